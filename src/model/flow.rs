use std::{fs, path::Path, sync::Arc};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    Result, RoadhogError,
    flow::{FlowDefinition, PromptHandler},
    schema::Schema,
    template::Template,
};

/// Declarative prompt flow, as loaded from a JSON manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowModel {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Schema>,
    pub output: Schema,
    pub template: String,
}

impl FlowModel {
    pub fn from_json(s: &str) -> Result<Self> {
        let value = serde_json::from_str::<Value>(s)?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self> {
        jsonschema::validate(&Self::schema(), &value)?;
        let model = serde_json::from_value::<Self>(value)?;
        Ok(model)
    }

    pub fn from_file<T: AsRef<Path>>(path: T) -> Result<Self> {
        let data = fs::read_to_string(path.as_ref())
            .map_err(|err| RoadhogError::Config(format!("failed to load flow manifest {:?}: {}", path.as_ref(), err)))?;
        Self::from_json(&data)
    }

    /// Turns the manifest into a prompt flow definition.
    pub fn to_definition(&self) -> Result<FlowDefinition> {
        let template = Template::parse(&self.template)?;
        let mut def = FlowDefinition::new(self.name.clone(), self.output.clone(), Arc::new(PromptHandler))
            .with_template(template)
            .with_description(&self.description);
        if let Some(input) = &self.input {
            def = def.with_input(input.clone());
        }
        Ok(def)
    }

    /// JSON Schema every manifest must satisfy.
    pub fn schema() -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "minLength": 1,
                    "description": "Unique flow name"
                },
                "description": {
                    "type": "string"
                },
                "input": {
                    "$ref": "#/$defs/schema",
                    "description": "Shape of the caller input, omitted for flows without input"
                },
                "output": {
                    "$ref": "#/$defs/schema",
                    "description": "Shape the backend answer must have"
                },
                "template": {
                    "type": "string",
                    "minLength": 1,
                    "description": "Prompt template rendered against the input"
                }
            },
            "required": ["name", "output", "template"],
            "additionalProperties": false,
            "$defs": {
                "schema": {
                    "type": "object",
                    "properties": {
                        "type": {
                            "type": "string",
                            "enum": ["string", "number", "boolean", "enum", "array", "object", "optional"]
                        }
                    },
                    "required": ["type"],
                    "allOf": [
                        {
                            "if": { "properties": { "type": { "const": "enum" } } },
                            "then": {
                                "properties": {
                                    "values": { "type": "array", "items": { "type": "string" }, "minItems": 1 }
                                },
                                "required": ["values"]
                            }
                        },
                        {
                            "if": { "properties": { "type": { "const": "array" } } },
                            "then": {
                                "properties": {
                                    "items": { "$ref": "#/$defs/schema" },
                                    "non_empty": { "type": "boolean" },
                                    "message": { "type": "string" }
                                },
                                "required": ["items"]
                            }
                        },
                        {
                            "if": { "properties": { "type": { "const": "object" } } },
                            "then": {
                                "properties": {
                                    "description": { "type": "string" },
                                    "fields": { "type": "array", "items": { "$ref": "#/$defs/field" } }
                                }
                            }
                        },
                        {
                            "if": { "properties": { "type": { "const": "optional" } } },
                            "then": {
                                "properties": {
                                    "schema": { "$ref": "#/$defs/schema" }
                                },
                                "required": ["schema"]
                            }
                        }
                    ]
                },
                "field": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string", "minLength": 1 },
                        "schema": { "$ref": "#/$defs/schema" },
                        "required": { "type": "boolean" },
                        "description": { "type": "string" }
                    },
                    "required": ["name", "schema"],
                    "additionalProperties": false
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::{
        backend::MockBackend,
        flow::{FlowExecutor, FlowRegistry},
        schema::{ObjectSchema, Schema},
    };

    const PACKING: &str = r#"
    {
        "name": "packingListFlow",
        "description": "Suggests what to pack.",
        "input": {
            "type": "object",
            "fields": [
                { "name": "destination", "schema": { "type": "string" } },
                { "name": "activities", "schema": { "type": "array", "items": { "type": "string" }, "non_empty": true } }
            ]
        },
        "output": {
            "type": "object",
            "fields": [
                { "name": "items", "schema": { "type": "array", "items": { "type": "string" } }, "description": "Things to pack." },
                { "name": "season", "schema": { "type": "enum", "values": ["summer", "winter"] } }
            ]
        },
        "template": "Packing for {{destination}}: {{#each activities}}{{this}}{{#unless @last}}, {{/unless}}{{/each}}."
    }
    "#;

    #[test]
    fn test_parse_manifest() {
        let model = FlowModel::from_json(PACKING).unwrap();
        assert_eq!(model.name, "packingListFlow");

        let expected: Schema = ObjectSchema::new()
            .required("destination", Schema::string(), "")
            .required("activities", Schema::non_empty_array(Schema::string(), None), "")
            .into();
        assert_eq!(model.input, Some(expected));
    }

    #[tokio::test]
    async fn test_manifest_flow_runs() {
        let def = FlowModel::from_json(PACKING).unwrap().to_definition().unwrap();
        let registry = FlowRegistry::builder().define(def).unwrap().build();
        let backend = Arc::new(MockBackend::new().respond(json!({"items": ["boots", "sunscreen"], "season": "summer"})));
        let exec = FlowExecutor::new(Arc::new(registry), backend.clone());

        let output = exec.invoke("packingListFlow", Some(json!({"destination": "Moab", "activities": ["hiking", "rafting"]}))).await.unwrap();
        assert_eq!(output["season"], "summer");
        assert_eq!(backend.requests()[0].prompt, "Packing for Moab: hiking, rafting.");
    }

    #[test]
    fn test_manifest_rejects_unknown_schema_type() {
        let err = FlowModel::from_json(r#"{"name": "x", "output": {"type": "date"}, "template": "t"}"#).unwrap_err();
        assert!(matches!(err, RoadhogError::Programmer(_)));
    }

    #[test]
    fn test_manifest_requires_enum_values() {
        let err = FlowModel::from_json(r#"{"name": "x", "output": {"type": "enum"}, "template": "t"}"#).unwrap_err();
        assert!(matches!(err, RoadhogError::Programmer(_)));
    }

    #[test]
    fn test_manifest_rejects_extra_keys() {
        let err = FlowModel::from_json(r#"{"name": "x", "output": {"type": "string"}, "template": "t", "model": "y"}"#).unwrap_err();
        assert!(matches!(err, RoadhogError::Programmer(_)));
    }

    #[test]
    fn test_manifest_bad_json() {
        assert!(matches!(FlowModel::from_json("{"), Err(RoadhogError::Convert(_))));
    }

    #[test]
    fn test_manifest_bad_template() {
        let model = FlowModel::from_json(r#"{"name": "x", "output": {"type": "string"}, "template": "{{#if a}}open"}"#).unwrap();
        assert!(matches!(model.to_definition(), Err(RoadhogError::Template(_))));
    }

    #[test]
    fn test_manifest_undeclared_reference_fails_registration() {
        let model = FlowModel::from_json(
            r#"{"name": "x", "input": {"type": "object", "fields": [{"name": "a", "schema": {"type": "string"}}]}, "output": {"type": "string"}, "template": "{{b}}"}"#,
        )
        .unwrap();
        let def = model.to_definition().unwrap();
        assert!(matches!(FlowRegistry::builder().define(def), Err(RoadhogError::Programmer(_))));
    }
}
