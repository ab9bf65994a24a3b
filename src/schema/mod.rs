//! Declarative value shapes for flow inputs and outputs.
//!
//! A [`Schema`] is a tagged tree of primitive, enum, array, object and optional
//! nodes. Values are checked against it by [`validate`], which walks the tree
//! with one exhaustive `match` and reports every violation it finds.
//!
//! Object field sets are closed: a value carrying a field the schema does not
//! declare is rejected.

mod validate;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::{Result, RoadhogError};

pub use validate::{Violation, ViolationKind, validate};

/// Message reported for an empty non-empty array when the field sets none.
pub const DEFAULT_EMPTY_SELECTION_MESSAGE: &str = "at least one selection required";

/// Shape of a structured value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Schema {
    String,
    Number,
    Boolean,
    Enum {
        values: Vec<String>,
    },
    Array {
        items: Box<Schema>,
        /// Require at least one element.
        #[serde(default)]
        non_empty: bool,
        /// Message reported when `non_empty` is violated.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    Object(ObjectSchema),
    Optional {
        schema: Box<Schema>,
    },
}

/// A closed set of named fields.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ObjectSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
}

/// One declared field of an [`ObjectSchema`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub schema: Schema,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

fn default_required() -> bool {
    true
}

impl Schema {
    pub fn string() -> Self {
        Schema::String
    }

    pub fn number() -> Self {
        Schema::Number
    }

    pub fn boolean() -> Self {
        Schema::Boolean
    }

    /// Enum over the given string literals.
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Schema::Enum {
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Enum over the serialized names of a `strum::VariantNames` type.
    pub fn enum_of<E: strum::VariantNames>() -> Self {
        Self::enumeration(E::VARIANTS.iter().copied())
    }

    pub fn array(items: Schema) -> Self {
        Schema::Array {
            items: Box::new(items),
            non_empty: false,
            message: None,
        }
    }

    /// Array that must hold at least one element, as used by multi-select fields.
    pub fn non_empty_array(
        items: Schema,
        message: Option<&str>,
    ) -> Self {
        Schema::Array {
            items: Box::new(items),
            non_empty: true,
            message: message.map(str::to_string),
        }
    }

    pub fn optional(schema: Schema) -> Self {
        Schema::Optional {
            schema: Box::new(schema),
        }
    }

    /// Short name of the node kind, used in violation messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Schema::String => "string",
            Schema::Number => "number",
            Schema::Boolean => "boolean",
            Schema::Enum {
                ..
            } => "enum",
            Schema::Array {
                ..
            } => "array",
            Schema::Object(_) => "object",
            Schema::Optional {
                schema,
            } => schema.kind(),
        }
    }

    /// Returns the object node, looking through `Optional`.
    pub fn as_object(&self) -> Option<&ObjectSchema> {
        match self {
            Schema::Object(obj) => Some(obj),
            Schema::Optional {
                schema,
            } => schema.as_object(),
            _ => None,
        }
    }

    /// Checks the schema itself for misconfiguration.
    ///
    /// Empty or duplicated enum members, empty field names and duplicated field
    /// names are programmer errors and are reported before any flow runs.
    pub fn check(&self) -> Result<()> {
        self.check_at("$")
    }

    fn check_at(
        &self,
        path: &str,
    ) -> Result<()> {
        match self {
            Schema::String | Schema::Number | Schema::Boolean => Ok(()),
            Schema::Enum {
                values,
            } => {
                if values.is_empty() {
                    return Err(RoadhogError::Programmer(format!("enum at '{}' declares no members", path)));
                }
                let mut seen = HashSet::new();
                for v in values {
                    if !seen.insert(v.as_str()) {
                        return Err(RoadhogError::Programmer(format!("enum at '{}' declares '{}' twice", path, v)));
                    }
                }
                Ok(())
            }
            Schema::Array {
                items, ..
            } => items.check_at(&format!("{}[]", path)),
            Schema::Object(obj) => {
                let mut seen = HashSet::new();
                for field in &obj.fields {
                    if field.name.is_empty() {
                        return Err(RoadhogError::Programmer(format!("object at '{}' declares a field with an empty name", path)));
                    }
                    if !seen.insert(field.name.as_str()) {
                        return Err(RoadhogError::Programmer(format!("object at '{}' declares field '{}' twice", path, field.name)));
                    }
                    field.schema.check_at(&format!("{}.{}", path, field.name))?;
                }
                Ok(())
            }
            Schema::Optional {
                schema,
            } => schema.check_at(path),
        }
    }

    /// Renders the schema as a JSON Schema document.
    ///
    /// This is the output-shape descriptor handed to the generative backend.
    pub fn to_json_schema(&self) -> Value {
        match self {
            Schema::String => json!({ "type": "string" }),
            Schema::Number => json!({ "type": "number" }),
            Schema::Boolean => json!({ "type": "boolean" }),
            Schema::Enum {
                values,
            } => json!({ "type": "string", "enum": values }),
            Schema::Array {
                items,
                non_empty,
                ..
            } => {
                let mut out = json!({ "type": "array", "items": items.to_json_schema() });
                if *non_empty {
                    out["minItems"] = json!(1);
                }
                out
            }
            Schema::Object(obj) => obj.to_json_schema(),
            Schema::Optional {
                schema,
            } => json!({ "anyOf": [schema.to_json_schema(), { "type": "null" }] }),
        }
    }
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn describe(
        mut self,
        description: &str,
    ) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Adds a field that must be present.
    pub fn required(
        mut self,
        name: &str,
        schema: Schema,
        description: &str,
    ) -> Self {
        self.fields.push(Field {
            name: name.to_string(),
            schema,
            required: true,
            description: description.to_string(),
        });
        self
    }

    /// Adds a field that may be absent.
    pub fn optional(
        mut self,
        name: &str,
        schema: Schema,
        description: &str,
    ) -> Self {
        self.fields.push(Field {
            name: name.to_string(),
            schema,
            required: false,
            description: description.to_string(),
        });
        self
    }

    pub fn field(
        &self,
        name: &str,
    ) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in &self.fields {
            let mut prop = field.schema.to_json_schema();
            if !field.description.is_empty() {
                if let Some(obj) = prop.as_object_mut() {
                    obj.insert("description".to_string(), Value::String(field.description.clone()));
                }
            }
            properties.insert(field.name.clone(), prop);
            if field.required {
                required.push(Value::String(field.name.clone()));
            }
        }

        let mut out = json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": false,
        });
        if let Some(desc) = &self.description {
            out["description"] = Value::String(desc.clone());
        }
        out
    }
}

impl From<ObjectSchema> for Schema {
    fn from(obj: ObjectSchema) -> Self {
        Schema::Object(obj)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn vehicle() -> Schema {
        ObjectSchema::new()
            .required("make", Schema::string(), "The make of the vehicle.")
            .required("mpg", Schema::number(), "The MPG of the vehicle.")
            .optional("fuelType", Schema::string(), "")
            .into()
    }

    #[test]
    fn test_check_accepts_well_formed_schema() {
        let schema: Schema = ObjectSchema::new()
            .required("vehicle", vehicle(), "")
            .required("pace", Schema::enumeration(["relaxed", "moderate", "fast"]), "")
            .required("stops", Schema::non_empty_array(Schema::string(), None), "")
            .into();
        assert!(schema.check().is_ok());
    }

    #[test]
    fn test_check_rejects_empty_enum() {
        let schema: Schema = ObjectSchema::new().required("icon", Schema::enumeration(Vec::<String>::new()), "").into();
        let err = schema.check().unwrap_err();
        assert!(matches!(err, RoadhogError::Programmer(_)));
        assert!(err.to_string().contains("$.icon"));
    }

    #[test]
    fn test_check_rejects_duplicate_enum_member() {
        let err = Schema::enumeration(["low", "low"]).check().unwrap_err();
        assert!(err.to_string().contains("'low' twice"));
    }

    #[test]
    fn test_check_rejects_duplicate_field() {
        let schema: Schema = ObjectSchema::new().required("origin", Schema::string(), "").optional("origin", Schema::string(), "").into();
        assert!(schema.check().is_err());
    }

    #[test]
    fn test_json_schema_descriptor() {
        let descriptor = vehicle().to_json_schema();
        assert_eq!(descriptor["type"], "object");
        assert_eq!(descriptor["required"], json!(["make", "mpg"]));
        assert_eq!(descriptor["additionalProperties"], json!(false));
        assert_eq!(descriptor["properties"]["mpg"]["type"], "number");
        assert_eq!(descriptor["properties"]["make"]["description"], "The make of the vehicle.");
    }

    #[test]
    fn test_json_schema_descriptor_agrees_with_validator() {
        let schema: Schema = ObjectSchema::new()
            .required("alerts", Schema::array(Schema::enumeration(["low", "high"])), "")
            .optional("note", Schema::optional(Schema::string()), "")
            .into();
        let descriptor = schema.to_json_schema();

        for value in [
            json!({"alerts": ["low"]}),
            json!({"alerts": [], "note": null}),
            json!({"alerts": "not-a-list"}),
            json!({"alerts": ["medium"]}),
            json!({"alerts": [], "extra": 1}),
        ] {
            assert_eq!(
                jsonschema::is_valid(&descriptor, &value),
                validate(&schema, &value).is_ok(),
                "disagreement on {}",
                value
            );
        }
    }

    #[test]
    fn test_schema_deserialize_from_json() {
        let schema: Schema = serde_json::from_value(json!({
            "type": "object",
            "fields": [
                {"name": "summary", "schema": {"type": "string"}, "description": "A summary."},
                {"name": "tags", "schema": {"type": "array", "items": {"type": "string"}, "non_empty": true}, "required": false}
            ]
        }))
        .unwrap();
        let obj = schema.as_object().unwrap();
        assert!(obj.field("summary").unwrap().required);
        assert!(!obj.field("tags").unwrap().required);
        assert_eq!(
            obj.field("tags").unwrap().schema,
            Schema::non_empty_array(Schema::string(), None)
        );
    }
}
