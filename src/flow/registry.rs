use std::{collections::HashMap, sync::Arc};

use tracing::debug;

use crate::{
    Result, RoadhogError,
    flow::{FlowDefinition, FlowName},
    schema::Schema,
};

/// Immutable set of flow definitions, keyed by name.
///
/// Built once through [`FlowRegistryBuilder`] and shared read-only afterwards.
#[derive(Debug, Default)]
pub struct FlowRegistry {
    flows: HashMap<FlowName, Arc<FlowDefinition>>,
}

impl FlowRegistry {
    pub fn builder() -> FlowRegistryBuilder {
        FlowRegistryBuilder::default()
    }

    pub fn get(
        &self,
        name: &str,
    ) -> Option<Arc<FlowDefinition>> {
        self.flows.get(name).cloned()
    }

    pub fn contains(
        &self,
        name: &str,
    ) -> bool {
        self.flows.contains_key(name)
    }

    /// Registered flow names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.flows.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct FlowRegistryBuilder {
    flows: HashMap<FlowName, Arc<FlowDefinition>>,
}

impl FlowRegistryBuilder {
    /// Adds a definition after checking it is well formed.
    ///
    /// Fails with [`RoadhogError::Programmer`] when the name is empty or taken,
    /// a schema is malformed, or the template reads a key the input schema
    /// does not declare.
    pub fn define(
        mut self,
        def: FlowDefinition,
    ) -> Result<Self> {
        if def.name.trim().is_empty() {
            return Err(RoadhogError::Programmer("flow name must not be empty".to_string()));
        }
        if self.flows.contains_key(&def.name) {
            return Err(RoadhogError::Programmer(format!("flow '{}' is already defined", def.name)));
        }
        if let Some(input) = &def.input_schema {
            input.check().map_err(|err| in_flow(&def.name, err))?;
        }
        def.output_schema.check().map_err(|err| in_flow(&def.name, err))?;

        if let (Some(template), Some(input)) = (&def.template, &def.input_schema) {
            for path in template.references() {
                if !declares(input, &path) {
                    return Err(RoadhogError::Programmer(format!(
                        "flow '{}': template references '{}' which the input schema does not declare",
                        def.name,
                        path.join(".")
                    )));
                }
            }
        }

        debug!(flow = %def.name, "flow defined");
        self.flows.insert(def.name.clone(), Arc::new(def));
        Ok(self)
    }

    pub fn build(self) -> FlowRegistry {
        FlowRegistry {
            flows: self.flows,
        }
    }
}

fn in_flow(
    name: &str,
    err: RoadhogError,
) -> RoadhogError {
    match err {
        RoadhogError::Programmer(msg) => RoadhogError::Programmer(format!("flow '{}': {}", name, msg)),
        other => other,
    }
}

/// Whether `path` can be reached through object fields of `schema`.
fn declares(
    schema: &Schema,
    path: &[String],
) -> bool {
    let Some((key, rest)) = path.split_first() else {
        return true;
    };
    let schema = match schema {
        Schema::Optional {
            schema,
        } => schema.as_ref(),
        other => other,
    };
    match schema.as_object().and_then(|obj| obj.field(key)) {
        Some(field) => declares(&field.schema, rest),
        None => false,
    }
}
