//! Named, schema-typed flows.
//!
//! A [`FlowDefinition`] is a plain record: a name, an optional input schema,
//! an output schema, an optional template and a handler. Definitions are
//! collected into a [`FlowRegistry`] once at startup and invoked by name
//! through a [`FlowExecutor`], which enforces
//! input validation → handler → output validation.

mod executor;
mod handler;
mod registry;
mod typed;

use std::{fmt, sync::Arc};

use crate::{schema::Schema, template::Template};

pub use executor::{FlowExecutor, InvocationRecord, InvokePolicy};
pub use handler::{FlowContext, FlowHandler, InstructionHandler, PromptHandler};
pub use registry::{FlowRegistry, FlowRegistryBuilder};
pub use typed::TypedFlow;

/// flow name
pub type FlowName = String;

pub struct FlowDefinition {
    /// unique flow name
    pub name: FlowName,
    /// flow description
    pub description: String,
    /// shape of the caller input, `None` for flows that take no input
    pub input_schema: Option<Schema>,
    /// shape the handler's result must have
    pub output_schema: Schema,
    /// prompt template rendered by the handler, if any
    pub template: Option<Template>,
    /// produces the output from validated input
    pub handler: Arc<dyn FlowHandler>,
}

impl FlowDefinition {
    pub fn new(
        name: impl Into<FlowName>,
        output_schema: Schema,
        handler: Arc<dyn FlowHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            input_schema: None,
            output_schema,
            template: None,
            handler,
        }
    }

    /// A flow that renders `template` against its input and sends the result
    /// to the backend.
    pub fn prompt(
        name: impl Into<FlowName>,
        input_schema: Schema,
        output_schema: Schema,
        template: Template,
    ) -> Self {
        Self::new(name, output_schema, Arc::new(PromptHandler))
            .with_input(input_schema)
            .with_template(template)
    }

    pub fn with_input(
        mut self,
        input_schema: Schema,
    ) -> Self {
        self.input_schema = Some(input_schema);
        self
    }

    pub fn with_template(
        mut self,
        template: Template,
    ) -> Self {
        self.template = Some(template);
        self
    }

    pub fn with_description(
        mut self,
        description: &str,
    ) -> Self {
        self.description = description.to_string();
        self
    }
}

impl fmt::Debug for FlowDefinition {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("FlowDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .field("output_schema", &self.output_schema)
            .field("template", &self.template.as_ref().map(Template::source))
            .finish_non_exhaustive()
    }
}
