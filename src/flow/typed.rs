use std::marker::PhantomData;

use serde::{Serialize, de::DeserializeOwned};

use crate::{Result, RoadhogError, flow::FlowExecutor};

/// Statically typed handle on a registered flow.
///
/// Input is serialized to JSON before validation and the validated output is
/// deserialized into `O`, so callers work with plain structs while the
/// executor still enforces the schemas.
pub struct TypedFlow<I, O> {
    name: &'static str,
    _marker: PhantomData<fn(I) -> O>,
}

impl<I, O> TypedFlow<I, O>
where
    I: Serialize,
    O: DeserializeOwned,
{
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn invoke(
        &self,
        executor: &FlowExecutor,
        input: &I,
    ) -> Result<O> {
        let input = serde_json::to_value(input).map_err(|err| RoadhogError::Convert(format!("flow '{}' input: {}", self.name, err)))?;
        let input = if input.is_null() { None } else { Some(input) };
        let output = executor.invoke(self.name, input).await?;
        serde_json::from_value(output).map_err(|err| RoadhogError::Convert(format!("flow '{}' output: {}", self.name, err)))
    }
}

impl<I, O> Clone for TypedFlow<I, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I, O> Copy for TypedFlow<I, O> {}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde::{Deserialize, Serialize};
    use serde_json::json;

    use super::*;
    use crate::{
        backend::MockBackend,
        flow::{FlowDefinition, FlowRegistry},
        schema::{ObjectSchema, Schema},
        template::Template,
    };

    #[derive(Serialize)]
    struct Greeting {
        name: String,
    }

    #[derive(Deserialize, Debug, PartialEq)]
    struct Reply {
        text: String,
    }

    const GREET: TypedFlow<Greeting, Reply> = TypedFlow::new("greet");

    fn executor(backend: MockBackend) -> FlowExecutor {
        let input: Schema = ObjectSchema::new().required("name", Schema::string(), "").into();
        let output: Schema = ObjectSchema::new().required("text", Schema::string(), "").into();
        let def = FlowDefinition::prompt("greet", input, output, Template::parse("Greet {{name}}").unwrap());
        let registry = FlowRegistry::builder().define(def).unwrap().build();
        FlowExecutor::new(Arc::new(registry), Arc::new(backend))
    }

    #[tokio::test]
    async fn test_typed_invoke() {
        let exec = executor(MockBackend::new().respond(json!({"text": "hello Ana"})));
        let reply = GREET
            .invoke(
                &exec,
                &Greeting {
                    name: "Ana".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(
            reply,
            Reply {
                text: "hello Ana".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_typed_contract_errors_pass_through() {
        let exec = executor(MockBackend::new().respond(json!({"text": 3})));
        let err = GREET
            .invoke(
                &exec,
                &Greeting {
                    name: "Ana".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RoadhogError::OutputContract { .. }));
    }
}
