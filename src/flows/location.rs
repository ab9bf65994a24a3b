use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    flow::{FlowDefinition, FlowExecutor, InstructionHandler, TypedFlow},
    schema::{ObjectSchema, Schema},
};

pub const NAME: &str = "findUserLocationFlow";

pub const FLOW: TypedFlow<(), UserLocation> = TypedFlow::new(NAME);

const INSTRUCTION: &str = "You are a location detection agent. Determine the user's current location from their IP address.
";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserLocation {
    pub location: String,
}

pub fn output_schema() -> Schema {
    ObjectSchema::new().required("location", Schema::string(), "The user's current location.").into()
}

pub fn definition() -> FlowDefinition {
    FlowDefinition::new(NAME, output_schema(), Arc::new(InstructionHandler::fixed(INSTRUCTION)))
        .with_description("Finds the user's current location.")
}

pub async fn find_user_location(executor: &FlowExecutor) -> Result<UserLocation> {
    FLOW.invoke(executor, &()).await
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{RoadhogError, backend::MockBackend, flows::testing};

    #[tokio::test]
    async fn test_find_user_location() {
        let backend = Arc::new(MockBackend::new().respond(json!({"location": "Boulder, CO"})));
        let exec = testing::executor(backend.clone());

        let location = find_user_location(&exec).await.unwrap();
        assert_eq!(location.location, "Boulder, CO");
        assert_eq!(backend.requests()[0].prompt, INSTRUCTION);
    }

    #[tokio::test]
    async fn test_location_must_be_present() {
        let backend = Arc::new(MockBackend::new().respond(json!({})));
        let exec = testing::executor(backend);

        let err = find_user_location(&exec).await.unwrap_err();
        assert!(matches!(err, RoadhogError::OutputContract { .. }));
        assert_eq!(err.violations()[0].path, "location");
    }
}
