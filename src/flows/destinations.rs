use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    Result,
    flow::{FlowDefinition, FlowExecutor, InstructionHandler, TypedFlow},
    schema::{ObjectSchema, Schema},
};

pub const NAME: &str = "suggestDestinationsFlow";

pub const FLOW: TypedFlow<DestinationsRequest, DestinationSuggestions> = TypedFlow::new(NAME);

/// Interests used when the caller has no profile to draw from.
pub const DEFAULT_INTERESTS: [&str; 4] = ["Hiking", "Photography", "Live Music", "Craft Beer"];

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DestinationsRequest {
    pub interests: Vec<String>,
}

impl Default for DestinationsRequest {
    fn default() -> Self {
        Self {
            interests: DEFAULT_INTERESTS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SuggestedDestination {
    pub name: String,
    pub location: String,
    /// out of 5
    pub rating: f64,
    pub category: String,
    pub description: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DestinationSuggestions {
    pub destinations: Vec<SuggestedDestination>,
}

/// The instruction is assembled directly from the input instead of a template.
fn instruction(input: &Value) -> String {
    let interests = input["interests"]
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_str).collect::<Vec<_>>().join(", "))
        .unwrap_or_default();

    format!(
        "You are the travel expert of the RoadHog app. Suggest top-rated destinations for a user's interests.

User Interests: {}

Suggest 5 destinations that are:
1. Highly relevant to the user's interests.
2. Well known and popular, such as national parks, famous museums or iconic landmarks.
3. Spread across the United States.

For each destination give the name, the location (city, state), a rating out of 5, the category and a short description of why it suits this user.
",
        interests
    )
}

pub fn input_schema() -> Schema {
    ObjectSchema::new().required("interests", Schema::array(Schema::string()), "The user's interests.").into()
}

pub fn output_schema() -> Schema {
    let destination: Schema = ObjectSchema::new()
        .required("name", Schema::string(), "Name of the destination.")
        .required("location", Schema::string(), "City and state of the destination.")
        .required("rating", Schema::number(), "Rating out of 5, may be fractional.")
        .required("category", Schema::string(), "Category, e.g. National Park, Museum, Restaurant.")
        .required("description", Schema::string(), "Why this destination suits the user's interests.")
        .into();
    ObjectSchema::new().required("destinations", Schema::array(destination), "Suggested destinations.").into()
}

pub fn definition() -> FlowDefinition {
    FlowDefinition::new(NAME, output_schema(), Arc::new(InstructionHandler::from_fn(instruction)))
        .with_input(input_schema())
        .with_description("Suggests destinations from the user's interests.")
}

pub async fn suggest_destinations(
    executor: &FlowExecutor,
    request: &DestinationsRequest,
) -> Result<DestinationSuggestions> {
    FLOW.invoke(executor, request).await
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{backend::MockBackend, flows::testing};

    #[tokio::test]
    async fn test_default_interests() {
        let backend = Arc::new(MockBackend::new().respond(json!({
            "destinations": [
                {"name": "Zion", "location": "Springdale, UT", "rating": 4.9, "category": "National Park", "description": "Canyon hikes."}
            ]
        })));
        let exec = testing::executor(backend.clone());

        let suggestions = suggest_destinations(&exec, &DestinationsRequest::default()).await.unwrap();
        assert_eq!(suggestions.destinations[0].rating, 4.9);

        let request = &backend.requests()[0];
        assert!(request.prompt.contains("User Interests: Hiking, Photography, Live Music, Craft Beer\n"));
        assert_eq!(request.output_schema, output_schema());
    }

    #[tokio::test]
    async fn test_rating_must_be_number() {
        let backend = Arc::new(MockBackend::new().respond(json!({
            "destinations": [
                {"name": "Zion", "location": "Springdale, UT", "rating": "4.9", "category": "National Park", "description": "x"}
            ]
        })));
        let exec = testing::executor(backend);

        let err = suggest_destinations(&exec, &DestinationsRequest::default()).await.unwrap_err();
        assert_eq!(err.violations()[0].path, "destinations[0].rating");
    }
}
