use serde::{Deserialize, Serialize};

use crate::{
    Result,
    flow::{FlowDefinition, FlowExecutor, TypedFlow},
    flows::{VehicleDetails, vehicle_details_schema},
    schema::{ObjectSchema, Schema},
    template::Template,
};

pub const NAME: &str = "suggestStopsAlongRouteFlow";

pub const FLOW: TypedFlow<StopsRequest, StopSuggestions> = TypedFlow::new(NAME);

const PROMPT: &str = "You are the personalized travel assistant of the RoadHog app. Suggest interesting, popular stops along a road trip route, based on the user's interests and the vehicle's fuel needs.

The trip starts at {{origin}} and ends at {{destination}}.
Stops the user already planned: {{#if waypoints}}{{#each waypoints}}{{{this}}}{{#unless @last}}, {{/unless}}{{/each}}{{else}}None{{/if}}.

User Profile:
- Interests: {{#each interests}}{{{this}}}{{#unless @last}}, {{/unless}}{{/each}}
- Vehicle: {{vehicleDetails.make}} {{vehicleDetails.model}} with an MPG of {{vehicleDetails.mpg}} ({{vehicleDetails.fuelType}}).

Suggest a few stops that are:
1. Highly relevant to the user's interests.
2. Popular and well regarded.
3. Located between the origin, the waypoints and the destination.
4. Fuel aware: include gas stations before the tank could run low, assuming a full 15-gallon tank at the start.
5. Diverse: activities, food and points of interest.

For each stop give the name, the location (city, state), the type and a short description of why it suits this user.
";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::EnumString, strum::VariantNames)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StopType {
    Interest,
    Gas,
    Food,
    Lodging,
    Activity,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StopsRequest {
    pub origin: String,
    pub destination: String,
    pub waypoints: Vec<String>,
    pub interests: Vec<String>,
    pub vehicle_details: VehicleDetails,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SuggestedStop {
    pub name: String,
    pub location: String,
    #[serde(rename = "type")]
    pub stop_type: StopType,
    pub description: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StopSuggestions {
    pub suggestions: Vec<SuggestedStop>,
}

pub fn input_schema() -> Schema {
    ObjectSchema::new()
        .required("origin", Schema::string(), "The starting point of the road trip.")
        .required("destination", Schema::string(), "The final destination of the road trip.")
        .required("waypoints", Schema::array(Schema::string()), "Stops already planned.")
        .required("interests", Schema::array(Schema::string()), "User interests, e.g. hiking, photography, food.")
        .required("vehicleDetails", vehicle_details_schema(), "")
        .into()
}

pub fn output_schema() -> Schema {
    let stop: Schema = ObjectSchema::new()
        .required("name", Schema::string(), "Name of the stop.")
        .required("location", Schema::string(), "City and state of the stop.")
        .required("type", Schema::enum_of::<StopType>(), "Category of the stop.")
        .required("description", Schema::string(), "Why this stop is recommended for the user.")
        .into();
    ObjectSchema::new().required("suggestions", Schema::array(stop), "Suggested stops along the route.").into()
}

pub fn definition() -> Result<FlowDefinition> {
    Ok(FlowDefinition::prompt(NAME, input_schema(), output_schema(), Template::parse(PROMPT)?)
        .with_description("Suggests stops along a route from the user's interests and fuel range."))
}

pub async fn suggest_stops_along_route(
    executor: &FlowExecutor,
    request: &StopsRequest,
) -> Result<StopSuggestions> {
    FLOW.invoke(executor, request).await
}
