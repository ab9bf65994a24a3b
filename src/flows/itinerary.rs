use serde::{Deserialize, Serialize};

use crate::{
    Result,
    flow::{FlowDefinition, FlowExecutor, TypedFlow},
    flows::{VehicleDetails, vehicle_details_schema},
    schema::{ObjectSchema, Schema},
    template::Template,
};

pub const NAME: &str = "generatePersonalizedRoadTripItineraryFlow";

pub const FLOW: TypedFlow<ItineraryRequest, Itinerary> = TypedFlow::new(NAME);

const PROMPT: &str = "You are a personalized travel assistant. Build a detailed road trip itinerary from the user's preferences, interests and vehicle.

The trip starts at {{startingPoint}}, ends at {{destination}} and lasts {{durationDays}} days.

The user has the following interests: {{#each interests}}{{{this}}}{{#unless @last}}, {{/unless}}{{/each}}.
Their vehicle is a {{vehicleDetails.make}} {{vehicleDetails.model}} running on {{vehicleDetails.fuelType}} with {{vehicleDetails.mpg}} MPG.
Preferred pace: {{travelPreferences.pace}}.
Lodging preferences: {{#each travelPreferences.lodgingPreferences}}{{{this}}}{{#unless @last}}, {{/unless}}{{/each}}.
Food preferences: {{#each travelPreferences.foodPreferences}}{{{this}}}{{#unless @last}}, {{/unless}}{{/each}}.

Return the itinerary as an ordered list of stops. For each stop give its name, its location and the suggested activity there.
Plan the stops around the vehicle's fuel efficiency.
";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::EnumString, strum::VariantNames)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Pace {
    Relaxed,
    Moderate,
    Fast,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TravelPreferences {
    pub pace: Pace,
    pub lodging_preferences: Vec<String>,
    pub food_preferences: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryRequest {
    pub starting_point: String,
    pub destination: String,
    pub duration_days: u32,
    pub interests: Vec<String>,
    pub vehicle_details: VehicleDetails,
    pub travel_preferences: TravelPreferences,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ItineraryStop {
    pub name: String,
    pub location: String,
    pub activity: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Itinerary {
    pub itinerary: Vec<ItineraryStop>,
}

pub fn input_schema() -> Schema {
    let preferences: Schema = ObjectSchema::new()
        .describe("The travel preferences of the user.")
        .required("pace", Schema::enum_of::<Pace>(), "Preferred travel pace.")
        .required("lodgingPreferences", Schema::array(Schema::string()), "Preferred lodging, e.g. hotels, RV parks, camping.")
        .required("foodPreferences", Schema::array(Schema::string()), "Preferred cuisines.")
        .into();

    ObjectSchema::new()
        .required("startingPoint", Schema::string(), "The starting point of the road trip.")
        .required("destination", Schema::string(), "The final destination of the road trip.")
        .required("durationDays", Schema::number(), "The duration of the road trip in days.")
        .required("interests", Schema::array(Schema::string()), "User interests, e.g. hiking, photography, food.")
        .required("vehicleDetails", vehicle_details_schema(), "")
        .required("travelPreferences", preferences, "")
        .into()
}

pub fn output_schema() -> Schema {
    let stop: Schema = ObjectSchema::new()
        .required("name", Schema::string(), "Name of the stop.")
        .required("location", Schema::string(), "Where the stop is.")
        .required("activity", Schema::string(), "Suggested activity at the stop.")
        .into();
    ObjectSchema::new().required("itinerary", Schema::array(stop), "Ordered stops of the road trip.").into()
}

pub fn definition() -> Result<FlowDefinition> {
    Ok(FlowDefinition::prompt(NAME, input_schema(), output_schema(), Template::parse(PROMPT)?)
        .with_description("Generates a personalized road trip itinerary."))
}

pub async fn generate_personalized_road_trip_itinerary(
    executor: &FlowExecutor,
    request: &ItineraryRequest,
) -> Result<Itinerary> {
    FLOW.invoke(executor, request).await
}
