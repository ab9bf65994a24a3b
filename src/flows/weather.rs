use serde::{Deserialize, Serialize};

use crate::{
    Result,
    flow::{FlowDefinition, FlowExecutor, TypedFlow},
    flows::{RouteRequest, route_request_schema},
    schema::{ObjectSchema, Schema},
    template::Template,
};

pub const NAME: &str = "getWeatherForRouteFlow";

pub const FLOW: TypedFlow<RouteRequest, WeatherInfo> = TypedFlow::new(NAME);

const PROMPT: &str = "You are the weather forecaster of a road trip application. Forecast the weather for the route from {{origin}} to {{destination}}{{#if waypoints}} via {{#each waypoints}}{{{this}}}{{#unless @last}}, {{/unless}}{{/each}}{{/if}}.

Start with a short summary of the conditions along the whole route.

Then list the conditions at the key points of the trip: the origin, the destination and the major cities or waypoints in between.
For each point give the location, the temperature in Fahrenheit, a short description and one icon from: Sun, Cloudy, Wind, CloudRain, Snowflake, Zap, AlertTriangle.

The data is for a demo; keep it realistic and varied.
";

/// Icon shown next to a forecast.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::EnumString, strum::VariantNames)]
pub enum WeatherIcon {
    Sun,
    Cloudy,
    Wind,
    CloudRain,
    Snowflake,
    Zap,
    AlertTriangle,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WeatherCondition {
    pub location: String,
    /// degrees Fahrenheit
    pub temperature: f64,
    pub condition: String,
    pub icon: WeatherIcon,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherInfo {
    pub overall_summary: String,
    pub conditions: Vec<WeatherCondition>,
}

pub fn output_schema() -> Schema {
    let condition: Schema = ObjectSchema::new()
        .required("location", Schema::string(), "The city or area of this forecast.")
        .required("temperature", Schema::number(), "The temperature in Fahrenheit.")
        .required("condition", Schema::string(), "A short description, e.g. \"Sunny\" or \"Light Rain\".")
        .required("icon", Schema::enum_of::<WeatherIcon>(), "Icon matching the condition.")
        .into();

    ObjectSchema::new()
        .required("overallSummary", Schema::string(), "Summary of the weather along the whole route.")
        .required("conditions", Schema::array(condition), "Conditions at points along the route.")
        .into()
}

pub fn definition() -> Result<FlowDefinition> {
    Ok(FlowDefinition::prompt(NAME, route_request_schema(), output_schema(), Template::parse(PROMPT)?)
        .with_description("Fetches weather conditions along a road trip route."))
}

pub async fn get_weather_for_route(
    executor: &FlowExecutor,
    route: &RouteRequest,
) -> Result<WeatherInfo> {
    FLOW.invoke(executor, route).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::{RoadhogError, backend::MockBackend, flows::testing, schema::ViolationKind};

    #[tokio::test]
    async fn test_weather_for_route() {
        let backend = Arc::new(MockBackend::new().respond(json!({
            "overallSummary": "Clear skies with afternoon wind in the canyons.",
            "conditions": [
                {"location": "Denver, CO", "temperature": 68, "condition": "Sunny", "icon": "Sun"},
                {"location": "Moab, UT", "temperature": 81.5, "condition": "Breezy", "icon": "Wind"}
            ]
        })));
        let exec = testing::executor(backend.clone());

        let route = RouteRequest::new("Denver, CO", "Moab, UT").via("Vail, CO").via("Grand Junction, CO");
        let info = get_weather_for_route(&exec, &route).await.unwrap();

        assert_eq!(info.conditions[0].icon, WeatherIcon::Sun);
        assert_eq!(info.conditions[1].temperature, 81.5);
        assert!(backend.requests()[0].prompt.contains("from Denver, CO to Moab, UT via Vail, CO, Grand Junction, CO."));
    }

    #[tokio::test]
    async fn test_no_waypoints_leaves_no_via() {
        let backend = Arc::new(MockBackend::new().respond(json!({"overallSummary": "", "conditions": []})));
        let exec = testing::executor(backend.clone());

        get_weather_for_route(&exec, &RouteRequest::new("Denver, CO", "Moab, UT")).await.unwrap();
        let prompt = &backend.requests()[0].prompt;
        assert!(prompt.contains("from Denver, CO to Moab, UT."));
        assert!(!prompt.contains(" via "));
    }

    #[tokio::test]
    async fn test_unknown_icon_lists_allowed_symbols() {
        let backend = Arc::new(MockBackend::new().respond(json!({
            "overallSummary": "Colorful.",
            "conditions": [{"location": "Moab, UT", "temperature": 70, "condition": "Rainbow", "icon": "Rainbow"}]
        })));
        let exec = testing::executor(backend);

        let err = get_weather_for_route(&exec, &RouteRequest::new("Denver, CO", "Moab, UT")).await.unwrap_err();
        assert!(matches!(err, RoadhogError::OutputContract { .. }));
        let violation = &err.violations()[0];
        assert_eq!(violation.path, "conditions[0].icon");
        match &violation.kind {
            ViolationKind::NotInEnum {
                allowed,
                found,
            } => {
                assert_eq!(found, "Rainbow");
                assert_eq!(allowed, &["Sun", "Cloudy", "Wind", "CloudRain", "Snowflake", "Zap", "AlertTriangle"]);
            }
            other => panic!("unexpected violation {:?}", other),
        }
    }
}
