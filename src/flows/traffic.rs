use serde::{Deserialize, Serialize};

use crate::{
    Result,
    flow::{FlowDefinition, FlowExecutor, TypedFlow},
    flows::{RouteRequest, route_request_schema},
    schema::{ObjectSchema, Schema},
    template::Template,
};

pub const NAME: &str = "getTrafficForRouteFlow";

pub const FLOW: TypedFlow<RouteRequest, TrafficInfo> = TypedFlow::new(NAME);

const PROMPT: &str = "You monitor traffic for a road trip application. List possible traffic alerts for the route from {{origin}} to {{destination}}{{#if waypoints}} via {{#each waypoints}}{{{this}}}{{#unless @last}}, {{/unless}}{{/each}}{{/if}}.

Produce between 1 and 3 realistic but fictional alerts for a demo.
Each alert has:
- location: where the alert is.
- severity: 'low', 'medium' or 'high'.
- description: a short description of the event.
- type: 'congestion', 'accident', 'construction' or 'road_closure'.

Return an empty list of alerts when nothing significant is going on.
";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, strum::AsRefStr, strum::EnumString, strum::VariantNames)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::EnumString, strum::VariantNames)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AlertType {
    Congestion,
    Accident,
    Construction,
    RoadClosure,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrafficAlert {
    pub location: String,
    pub severity: Severity,
    pub description: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TrafficInfo {
    pub alerts: Vec<TrafficAlert>,
}

impl TrafficInfo {
    /// Alerts at or above `severity`.
    pub fn at_least(
        &self,
        severity: Severity,
    ) -> impl Iterator<Item = &TrafficAlert> {
        self.alerts.iter().filter(move |alert| alert.severity >= severity)
    }
}

pub fn output_schema() -> Schema {
    let alert: Schema = ObjectSchema::new()
        .required("location", Schema::string(), "Where the alert is, e.g. \"near Denver, CO on I-25\".")
        .required("severity", Schema::enum_of::<Severity>(), "How severe the traffic issue is.")
        .required("description", Schema::string(), "A short description, e.g. \"Accident reported\".")
        .required("type", Schema::enum_of::<AlertType>(), "The kind of traffic alert.")
        .into();

    ObjectSchema::new().required("alerts", Schema::array(alert), "Traffic alerts along the route.").into()
}

pub fn definition() -> Result<FlowDefinition> {
    Ok(FlowDefinition::prompt(NAME, route_request_schema(), output_schema(), Template::parse(PROMPT)?)
        .with_description("Generates traffic alerts along a road trip route."))
}

pub async fn get_traffic_for_route(
    executor: &FlowExecutor,
    route: &RouteRequest,
) -> Result<TrafficInfo> {
    FLOW.invoke(executor, route).await
}
