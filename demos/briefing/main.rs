use std::sync::Arc;

use roadhog::{
    MockBackend, RoadhogBuilder, TripPlanner,
    flows::{RouteRequest, traffic, weather},
    route::StaticRouteResolver,
};
use serde_json::json;

#[tokio::main]
async fn main() {
    let backend = MockBackend::new()
        .respond_to(
            weather::NAME,
            json!({
                "overallSummary": "Clear skies through the Rockies, cooler near the pass.",
                "conditions": [
                    {"location": "Denver, CO", "temperature": 68, "condition": "Sunny", "icon": "Sun"},
                    {"location": "Vail, CO", "temperature": 52, "condition": "Breezy", "icon": "Wind"},
                    {"location": "Moab, UT", "temperature": 81, "condition": "Sunny", "icon": "Sun"}
                ]
            }),
        )
        .respond_to(
            traffic::NAME,
            json!({
                "alerts": [
                    {"location": "I-70 Glenwood Canyon", "severity": "medium", "description": "Single lane for rockfall work", "type": "construction"}
                ]
            }),
        );

    let executor = RoadhogBuilder::new().backend(Arc::new(backend)).build().unwrap();

    let resolver = StaticRouteResolver::new()
        .place("Denver, CO", 39.7392, -104.9903)
        .place("Vail, CO", 39.6403, -106.3742)
        .place("Moab, UT", 38.5733, -109.5498);

    let planner = TripPlanner::new(executor, Arc::new(resolver));

    let request = RouteRequest::new("Denver, CO", "Moab, UT").via("Vail, CO");
    let briefing = planner.route_briefing(&request).await.unwrap();

    println!(
        "Route: {:.0} km, about {} min",
        briefing.route.distance_meters() / 1000.0,
        briefing.route.duration_secs() / 60
    );
    println!("Weather: {}", briefing.weather.overall_summary);
    for condition in &briefing.weather.conditions {
        println!("  {} {}F {} ({:?})", condition.location, condition.temperature, condition.condition, condition.icon);
    }
    for alert in &briefing.traffic.alerts {
        println!("Traffic: {} [{:?}] {}", alert.location, alert.severity, alert.description);
    }
}
