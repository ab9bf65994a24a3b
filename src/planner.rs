use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    Result, RoadhogError,
    flow::FlowExecutor,
    flows::{
        RouteRequest,
        traffic::{self, TrafficInfo},
        weather::{self, WeatherInfo},
    },
    route::{Route, RouteResolver},
};

/// Everything the trip view shows for one route.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RouteBriefing {
    pub route: Route,
    pub weather: WeatherInfo,
    pub traffic: TrafficInfo,
}

/// Combines the route resolver with the weather and traffic flows.
#[derive(Clone)]
pub struct TripPlanner {
    executor: FlowExecutor,
    resolver: Arc<dyn RouteResolver>,
}

impl TripPlanner {
    pub fn new(
        executor: FlowExecutor,
        resolver: Arc<dyn RouteResolver>,
    ) -> Self {
        Self {
            executor,
            resolver,
        }
    }

    pub fn executor(&self) -> &FlowExecutor {
        &self.executor
    }

    /// Resolves the route, then asks for weather and traffic at the same time.
    ///
    /// Fails if any of the three fails; the first error in the order route,
    /// weather, traffic is returned.
    pub async fn route_briefing(
        &self,
        request: &RouteRequest,
    ) -> Result<RouteBriefing> {
        if request.origin.trim().is_empty() || request.destination.trim().is_empty() {
            return Err(RoadhogError::Route("origin and destination are required".to_string()));
        }

        let route = self.resolver.route(&request.origin, &request.destination, &request.waypoints).await?;
        debug!(legs = route.legs.len(), meters = route.distance_meters(), "route resolved");

        let (weather, traffic) = tokio::join!(
            weather::get_weather_for_route(&self.executor, request),
            traffic::get_traffic_for_route(&self.executor, request),
        );
        let briefing = RouteBriefing {
            route,
            weather: weather?,
            traffic: traffic?,
        };

        info!(
            origin = %request.origin,
            destination = %request.destination,
            alerts = briefing.traffic.alerts.len(),
            "route briefing ready"
        );
        Ok(briefing)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        backend::MockBackend,
        flows::testing,
        route::StaticRouteResolver,
    };

    fn resolver() -> Arc<StaticRouteResolver> {
        Arc::new(
            StaticRouteResolver::new()
                .place("Denver, CO", 39.7392, -104.9903)
                .place("Vail, CO", 39.6403, -106.3742)
                .place("Moab, UT", 38.5733, -109.5498),
        )
    }

    fn weather_answer() -> serde_json::Value {
        json!({"overallSummary": "Sunny", "conditions": [{"location": "Vail, CO", "temperature": 55, "condition": "Clear", "icon": "Sun"}]})
    }

    fn traffic_answer() -> serde_json::Value {
        json!({"alerts": [{"location": "I-70", "severity": "medium", "description": "Construction", "type": "construction"}]})
    }

    fn backend(
        weather_answer: serde_json::Value,
        traffic_answer: serde_json::Value,
    ) -> Arc<MockBackend> {
        Arc::new(MockBackend::new().respond_to(weather::NAME, weather_answer).respond_to(traffic::NAME, traffic_answer))
    }

    #[tokio::test]
    async fn test_route_briefing() {
        let backend = backend(weather_answer(), traffic_answer());
        let planner = TripPlanner::new(testing::executor(backend.clone()), resolver());

        let request = RouteRequest::new("Denver, CO", "Moab, UT").via("Vail, CO");
        let briefing = planner.route_briefing(&request).await.unwrap();

        assert_eq!(briefing.route.legs.len(), 2);
        assert_eq!(briefing.weather.overall_summary, "Sunny");
        assert_eq!(briefing.traffic.alerts[0].alert_type, traffic::AlertType::Construction);
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_unknown_place_skips_backend() {
        let mock = Arc::new(MockBackend::new());
        let planner = TripPlanner::new(testing::executor(mock.clone()), resolver());

        let err = planner.route_briefing(&RouteRequest::new("Denver, CO", "Atlantis")).await.unwrap_err();
        assert!(matches!(err, RoadhogError::Route(_)));
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_origin() {
        let mock = Arc::new(MockBackend::new());
        let planner = TripPlanner::new(testing::executor(mock.clone()), resolver());
        let err = planner.route_briefing(&RouteRequest::new(" ", "Moab, UT")).await.unwrap_err();
        assert!(matches!(err, RoadhogError::Route(_)));
    }

    #[tokio::test]
    async fn test_flow_failure_fails_briefing() {
        let planner = TripPlanner::new(testing::executor(backend(weather_answer(), json!({"alerts": "not-a-list"}))), resolver());

        let err = planner.route_briefing(&RouteRequest::new("Denver, CO", "Moab, UT")).await.unwrap_err();
        match err {
            RoadhogError::OutputContract {
                flow,
                ..
            } => assert_eq!(flow, traffic::NAME),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
