//! The RoadHog flows.
//!
//! Each submodule declares the typed input and output of one flow, its
//! schemas, its prompt, a [`TypedFlow`](crate::flow::TypedFlow) handle and an
//! async convenience function. [`register_builtin`] adds all of them to a
//! registry builder.

pub mod destinations;
pub mod itinerary;
pub mod location;
pub mod poi;
pub mod preferences;
pub mod stops;
pub mod traffic;
pub mod weather;

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    flow::FlowRegistryBuilder,
    schema::{ObjectSchema, Schema},
};

/// Adds every built-in flow to `builder`.
pub fn register_builtin(builder: FlowRegistryBuilder) -> Result<FlowRegistryBuilder> {
    builder
        .define(itinerary::definition()?)?
        .define(weather::definition()?)?
        .define(traffic::definition()?)?
        .define(poi::summarize_reviews_definition()?)?
        .define(poi::alternative_definition()?)?
        .define(stops::definition()?)?
        .define(destinations::definition())?
        .define(location::definition())
}

/// Origin, destination and the stops in between.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RouteRequest {
    pub origin: String,
    pub destination: String,
    pub waypoints: Vec<String>,
}

impl RouteRequest {
    pub fn new(
        origin: &str,
        destination: &str,
    ) -> Self {
        Self {
            origin: origin.to_string(),
            destination: destination.to_string(),
            waypoints: Vec::new(),
        }
    }

    pub fn via(
        mut self,
        waypoint: &str,
    ) -> Self {
        self.waypoints.push(waypoint.to_string());
        self
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDetails {
    pub make: String,
    pub model: String,
    pub fuel_type: String,
    pub mpg: f64,
}

pub(crate) fn route_request_schema() -> Schema {
    ObjectSchema::new()
        .required("origin", Schema::string(), "The starting point of the road trip.")
        .required("destination", Schema::string(), "The final destination of the road trip.")
        .required("waypoints", Schema::array(Schema::string()), "Planned stops between origin and destination.")
        .into()
}

pub(crate) fn vehicle_details_schema() -> Schema {
    ObjectSchema::new()
        .describe("Details about the user's vehicle.")
        .required("make", Schema::string(), "The make of the vehicle.")
        .required("model", Schema::string(), "The model of the vehicle.")
        .required("fuelType", Schema::string(), "The fuel type of the vehicle.")
        .required("mpg", Schema::number(), "The fuel economy of the vehicle in miles per gallon.")
        .into()
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::flow::FlowRegistry;

    #[test]
    fn test_register_builtin() {
        let registry = register_builtin(FlowRegistry::builder()).unwrap().build();
        assert_eq!(
            registry.names(),
            vec![
                "findUserLocationFlow",
                "generatePersonalizedRoadTripItineraryFlow",
                "getTrafficForRouteFlow",
                "getWeatherForRouteFlow",
                "suggestAlternativePoiFlow",
                "suggestDestinationsFlow",
                "suggestStopsAlongRouteFlow",
                "summarizePoiReviewsFlow",
            ]
        );
    }

    #[test]
    fn test_route_request_serializes_to_schema() {
        let request = RouteRequest::new("Denver, CO", "Moab, UT").via("Grand Junction, CO");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value, json!({"origin": "Denver, CO", "destination": "Moab, UT", "waypoints": ["Grand Junction, CO"]}));
        assert!(crate::schema::validate(&route_request_schema(), &value).is_ok());
    }
}
