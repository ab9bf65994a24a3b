//! Route resolution boundary.
//!
//! Geocoding and routing belong to the map provider. The planner only sees the
//! [`RouteResolver`] capability, which is passed in explicitly.

mod r#static;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

pub use r#static::StaticRouteResolver;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(
        lat: f64,
        lng: f64,
    ) -> Self {
        Self {
            lat,
            lng,
        }
    }
}

/// A named place and its coordinates.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Place {
    pub name: String,
    pub point: GeoPoint,
}

/// One segment between two consecutive places.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouteLeg {
    pub from: Place,
    pub to: Place,
    pub distance_meters: f64,
    pub duration_secs: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Route {
    pub legs: Vec<RouteLeg>,
}

impl Route {
    pub fn distance_meters(&self) -> f64 {
        self.legs.iter().map(|leg| leg.distance_meters).sum()
    }

    pub fn duration_secs(&self) -> u64 {
        self.legs.iter().map(|leg| leg.duration_secs).sum()
    }

    /// Every place on the route in travel order.
    pub fn places(&self) -> Vec<&Place> {
        let mut places: Vec<&Place> = self.legs.iter().map(|leg| &leg.from).collect();
        if let Some(last) = self.legs.last() {
            places.push(&last.to);
        }
        places
    }
}

#[async_trait]
pub trait RouteResolver: Send + Sync {
    /// Resolves an address or place name to coordinates.
    async fn geocode(
        &self,
        address: &str,
    ) -> Result<Place>;

    /// Computes the route from `origin` through `waypoints` to `destination`.
    async fn route(
        &self,
        origin: &str,
        destination: &str,
        waypoints: &[String],
    ) -> Result<Route>;
}
