use std::collections::HashMap;

use async_trait::async_trait;
use tracing::trace;

use crate::{
    Result, RoadhogError,
    route::{GeoPoint, Place, Route, RouteLeg, RouteResolver},
};

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// In-memory resolver over a fixed set of known places.
///
/// Legs are great-circle distances driven at a constant average speed, which
/// is enough for tests and offline demos.
#[derive(Debug, Clone)]
pub struct StaticRouteResolver {
    places: HashMap<String, GeoPoint>,
    speed_mps: f64,
}

impl Default for StaticRouteResolver {
    fn default() -> Self {
        Self {
            places: HashMap::new(),
            // ~60 mph
            speed_mps: 26.8,
        }
    }
}

impl StaticRouteResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place(
        mut self,
        name: &str,
        lat: f64,
        lng: f64,
    ) -> Self {
        self.places.insert(key(name), GeoPoint::new(lat, lng));
        self
    }

    /// Average driving speed in meters per second.
    pub fn speed(
        mut self,
        speed_mps: f64,
    ) -> Self {
        self.speed_mps = speed_mps;
        self
    }

    fn lookup(
        &self,
        name: &str,
    ) -> Result<Place> {
        self.places
            .get(&key(name))
            .map(|point| Place {
                name: name.trim().to_string(),
                point: *point,
            })
            .ok_or_else(|| RoadhogError::Route(format!("unknown place '{}'", name)))
    }
}

fn key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Haversine distance in meters.
fn distance(
    a: GeoPoint,
    b: GeoPoint,
) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = lat2 - lat1;
    let dlng = (b.lng - a.lng).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

#[async_trait]
impl RouteResolver for StaticRouteResolver {
    async fn geocode(
        &self,
        address: &str,
    ) -> Result<Place> {
        self.lookup(address)
    }

    async fn route(
        &self,
        origin: &str,
        destination: &str,
        waypoints: &[String],
    ) -> Result<Route> {
        if self.speed_mps <= 0.0 {
            return Err(RoadhogError::Route("average speed must be positive".to_string()));
        }

        let mut stops = Vec::with_capacity(waypoints.len() + 2);
        stops.push(self.lookup(origin)?);
        for waypoint in waypoints {
            stops.push(self.lookup(waypoint)?);
        }
        stops.push(self.lookup(destination)?);

        let legs = stops
            .windows(2)
            .map(|pair| {
                let distance_meters = distance(pair[0].point, pair[1].point);
                RouteLeg {
                    from: pair[0].clone(),
                    to: pair[1].clone(),
                    distance_meters,
                    duration_secs: (distance_meters / self.speed_mps).round() as u64,
                }
            })
            .collect::<Vec<_>>();

        trace!(origin, destination, legs = legs.len(), "route resolved");
        Ok(Route {
            legs,
        })
    }
}
