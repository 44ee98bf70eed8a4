use async_trait::async_trait;
use std::sync::Arc;

use crate::entities::{Coordinates, RouteData, Stop, Vehicle};
use crate::error::Error;

/// Outcome of a nearby-route discovery call. A declared-empty result
/// is distinct from any error.
#[derive(Clone, Debug)]
pub enum NearbyOutcome {
    NoneNearby,
    Found(Vec<RouteData>),
}

/// Outcome of attempting to create an opt-in record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptInOutcome {
    Created,
    AlreadyExists,
}

#[async_trait]
pub trait RouteAPI {
    async fn find_nearby_routes(&self, origin: Coordinates) -> Result<NearbyOutcome, Error>;

    async fn find_route_stops(&self, route_id: i64) -> Result<Vec<Stop>, Error>;
}

#[async_trait]
pub trait VehicleAPI {
    async fn list_vehicles(&self, route_id: i64) -> Result<Vec<Vehicle>, Error>;
}

#[async_trait]
pub trait DirectionsAPI {
    /// Encoded overview polyline of the first candidate route, or None
    /// when the directions service finds no route at all.
    async fn route_polyline(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        waypoints: &[Coordinates],
    ) -> Result<Option<String>, Error>;
}

#[async_trait]
pub trait NotificationAPI {
    async fn create_opt_in(
        &self,
        vehicle_id: &str,
        push_token: &str,
    ) -> Result<OptInOutcome, Error>;

    async fn set_opt_in_active(&self, vehicle_id: &str, active: bool) -> Result<(), Error>;
}

pub trait API: RouteAPI + VehicleAPI + DirectionsAPI + NotificationAPI {}

pub type DynAPI = Arc<dyn API + Send + Sync>;
