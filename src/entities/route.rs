use serde::{Deserialize, Serialize};

use crate::entities::{Coordinates, Stop};

/// A candidate route as the backend reports it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RouteData {
    #[serde(rename = "route_id")]
    pub id: i64,
    #[serde(rename = "route_name")]
    pub name: String,
    pub stops: Vec<Stop>,
}

/// A fully assembled route, ready to draw. Built fresh on every
/// discovery run and never persisted. An empty `path` means no line to
/// draw, not a failed route.
#[derive(Clone, Debug)]
pub struct Route {
    pub id: i64,
    pub name: String,
    pub color: &'static str,
    pub stops: Vec<Stop>,
    pub path: Vec<Coordinates>,
}
