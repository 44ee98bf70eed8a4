use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::Coordinates;

/// A fixed point along a route; `sequence` defines path order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Stop {
    pub id: i64,
    pub sequence: u32,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub arrival_time: Option<DateTime<Utc>>,
}

impl Stop {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}
