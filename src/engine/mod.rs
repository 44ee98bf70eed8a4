mod directions_api;
mod notification_api;
mod route_api;
mod vehicle_api;

use serde::Deserialize;
use std::env;

use crate::{api::API, error::Error};

/// Response envelope used by every backend endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub success: bool,
    pub data: Option<T>,
}

pub struct Engine {
    http: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl Engine {
    pub fn new(base_url: String, auth_token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            auth_token,
        }
    }

    /// Reads TRANSIT_API_BASE and, if present, TRANSIT_API_TOKEN.
    pub fn from_env() -> Result<Self, Error> {
        let base_url = env::var("TRANSIT_API_BASE")?;
        let auth_token = env::var("TRANSIT_API_TOKEN").ok();

        Ok(Self::new(base_url, auth_token))
    }

    /// Attaches the auth header to requests that have a token to carry.
    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth_token {
            Some(token) => builder.header("x-access-token", token),
            None => builder,
        }
    }
}

impl API for Engine {}

#[test]
fn envelope_parses_backend_shape() {
    use crate::entities::RouteData;

    let body = r#"{
        "success": true,
        "data": [{
            "route_id": 3,
            "route_name": "Ruta 3",
            "stops": [
                {"id": 1, "sequence": 1, "latitude": 20.17, "longitude": -98.05},
                {"id": 2, "sequence": 2, "latitude": 20.18, "longitude": -98.06, "arrival_time": "2024-11-02T14:30:00Z"}
            ]
        }]
    }"#;

    let envelope: Envelope<Vec<RouteData>> = serde_json::from_str(body).unwrap();
    assert!(envelope.success);

    let routes = envelope.data.unwrap();
    assert_eq!(routes[0].id, 3);
    assert_eq!(routes[0].stops.len(), 2);
    assert!(routes[0].stops[0].arrival_time.is_none());
    assert!(routes[0].stops[1].arrival_time.is_some());
}
