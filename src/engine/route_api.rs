use super::{Engine, Envelope};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::{
    api::{NearbyOutcome, RouteAPI},
    entities::{Coordinates, RouteData, Stop},
    error::{invalid_input_error, upstream_error, Error},
};

#[derive(Debug, Deserialize)]
struct RouteDetail {
    stops: Vec<Stop>,
}

#[async_trait]
impl RouteAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn find_nearby_routes(&self, origin: Coordinates) -> Result<NearbyOutcome, Error> {
        let url = format!("{}/routes/nearby", self.base_url);

        let res = self
            .request(self.http.post(url))
            .json(&json!({ "lat": origin.latitude, "lon": origin.longitude }))
            .send()
            .await?;

        let status_code = res.status().as_u16();

        // a declared-empty result, distinct from any error
        if status_code == 204 {
            return Ok(NearbyOutcome::NoneNearby);
        }

        if status_code >= 400 && status_code < 500 {
            return Err(invalid_input_error());
        } else if status_code != 200 {
            return Err(upstream_error());
        }

        let body: Envelope<Vec<RouteData>> = res.json().await?;

        if !body.success {
            return Err(upstream_error());
        }

        Ok(NearbyOutcome::Found(
            body.data.ok_or_else(|| upstream_error())?,
        ))
    }

    #[tracing::instrument(skip(self))]
    async fn find_route_stops(&self, route_id: i64) -> Result<Vec<Stop>, Error> {
        let url = format!("{}/routes/get-route/{}", self.base_url, route_id);

        let res = self.request(self.http.get(url)).send().await?;

        let status_code = res.status().as_u16();

        if status_code >= 400 && status_code < 500 {
            return Err(invalid_input_error());
        } else if status_code != 200 {
            return Err(upstream_error());
        }

        let body: Envelope<RouteDetail> = res.json().await?;

        if !body.success {
            return Err(upstream_error());
        }

        Ok(body.data.ok_or_else(|| upstream_error())?.stops)
    }
}
