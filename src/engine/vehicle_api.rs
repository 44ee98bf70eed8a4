use super::{Engine, Envelope};

use async_trait::async_trait;

use crate::{
    api::VehicleAPI,
    entities::Vehicle,
    error::{invalid_input_error, upstream_error, Error},
};

#[async_trait]
impl VehicleAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn list_vehicles(&self, route_id: i64) -> Result<Vec<Vehicle>, Error> {
        let url = format!("{}/routes/get-vehicles/{}", self.base_url, route_id);

        let res = self.request(self.http.get(url)).send().await?;

        let status_code = res.status().as_u16();

        // no vehicles assigned is an empty state, not an error
        if status_code == 204 {
            return Ok(Vec::new());
        }

        if status_code >= 400 && status_code < 500 {
            return Err(invalid_input_error());
        } else if status_code != 200 {
            return Err(upstream_error());
        }

        let body: Envelope<Vec<Vehicle>> = res.json().await?;

        if !body.success {
            return Err(upstream_error());
        }

        Ok(body.data.unwrap_or_default())
    }
}
