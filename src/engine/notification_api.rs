use super::{Engine, Envelope};

use async_trait::async_trait;
use serde_json::json;

use crate::{
    api::{NotificationAPI, OptInOutcome},
    error::{invalid_input_error, upstream_error, Error},
};

#[async_trait]
impl NotificationAPI for Engine {
    #[tracing::instrument(skip(self, push_token))]
    async fn create_opt_in(
        &self,
        vehicle_id: &str,
        push_token: &str,
    ) -> Result<OptInOutcome, Error> {
        let url = format!("{}/notifications", self.base_url);

        let res = self
            .request(self.http.post(url))
            .json(&json!({ "vehicleId": vehicle_id, "pushToken": push_token }))
            .send()
            .await?;

        match res.status().as_u16() {
            200 | 201 => Ok(OptInOutcome::Created),
            // an existing record is an expected outcome, not an error
            409 => Ok(OptInOutcome::AlreadyExists),
            code if code >= 400 && code < 500 => Err(invalid_input_error()),
            _ => Err(upstream_error()),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn set_opt_in_active(&self, vehicle_id: &str, active: bool) -> Result<(), Error> {
        let url = format!("{}/notifications", self.base_url);
        let status_active = if active { "yes" } else { "no" };

        let res = self
            .request(self.http.put(url))
            .json(&json!({ "vehicleId": vehicle_id, "status_active": status_active }))
            .send()
            .await?;

        let status_code = res.status().as_u16();

        if status_code >= 400 && status_code < 500 {
            return Err(invalid_input_error());
        } else if status_code != 200 {
            return Err(upstream_error());
        }

        let body: Envelope<serde_json::Value> = res.json().await?;

        if !body.success {
            return Err(upstream_error());
        }

        Ok(())
    }
}
