use super::Engine;

use async_trait::async_trait;

use crate::{
    api::DirectionsAPI, entities::Coordinates, error::Error, external::google_maps,
};

#[async_trait]
impl DirectionsAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn route_polyline(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        waypoints: &[Coordinates],
    ) -> Result<Option<String>, Error> {
        google_maps::find_route_polyline(origin, destination, waypoints).await
    }
}
