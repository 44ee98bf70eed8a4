use serde::{Deserialize, Serialize};
use std::env;

use crate::{
    entities::Coordinates,
    error::{invalid_input_error, upstream_error, Error},
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DirectionsRoute {
    pub overview_polyline: OverviewPolyline,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OverviewPolyline {
    pub points: String,
}

#[derive(Clone, Debug, Deserialize)]
struct Response {
    routes: Vec<DirectionsRoute>,
}

/// Asks the directions API for a street-following route through the
/// given points, in the given order. Zero candidate routes is a valid
/// answer (None), not an error.
#[tracing::instrument]
pub async fn find_route_polyline(
    origin: Coordinates,
    destination: Coordinates,
    waypoints: &[Coordinates],
) -> Result<Option<String>, Error> {
    let api_base = env::var("GOOGLE_MAPS_API_BASE")?;
    let url = format!("https://{}/maps/api/directions/json", api_base);
    let key = env::var("GOOGLE_MAPS_API_KEY")?;

    let origin: String = origin.into();
    let destination: String = destination.into();

    let mut request = reqwest::Client::new()
        .get(url)
        .query(&[("key", key)])
        .query(&[("origin", origin)])
        .query(&[("destination", destination)]);

    if !waypoints.is_empty() {
        let joined = waypoints
            .iter()
            .map(|waypoint| String::from(*waypoint))
            .collect::<Vec<_>>()
            .join("|");

        request = request.query(&[("waypoints", format!("optimize:false|{}", joined))]);
    }

    let res = request.send().await?;

    let status_code = res.status().as_u16();

    if status_code >= 400 && status_code < 500 {
        return Err(invalid_input_error());
    } else if status_code != 200 {
        return Err(upstream_error());
    }

    let data: Response = res.json().await?;

    Ok(data
        .routes
        .into_iter()
        .next()
        .map(|route| route.overview_polyline.points))
}
