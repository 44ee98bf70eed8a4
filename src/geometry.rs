use std::sync::Arc;

use crate::api::DirectionsAPI;
use crate::entities::{Coordinates, Stop};
use crate::polyline;

/// Turns an ordered list of stops into a street-following path.
pub struct RouteGeometry<D> {
    directions: Arc<D>,
}

impl<D> RouteGeometry<D>
where
    D: DirectionsAPI + Send + Sync,
{
    pub fn new(directions: Arc<D>) -> Self {
        Self { directions }
    }

    /// Street-following path through the stops, in stop order: first
    /// stop is the origin, last the destination, interior stops are
    /// ordered waypoints. Every failure degrades to an empty path; the
    /// caller simply draws no line.
    #[tracing::instrument(skip_all, fields(stops = stops.len()))]
    pub async fn street_path(&self, stops: &[Stop]) -> Vec<Coordinates> {
        if stops.len() < 2 {
            tracing::warn!("need at least two stops to trace a path");
            return Vec::new();
        }

        let origin = stops[0].coordinates();
        let destination = stops[stops.len() - 1].coordinates();
        let waypoints: Vec<Coordinates> = stops[1..stops.len() - 1]
            .iter()
            .map(|stop| stop.coordinates())
            .collect();

        match self
            .directions
            .route_polyline(origin, destination, &waypoints)
            .await
        {
            Ok(Some(points)) => polyline::decode(&points),
            Ok(None) => {
                tracing::warn!("directions service found no route");
                Vec::new()
            }
            Err(err) => {
                tracing::warn!(?err, "directions request failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
#[derive(Default)]
struct RecordingDirections {
    polyline: Option<String>,
    fail: bool,
    calls: std::sync::Mutex<Vec<(Coordinates, Coordinates, Vec<Coordinates>)>>,
}

#[cfg(test)]
#[async_trait::async_trait]
impl DirectionsAPI for RecordingDirections {
    async fn route_polyline(
        &self,
        origin: Coordinates,
        destination: Coordinates,
        waypoints: &[Coordinates],
    ) -> Result<Option<String>, crate::error::Error> {
        self.calls
            .lock()
            .unwrap()
            .push((origin, destination, waypoints.to_vec()));

        if self.fail {
            return Err(crate::error::upstream_error());
        }

        Ok(self.polyline.clone())
    }
}

#[cfg(test)]
fn stop_at(id: i64, sequence: u32, latitude: f64, longitude: f64) -> Stop {
    Stop {
        id,
        sequence,
        latitude,
        longitude,
        arrival_time: None,
    }
}

#[test]
fn fewer_than_two_stops_yields_empty_path() {
    use tokio_test::block_on;

    let directions = Arc::new(RecordingDirections {
        polyline: Some("_p~iF~ps|U_ulLnnqC".into()),
        ..Default::default()
    });
    let geometry = RouteGeometry::new(directions.clone());

    let path = block_on(geometry.street_path(&[stop_at(1, 1, 20.17, -98.05)]));

    assert!(path.is_empty());
    assert!(directions.calls.lock().unwrap().is_empty());
}

#[test]
fn waypoints_preserve_interior_stop_order() {
    use tokio_test::block_on;

    let directions = Arc::new(RecordingDirections {
        polyline: Some("_p~iF~ps|U_ulLnnqC".into()),
        ..Default::default()
    });
    let geometry = RouteGeometry::new(directions.clone());

    let stops = vec![
        stop_at(1, 1, 20.10, -98.01),
        stop_at(2, 2, 20.20, -98.02),
        stop_at(3, 3, 20.30, -98.03),
        stop_at(4, 4, 20.40, -98.04),
    ];

    let path = block_on(geometry.street_path(&stops));
    assert_eq!(path.len(), 2);

    let calls = directions.calls.lock().unwrap();
    let (origin, destination, waypoints) = &calls[0];

    assert_eq!(*origin, stops[0].coordinates());
    assert_eq!(*destination, stops[3].coordinates());
    assert_eq!(
        *waypoints,
        vec![stops[1].coordinates(), stops[2].coordinates()]
    );
}

#[test]
fn two_stops_send_no_waypoints() {
    use tokio_test::block_on;

    let directions = Arc::new(RecordingDirections {
        polyline: Some("_p~iF~ps|U_ulLnnqC".into()),
        ..Default::default()
    });
    let geometry = RouteGeometry::new(directions.clone());

    let stops = vec![stop_at(1, 1, 20.10, -98.01), stop_at(2, 2, 20.20, -98.02)];

    block_on(geometry.street_path(&stops));

    let calls = directions.calls.lock().unwrap();
    assert!(calls[0].2.is_empty());
}

#[test]
fn zero_candidate_routes_degrade_to_empty_path() {
    use tokio_test::block_on;

    let geometry = RouteGeometry::new(Arc::new(RecordingDirections::default()));

    let stops = vec![stop_at(1, 1, 20.10, -98.01), stop_at(2, 2, 20.20, -98.02)];
    assert!(block_on(geometry.street_path(&stops)).is_empty());
}

#[test]
fn transport_error_degrades_to_empty_path() {
    use tokio_test::block_on;

    let geometry = RouteGeometry::new(Arc::new(RecordingDirections {
        fail: true,
        ..Default::default()
    }));

    let stops = vec![stop_at(1, 1, 20.10, -98.01), stop_at(2, 2, 20.20, -98.02)];
    assert!(block_on(geometry.street_path(&stops)).is_empty());
}
