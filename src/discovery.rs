use std::sync::Arc;

use futures::future::join_all;

use crate::api::{DirectionsAPI, NearbyOutcome, RouteAPI};
use crate::entities::{Coordinates, Route, RouteData};
use crate::error::Error;
use crate::geometry::RouteGeometry;

/// Display colors assigned to discovered routes by result order, so a
/// re-run over the same results paints the same colors.
pub const PALETTE: [&str; 6] = [
    "#6200ee", "#03dac6", "#d32f2f", "#f57c00", "#388e3c", "#1976d2",
];

/// What a discovery run hands to the view: either a typed empty state
/// or the fully assembled route list.
#[derive(Debug)]
pub enum NearbyRoutes {
    NoneNearby,
    Found(Vec<Route>),
}

pub struct RouteFinder<A> {
    api: Arc<A>,
    geometry: RouteGeometry<A>,
}

impl<A> RouteFinder<A>
where
    A: RouteAPI + DirectionsAPI + Send + Sync,
{
    pub fn new(api: Arc<A>) -> Self {
        let geometry = RouteGeometry::new(api.clone());

        Self { api, geometry }
    }

    /// Discovers routes near the origin and attaches a color and a
    /// street-following path to each. Geometry is fetched concurrently
    /// per route and the list is assembled in full before it is
    /// returned; a failed geometry fetch leaves only that route's path
    /// empty.
    #[tracing::instrument(skip(self))]
    pub async fn find_nearby(&self, origin: Coordinates) -> Result<NearbyRoutes, Error> {
        let candidates = match self.api.find_nearby_routes(origin).await? {
            NearbyOutcome::NoneNearby => {
                tracing::info!("no routes near origin");
                return Ok(NearbyRoutes::NoneNearby);
            }
            NearbyOutcome::Found(candidates) => candidates,
        };

        let assembled = join_all(
            candidates
                .into_iter()
                .enumerate()
                .map(|(index, data)| self.assemble(index, data)),
        )
        .await;

        Ok(NearbyRoutes::Found(assembled))
    }

    async fn assemble(&self, index: usize, data: RouteData) -> Route {
        let path = self.geometry.street_path(&data.stops).await;

        Route {
            id: data.id,
            name: data.name,
            color: PALETTE[index % PALETTE.len()],
            stops: data.stops,
            path,
        }
    }
}

#[cfg(test)]
#[derive(Default)]
struct StubApi {
    candidates: Vec<RouteData>,
    none_nearby: bool,
    fail_discovery: bool,
    // origin latitude whose geometry request errors out
    fail_polyline_for: Option<f64>,
}

#[cfg(test)]
#[async_trait::async_trait]
impl RouteAPI for StubApi {
    async fn find_nearby_routes(&self, _origin: Coordinates) -> Result<NearbyOutcome, Error> {
        if self.fail_discovery {
            return Err(crate::error::upstream_error());
        }

        if self.none_nearby {
            return Ok(NearbyOutcome::NoneNearby);
        }

        Ok(NearbyOutcome::Found(self.candidates.clone()))
    }

    async fn find_route_stops(&self, _route_id: i64) -> Result<Vec<crate::entities::Stop>, Error> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl DirectionsAPI for StubApi {
    async fn route_polyline(
        &self,
        origin: Coordinates,
        _destination: Coordinates,
        _waypoints: &[Coordinates],
    ) -> Result<Option<String>, Error> {
        if self.fail_polyline_for == Some(origin.latitude) {
            return Err(crate::error::upstream_error());
        }

        Ok(Some("_p~iF~ps|U_ulLnnqC".into()))
    }
}

#[cfg(test)]
fn candidate(id: i64, first_stop_latitude: f64) -> RouteData {
    use crate::entities::Stop;

    let stop = |stop_id: i64, sequence: u32, latitude: f64| Stop {
        id: stop_id,
        sequence,
        latitude,
        longitude: -98.05,
        arrival_time: None,
    };

    RouteData {
        id,
        name: format!("Ruta {}", id),
        stops: vec![
            stop(id * 10, 1, first_stop_latitude),
            stop(id * 10 + 1, 2, first_stop_latitude + 0.01),
        ],
    }
}

#[test]
fn assigns_colors_by_result_order() {
    use tokio_test::block_on;

    let api = Arc::new(StubApi {
        candidates: vec![candidate(1, 10.0), candidate(2, 11.0), candidate(3, 12.0)],
        ..Default::default()
    });
    let finder = RouteFinder::new(api);

    let origin = Coordinates {
        latitude: 20.17,
        longitude: -98.05,
    };

    let outcome = block_on(finder.find_nearby(origin)).unwrap();
    let routes = match outcome {
        NearbyRoutes::Found(routes) => routes,
        NearbyRoutes::NoneNearby => panic!("expected routes"),
    };

    assert_eq!(routes.len(), 3);
    assert_eq!(routes[0].color, PALETTE[0]);
    assert_eq!(routes[1].color, PALETTE[1]);
    assert_eq!(routes[2].color, PALETTE[2]);
}

#[test]
fn isolates_per_route_geometry_failures() {
    use tokio_test::block_on;

    // the middle route's geometry request fails
    let api = Arc::new(StubApi {
        candidates: vec![candidate(1, 10.0), candidate(2, 11.0), candidate(3, 12.0)],
        fail_polyline_for: Some(11.0),
        ..Default::default()
    });
    let finder = RouteFinder::new(api);

    let origin = Coordinates {
        latitude: 20.17,
        longitude: -98.05,
    };

    let outcome = block_on(finder.find_nearby(origin)).unwrap();
    let routes = match outcome {
        NearbyRoutes::Found(routes) => routes,
        NearbyRoutes::NoneNearby => panic!("expected routes"),
    };

    assert_eq!(routes.len(), 3);
    assert!(!routes[0].path.is_empty());
    assert!(routes[1].path.is_empty());
    assert!(!routes[2].path.is_empty());
}

#[test]
fn no_content_is_not_an_error() {
    use tokio_test::block_on;

    let api = Arc::new(StubApi {
        none_nearby: true,
        ..Default::default()
    });
    let finder = RouteFinder::new(api);

    let origin = Coordinates {
        latitude: 20.17,
        longitude: -98.05,
    };

    let outcome = block_on(finder.find_nearby(origin)).unwrap();
    assert!(matches!(outcome, NearbyRoutes::NoneNearby));
}

#[test]
fn discovery_transport_error_propagates() {
    use tokio_test::block_on;

    let api = Arc::new(StubApi {
        fail_discovery: true,
        ..Default::default()
    });
    let finder = RouteFinder::new(api);

    let origin = Coordinates {
        latitude: 20.17,
        longitude: -98.05,
    };

    assert!(block_on(finder.find_nearby(origin)).is_err());
}
