use crate::entities::{Coordinates, Route, Stop, Vehicle};

/// Everything the map screen renders, mutated only through `apply`.
/// Keeps the subsystems above testable without any rendering.
#[derive(Debug, Default)]
pub struct MapViewModel {
    pub routes: Vec<Route>,
    pub notice: Option<String>,
    pub vehicles: Vec<Vehicle>,
    pub selected_stop: Option<Stop>,
    pub vehicle_fix: Option<Coordinates>,
    pub awaiting_fix: bool,
    generation: u64,
}

#[derive(Debug)]
pub enum ViewUpdate {
    RoutesLoaded { generation: u64, routes: Vec<Route> },
    NoRoutesNearby { generation: u64 },
    SearchFailed { generation: u64, message: String },
    VehiclesLoaded(Vec<Vehicle>),
    StopSelected(Stop),
    WatchStarted,
    VehicleFix(Coordinates),
    WatchEnded,
}

impl MapViewModel {
    /// Marks the start of a new search. Results carrying an older
    /// generation are discarded by `apply`, so late arrivals from a
    /// superseded search can never clobber the current screen.
    pub fn begin_search(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn apply(&mut self, update: ViewUpdate) {
        match update {
            ViewUpdate::RoutesLoaded { generation, routes } => {
                if generation != self.generation {
                    return;
                }
                self.routes = routes;
                self.notice = None;
            }
            ViewUpdate::NoRoutesNearby { generation } => {
                if generation != self.generation {
                    return;
                }
                self.routes = Vec::new();
                self.notice = Some("No routes near you".into());
            }
            ViewUpdate::SearchFailed {
                generation,
                message,
            } => {
                if generation != self.generation {
                    return;
                }
                self.routes = Vec::new();
                self.notice = Some(message);
            }
            ViewUpdate::VehiclesLoaded(vehicles) => {
                self.vehicles = vehicles;
            }
            ViewUpdate::StopSelected(stop) => {
                self.selected_stop = Some(stop);
            }
            ViewUpdate::WatchStarted => {
                self.awaiting_fix = true;
                self.vehicle_fix = None;
            }
            ViewUpdate::VehicleFix(fix) => {
                self.awaiting_fix = false;
                self.vehicle_fix = Some(fix);
            }
            ViewUpdate::WatchEnded => {
                self.awaiting_fix = false;
                self.vehicle_fix = None;
            }
        }
    }
}

#[cfg(test)]
fn sample_route(id: i64) -> Route {
    Route {
        id,
        name: format!("Ruta {}", id),
        color: "#6200ee",
        stops: Vec::new(),
        path: Vec::new(),
    }
}

#[test]
fn no_content_renders_empty_state() {
    let mut view = MapViewModel::default();

    let generation = view.begin_search();
    view.apply(ViewUpdate::NoRoutesNearby { generation });

    assert!(view.routes.is_empty());
    assert_eq!(view.notice.as_deref(), Some("No routes near you"));
}

#[test]
fn superseded_search_results_are_discarded() {
    let mut view = MapViewModel::default();

    let stale = view.begin_search();
    let current = view.begin_search();

    view.apply(ViewUpdate::RoutesLoaded {
        generation: current,
        routes: vec![sample_route(1)],
    });
    // late arrival from the abandoned search
    view.apply(ViewUpdate::RoutesLoaded {
        generation: stale,
        routes: vec![sample_route(2), sample_route(3)],
    });

    assert_eq!(view.routes.len(), 1);
    assert_eq!(view.routes[0].id, 1);
}

#[test]
fn fresh_results_clear_an_earlier_notice() {
    let mut view = MapViewModel::default();

    let generation = view.begin_search();
    view.apply(ViewUpdate::NoRoutesNearby { generation });

    let generation = view.begin_search();
    view.apply(ViewUpdate::RoutesLoaded {
        generation,
        routes: vec![sample_route(1)],
    });

    assert!(view.notice.is_none());
    assert_eq!(view.routes.len(), 1);
}

#[test]
fn watch_lifecycle_updates() {
    let mut view = MapViewModel::default();

    view.apply(ViewUpdate::WatchStarted);
    assert!(view.awaiting_fix);
    assert!(view.vehicle_fix.is_none());

    view.apply(ViewUpdate::VehicleFix(Coordinates {
        latitude: 20.17,
        longitude: -98.05,
    }));
    assert!(!view.awaiting_fix);
    assert!(view.vehicle_fix.is_some());

    view.apply(ViewUpdate::WatchEnded);
    assert!(view.vehicle_fix.is_none());
}
