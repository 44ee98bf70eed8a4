use std::sync::Arc;

use omnibus::discovery::{NearbyRoutes, RouteFinder};
use omnibus::engine::Engine;
use omnibus::entities::Coordinates;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let engine = Arc::new(Engine::from_env().unwrap());
    let finder = RouteFinder::new(engine);

    let origin = Coordinates {
        latitude: 20.17,
        longitude: -98.05,
    };

    match finder.find_nearby(origin).await {
        Ok(NearbyRoutes::NoneNearby) => println!("no routes near you"),
        Ok(NearbyRoutes::Found(routes)) => {
            for route in routes {
                println!(
                    "{} ({}): {} stops, {} path points",
                    route.name,
                    route.color,
                    route.stops.len(),
                    route.path.len()
                );
            }
        }
        Err(err) => eprintln!("route discovery failed: {:?}", err),
    }
}
