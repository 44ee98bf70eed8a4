mod location;
mod route;
mod stop;
mod vehicle;

pub use location::Coordinates;
pub use route::{Route, RouteData};
pub use stop::Stop;
pub use vehicle::Vehicle;
