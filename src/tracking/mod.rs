mod connection;
mod manager;
mod state;

pub use connection::{Connection, Connector};
pub use manager::SubscriptionManager;
pub use state::{transition, Effect, Event, WatchState};
