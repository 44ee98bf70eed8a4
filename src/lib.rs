pub mod api;
pub mod discovery;
pub mod engine;
pub mod entities;
pub mod error;
pub mod external;
pub mod geometry;
pub mod notify;
pub mod polyline;
pub mod tracking;
pub mod view;
