// Map data access layer for the fleet tracking client.

pub mod auth;
pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use error::{MapError, Result};
pub use models::{GeoPoint, MapOutcome, PlaceResult, RouteResult};
pub use services::{MapDataService, SearchOptions};
