pub mod fallback;
pub mod inflight;
pub mod map_api;
pub mod map_data;
pub mod recent;
pub mod tracker;

pub use map_api::{MapApiClient, MapBackend};
pub use map_data::{MapDataService, SearchOptions};
pub use recent::RecentSearches;
pub use tracker::{BusPosition, BusSimulator, SimulationHandle};
