//! Stable application-wide constants.
//!
//! Values here are protocol defaults, estimator coefficients, and fallbacks
//! for env-var-based configuration. See [`Config`](crate::config::Config) for
//! the knobs that can be changed at runtime.

// --- Backend defaults (used when env vars are absent) ---

/// Default backend origin. `/api` is appended by the config loader.
pub const DEFAULT_API_URL: &str = "http://10.0.2.2:5000";
/// Default HTTP request timeout (milliseconds). Overridden by `REQUEST_TIMEOUT_MS`.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;
/// Default country filter for place search. Overridden by `DEFAULT_COUNTRY`.
pub const DEFAULT_COUNTRY: &str = "co";

// --- Cache ---

/// Response cache TTL: 5 minutes. Overridden by `MAP_CACHE_TTL`.
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

// --- Local storage ---

pub const DEFAULT_STORAGE_DIR: &str = ".fleetmap";
pub const DEFAULT_STORAGE_PREFIX: &str = "fleetmap_";

// --- Query limits ---

/// Shortest query sent to `/map/search`.
pub const MIN_SEARCH_QUERY_CHARS: usize = 2;
/// Shortest query accepted by address autocomplete.
pub const MIN_ADDRESS_QUERY_CHARS: usize = 3;
pub const DEFAULT_SEARCH_LIMIT: u32 = 5;
pub const DEFAULT_REVERSE_ZOOM: u8 = 18;
pub const DEFAULT_NEARBY_RADIUS_METERS: u32 = 1_000;
/// Places kept per category in the popular-places summary.
pub const POPULAR_PLACES_PER_CATEGORY: usize = 3;
/// Capacity of the recent searches list.
pub const RECENT_SEARCHES_CAPACITY: usize = 5;

// --- Distance estimator ---

/// Mean Earth radius used by the Haversine estimator.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;
/// Assumed average speed for fallback ETAs.
pub const FALLBACK_AVERAGE_SPEED_KMH: f64 = 50.0;

// --- Bus simulation ---

/// Default tick interval of the position simulator. Overridden by `SIMULATION_INTERVAL_MS`.
pub const DEFAULT_SIMULATION_INTERVAL_MS: u64 = 5_000;
/// Maximum lateral jitter applied to simulated positions, in degrees (~5 m).
pub const SIMULATION_JITTER_DEGREES: f64 = 0.000_05;
