use crate::constants::*;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Backend API root, including the `/api` suffix.
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub cache_ttl: Duration,
    /// Optional upper bound on cached responses; unbounded when absent.
    pub cache_max_entries: Option<u64>,
    pub default_country: String,
    pub storage_dir: PathBuf,
    pub storage_prefix: String,
    pub simulation_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: api_root(DEFAULT_API_URL),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS),
            cache_max_entries: None,
            default_country: DEFAULT_COUNTRY.to_string(),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            storage_prefix: DEFAULT_STORAGE_PREFIX.to_string(),
            simulation_interval: Duration::from_millis(DEFAULT_SIMULATION_INTERVAL_MS),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();

        let request_timeout_ms: u64 = env::var("REQUEST_TIMEOUT_MS")
            .unwrap_or_else(|_| DEFAULT_REQUEST_TIMEOUT_MS.to_string())
            .parse()
            .map_err(|_| "Invalid REQUEST_TIMEOUT_MS")?;
        if request_timeout_ms == 0 {
            return Err("REQUEST_TIMEOUT_MS must be greater than 0".to_string());
        }

        let cache_ttl_secs: u64 = env::var("MAP_CACHE_TTL")
            .unwrap_or_else(|_| DEFAULT_CACHE_TTL_SECONDS.to_string())
            .parse()
            .map_err(|_| "Invalid MAP_CACHE_TTL")?;
        if cache_ttl_secs == 0 {
            return Err("MAP_CACHE_TTL must be greater than 0".to_string());
        }

        let cache_max_entries = match env::var("MAP_CACHE_MAX_ENTRIES") {
            Ok(raw) => Some(
                raw.parse::<u64>()
                    .map_err(|_| "Invalid MAP_CACHE_MAX_ENTRIES")?,
            ),
            Err(_) => None,
        };

        let simulation_interval_ms: u64 = env::var("SIMULATION_INTERVAL_MS")
            .unwrap_or_else(|_| DEFAULT_SIMULATION_INTERVAL_MS.to_string())
            .parse()
            .map_err(|_| "Invalid SIMULATION_INTERVAL_MS")?;
        if simulation_interval_ms == 0 {
            return Err("SIMULATION_INTERVAL_MS must be greater than 0".to_string());
        }

        Ok(Config {
            api_base_url: api_root(
                &env::var("FLEETMAP_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            ),
            request_timeout: Duration::from_millis(request_timeout_ms),
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            cache_max_entries,
            default_country: env::var("DEFAULT_COUNTRY")
                .unwrap_or_else(|_| DEFAULT_COUNTRY.to_string()),
            storage_dir: PathBuf::from(
                env::var("STORAGE_DIR").unwrap_or_else(|_| DEFAULT_STORAGE_DIR.to_string()),
            ),
            storage_prefix: env::var("STORAGE_PREFIX")
                .unwrap_or_else(|_| DEFAULT_STORAGE_PREFIX.to_string()),
            simulation_interval: Duration::from_millis(simulation_interval_ms),
        })
    }
}

fn api_root(origin: &str) -> String {
    let trimmed = origin.trim_end_matches('/');
    if trimmed.ends_with("/api") {
        trimmed.to_string()
    } else {
        format!("{}/api", trimmed)
    }
}
