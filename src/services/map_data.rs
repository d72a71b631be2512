use crate::auth::TokenStore;
use crate::cache::{CacheKey, CacheStats, MemoryResponseCache, ResponseCache};
use crate::config::Config;
use crate::constants::{
    DEFAULT_SEARCH_LIMIT, MIN_ADDRESS_QUERY_CHARS, MIN_SEARCH_QUERY_CHARS,
    POPULAR_PLACES_PER_CATEGORY,
};
use crate::error::{MapError, Result};
use crate::models::{
    is_valid, GeoPoint, MapHealth, MapOutcome, MapTypes, PlaceCategory, PlaceResult,
    PopularCategory, RouteResult, TravelProfile,
};
use crate::services::fallback::build_fallback_route;
use crate::services::inflight::InflightRequests;
use crate::services::map_api::{MapApiClient, MapBackend};
use futures::future::{join_all, FutureExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

/// Categories and radii queried by [`MapDataService::popular_places`].
static POPULAR_CATEGORIES: [(PlaceCategory, u32); 5] = [
    (PlaceCategory::Restaurant, 2_000),
    (PlaceCategory::Bank, 1_000),
    (PlaceCategory::Hospital, 5_000),
    (PlaceCategory::School, 2_000),
    (PlaceCategory::Pharmacy, 1_500),
];

const MAX_SEARCH_LIMIT: u32 = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub limit: u32,
    pub countrycodes: String,
}

impl SearchOptions {
    pub fn for_country(countrycodes: impl Into<String>) -> Self {
        SearchOptions {
            limit: DEFAULT_SEARCH_LIMIT,
            countrycodes: countrycodes.into(),
        }
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions::for_country(crate::constants::DEFAULT_COUNTRY)
    }
}

/// Map data access layer.
///
/// Every operation validates its input, then consults the response cache, then
/// joins or starts the remote call, and finally applies its own recovery
/// policy. Validation problems come back as `Err`; remote problems come back
/// as [`MapOutcome::Failure`] (or a fallback route for routing).
pub struct MapDataService {
    backend: Arc<dyn MapBackend>,
    cache: Arc<dyn ResponseCache>,
    inflight: InflightRequests,
    default_country: String,
}

impl MapDataService {
    pub fn new(backend: Arc<dyn MapBackend>, cache: Arc<dyn ResponseCache>) -> Self {
        MapDataService {
            backend,
            cache,
            inflight: InflightRequests::new(),
            default_country: crate::constants::DEFAULT_COUNTRY.to_string(),
        }
    }

    /// Wire the HTTP client and an in-memory cache from configuration.
    pub fn from_config(config: &Config, tokens: Option<Arc<dyn TokenStore>>) -> Result<Self> {
        let mut client = MapApiClient::new(config)?;
        if let Some(tokens) = tokens {
            client = client.with_token_store(tokens);
        }
        let cache = MemoryResponseCache::new(config.cache_ttl, config.cache_max_entries);

        let mut service = MapDataService::new(Arc::new(client), Arc::new(cache));
        service.default_country = config.default_country.clone();
        Ok(service)
    }

    /// Search options using the configured country filter.
    pub fn default_search_options(&self) -> SearchOptions {
        SearchOptions::for_country(self.default_country.clone())
    }

    pub async fn search_places(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<MapOutcome<Vec<PlaceResult>>> {
        self.search_with_minimum(query, options, MIN_SEARCH_QUERY_CHARS)
            .await
    }

    /// Address autocomplete: same endpoint as search with a longer minimum query.
    pub async fn search_addresses(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<MapOutcome<Vec<PlaceResult>>> {
        self.search_with_minimum(query, options, MIN_ADDRESS_QUERY_CHARS)
            .await
    }

    async fn search_with_minimum(
        &self,
        query: &str,
        options: &SearchOptions,
        min_chars: usize,
    ) -> Result<MapOutcome<Vec<PlaceResult>>> {
        let query = query.trim();
        if query.chars().count() < min_chars {
            tracing::debug!("Query '{}' shorter than {} chars, skipping", query, min_chars);
            return Ok(MapOutcome::Success(Vec::new()));
        }
        if options.limit == 0 || options.limit > MAX_SEARCH_LIMIT {
            return Err(MapError::InvalidRequest(format!(
                "limit must be between 1 and {}, got {}",
                MAX_SEARCH_LIMIT, options.limit
            )));
        }

        let key = CacheKey::builder("search")
            .param("query", query)
            .param("limit", options.limit)
            .param("countrycodes", &options.countrycodes)
            .build();

        let backend = Arc::clone(&self.backend);
        let owned_query = query.to_string();
        let limit = options.limit;
        let countrycodes = options.countrycodes.clone();
        let result = self
            .fetch_cached(&key, async move {
                backend.search(&owned_query, limit, &countrycodes).await
            })
            .await;

        Ok(self.outcome("search", result))
    }

    pub async fn reverse_geocode(
        &self,
        point: GeoPoint,
        zoom: u8,
    ) -> Result<MapOutcome<PlaceResult>> {
        ensure_valid(&point)?;

        let key = CacheKey::builder("reverse")
            .param("lat", point.latitude)
            .param("lon", point.longitude)
            .param("zoom", zoom)
            .build();

        let backend = Arc::clone(&self.backend);
        let result = self
            .fetch_cached(&key, async move { backend.reverse(point, zoom).await })
            .await;

        Ok(self.outcome("reverse geocode", result))
    }

    pub async fn find_nearby_places(
        &self,
        point: GeoPoint,
        category: &PlaceCategory,
        radius_meters: u32,
    ) -> Result<MapOutcome<Vec<PlaceResult>>> {
        ensure_valid(&point)?;
        if radius_meters == 0 {
            return Err(MapError::InvalidRequest(
                "radius must be greater than zero".to_string(),
            ));
        }

        let key = CacheKey::builder("nearby")
            .param("lat", point.latitude)
            .param("lon", point.longitude)
            .param("type", category)
            .param("radius", radius_meters)
            .build();

        let backend = Arc::clone(&self.backend);
        let owned_category = category.clone();
        let result = self
            .fetch_cached(&key, async move {
                backend.nearby(point, &owned_category, radius_meters).await
            })
            .await;

        Ok(self.outcome("nearby", result))
    }

    /// Route between two points. Remote failures degrade to a straight-line
    /// estimate flagged `is_fallback`; those estimates are never cached.
    pub async fn calculate_route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        profile: TravelProfile,
    ) -> Result<RouteResult> {
        ensure_valid(&origin)?;
        ensure_valid(&destination)?;

        let key = CacheKey::builder("route")
            .param("from_lat", origin.latitude)
            .param("from_lon", origin.longitude)
            .param("to_lat", destination.latitude)
            .param("to_lon", destination.longitude)
            .param("profile", profile)
            .build();

        let backend = Arc::clone(&self.backend);
        let result = self
            .fetch_cached(&key, async move {
                backend.route(origin, destination, profile).await
            })
            .await;

        match result {
            Ok(route) => Ok(route),
            Err(e) => {
                tracing::warn!(
                    profile = %profile,
                    "Routing failed, using straight-line estimate: {}",
                    e
                );
                Ok(build_fallback_route(
                    origin,
                    destination,
                    profile,
                    Some(e.to_string()),
                ))
            }
        }
    }

    /// One route per profile, requested concurrently. Each profile falls back
    /// independently.
    pub async fn calculate_routes(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        profiles: &[TravelProfile],
    ) -> Result<Vec<RouteResult>> {
        ensure_valid(&origin)?;
        ensure_valid(&destination)?;

        let routes = join_all(
            profiles
                .iter()
                .map(|profile| self.calculate_route(origin, destination, *profile)),
        )
        .await;

        routes.into_iter().collect()
    }

    pub async fn place_details(&self, place_id: &str) -> Result<MapOutcome<PlaceResult>> {
        let place_id = place_id.trim();
        if place_id.is_empty() {
            return Err(MapError::InvalidRequest(
                "place id must not be empty".to_string(),
            ));
        }

        let key = CacheKey::builder("place").param("id", place_id).build();

        let backend = Arc::clone(&self.backend);
        let owned_id = place_id.to_string();
        let result = self
            .fetch_cached(&key, async move { backend.place_details(&owned_id).await })
            .await;

        Ok(self.outcome("place details", result))
    }

    /// Category and profile enumerations; built-in lists when the backend is
    /// unavailable.
    pub async fn available_types(&self) -> MapTypes {
        match self.backend.map_types().await {
            Ok(types) => types,
            Err(e) => {
                tracing::warn!("Failed to load map types, using defaults: {}", e);
                MapTypes::default()
            }
        }
    }

    pub async fn check_health(&self) -> MapOutcome<MapHealth> {
        self.outcome("health check", self.backend.health().await)
    }

    /// Top places for a fixed set of everyday categories around `point`.
    /// Categories whose lookup fails or finds nothing are left out.
    pub async fn popular_places(&self, point: GeoPoint) -> Result<Vec<PopularCategory>> {
        ensure_valid(&point)?;

        let lookups = POPULAR_CATEGORIES.iter().map(|(category, radius)| async move {
            let outcome = self.find_nearby_places(point, category, *radius).await;
            (category, outcome)
        });

        let mut popular = Vec::new();
        for (category, outcome) in join_all(lookups).await {
            match outcome? {
                MapOutcome::Success(mut places) if !places.is_empty() => {
                    places.truncate(POPULAR_PLACES_PER_CATEGORY);
                    popular.push(PopularCategory {
                        category: category.label(),
                        places,
                    });
                }
                MapOutcome::Success(_) => {}
                MapOutcome::Failure(failure) => {
                    tracing::debug!("Skipping popular category {}: {}", category, failure);
                }
            }
        }

        Ok(popular)
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    async fn fetch_cached<T, F>(&self, key: &CacheKey, call: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        if let Some(value) = self.cache.get(key).await {
            match serde_json::from_value(value) {
                Ok(data) => return Ok(data),
                Err(e) => tracing::warn!("Discarding unreadable cache entry {}: {}", key, e),
            }
        }

        let cache = Arc::clone(&self.cache);
        let cache_key = key.clone();
        let value = self
            .inflight
            .run(key, move || {
                async move {
                    let data = call.await?;
                    let value = serde_json::to_value(&data)?;
                    cache.set(&cache_key, value.clone()).await;
                    Ok(value)
                }
                .boxed()
            })
            .await?;

        Ok(serde_json::from_value(value)?)
    }

    fn outcome<T>(&self, operation: &str, result: Result<T>) -> MapOutcome<T> {
        if let Err(e) = &result {
            if e.is_rate_limited() {
                tracing::warn!("{} rate limited: {}", operation, e);
            } else {
                tracing::warn!("{} failed: {}", operation, e);
            }
        }
        MapOutcome::from(result)
    }
}

fn ensure_valid(point: &GeoPoint) -> Result<()> {
    if is_valid(point.latitude, point.longitude) {
        Ok(())
    } else {
        Err(MapError::invalid_coordinates(point.latitude, point.longitude))
    }
}
