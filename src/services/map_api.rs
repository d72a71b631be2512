use crate::auth::TokenStore;
use crate::config::Config;
use crate::error::{MapError, Result};
use crate::models::{
    Address, GeoPoint, MapHealth, MapTypes, PlaceCategory, PlaceResult, RouteInstruction,
    RouteResult, TravelProfile,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::sync::Arc;

/// Remote side of the map data layer: one method per `/map/*` endpoint.
///
/// Implementations return typed payloads or a [`MapError`]; recovery policy is
/// applied by [`MapDataService`](crate::services::map_data::MapDataService).
#[async_trait]
pub trait MapBackend: Send + Sync {
    async fn search(&self, query: &str, limit: u32, countrycodes: &str)
        -> Result<Vec<PlaceResult>>;
    async fn reverse(&self, point: GeoPoint, zoom: u8) -> Result<PlaceResult>;
    async fn nearby(
        &self,
        point: GeoPoint,
        category: &PlaceCategory,
        radius_meters: u32,
    ) -> Result<Vec<PlaceResult>>;
    async fn route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        profile: TravelProfile,
    ) -> Result<RouteResult>;
    async fn place_details(&self, place_id: &str) -> Result<PlaceResult>;
    async fn map_types(&self) -> Result<MapTypes>;
    async fn health(&self) -> Result<MapHealth>;
}

/// HTTP client for the fleet backend's map endpoints.
#[derive(Clone)]
pub struct MapApiClient {
    client: Client,
    base_url: String,
    tokens: Option<Arc<dyn TokenStore>>,
}

impl MapApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| MapError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(MapApiClient {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            tokens: None,
        })
    }

    /// Attach a token store: its bearer token is sent with every request and
    /// it is cleared when the backend answers 401.
    pub fn with_token_store(mut self, tokens: Arc<dyn TokenStore>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("Map API request: GET {}", url);

        let mut request = self.client.get(&url).query(query);
        if let Some(token) = self.tokens.as_ref().and_then(|store| store.token()) {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            let error = MapError::from(e);
            tracing::warn!("Map API request to {} failed: {}", path, error);
            error
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            });
            return Err(self.status_error(status, message, path));
        }

        let envelope: WireEnvelope<T> = response.json().await?;
        envelope.into_data()
    }

    fn status_error(&self, status: StatusCode, message: String, path: &str) -> MapError {
        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                tracing::warn!("Map API rate limited on {}: {}", path, message);
                MapError::RateLimited(message)
            }
            StatusCode::UNAUTHORIZED => {
                tracing::warn!("Map API rejected credentials on {}", path);
                if let Some(store) = &self.tokens {
                    if let Err(e) = store.clear() {
                        tracing::warn!("Failed to clear stored session: {}", e);
                    }
                }
                MapError::Unauthorized(message)
            }
            _ => {
                tracing::warn!(status = %status, "Map API HTTP error on {}: {}", path, message);
                MapError::Http {
                    status: status.as_u16(),
                    message,
                }
            }
        }
    }
}

#[async_trait]
impl MapBackend for MapApiClient {
    async fn search(
        &self,
        query: &str,
        limit: u32,
        countrycodes: &str,
    ) -> Result<Vec<PlaceResult>> {
        let path = format!("/map/search/{}", urlencoding::encode(query));
        let places: Vec<WirePlace> = self
            .get_data(
                &path,
                &[
                    ("limit", limit.to_string()),
                    ("countrycodes", countrycodes.to_string()),
                ],
            )
            .await?;
        Ok(convert_places(places))
    }

    async fn reverse(&self, point: GeoPoint, zoom: u8) -> Result<PlaceResult> {
        let path = format!("/map/reverse/{}/{}", point.latitude, point.longitude);
        let place: WirePlace = self.get_data(&path, &[("zoom", zoom.to_string())]).await?;
        place.into_place()
    }

    async fn nearby(
        &self,
        point: GeoPoint,
        category: &PlaceCategory,
        radius_meters: u32,
    ) -> Result<Vec<PlaceResult>> {
        let path = format!(
            "/map/nearby/{}/{}/{}",
            point.latitude, point.longitude, category
        );
        let places: Vec<WirePlace> = self
            .get_data(&path, &[("radius", radius_meters.to_string())])
            .await?;
        Ok(convert_places(places))
    }

    async fn route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        profile: TravelProfile,
    ) -> Result<RouteResult> {
        let path = format!(
            "/map/route/{}/{}/{}/{}",
            origin.latitude, origin.longitude, destination.latitude, destination.longitude
        );
        let route: WireRoute = self
            .get_data(&path, &[("profile", profile.as_str().to_string())])
            .await?;
        route.into_route(profile)
    }

    async fn place_details(&self, place_id: &str) -> Result<PlaceResult> {
        let path = format!("/map/place/{}", urlencoding::encode(place_id));
        let place: WirePlace = self.get_data(&path, &[]).await?;
        place.into_place()
    }

    async fn map_types(&self) -> Result<MapTypes> {
        self.get_data("/map/types", &[]).await
    }

    async fn health(&self) -> Result<MapHealth> {
        self.get_data("/map/health", &[]).await
    }
}

/// Pull a human-readable message out of an error body.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(|m| m.as_str())
        .map(|m| m.to_string())
}

fn convert_places(places: Vec<WirePlace>) -> Vec<PlaceResult> {
    places
        .into_iter()
        .filter_map(|place| match place.into_place() {
            Ok(place) => Some(place),
            Err(e) => {
                tracing::warn!("Skipping malformed place: {}", e);
                None
            }
        })
        .collect()
}

// Backend wire types

#[derive(Debug, Deserialize)]
struct WireEnvelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl<T> WireEnvelope<T> {
    fn into_data(self) -> Result<T> {
        if !self.success {
            let reason = self
                .error
                .or(self.message)
                .unwrap_or_else(|| "request was not successful".to_string());
            return Err(MapError::Upstream(reason));
        }
        self.data
            .ok_or_else(|| MapError::Upstream("response is missing data".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct WirePlace {
    #[serde(alias = "place_id", default, deserialize_with = "de_opt_id")]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(deserialize_with = "de_flexible_f64")]
    lat: f64,
    #[serde(alias = "lng", deserialize_with = "de_flexible_f64")]
    lon: f64,
    #[serde(rename = "type", default)]
    place_type: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    address: Option<Address>,
    #[serde(default, deserialize_with = "de_opt_flexible_f64")]
    distance: Option<f64>,
    #[serde(default)]
    phone: Option<String>,
    #[serde(default)]
    website: Option<String>,
    #[serde(default)]
    opening_hours: Option<String>,
}

impl WirePlace {
    fn into_place(self) -> Result<PlaceResult> {
        let coordinates = GeoPoint::new(self.lat, self.lon)
            .map_err(|e| MapError::Decode(format!("place has {}", e)))?;

        let formatted = self
            .address
            .as_ref()
            .map(Address::format)
            .filter(|s| !s.is_empty())
            .or_else(|| self.display_name.clone())
            .unwrap_or_default();

        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .or_else(|| {
                self.display_name
                    .as_deref()
                    .and_then(|d| d.split(',').next())
                    .map(|s| s.trim().to_string())
            })
            .unwrap_or_else(|| "Unnamed place".to_string());

        let id = self
            .id
            .unwrap_or_else(|| format!("{}_{}", coordinates.latitude, coordinates.longitude));

        Ok(PlaceResult {
            id,
            name,
            formatted_address: formatted,
            coordinates,
            category: self.category,
            place_type: self.place_type,
            distance_meters: self.distance,
            phone: self.phone,
            website: self.website,
            opening_hours: self.opening_hours,
        })
    }
}

#[derive(Debug, Deserialize)]
struct WireRoute {
    #[serde(deserialize_with = "de_flexible_f64")]
    distance: f64,
    #[serde(deserialize_with = "de_flexible_f64")]
    duration: f64,
    geometry: WireGeometry,
    #[serde(default)]
    instructions: Vec<WireInstruction>,
}

#[derive(Debug, Deserialize)]
struct WireGeometry {
    coordinates: Vec<[f64; 2]>, // [lon, lat] pairs
}

#[derive(Debug, Deserialize)]
struct WireInstruction {
    #[serde(alias = "text")]
    instruction: String,
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
}

impl WireRoute {
    fn into_route(self, profile: TravelProfile) -> Result<RouteResult> {
        let coordinates = self
            .geometry
            .coordinates
            .into_iter()
            .map(GeoPoint::from_lon_lat)
            .collect::<Result<Vec<_>>>()
            .map_err(|e| MapError::Decode(format!("route geometry has {}", e)))?;

        if coordinates.len() < 2 {
            return Err(MapError::Upstream(
                "route geometry has fewer than 2 points".to_string(),
            ));
        }

        let instructions = self
            .instructions
            .into_iter()
            .map(|step| RouteInstruction {
                instruction: step.instruction,
                distance_meters: step.distance,
                duration_seconds: step.duration,
            })
            .collect();

        Ok(RouteResult::new(
            profile,
            coordinates,
            self.distance,
            self.duration,
            instructions,
        ))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

impl NumberOrString {
    fn into_f64<E: serde::de::Error>(self) -> std::result::Result<f64, E> {
        match self {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| E::custom(format!("invalid number: '{}'", s))),
        }
    }
}

// The geocoder returns coordinates as strings; the routing service as numbers.
fn de_flexible_f64<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    NumberOrString::deserialize(deserializer)?.into_f64()
}

fn de_opt_flexible_f64<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<f64>, D::Error> {
    match Option::<NumberOrString>::deserialize(deserializer)? {
        Some(raw) => raw.into_f64().map(Some),
        None => Ok(None),
    }
}

fn de_opt_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
