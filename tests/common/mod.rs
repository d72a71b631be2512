use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use fleetmap::config::Config;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// How the mock backend answers every request.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Behavior {
    #[default]
    Ok,
    RateLimited,
    ServerError,
    Unauthorized,
    EnvelopeFailure,
    Slow(Duration),
}

#[derive(Clone, Default)]
struct MockState {
    hits: Arc<Mutex<HashMap<&'static str, usize>>>,
    behavior: Arc<Mutex<Behavior>>,
    last_authorization: Arc<Mutex<Option<String>>>,
}

/// In-process stand-in for the fleet backend's `/api/map/*` endpoints.
pub struct MockBackend {
    pub origin: String,
    state: MockState,
    task: tokio::task::JoinHandle<()>,
}

#[allow(dead_code)]
impl MockBackend {
    pub async fn start() -> MockBackend {
        let state = MockState::default();
        let app = Router::new()
            .route("/api/map/search/{query}", get(search))
            .route("/api/map/reverse/{lat}/{lon}", get(reverse))
            .route("/api/map/nearby/{lat}/{lon}/{kind}", get(nearby))
            .route(
                "/api/map/route/{start_lat}/{start_lon}/{end_lat}/{end_lon}",
                get(route),
            )
            .route("/api/map/place/{place_id}", get(place))
            .route("/api/map/types", get(types))
            .route("/api/map/health", get(health))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Mock backend has no address");
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock backend crashed");
        });

        MockBackend {
            origin: format!("http://{}", addr),
            state,
            task,
        }
    }

    /// Client configuration pointing at this backend with a short timeout.
    pub fn config(&self) -> Config {
        Config {
            api_base_url: format!("{}/api", self.origin),
            request_timeout: Duration::from_millis(500),
            ..Config::default()
        }
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.state.behavior.lock().unwrap() = behavior;
    }

    pub fn hits(&self, endpoint: &str) -> usize {
        self.state.hits.lock().unwrap().get(endpoint).copied().unwrap_or(0)
    }

    pub fn total_hits(&self) -> usize {
        self.state.hits.lock().unwrap().values().sum()
    }

    pub fn last_authorization(&self) -> Option<String> {
        self.state.last_authorization.lock().unwrap().clone()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn respond(state: &MockState, endpoint: &'static str, headers: &HeaderMap, data: Value) -> Response {
    *state.hits.lock().unwrap().entry(endpoint).or_insert(0) += 1;
    *state.last_authorization.lock().unwrap() = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    let behavior = *state.behavior.lock().unwrap();
    match behavior {
        Behavior::Ok => Json(json!({"success": true, "data": data})).into_response(),
        Behavior::RateLimited => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({"success": false, "message": "Too many requests"})),
        )
            .into_response(),
        Behavior::ServerError => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"success": false, "error": "Internal server error"})),
        )
            .into_response(),
        Behavior::Unauthorized => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "message": "Token expired"})),
        )
            .into_response(),
        Behavior::EnvelopeFailure => {
            Json(json!({"success": false, "error": "Geocoder unavailable"})).into_response()
        }
        Behavior::Slow(delay) => {
            tokio::time::sleep(delay).await;
            Json(json!({"success": true, "data": data})).into_response()
        }
    }
}

fn place_json(id: &str, name: &str, lat: f64, lon: f64) -> Value {
    json!({
        "place_id": id,
        "name": name,
        "display_name": format!("{}, Bogotá, Colombia", name),
        "lat": lat.to_string(),
        "lon": lon.to_string(),
        "type": "amenity",
    })
}

async fn search(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(query): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let limit: usize = params
        .get("limit")
        .and_then(|l| l.parse().ok())
        .unwrap_or(5);
    let places: Vec<Value> = (0..limit.min(3))
        .map(|i| place_json(&format!("{}-{}", query, i), &format!("{} {}", query, i), 4.60 + i as f64 * 0.01, -74.08))
        .collect();
    respond(&state, "search", &headers, json!(places)).await
}

async fn reverse(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path((lat, lon)): Path<(f64, f64)>,
) -> Response {
    let mut place = place_json("reverse-1", "Carrera 7", lat, lon);
    place["address"] = json!({"road": "Carrera 7", "house_number": "32-16", "city": "Bogotá"});
    respond(&state, "reverse", &headers, place).await
}

async fn nearby(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path((lat, lon, kind)): Path<(f64, f64, String)>,
) -> Response {
    let places: Vec<Value> = (0..4)
        .map(|i| {
            let mut place = place_json(&format!("{}-{}", kind, i), &format!("{} {}", kind, i), lat + 0.001 * i as f64, lon);
            place["distance"] = json!(111.0 * i as f64);
            place
        })
        .collect();
    respond(&state, "nearby", &headers, json!(places)).await
}

async fn route(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path((start_lat, start_lon, end_lat, end_lon)): Path<(f64, f64, f64, f64)>,
) -> Response {
    let data = json!({
        "distance": 7420.5,
        "duration": 912.0,
        "geometry": {
            "type": "LineString",
            "coordinates": [[start_lon, start_lat], [end_lon, end_lat]]
        },
        "instructions": [
            {"instruction": "Head north on Carrera 7", "distance": 7420.5, "duration": 912.0}
        ]
    });
    respond(&state, "route", &headers, data).await
}

async fn place(
    State(state): State<MockState>,
    headers: HeaderMap,
    Path(place_id): Path<String>,
) -> Response {
    let mut place = place_json(&place_id, "Museo Botero", 4.5969, -74.0733);
    place["website"] = json!("https://www.banrepcultural.org");
    respond(&state, "place", &headers, place).await
}

async fn types(State(state): State<MockState>, headers: HeaderMap) -> Response {
    let data = json!({
        "amenities": ["restaurant", "cafe"],
        "shops": ["bakery"],
        "transport": ["bus_stop"],
        "profiles": ["driving-car", "cycling-regular"]
    });
    respond(&state, "types", &headers, data).await
}

async fn health(State(state): State<MockState>, headers: HeaderMap) -> Response {
    respond(&state, "health", &headers, json!({"status": "ok", "details": {"geocoder": "up"}})).await
}
