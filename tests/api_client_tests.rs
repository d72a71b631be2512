use fleetmap::auth::{MemoryTokenStore, TokenStore};
use fleetmap::error::MapError;
use fleetmap::models::{GeoPoint, PlaceCategory, TravelProfile};
use fleetmap::services::{MapApiClient, MapBackend};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

mod common;

use common::{Behavior, MockBackend};

fn client(mock: &MockBackend) -> MapApiClient {
    MapApiClient::new(&mock.config()).expect("client should build")
}

#[tokio::test]
async fn test_search_parses_places() {
    let mock = MockBackend::start().await;
    let places = assert_ok!(client(&mock).search("parque 93", 2, "co").await);

    assert_eq!(places.len(), 2);
    assert_eq!(places[0].name, "parque 93 0");
    assert_eq!(places[0].coordinates.latitude, 4.60);
    assert_eq!(mock.hits("search"), 1);
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let mock = MockBackend::start().await;
    let tokens: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::with_token("s3cret"));
    let client = client(&mock).with_token_store(tokens.clone());

    assert_ok!(client.health().await);
    assert_eq!(mock.last_authorization().as_deref(), Some("Bearer s3cret"));
    assert_eq!(tokens.token().as_deref(), Some("s3cret"));
}

#[tokio::test]
async fn test_no_token_no_header() {
    let mock = MockBackend::start().await;
    assert_ok!(client(&mock).map_types().await);
    assert_eq!(mock.last_authorization(), None);
}

#[tokio::test]
async fn test_status_classification() {
    let mock = MockBackend::start().await;
    let client = client(&mock);
    let point = GeoPoint::new(4.6, -74.08).unwrap();

    mock.set_behavior(Behavior::RateLimited);
    let err = assert_err!(client.nearby(point, &PlaceCategory::Bank, 500).await);
    assert_eq!(err, MapError::RateLimited("Too many requests".to_string()));

    mock.set_behavior(Behavior::ServerError);
    let err = assert_err!(client.nearby(point, &PlaceCategory::Bank, 500).await);
    assert_eq!(
        err,
        MapError::Http {
            status: 500,
            message: "Internal server error".to_string()
        }
    );
}

#[tokio::test]
async fn test_unauthorized_clears_store() {
    let mock = MockBackend::start().await;
    mock.set_behavior(Behavior::Unauthorized);
    let tokens: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::with_token("old"));
    let client = client(&mock).with_token_store(tokens.clone());

    let err = assert_err!(client.place_details("way/7").await);
    assert!(matches!(err, MapError::Unauthorized(_)));
    assert!(tokens.token().is_none());
}

#[tokio::test]
async fn test_envelope_failure() {
    let mock = MockBackend::start().await;
    mock.set_behavior(Behavior::EnvelopeFailure);

    let err = assert_err!(client(&mock).health().await);
    assert_eq!(err, MapError::Upstream("Geocoder unavailable".to_string()));
}

#[tokio::test]
async fn test_timeout_maps_to_timeout() {
    let mock = MockBackend::start().await;
    mock.set_behavior(Behavior::Slow(Duration::from_secs(2)));

    let origin = GeoPoint::new(4.60, -74.08).unwrap();
    let destination = GeoPoint::new(4.65, -74.05).unwrap();
    let err = assert_err!(
        client(&mock)
            .route(origin, destination, TravelProfile::CyclingRegular)
            .await
    );
    assert_eq!(err, MapError::Timeout);
}

#[tokio::test]
async fn test_route_geometry_and_instructions() {
    let mock = MockBackend::start().await;
    let origin = GeoPoint::new(4.60, -74.08).unwrap();
    let destination = GeoPoint::new(4.65, -74.05).unwrap();

    let route = assert_ok!(
        client(&mock)
            .route(origin, destination, TravelProfile::DrivingCar)
            .await
    );
    assert_eq!(route.coordinates, vec![origin, destination]);
    assert_eq!(route.instructions.len(), 1);
    assert_eq!(route.profile, TravelProfile::DrivingCar);
    assert!(!route.is_fallback);
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    // Bind then drop to get a port with nothing listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = fleetmap::config::Config {
        api_base_url: format!("http://127.0.0.1:{}/api", port),
        request_timeout: Duration::from_millis(500),
        ..Default::default()
    };
    let client = MapApiClient::new(&config).unwrap();
    let err = assert_err!(client.health().await);
    assert!(matches!(err, MapError::Transport(_) | MapError::Timeout));
}
