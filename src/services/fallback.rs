use crate::constants::FALLBACK_AVERAGE_SPEED_KMH;
use crate::models::{DistanceMeters, GeoPoint, RouteInstruction, RouteResult, TravelProfile};

/// Great-circle distance between two points, in meters.
pub fn distance_meters(a: &GeoPoint, b: &GeoPoint) -> f64 {
    a.distance_to(b)
}

/// Travel time at the assumed fallback speed (50 km/h).
pub fn estimated_duration_seconds(distance_meters: f64) -> f64 {
    let meters_per_second = FALLBACK_AVERAGE_SPEED_KMH * 1000.0 / 3600.0;
    distance_meters / meters_per_second
}

/// Straight-line stand-in for a routed path, used when the routing call fails.
///
/// The result is always flagged `is_fallback` so the UI can mark it approximate.
pub fn build_fallback_route(
    origin: GeoPoint,
    destination: GeoPoint,
    profile: TravelProfile,
    reason: Option<String>,
) -> RouteResult {
    let distance = distance_meters(&origin, &destination);
    let duration = estimated_duration_seconds(distance);

    let instruction = RouteInstruction {
        instruction: format!(
            "Head towards the destination ({})",
            DistanceMeters(distance)
        ),
        distance_meters: distance,
        duration_seconds: duration,
    };

    let mut route = RouteResult::new(
        profile,
        vec![origin, destination],
        distance,
        duration,
        vec![instruction],
    );
    route.is_fallback = true;
    route.fallback_reason = reason;
    route
}
