use crate::constants::EARTH_RADIUS_METERS;
use crate::error::MapError;
use serde::{Deserialize, Serialize};

/// Returns true iff both values are finite and inside WGS84 ranges.
pub fn is_valid(lat: f64, lon: f64) -> bool {
    lat.is_finite()
        && lon.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lon)
}

/// A validated WGS84 position.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, MapError> {
        if !is_valid(latitude, longitude) {
            return Err(MapError::invalid_coordinates(latitude, longitude));
        }
        Ok(GeoPoint {
            latitude,
            longitude,
        })
    }

    /// Build from a GeoJSON `[lon, lat]` pair.
    pub fn from_lon_lat(pair: [f64; 2]) -> Result<Self, MapError> {
        GeoPoint::new(pair[1], pair[0])
    }

    /// Great-circle distance using the Haversine formula, in meters.
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        let lat1_rad = self.latitude.to_radians();
        let lat2_rad = other.latitude.to_radians();
        let delta_lat = (other.latitude - self.latitude).to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_METERS * c
    }

    /// Initial bearing towards `other`, degrees clockwise from north in [0, 360).
    pub fn bearing_to(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let y = delta_lon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();
        (y.atan2(x).to_degrees() + 360.0) % 360.0
    }

    /// Linear interpolation between two points; `t` is clamped to [0, 1].
    /// Adequate for the short segments of a city route.
    pub fn lerp(&self, other: &GeoPoint, t: f64) -> GeoPoint {
        let t = t.clamp(0.0, 1.0);
        GeoPoint {
            latitude: self.latitude + (other.latitude - self.latitude) * t,
            longitude: self.longitude + (other.longitude - self.longitude) * t,
        }
    }
}

// Deserialization goes through the validating constructor so an out-of-range
// point can never be built from wire data.
impl<'de> Deserialize<'de> for GeoPoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(alias = "lat")]
            latitude: f64,
            #[serde(alias = "lon", alias = "lng")]
            longitude: f64,
        }

        let raw = Raw::deserialize(deserializer)?;
        GeoPoint::new(raw.latitude, raw.longitude).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_ranges() {
        assert!(is_valid(4.6097, -74.0817));
        assert!(is_valid(90.0, 180.0));
        assert!(is_valid(-90.0, -180.0));
        assert!(!is_valid(90.0001, 0.0));
        assert!(!is_valid(0.0, -180.5));
        assert!(!is_valid(f64::NAN, 0.0));
        assert!(!is_valid(0.0, f64::INFINITY));
    }

    #[test]
    fn test_new_rejects_invalid() {
        assert!(GeoPoint::new(4.6, -74.08).is_ok());
        let err = GeoPoint::new(91.0, 0.0).unwrap_err();
        assert!(matches!(err, MapError::InvalidCoordinates { .. }));
    }

    #[test]
    fn test_distance_bogota_medellin() {
        let bogota = GeoPoint::new(4.7110, -74.0721).unwrap();
        let medellin = GeoPoint::new(6.2442, -75.5812).unwrap();

        let distance = bogota.distance_to(&medellin);
        // Roughly 240 km as the crow flies
        assert!((distance - 240_000.0).abs() < 10_000.0, "got {}", distance);
    }

    #[test]
    fn test_distance_identity_and_symmetry() {
        let a = GeoPoint::new(4.60, -74.08).unwrap();
        let b = GeoPoint::new(4.65, -74.05).unwrap();

        assert_eq!(a.distance_to(&a), 0.0);
        assert!((a.distance_to(&b) - b.distance_to(&a)).abs() < 1e-6);
    }

    #[test]
    fn test_distance_additive_on_meridian() {
        let a = GeoPoint::new(0.0, 10.0).unwrap();
        let b = GeoPoint::new(1.0, 10.0).unwrap();
        let c = GeoPoint::new(2.5, 10.0).unwrap();

        let direct = a.distance_to(&c);
        let via_b = a.distance_to(&b) + b.distance_to(&c);
        assert!((direct - via_b).abs() < 1e-3);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = GeoPoint::new(0.0, 0.0).unwrap();
        let north = GeoPoint::new(1.0, 0.0).unwrap();
        let east = GeoPoint::new(0.0, 1.0).unwrap();

        assert!(origin.bearing_to(&north).abs() < 1e-9);
        assert!((origin.bearing_to(&east) - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: GeoPoint = serde_json::from_str(r#"{"lat": 4.6, "lon": -74.08}"#).unwrap();
        assert_eq!(ok.latitude, 4.6);

        let bad = serde_json::from_str::<GeoPoint>(r#"{"latitude": 120.0, "longitude": 0.0}"#);
        assert!(bad.is_err());
    }
}
