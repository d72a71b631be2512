use serde::{Deserialize, Serialize};
use std::fmt;

/// Distance in meters
/// Display switches to kilometers at 1000 m, the way route summaries show it.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct DistanceMeters(pub f64);

impl DistanceMeters {
    pub fn as_km(self) -> f64 {
        self.0 / 1000.0
    }
}

impl fmt::Display for DistanceMeters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 1000.0 {
            write!(f, "{} m", self.0.round() as i64)
        } else {
            write!(f, "{:.1} km", self.as_km())
        }
    }
}

/// Travel time in seconds
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct DurationSeconds(pub f64);

impl fmt::Display for DurationSeconds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.0.max(0.0) as u64;
        let hours = total / 3600;
        let minutes = (total % 3600) / 60;
        if hours > 0 {
            write!(f, "{}h {}m", hours, minutes)
        } else {
            write!(f, "{}m", minutes)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_display() {
        assert_eq!(DistanceMeters(850.4).to_string(), "850 m");
        assert_eq!(DistanceMeters(1234.0).to_string(), "1.2 km");
        assert_eq!(DistanceMeters(15_000.0).to_string(), "15.0 km");
    }

    #[test]
    fn test_duration_display() {
        assert_eq!(DurationSeconds(59.0).to_string(), "0m");
        assert_eq!(DurationSeconds(754.0).to_string(), "12m");
        assert_eq!(DurationSeconds(3_900.0).to_string(), "1h 5m");
    }
}
