use crate::models::distance::{DistanceMeters, DurationSeconds};
use crate::models::GeoPoint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum TravelProfile {
    #[default]
    #[serde(rename = "driving-car")]
    DrivingCar,
    #[serde(rename = "driving-hgv")]
    DrivingHgv,
    #[serde(rename = "foot-walking")]
    FootWalking,
    #[serde(rename = "cycling-regular")]
    CyclingRegular,
}

impl TravelProfile {
    /// Profile name expected by `/map/route`.
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelProfile::DrivingCar => "driving-car",
            TravelProfile::DrivingHgv => "driving-hgv",
            TravelProfile::FootWalking => "foot-walking",
            TravelProfile::CyclingRegular => "cycling-regular",
        }
    }
}

impl fmt::Display for TravelProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TravelProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "driving-car" | "car" | "driving" => Ok(TravelProfile::DrivingCar),
            "driving-hgv" | "hgv" | "bus" => Ok(TravelProfile::DrivingHgv),
            "foot-walking" | "walk" | "walking" => Ok(TravelProfile::FootWalking),
            "cycling-regular" | "bike" | "cycling" => Ok(TravelProfile::CyclingRegular),
            _ => Err(format!("Invalid travel profile: '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteInstruction {
    pub instruction: String,
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteResult {
    pub id: Uuid,
    pub profile: TravelProfile,
    /// Ordered path from origin to destination
    pub coordinates: Vec<GeoPoint>,
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub instructions: Vec<RouteInstruction>,
    /// True when the path is a straight-line estimate rather than a routed path.
    pub is_fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

impl RouteResult {
    pub fn new(
        profile: TravelProfile,
        coordinates: Vec<GeoPoint>,
        distance_meters: f64,
        duration_seconds: f64,
        instructions: Vec<RouteInstruction>,
    ) -> Self {
        RouteResult {
            id: Uuid::new_v4(),
            profile,
            coordinates,
            distance_meters,
            duration_seconds,
            instructions,
            is_fallback: false,
            fallback_reason: None,
        }
    }

    pub fn distance(&self) -> DistanceMeters {
        DistanceMeters(self.distance_meters)
    }

    pub fn duration(&self) -> DurationSeconds {
        DurationSeconds(self.duration_seconds)
    }

    /// One-line summary such as "12.4 km · 18m", flagged when approximate.
    pub fn summary(&self) -> String {
        let base = format!("{} · {}", self.distance(), self.duration());
        if self.is_fallback {
            format!("~{} (approximate)", base)
        } else {
            base
        }
    }
}
