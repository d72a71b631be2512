use crate::models::GeoPoint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category understood by `/map/nearby/{lat}/{lon}/{type}`.
///
/// The backend publishes its full list through `/map/types`; the named variants
/// are the ones the driver UI asks for directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlaceCategory {
    Restaurant,
    Bank,
    Hospital,
    School,
    Pharmacy,
    Fuel,
    Supermarket,
    BusStop,
    Other(String),
}

impl PlaceCategory {
    pub fn as_str(&self) -> &str {
        match self {
            PlaceCategory::Restaurant => "restaurant",
            PlaceCategory::Bank => "bank",
            PlaceCategory::Hospital => "hospital",
            PlaceCategory::School => "school",
            PlaceCategory::Pharmacy => "pharmacy",
            PlaceCategory::Fuel => "fuel",
            PlaceCategory::Supermarket => "supermarket",
            PlaceCategory::BusStop => "bus_stop",
            PlaceCategory::Other(s) => s.as_str(),
        }
    }

    /// Heading shown above a group of places in the popular-places summary.
    pub fn label(&self) -> String {
        match self {
            PlaceCategory::Restaurant => "Restaurants".to_string(),
            PlaceCategory::Bank => "Banks".to_string(),
            PlaceCategory::Hospital => "Hospitals".to_string(),
            PlaceCategory::School => "Schools".to_string(),
            PlaceCategory::Pharmacy => "Pharmacies".to_string(),
            PlaceCategory::Fuel => "Fuel stations".to_string(),
            PlaceCategory::Supermarket => "Supermarkets".to_string(),
            PlaceCategory::BusStop => "Bus stops".to_string(),
            PlaceCategory::Other(s) => s.replace('_', " "),
        }
    }
}

impl fmt::Display for PlaceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PlaceCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        if normalized.is_empty() {
            return Err("Place category cannot be empty".to_string());
        }
        if !normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(format!("Invalid place category: '{}'", s));
        }
        Ok(match normalized.as_str() {
            "restaurant" => PlaceCategory::Restaurant,
            "bank" => PlaceCategory::Bank,
            "hospital" => PlaceCategory::Hospital,
            "school" => PlaceCategory::School,
            "pharmacy" => PlaceCategory::Pharmacy,
            "fuel" => PlaceCategory::Fuel,
            "supermarket" => PlaceCategory::Supermarket,
            "bus_stop" => PlaceCategory::BusStop,
            _ => PlaceCategory::Other(normalized),
        })
    }
}

impl Serialize for PlaceCategory {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PlaceCategory {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Street address components as returned by the geocoder.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Address {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub house_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighbourhood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl Address {
    /// "Road, #Number, Neighbourhood, City", skipping missing parts.
    pub fn format(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(road) = &self.road {
            parts.push(road.clone());
        }
        if let Some(number) = &self.house_number {
            parts.push(format!("#{}", number));
        }
        if let Some(neighbourhood) = &self.neighbourhood {
            parts.push(neighbourhood.clone());
        }
        if let Some(city) = &self.city {
            parts.push(city.clone());
        }
        parts.join(", ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaceResult {
    pub id: String,
    pub name: String,
    pub formatted_address: String,
    pub coordinates: GeoPoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_type: Option<String>,
    /// Distance from the query point, set by nearby searches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opening_hours: Option<String>,
}

impl PlaceResult {
    pub fn new(id: impl Into<String>, name: impl Into<String>, coordinates: GeoPoint) -> Self {
        PlaceResult {
            id: id.into(),
            name: name.into(),
            formatted_address: String::new(),
            coordinates,
            category: None,
            place_type: None,
            distance_meters: None,
            phone: None,
            website: None,
            opening_hours: None,
        }
    }
}

/// One group of the popular-places summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PopularCategory {
    pub category: String,
    pub places: Vec<PlaceResult>,
}

/// Enumerations published by `/map/types`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapTypes {
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub shops: Vec<String>,
    #[serde(default)]
    pub transport: Vec<String>,
    #[serde(default)]
    pub profiles: Vec<String>,
}

impl Default for MapTypes {
    fn default() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        MapTypes {
            amenities: owned(&["restaurant", "bank", "hospital", "school", "pharmacy", "fuel"]),
            shops: owned(&["supermarket"]),
            transport: owned(&["bus_stop"]),
            profiles: owned(&["driving-car", "foot-walking"]),
        }
    }
}

/// Payload of `/map/health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapHealth {
    #[serde(default = "default_health_status")]
    pub status: String,
    #[serde(default)]
    pub details: serde_json::Value,
}

fn default_health_status() -> String {
    "unknown".to_string()
}
