use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors raised by the map data layer.
///
/// Validation variants are returned to callers directly. Everything that comes
/// from the network is folded into a [`MapFailure`] by the service layer, so
/// variants are `Clone` to let coalesced callers share one outcome.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapError {
    #[error("Invalid coordinates: ({lat}, {lon})")]
    InvalidCoordinates { lat: f64, lon: f64 },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Map service error: {0}")]
    Upstream(String),

    #[error("Failed to parse response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl MapError {
    pub fn invalid_coordinates(lat: f64, lon: f64) -> Self {
        MapError::InvalidCoordinates { lat, lon }
    }

    /// Classify this error for the UI layer.
    pub fn kind(&self) -> FailureKind {
        match self {
            MapError::InvalidCoordinates { .. } | MapError::InvalidRequest(_) => {
                FailureKind::Validation
            }
            MapError::RateLimited(_) => FailureKind::RateLimited,
            MapError::Unauthorized(_) => FailureKind::Unauthorized,
            MapError::Upstream(_) | MapError::Decode(_) => FailureKind::Upstream,
            MapError::Timeout
            | MapError::Transport(_)
            | MapError::Http { .. }
            | MapError::Config(_)
            | MapError::Storage(_) => FailureKind::Transport,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == FailureKind::Validation
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, MapError::RateLimited(_))
    }
}

impl From<reqwest::Error> for MapError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            MapError::Timeout
        } else if e.is_decode() {
            MapError::Decode(e.to_string())
        } else {
            MapError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for MapError {
    fn from(e: serde_json::Error) -> Self {
        MapError::Decode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MapError>;

/// Coarse error classification surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Rejected locally, never sent to the network.
    Validation,
    /// Timeout, connectivity, or non-2xx status.
    Transport,
    /// HTTP 429. The caller should wait rather than retry.
    RateLimited,
    /// HTTP 401. Stored credentials have been cleared.
    Unauthorized,
    /// The backend answered with `success: false` or an unreadable payload.
    Upstream,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::Validation => "validation",
            FailureKind::Transport => "transport",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::Unauthorized => "unauthorized",
            FailureKind::Upstream => "upstream",
        };
        write!(f, "{}", s)
    }
}

/// A remote failure converted into data at the service boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl MapFailure {
    pub fn user_message(&self) -> &'static str {
        match self.kind {
            FailureKind::RateLimited => "Too many requests. Please try again shortly.",
            FailureKind::Unauthorized => "Your session has expired. Please sign in again.",
            FailureKind::Validation => "Invalid request.",
            FailureKind::Transport | FailureKind::Upstream => {
                "The map service is unavailable right now."
            }
        }
    }
}

impl From<MapError> for MapFailure {
    fn from(e: MapError) -> Self {
        MapFailure {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}

impl fmt::Display for MapFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}
