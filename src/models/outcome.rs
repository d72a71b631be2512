use crate::error::{FailureKind, MapError, MapFailure};
use crate::models::{MapHealth, PlaceResult};
use serde::ser::SerializeStruct;
use serde::Serialize;

/// Result of a map operation once remote failures have been absorbed.
///
/// `Success(vec![])` means the backend legitimately found nothing; it is never
/// used to signal an error.
#[derive(Debug, Clone, PartialEq)]
pub enum MapOutcome<T> {
    Success(T),
    Failure(MapFailure),
}

impl<T> MapOutcome<T> {
    pub fn failed(error: MapError) -> Self {
        MapOutcome::Failure(error.into())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MapOutcome::Success(_))
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            MapOutcome::Success(data) => Some(data),
            MapOutcome::Failure(_) => None,
        }
    }

    pub fn into_data(self) -> Option<T> {
        match self {
            MapOutcome::Success(data) => Some(data),
            MapOutcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&MapFailure> {
        match self {
            MapOutcome::Success(_) => None,
            MapOutcome::Failure(failure) => Some(failure),
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure().map(|f| f.kind)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.failure_kind() == Some(FailureKind::RateLimited)
    }
}

impl<T> MapOutcome<Vec<T>> {
    /// Items on success, an empty slice on failure.
    pub fn items(&self) -> &[T] {
        match self {
            MapOutcome::Success(items) => items,
            MapOutcome::Failure(_) => &[],
        }
    }

    pub fn count(&self) -> usize {
        self.items().len()
    }
}

impl<T> From<Result<T, MapError>> for MapOutcome<T> {
    fn from(result: Result<T, MapError>) -> Self {
        match result {
            Ok(data) => MapOutcome::Success(data),
            Err(e) => MapOutcome::failed(e),
        }
    }
}

/// Payload carried by a [`MapOutcome`]. Lists also report their length, which
/// is serialized as `count`.
pub trait OutcomePayload {
    const IS_LIST: bool = false;

    fn item_count(&self) -> Option<usize> {
        None
    }
}

impl<T> OutcomePayload for Vec<T> {
    const IS_LIST: bool = true;

    fn item_count(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl OutcomePayload for PlaceResult {}
impl OutcomePayload for MapHealth {}

// Serialized in the `{success, data, count?, error}` shape the UI already
// consumes. Failed list operations carry `data: []` and `count: 0`.
impl<T: Serialize + OutcomePayload> Serialize for MapOutcome<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MapOutcome::Success(data) => {
                let count = data.item_count();
                let fields = if count.is_some() { 3 } else { 2 };
                let mut s = serializer.serialize_struct("MapOutcome", fields)?;
                s.serialize_field("success", &true)?;
                s.serialize_field("data", data)?;
                if let Some(count) = count {
                    s.serialize_field("count", &count)?;
                }
                s.end()
            }
            MapOutcome::Failure(failure) => {
                let fields = if T::IS_LIST { 5 } else { 4 };
                let mut s = serializer.serialize_struct("MapOutcome", fields)?;
                s.serialize_field("success", &false)?;
                if T::IS_LIST {
                    s.serialize_field("data", &[(); 0])?;
                    s.serialize_field("count", &0usize)?;
                } else {
                    s.serialize_field("data", &Option::<()>::None)?;
                }
                s.serialize_field("error", &failure.message)?;
                s.serialize_field("kind", &failure.kind)?;
                s.end()
            }
        }
    }
}
