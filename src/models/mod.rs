pub mod coordinates;
pub mod distance;
pub mod outcome;
pub mod place;
pub mod route;

pub use coordinates::{is_valid, GeoPoint};
pub use distance::{DistanceMeters, DurationSeconds};
pub use outcome::{MapOutcome, OutcomePayload};
pub use place::{Address, MapHealth, MapTypes, PlaceCategory, PlaceResult, PopularCategory};
pub use route::{RouteInstruction, RouteResult, TravelProfile};
