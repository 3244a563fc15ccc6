// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AgePreference, CompatibilitySignals, Coordinates, Decision, LocationFallback, MatchingOptions,
    UserProfile,
};
pub use requests::{DiscoverRequest, EvaluateRequest};
pub use responses::{DiscoverResponse, ErrorResponse, EvaluateResponse, HealthResponse};
