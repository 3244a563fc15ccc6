//! HabiBeats Match - compatibility matching and candidate discovery
//!
//! This library decides whether two HabiBeats users are a candidate match
//! and discovers the undecided, compatible candidates for a user.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{CompatibilityEvaluator, DiscoveryError, DiscoveryOutcome, DiscoveryPipeline, haversine_miles};
pub use crate::models::{CompatibilitySignals, Coordinates, Decision, MatchingOptions, UserProfile};
