//! Collaborator interfaces consumed by the matching core
//!
//! The profile store and the location provider live outside the core. Any
//! backend implementing these traits can drive discovery.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Coordinates, UserProfile};

/// Errors a profile store can report
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Profile not found: {0}")]
    NotFound(String),

    #[error("Profile store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid profile data: {0}")]
    InvalidData(String),
}

/// Errors a location provider can report
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    Denied,

    #[error("Location unavailable: {0}")]
    Unavailable(String),

    #[error("Location request timed out")]
    TimedOut,
}

/// Read access to user profiles
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch a single profile by id
    async fn get(&self, id: &str) -> Result<UserProfile, StoreError>;

    /// Fetch every profile except the one with the given id, in store order
    async fn query_all_except(&self, id: &str) -> Result<Vec<UserProfile>, StoreError>;
}

/// Source of the current device position
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_coordinates(&self) -> Result<Coordinates, LocationError>;
}
