use async_trait::async_trait;

use crate::core::ports::{LocationError, LocationProvider};
use crate::models::Coordinates;

/// Always reports the same position
#[derive(Debug, Clone, Copy)]
pub struct FixedLocationProvider {
    coordinates: Coordinates,
}

impl FixedLocationProvider {
    pub fn new(coordinates: Coordinates) -> Self {
        Self { coordinates }
    }
}

#[async_trait]
impl LocationProvider for FixedLocationProvider {
    async fn current_coordinates(&self) -> Result<Coordinates, LocationError> {
        Ok(self.coordinates)
    }
}

/// Position reported by the calling device along with its request
///
/// A caller that did not share its position is treated as having denied
/// location access.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLocationProvider {
    coordinates: Option<Coordinates>,
}

impl RequestLocationProvider {
    pub fn new(coordinates: Option<Coordinates>) -> Self {
        Self { coordinates }
    }
}

#[async_trait]
impl LocationProvider for RequestLocationProvider {
    async fn current_coordinates(&self) -> Result<Coordinates, LocationError> {
        self.coordinates.ok_or(LocationError::Denied)
    }
}

/// For hosts with no notion of a device position
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableLocationProvider;

#[async_trait]
impl LocationProvider for UnavailableLocationProvider {
    async fn current_coordinates(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::Unavailable("no location source configured".to_string()))
    }
}
