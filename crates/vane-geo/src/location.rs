//! Platform position providers.

use std::time::Duration;

use async_trait::async_trait;

use vane_core::Coordinates;

use crate::error::GeolocationError;

/// Options for a single position request.
#[derive(Debug, Clone, Copy)]
pub struct PositionRequest {
    /// Ask the platform for its best fix rather than a coarse one.
    pub high_accuracy: bool,
    /// How long to wait for a fix before giving up.
    pub timeout: Duration,
    /// Oldest platform-cached fix that is still acceptable.
    pub maximum_age: Duration,
}

impl Default for PositionRequest {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(3600),
        }
    }
}

/// Source of device positions.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Whether this platform can produce positions at all.
    fn is_supported(&self) -> bool;

    /// Resolve the current position, honoring the request options.
    async fn current_position(
        &self,
        request: PositionRequest,
    ) -> Result<Coordinates, GeolocationError>;
}

/// Provider for builds without a positioning backend.
// TODO: wire a GeoClue backend for Linux desktops
pub struct SystemLocationProvider;

#[async_trait]
impl LocationProvider for SystemLocationProvider {
    fn is_supported(&self) -> bool {
        false
    }

    async fn current_position(
        &self,
        _request: PositionRequest,
    ) -> Result<Coordinates, GeolocationError> {
        Err(GeolocationError::Unsupported)
    }
}
