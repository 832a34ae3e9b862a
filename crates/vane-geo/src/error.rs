//! Geolocation-specific error types.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("Permission denied")]
    PermissionDenied,

    #[error("Position unavailable")]
    PositionUnavailable,

    #[error("Position request timed out")]
    Timeout,

    #[error("Geolocation not supported")]
    Unsupported,

    #[error("Unknown geolocation error")]
    Unknown,
}

impl GeolocationError {
    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "Location access was denied. Please enable location services for this app."
            }
            Self::PositionUnavailable => {
                "Location information is unavailable. Please try again later."
            }
            Self::Timeout => "The request to get your location timed out. Please try again.",
            Self::Unknown => "An unknown error occurred while trying to get your location.",
            Self::Unsupported => "Geolocation is not supported on this platform.",
        }
    }
}
