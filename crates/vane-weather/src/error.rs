//! Forecast-specific error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Forecast API error: {0}")]
    Api(String),
}

impl WeatherError {
    /// User-friendly error message for UI display. Same wording for every
    /// variant; the detail goes to the logs.
    pub fn user_message(&self) -> &'static str {
        "Failed to fetch weather data. Please try again later."
    }
}
