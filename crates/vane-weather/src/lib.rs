//! Weather service for Vane.
//!
//! Fetches Open-Meteo forecasts with a TTL cache keyed on coordinates and
//! temperature unit, and drives a reactive session that turns location and
//! unit changes into observable weather state.

pub mod cache;
pub mod client;
pub mod error;
pub mod session;
pub mod types;

pub use cache::ForecastCache;
pub use client::ForecastClient;
pub use error::WeatherError;
pub use session::{WeatherFailure, WeatherSession, WeatherState};
pub use types::*;
