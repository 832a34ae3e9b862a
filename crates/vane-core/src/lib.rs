//! Core pieces shared by the location and weather crates: coordinate and
//! preference types, the persistent profile store, and configuration.

pub mod config;
pub mod prefs;
pub mod store;
pub mod types;

pub use config::{Config, ForecastConfig, GeocodingConfig, SearchConfig, ValidationResult};
pub use prefs::{
    PrecipitationUnit, Preferences, TemperatureUnit, Theme, UnitPreferences, WindSpeedUnit,
};
pub use store::{KeyValueStore, MemoryStore, SqliteStore};
pub use types::Coordinates;

use anyhow::Result;

/// Initialize the core application
pub fn init() -> Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Vane core initialized");
    Ok(())
}
