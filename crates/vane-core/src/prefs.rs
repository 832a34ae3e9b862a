//! User preferences persisted in the profile store.
//!
//! Unit preferences are stored as one JSON object, the theme as a bare
//! string. Missing or corrupt entries fall back to defaults, and the
//! defaults are written back so the next session starts from a known state.

use serde::{Deserialize, Serialize};

use crate::store::KeyValueStore;

pub const PREFERENCES_KEY: &str = "weather-app-preferences";
pub const THEME_KEY: &str = "theme";

/// Temperature unit requested from the forecast API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Value of the `temperature_unit` query parameter.
    pub fn as_api_param(&self) -> &'static str {
        match self {
            Self::Celsius => "celsius",
            Self::Fahrenheit => "fahrenheit",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindSpeedUnit {
    #[default]
    Kmh,
    Mph,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrecipitationUnit {
    #[default]
    Mm,
    In,
}

/// Display theme. Stored as a bare string, not JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::System => "system",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "system" => Some(Self::System),
            _ => None,
        }
    }
}

/// Measurement units, serialized as one JSON object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UnitPreferences {
    pub temperature_unit: TemperatureUnit,
    pub wind_speed_unit: WindSpeedUnit,
    pub precipitation_unit: PrecipitationUnit,
}

/// All persisted preferences, loaded once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Preferences {
    pub units: UnitPreferences,
    pub theme: Theme,
}

impl Preferences {
    /// Load preferences, writing defaults back for anything missing or
    /// unreadable.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let units = match store.get(PREFERENCES_KEY) {
            Some(raw) => match serde_json::from_str(&raw) {
                Ok(units) => units,
                Err(e) => {
                    tracing::warn!("Stored unit preferences are unreadable, resetting: {}", e);
                    Self::write_back_units(store)
                }
            },
            None => Self::write_back_units(store),
        };

        let theme = match store.get(THEME_KEY) {
            Some(raw) => match Theme::parse(&raw) {
                Some(theme) => theme,
                None => {
                    tracing::warn!("Stored theme {:?} is not recognized, resetting", raw);
                    Self::write_back_theme(store)
                }
            },
            None => Self::write_back_theme(store),
        };

        Self { units, theme }
    }

    /// Persist the current unit preferences.
    pub fn save_units(&self, store: &dyn KeyValueStore) {
        persist_units(store, &self.units);
    }

    /// Persist the current theme.
    pub fn save_theme(&self, store: &dyn KeyValueStore) {
        if let Err(e) = store.set(THEME_KEY, self.theme.as_str()) {
            tracing::warn!("Failed to persist theme: {}", e);
        }
    }

    fn write_back_units(store: &dyn KeyValueStore) -> UnitPreferences {
        let units = UnitPreferences::default();
        persist_units(store, &units);
        units
    }

    fn write_back_theme(store: &dyn KeyValueStore) -> Theme {
        let theme = Theme::default();
        if let Err(e) = store.set(THEME_KEY, theme.as_str()) {
            tracing::warn!("Failed to persist default theme: {}", e);
        }
        theme
    }
}

fn persist_units(store: &dyn KeyValueStore, units: &UnitPreferences) {
    match serde_json::to_string(units) {
        Ok(json) => {
            if let Err(e) = store.set(PREFERENCES_KEY, &json) {
                tracing::warn!("Failed to persist unit preferences: {}", e);
            }
        }
        Err(e) => tracing::warn!("Failed to serialize unit preferences: {}", e),
    }
}
