use serde::{Deserialize, Serialize};

/// Weather condition categories mapped from WMO codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeatherCondition {
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Thunderstorm,
    #[default]
    Unknown,
}

impl WeatherCondition {
    /// Convert WMO weather code to WeatherCondition
    /// See: https://open-meteo.com/en/docs#weathervariables
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1..=2 => Self::PartlyCloudy,
            3 => Self::Cloudy,
            45 | 48 => Self::Fog,
            51..=57 => Self::Drizzle,
            61..=67 | 80..=82 => Self::Rain,
            71..=77 | 85..=86 => Self::Snow,
            95..=99 => Self::Thunderstorm,
            _ => Self::Unknown,
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Thunderstorm => "Thunderstorm",
            Self::Unknown => "Unknown",
        }
    }
}

/// Snapshot conditions as reported by the API.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temperature: f64,
    pub windspeed: f64,
    pub winddirection: f64,
    pub weathercode: i32,
    pub is_day: u8,
    pub time: String,
}

/// Daily forecast series, one entry per day across all columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DailyForecast {
    pub time: Vec<String>,
    pub weathercode: Vec<i32>,
    pub temperature_2m_max: Vec<f64>,
    pub temperature_2m_min: Vec<f64>,
    pub sunrise: Vec<String>,
    pub sunset: Vec<String>,
    pub precipitation_probability_max: Vec<f64>,
    pub windspeed_10m_max: Vec<f64>,
    pub uv_index_max: Vec<f64>,
}

impl DailyForecast {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Whether every column has one entry per day.
    pub fn is_aligned(&self) -> bool {
        let days = self.time.len();
        [
            self.weathercode.len(),
            self.temperature_2m_max.len(),
            self.temperature_2m_min.len(),
            self.sunrise.len(),
            self.sunset.len(),
            self.precipitation_probability_max.len(),
            self.windspeed_10m_max.len(),
            self.uv_index_max.len(),
        ]
        .iter()
        .all(|&len| len == days)
    }
}

/// Hourly forecast series, one entry per hour across all columns.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub time: Vec<String>,
    pub temperature_2m: Vec<f64>,
    pub relativehumidity_2m: Vec<f64>,
    pub precipitation_probability: Vec<f64>,
    pub weathercode: Vec<i32>,
    pub windspeed_10m: Vec<f64>,
    pub winddirection_10m: Vec<f64>,
    pub is_day: Vec<u8>,
}

impl HourlyForecast {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Whether every column has one entry per hour.
    pub fn is_aligned(&self) -> bool {
        let hours = self.time.len();
        [
            self.temperature_2m.len(),
            self.relativehumidity_2m.len(),
            self.precipitation_probability.len(),
            self.weathercode.len(),
            self.windspeed_10m.len(),
            self.winddirection_10m.len(),
            self.is_day.len(),
        ]
        .iter()
        .all(|&len| len == hours)
    }
}

/// Complete forecast response for one position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPayload {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    pub timezone_abbreviation: String,
    pub current_weather: CurrentWeather,
    pub daily: DailyForecast,
    pub hourly: HourlyForecast,
}

impl ForecastPayload {
    /// Whether the daily and hourly series are internally consistent.
    pub fn is_aligned(&self) -> bool {
        self.daily.is_aligned() && self.hourly.is_aligned()
    }

    /// Condition category for the current weather code.
    pub fn current_condition(&self) -> WeatherCondition {
        WeatherCondition::from_wmo_code(self.current_weather.weathercode)
    }
}
