//! Open-Meteo forecast client with TTL caching.

use std::time::Duration;

use reqwest::Client;
use tracing::instrument;

use vane_core::{Coordinates, ForecastConfig, TemperatureUnit};

use crate::cache::ForecastCache;
use crate::error::WeatherError;
use crate::types::ForecastPayload;

/// Daily series requested from the API, in column order.
const DAILY_FIELDS: &str = "weathercode,temperature_2m_max,temperature_2m_min,sunrise,sunset,precipitation_probability_max,windspeed_10m_max,uv_index_max";

/// Hourly series requested from the API.
const HOURLY_FIELDS: &str = "temperature_2m,relativehumidity_2m,precipitation_probability,weathercode,windspeed_10m,winddirection_10m,is_day";

#[derive(Debug)]
pub struct ForecastClient {
    client: Client,
    base_url: String,
    forecast_days: u8,
    cache: ForecastCache,
}

impl ForecastClient {
    pub fn new(config: &ForecastConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            forecast_days: config.forecast_days,
            cache: ForecastCache::new(Duration::from_secs(config.cache_ttl_secs)),
        })
    }

    #[cfg(test)]
    pub fn new_with_base_url(base_url: &str, cache_ttl: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            forecast_days: 7,
            cache: ForecastCache::new(cache_ttl),
        }
    }

    /// Fetch the forecast for a position, serving a cached payload when one
    /// is still fresh for exactly this position and unit.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch(
        &self,
        coordinates: Coordinates,
        unit: TemperatureUnit,
    ) -> Result<ForecastPayload, WeatherError> {
        if let Some(payload) = self.cache.get(coordinates, unit) {
            tracing::debug!("Serving forecast from cache");
            return Ok(payload);
        }

        let url = format!("{}/forecast", self.base_url);
        let latitude = coordinates.latitude.to_string();
        let longitude = coordinates.longitude.to_string();
        let forecast_days = self.forecast_days.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("current_weather", "true"),
                ("temperature_unit", unit.as_api_param()),
                ("timezone", "auto"),
                ("daily", DAILY_FIELDS),
                ("hourly", HOURLY_FIELDS),
                ("forecast_days", forecast_days.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(WeatherError::Api(format!("{}: {}", status, text)));
        }

        let payload: ForecastPayload = response
            .json()
            .await
            .map_err(|e| WeatherError::Api(format!("JSON parse error: {}", e)))?;

        if !payload.is_aligned() {
            tracing::warn!("Forecast series lengths are misaligned; passing payload through");
        }

        self.cache.insert(coordinates, unit, payload.clone());
        Ok(payload)
    }
}
