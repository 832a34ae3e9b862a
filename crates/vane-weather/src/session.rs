//! Reactive weather session: coordinates and unit in, forecast state out.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;

use vane_core::{Coordinates, TemperatureUnit};

use crate::client::ForecastClient;
use crate::types::ForecastPayload;

/// Why the session has no fresh forecast.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WeatherFailure {
    #[error("No location selected")]
    NoLocationSelected,

    #[error("Forecast fetch failed: {0}")]
    Fetch(String),
}

impl WeatherFailure {
    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NoLocationSelected => {
                "No location selected. Please choose a location to see weather data."
            }
            Self::Fetch(_) => "Failed to fetch weather data. Please try again later.",
        }
    }
}

/// Observable session state.
///
/// `data` survives failures: a fetch error or a cleared location sets
/// `error` but leaves the last good payload in place for display.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WeatherState {
    pub data: Option<ForecastPayload>,
    pub loading: bool,
    pub error: Option<WeatherFailure>,
    /// When the last successful fetch landed. Untouched by failures.
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SessionInputs {
    coordinates: Option<Coordinates>,
    unit: TemperatureUnit,
}

struct SessionInner {
    client: Arc<ForecastClient>,
    state_tx: watch::Sender<WeatherState>,
    inputs: Mutex<SessionInputs>,
    generation: AtomicU64,
}

/// Drives forecast fetches from (coordinates, unit) changes.
///
/// Input changes are equality-guarded so re-selecting the same location is
/// free. Every trigger bumps a generation counter and a completed fetch is
/// applied only if its generation is still current, so with overlapping
/// fetches the last writer wins.
#[derive(Clone)]
pub struct WeatherSession {
    inner: Arc<SessionInner>,
}

impl WeatherSession {
    pub fn new(client: Arc<ForecastClient>, unit: TemperatureUnit) -> Self {
        let initial = WeatherState {
            error: Some(WeatherFailure::NoLocationSelected),
            ..WeatherState::default()
        };
        let (state_tx, _) = watch::channel(initial);

        Self {
            inner: Arc::new(SessionInner {
                client,
                state_tx,
                inputs: Mutex::new(SessionInputs {
                    coordinates: None,
                    unit,
                }),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Point the session at new coordinates. `None` drops back to the
    /// no-location state without touching any fetched data.
    pub fn set_coordinates(&self, coordinates: Option<Coordinates>) {
        {
            let mut inputs = self.inner.inputs.lock();
            if inputs.coordinates == coordinates {
                return;
            }
            inputs.coordinates = coordinates;
        }
        self.trigger();
    }

    /// Switch the temperature unit, refetching in the new unit.
    pub fn set_temperature_unit(&self, unit: TemperatureUnit) {
        {
            let mut inputs = self.inner.inputs.lock();
            if inputs.unit == unit {
                return;
            }
            inputs.unit = unit;
        }
        self.trigger();
    }

    /// Fetch again with the current inputs.
    pub fn refresh_weather(&self) {
        self.trigger();
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> WeatherState {
        self.inner.state_tx.borrow().clone()
    }

    /// Watch for state changes.
    pub fn subscribe(&self) -> watch::Receiver<WeatherState> {
        self.inner.state_tx.subscribe()
    }

    fn trigger(&self) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let inputs = *self.inner.inputs.lock();

        let Some(coordinates) = inputs.coordinates else {
            // No network round trip; fetched data stays for display.
            self.inner.state_tx.send_modify(|state| {
                state.loading = false;
                state.error = Some(WeatherFailure::NoLocationSelected);
            });
            return;
        };

        self.inner.state_tx.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        let session = self.clone();
        tokio::spawn(async move {
            let result = session.inner.client.fetch(coordinates, inputs.unit).await;

            if session.inner.generation.load(Ordering::SeqCst) != generation {
                tracing::debug!("Dropping stale forecast result");
                return;
            }

            match result {
                Ok(payload) => {
                    session.inner.state_tx.send_modify(|state| {
                        state.data = Some(payload);
                        state.loading = false;
                        state.error = None;
                        state.last_updated = Some(Utc::now());
                    });
                }
                Err(e) => {
                    tracing::warn!("Forecast fetch failed: {}", e);
                    session.inner.state_tx.send_modify(|state| {
                        state.loading = false;
                        state.error = Some(WeatherFailure::Fetch(e.to_string()));
                    });
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BERLIN: Coordinates = Coordinates {
        latitude: 52.52,
        longitude: 13.405,
    };
    const PARIS: Coordinates = Coordinates {
        latitude: 48.8566,
        longitude: 2.3522,
    };

    fn forecast_body(temperature: f64) -> serde_json::Value {
        serde_json::json!({
            "latitude": 52.52,
            "longitude": 13.405,
            "timezone": "Europe/Berlin",
            "timezone_abbreviation": "CEST",
            "current_weather": {
                "temperature": temperature,
                "windspeed": 11.2,
                "winddirection": 220.0,
                "weathercode": 2,
                "is_day": 1,
                "time": "2026-08-23T12:00"
            },
            "daily": {
                "time": ["2026-08-23"],
                "weathercode": [2],
                "temperature_2m_max": [24.0],
                "temperature_2m_min": [14.0],
                "sunrise": ["2026-08-23T06:14"],
                "sunset": ["2026-08-23T20:12"],
                "precipitation_probability_max": [20.0],
                "windspeed_10m_max": [18.0],
                "uv_index_max": [5.2]
            },
            "hourly": {
                "time": ["2026-08-23T12:00"],
                "temperature_2m": [21.4],
                "relativehumidity_2m": [60.0],
                "precipitation_probability": [10.0],
                "weathercode": [2],
                "windspeed_10m": [12.0],
                "winddirection_10m": [220.0],
                "is_day": [1]
            }
        })
    }

    fn test_session(mock_server: &MockServer, cache_ttl: Duration) -> WeatherSession {
        let client = Arc::new(ForecastClient::new_with_base_url(&mock_server.uri(), cache_ttl));
        WeatherSession::new(client, TemperatureUnit::Celsius)
    }

    #[tokio::test]
    async fn test_starts_with_no_location_selected() {
        let mock_server = MockServer::start().await;
        let session = test_session(&mock_server, Duration::from_secs(3600));

        let state = session.state();
        assert!(state.data.is_none());
        assert!(!state.loading);
        assert!(state.last_updated.is_none());

        let error = state.error.unwrap();
        assert_eq!(error, WeatherFailure::NoLocationSelected);
        assert_eq!(
            error.user_message(),
            "No location selected. Please choose a location to see weather data."
        );

        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_coordinates_trigger_fetch() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(21.4)))
            .mount(&mock_server)
            .await;

        let session = test_session(&mock_server, Duration::from_secs(3600));
        let mut rx = session.subscribe();

        session.set_coordinates(Some(BERLIN));

        let state = rx
            .wait_for(|state| !state.loading && state.data.is_some())
            .await
            .unwrap()
            .clone();
        assert_eq!(state.data.unwrap().current_weather.temperature, 21.4);
        assert!(state.last_updated.is_some());
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn test_loading_flag_during_fetch() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(100))
                    .set_body_json(forecast_body(21.4)),
            )
            .mount(&mock_server)
            .await;

        let session = test_session(&mock_server, Duration::from_secs(3600));
        let mut rx = session.subscribe();

        session.set_coordinates(Some(BERLIN));

        let loading = rx.wait_for(|state| state.loading).await.unwrap().clone();
        assert_eq!(loading.error, None);

        let done = rx
            .wait_for(|state| !state.loading && state.data.is_some())
            .await
            .unwrap()
            .clone();
        assert!(done.data.is_some());
    }

    #[tokio::test]
    async fn test_failed_first_fetch_has_no_data() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let session = test_session(&mock_server, Duration::from_secs(3600));
        let mut rx = session.subscribe();

        session.set_coordinates(Some(BERLIN));

        let state = rx
            .wait_for(|state| !state.loading && matches!(state.error, Some(WeatherFailure::Fetch(_))))
            .await
            .unwrap()
            .clone();
        assert!(state.data.is_none());
        assert!(state.last_updated.is_none());
        assert_eq!(
            state.error.unwrap().user_message(),
            "Failed to fetch weather data. Please try again later."
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_retains_stale_data() {
        let mock_server = MockServer::start().await;

        // First fetch succeeds, everything after that fails.
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(21.4)))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let session = test_session(&mock_server, Duration::ZERO);
        let mut rx = session.subscribe();

        session.set_coordinates(Some(BERLIN));
        let first = rx
            .wait_for(|state| !state.loading && state.data.is_some())
            .await
            .unwrap()
            .clone();
        let first_updated = first.last_updated;

        session.refresh_weather();
        let state = rx
            .wait_for(|state| !state.loading && matches!(state.error, Some(WeatherFailure::Fetch(_))))
            .await
            .unwrap()
            .clone();

        // The old payload is still there for display.
        assert_eq!(state.data.unwrap().current_weather.temperature, 21.4);
        assert_eq!(state.last_updated, first_updated);
    }

    #[tokio::test]
    async fn test_unchanged_inputs_do_not_refetch() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(21.4)))
            .expect(1)
            .mount(&mock_server)
            .await;

        let session = test_session(&mock_server, Duration::from_secs(3600));
        let mut rx = session.subscribe();

        session.set_coordinates(Some(BERLIN));
        rx.wait_for(|state| !state.loading && state.data.is_some()).await.unwrap();

        session.set_coordinates(Some(BERLIN));
        session.set_temperature_unit(TemperatureUnit::Celsius);
        tokio::time::sleep(Duration::from_millis(50)).await;

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn test_unit_change_refetches() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("temperature_unit", "celsius"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(20.0)))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("temperature_unit", "fahrenheit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(68.0)))
            .expect(1)
            .mount(&mock_server)
            .await;

        let session = test_session(&mock_server, Duration::from_secs(3600));
        let mut rx = session.subscribe();

        session.set_coordinates(Some(BERLIN));
        rx.wait_for(|state| {
            state.data.as_ref().is_some_and(|d| d.current_weather.temperature == 20.0)
        })
        .await
        .unwrap();

        session.set_temperature_unit(TemperatureUnit::Fahrenheit);
        rx.wait_for(|state| {
            state.data.as_ref().is_some_and(|d| d.current_weather.temperature == 68.0)
        })
        .await
        .unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_updates_timestamp_even_from_cache() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(21.4)))
            .expect(1)
            .mount(&mock_server)
            .await;

        let session = test_session(&mock_server, Duration::from_secs(3600));
        let mut rx = session.subscribe();

        session.set_coordinates(Some(BERLIN));
        let first = rx
            .wait_for(|state| !state.loading && state.data.is_some())
            .await
            .unwrap()
            .clone();
        let first_updated = first.last_updated;

        tokio::time::sleep(Duration::from_millis(5)).await;
        session.refresh_weather();

        let state = rx
            .wait_for(|state| !state.loading && state.last_updated != first_updated)
            .await
            .unwrap()
            .clone();
        assert!(state.last_updated > first_updated);

        // Served from cache, so still only one request.
        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn test_last_writer_wins() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("latitude", "52.52"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(300))
                    .set_body_json(forecast_body(1.0)),
            )
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("latitude", "48.8566"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(2.0)))
            .mount(&mock_server)
            .await;

        let session = test_session(&mock_server, Duration::from_secs(3600));
        let mut rx = session.subscribe();

        session.set_coordinates(Some(BERLIN));
        tokio::time::sleep(Duration::from_millis(20)).await;
        session.set_coordinates(Some(PARIS));

        rx.wait_for(|state| {
            state.data.as_ref().is_some_and(|d| d.current_weather.temperature == 2.0)
        })
        .await
        .unwrap();

        // The slow first response lands later and must be discarded.
        tokio::time::sleep(Duration::from_millis(350)).await;
        let state = session.state();
        assert_eq!(state.data.unwrap().current_weather.temperature, 2.0);
        assert!(!state.loading);
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn test_clearing_location_keeps_data_without_fetching() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(21.4)))
            .mount(&mock_server)
            .await;

        let session = test_session(&mock_server, Duration::from_secs(3600));
        let mut rx = session.subscribe();

        session.set_coordinates(Some(BERLIN));
        rx.wait_for(|state| !state.loading && state.data.is_some()).await.unwrap();

        session.set_coordinates(None);

        let state = session.state();
        assert_eq!(state.error, Some(WeatherFailure::NoLocationSelected));
        assert!(state.data.is_some());
        assert!(!state.loading);

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }
}
