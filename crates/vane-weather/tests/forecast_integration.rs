//! Integration tests for the forecast service: a config-built client and
//! the reactive session running against a mock Open-Meteo server.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::sync::Arc;

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vane_core::{Coordinates, ForecastConfig, TemperatureUnit};
use vane_weather::{ForecastClient, WeatherCondition, WeatherFailure, WeatherSession};

const BERLIN: Coordinates = Coordinates {
    latitude: 52.52,
    longitude: 13.405,
};

fn client(mock_server: &MockServer, cache_ttl_secs: u64) -> ForecastClient {
    ForecastClient::new(&ForecastConfig {
        base_url: mock_server.uri(),
        cache_ttl_secs,
        ..ForecastConfig::default()
    })
    .unwrap()
}

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
            "weathercode": [61],
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

#[tokio::test]
async fn test_fetch_requests_all_series() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("latitude", "52.52"))
        .and(query_param("longitude", "13.405"))
        .and(query_param("current_weather", "true"))
        .and(query_param("temperature_unit", "celsius"))
        .and(query_param("timezone", "auto"))
        .and(query_param("forecast_days", "7"))
        .and(query_param(
            "daily",
            "weathercode,temperature_2m_max,temperature_2m_min,sunrise,sunset,\
             precipitation_probability_max,windspeed_10m_max,uv_index_max",
        ))
        .and(query_param(
            "hourly",
            "temperature_2m,relativehumidity_2m,precipitation_probability,weathercode,\
             windspeed_10m,winddirection_10m,is_day",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(21.4)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client(&mock_server, 3600);
    let payload = client.fetch(BERLIN, TemperatureUnit::Celsius).await.unwrap();

    assert_eq!(payload.current_weather.temperature, 21.4);
    assert_eq!(payload.current_condition(), WeatherCondition::PartlyCloudy);
    assert_eq!(payload.daily.weathercode, vec![61]);
    assert!(payload.is_aligned());
}

#[tokio::test]
async fn test_session_delivers_forecast() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(21.4)))
        .mount(&mock_server)
        .await;

    let session = WeatherSession::new(
        Arc::new(client(&mock_server, 3600)),
        TemperatureUnit::Celsius,
    );
    let mut rx = session.subscribe();

    assert_eq!(
        session.state().error,
        Some(WeatherFailure::NoLocationSelected)
    );

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
async fn test_unit_switch_refetches_in_new_unit() {
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

    let session = WeatherSession::new(
        Arc::new(client(&mock_server, 3600)),
        TemperatureUnit::Celsius,
    );
    let mut rx = session.subscribe();

    session.set_coordinates(Some(BERLIN));
    rx.wait_for(|state| {
        state
            .data
            .as_ref()
            .is_some_and(|d| d.current_weather.temperature == 20.0)
    })
    .await
    .unwrap();

    session.set_temperature_unit(TemperatureUnit::Fahrenheit);
    rx.wait_for(|state| {
        state
            .data
            .as_ref()
            .is_some_and(|d| d.current_weather.temperature == 68.0)
    })
    .await
    .unwrap();

    assert_eq!(mock_server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_config_cache_ttl_serves_refresh_from_cache() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(21.4)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = WeatherSession::new(
        Arc::new(client(&mock_server, 3600)),
        TemperatureUnit::Celsius,
    );
    let mut rx = session.subscribe();

    session.set_coordinates(Some(BERLIN));
    let first = rx
        .wait_for(|state| !state.loading && state.data.is_some())
        .await
        .unwrap()
        .clone();

    session.refresh_weather();
    let state = rx
        .wait_for(|state| !state.loading && state.last_updated != first.last_updated)
        .await
        .unwrap()
        .clone();

    assert!(state.last_updated > first.last_updated);
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_api_error_surfaces_user_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let session = WeatherSession::new(
        Arc::new(client(&mock_server, 3600)),
        TemperatureUnit::Celsius,
    );
    let mut rx = session.subscribe();

    session.set_coordinates(Some(BERLIN));
    let state = rx
        .wait_for(|state| !state.loading && matches!(state.error, Some(WeatherFailure::Fetch(_))))
        .await
        .unwrap()
        .clone();

    let error = state.error.unwrap();
    assert_eq!(
        error.user_message(),
        "Failed to fetch weather data. Please try again later."
    );
    match error {
        WeatherFailure::Fetch(detail) => assert!(detail.contains("500")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(state.data.is_none());
}
