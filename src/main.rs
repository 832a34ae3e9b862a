use std::sync::Arc;

use anyhow::{Context, Result};

use vane_core::{Config, KeyValueStore, Preferences, SqliteStore};
use vane_geo::{
    GeocodingClient, GeolocationResolver, GeolocationStatus, ResolverOptions,
    SearchSuggestionController, SystemLocationProvider,
};
use vane_weather::{ForecastClient, ForecastPayload, WeatherCondition, WeatherSession};

#[tokio::main]
async fn main() -> Result<()> {
    vane_core::init()?;

    let (config, _validation) = Config::load_validated()?;
    std::fs::create_dir_all(&config.config_dir).context("Failed to create config directory")?;

    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::new(config.profile_db_path())?);
    let prefs = Preferences::load(store.as_ref());

    let geocoder = GeocodingClient::new(&config.geocoding)?;
    let forecast = Arc::new(ForecastClient::new(&config.forecast)?);

    let resolver = GeolocationResolver::new(
        Arc::new(SystemLocationProvider),
        store.clone(),
        ResolverOptions::default(),
    );
    let session = WeatherSession::new(forecast, prefs.units.temperature_unit);
    let mut weather_rx = session.subscribe();

    tracing::info!("Vane started");

    let query = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if query.is_empty() {
        resolver.initialize().await;
    } else {
        let (controller, mut selections) =
            SearchSuggestionController::new(geocoder.clone(), store.clone(), config.search.clone());
        controller.input(&query);
        controller.submit().await;

        match controller.state().suggestions.first() {
            Some(suggestion) => {
                controller.select(suggestion);
                if let Some(selection) = selections.recv().await {
                    println!("Selected {}", selection.display_name);
                    resolver.set_manual_coordinates(selection.coordinates);
                }
            }
            None => {
                println!("No locations found for {query:?}");
                return Ok(());
            }
        }
    }

    let location = resolver.state();
    let Some(coordinates) = location.coordinates else {
        if let GeolocationStatus::Failed(error) = location.status {
            println!("{}", error.user_message());
        }
        println!("Pass a place name to search, e.g. `vane berlin`.");
        return Ok(());
    };

    session.set_coordinates(Some(coordinates));
    let weather = weather_rx
        .wait_for(|state| !state.loading && (state.data.is_some() || state.error.is_some()))
        .await
        .context("Weather session closed")?
        .clone();

    if let Some(error) = weather.error {
        println!("{}", error.user_message());
        return Ok(());
    }

    let place = geocoder.reverse_search(&coordinates).await;
    println!("{place} ({coordinates})");
    if let Some(payload) = weather.data {
        print_forecast(&payload, prefs.units.temperature_unit.symbol());
    }
    if let Some(updated) = weather.last_updated {
        println!("Updated {}", updated.format("%H:%M UTC"));
    }

    Ok(())
}

fn print_forecast(payload: &ForecastPayload, symbol: &str) {
    let current = &payload.current_weather;
    println!(
        "{:.1}{symbol} {} wind {:.0} km/h",
        current.temperature,
        WeatherCondition::from_wmo_code(current.weathercode).description(),
        current.windspeed,
    );

    for (i, day) in payload.daily.time.iter().enumerate() {
        let max = payload.daily.temperature_2m_max.get(i).copied().unwrap_or(f64::NAN);
        let min = payload.daily.temperature_2m_min.get(i).copied().unwrap_or(f64::NAN);
        let code = payload.daily.weathercode.get(i).copied().unwrap_or(-1);
        println!(
            "  {day}  {min:.0}{symbol} / {max:.0}{symbol}  {}",
            WeatherCondition::from_wmo_code(code).description()
        );
    }
}
