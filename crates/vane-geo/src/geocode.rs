//! Forward and reverse geocoding against Nominatim (OpenStreetMap).
//!
//! Geocoding soft-fails: a request that errors out yields an empty
//! suggestion list or a placeholder name instead of an error. The search
//! box and the location header degrade gracefully while the rest of the
//! app keeps working.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use vane_core::{Coordinates, GeocodingConfig};

const UNKNOWN_LOCATION: &str = "Unknown Location";

/// One entry in the search suggestion list.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSuggestion {
    pub display_name: String,
    pub coordinates: Coordinates,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    display_name: String,
    // Nominatim returns coordinates as strings
    lat: String,
    lon: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResult {
    address: Option<ReverseAddress>,
    display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ReverseAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    hamlet: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GeocodingClient {
    client: Client,
    base_url: String,
    max_results: u8,
}

impl GeocodingClient {
    /// Build a client from config. Nominatim's usage policy requires an
    /// identifying User-Agent, so it is set on every request.
    pub fn new(config: &GeocodingConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_results: config.max_results,
        })
    }

    #[cfg(test)]
    pub fn new_with_base_url(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            max_results: 5,
        }
    }

    /// Search for places matching a free-form query.
    ///
    /// Returns at most `max_results` suggestions. Failures yield an empty
    /// list so callers can treat "no results" and "search unavailable" the
    /// same way.
    #[instrument(skip(self), level = "debug")]
    pub async fn forward_search(&self, query: &str) -> Vec<LocationSuggestion> {
        let url = format!("{}/search", self.base_url);
        let limit = self.max_results.to_string();

        let response = match self
            .client
            .get(&url)
            .query(&[("q", query), ("format", "json"), ("limit", limit.as_str())])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Forward geocode request failed: {}", e);
                return Vec::new();
            }
        };

        if !response.status().is_success() {
            tracing::debug!("Forward geocode returned status {}", response.status());
            return Vec::new();
        }

        let results: Vec<SearchResult> = match response.json().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Forward geocode parse error: {}", e);
                return Vec::new();
            }
        };

        results
            .into_iter()
            .filter_map(|r| {
                let latitude = r.lat.parse::<f64>().ok()?;
                let longitude = r.lon.parse::<f64>().ok()?;
                Some(LocationSuggestion {
                    display_name: r.display_name,
                    coordinates: Coordinates::new(latitude, longitude),
                })
            })
            .take(self.max_results as usize)
            .collect()
    }

    /// Reverse geocode coordinates to a human-readable place name
    /// (e.g. "Seattle, United States").
    ///
    /// Never fails: falls back to a trimmed `display_name`, then to
    /// "Unknown Location".
    #[instrument(skip(self), level = "debug")]
    pub async fn reverse_search(&self, coordinates: &Coordinates) -> String {
        let url = format!("{}/reverse", self.base_url);
        let lat = coordinates.latitude.to_string();
        let lon = coordinates.longitude.to_string();

        let response = match self
            .client
            .get(&url)
            .query(&[("lat", lat.as_str()), ("lon", lon.as_str()), ("format", "json")])
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!("Reverse geocode request failed: {}", e);
                return UNKNOWN_LOCATION.to_string();
            }
        };

        if !response.status().is_success() {
            tracing::debug!("Reverse geocode returned status {}", response.status());
            return UNKNOWN_LOCATION.to_string();
        }

        let body: ReverseResult = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!("Reverse geocode parse error: {}", e);
                return UNKNOWN_LOCATION.to_string();
            }
        };

        let name = format_place(body);
        tracing::debug!("Reverse geocoded to: {}", name);
        name
    }
}

/// Prefer city > town > village > hamlet paired with the country; fall back
/// to the first two comma-separated pieces of the full display name.
fn format_place(body: ReverseResult) -> String {
    let address = body.address.unwrap_or_default();
    let place = address.city.or(address.town).or(address.village).or(address.hamlet);

    match (place, address.country) {
        (Some(place), Some(country)) => format!("{}, {}", place, country),
        _ => body
            .display_name
            .filter(|name| !name.trim().is_empty())
            .map(|name| name.split(',').take(2).collect::<Vec<_>>().join(","))
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string()),
    }
}
