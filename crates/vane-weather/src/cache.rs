//! In-memory forecast cache.
//!
//! Entries are keyed on the exact coordinate bit patterns plus the
//! temperature unit. Two positions differing only in the last decimal are
//! distinct entries, and a unit flip never serves data fetched in the
//! other unit.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use vane_core::{Coordinates, TemperatureUnit};

use crate::types::ForecastPayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    lat_bits: u64,
    lon_bits: u64,
    unit: TemperatureUnit,
}

impl CacheKey {
    fn new(coordinates: Coordinates, unit: TemperatureUnit) -> Self {
        Self {
            lat_bits: coordinates.latitude.to_bits(),
            lon_bits: coordinates.longitude.to_bits(),
            unit,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    payload: ForecastPayload,
    fetched_at: Instant,
}

/// TTL cache for forecast payloads.
#[derive(Debug)]
pub struct ForecastCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    ttl: Duration,
}

impl ForecastCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Fresh payload for exactly this position and unit, if one exists.
    pub fn get(&self, coordinates: Coordinates, unit: TemperatureUnit) -> Option<ForecastPayload> {
        let entries = self.entries.lock();
        let entry = entries.get(&CacheKey::new(coordinates, unit))?;
        if entry.fetched_at.elapsed() < self.ttl {
            Some(entry.payload.clone())
        } else {
            None
        }
    }

    /// Store a payload, replacing any earlier entry for the same key.
    pub fn insert(&self, coordinates: Coordinates, unit: TemperatureUnit, payload: ForecastPayload) {
        self.entries.lock().insert(
            CacheKey::new(coordinates, unit),
            CacheEntry {
                payload,
                fetched_at: Instant::now(),
            },
        );
    }
}
