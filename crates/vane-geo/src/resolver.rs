//! Device geolocation with persistence and permission memory.
//!
//! The resolver owns the decision of when to ask the platform for a
//! position. Coordinates from an earlier session are adopted without a
//! prompt. If permission was already requested once, the resolver holds
//! instead of prompting again and waits for an explicit user action.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::instrument;

use vane_core::{Coordinates, KeyValueStore};

use crate::error::GeolocationError;
use crate::location::{LocationProvider, PositionRequest};

pub const COORDINATES_KEY: &str = "weather-app-coordinates";
pub const PERMISSION_REQUESTED_KEY: &str = "location-permission-requested";

/// Where the resolver stands with respect to a usable position.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GeolocationStatus {
    /// Waiting on the user or the platform.
    #[default]
    Pending,
    /// Coordinates are current and usable.
    Ready,
    /// The last attempt failed.
    Failed(GeolocationError),
}

/// Observable resolver state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeolocationState {
    pub coordinates: Option<Coordinates>,
    pub status: GeolocationStatus,
}

/// Startup options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolverOptions {
    /// Ignore persisted coordinates and resolve from scratch.
    pub skip_cache: bool,
}

pub struct GeolocationResolver {
    provider: Arc<dyn LocationProvider>,
    store: Arc<dyn KeyValueStore>,
    state_tx: watch::Sender<GeolocationState>,
    auto_request: AtomicBool,
}

impl GeolocationResolver {
    /// Build a resolver and work out its starting state.
    ///
    /// Persisted coordinates short-circuit to `Ready`. If permission was
    /// requested in an earlier session the resolver holds at `Pending`
    /// rather than prompting again; otherwise the first call to
    /// [`initialize`](Self::initialize) triggers one automatic request.
    pub fn new(
        provider: Arc<dyn LocationProvider>,
        store: Arc<dyn KeyValueStore>,
        options: ResolverOptions,
    ) -> Self {
        let cached = if options.skip_cache {
            None
        } else {
            Self::load_cached(store.as_ref())
        };

        let (state, auto_request) = if let Some(coordinates) = cached {
            (
                GeolocationState {
                    coordinates: Some(coordinates),
                    status: GeolocationStatus::Ready,
                },
                false,
            )
        } else if Self::memo_set(store.as_ref()) {
            (GeolocationState::default(), false)
        } else {
            (GeolocationState::default(), true)
        };

        let (state_tx, _) = watch::channel(state);

        Self {
            provider,
            store,
            state_tx,
            auto_request: AtomicBool::new(auto_request),
        }
    }

    /// Run the automatic position request, at most once per resolver.
    pub async fn initialize(&self) {
        if self.auto_request.swap(false, Ordering::SeqCst) {
            self.request_geolocation().await;
        }
    }

    /// Ask the platform for the current position.
    ///
    /// Existing coordinates stay visible while the request is in flight.
    /// On failure they are cleared so a stale position is never mistaken
    /// for a current one.
    #[instrument(skip(self), level = "info")]
    pub async fn request_geolocation(&self) {
        self.state_tx.send_modify(|state| {
            state.status = GeolocationStatus::Pending;
        });

        // An unsupported platform fails without burning the one-time
        // permission memo; a capable build can still auto-request later.
        if !self.provider.is_supported() {
            tracing::warn!("Geolocation is not supported on this platform");
            self.state_tx.send_replace(GeolocationState {
                coordinates: None,
                status: GeolocationStatus::Failed(GeolocationError::Unsupported),
            });
            return;
        }

        self.mark_requested();

        match self.provider.current_position(PositionRequest::default()).await {
            Ok(coordinates) => {
                self.persist_coordinates(coordinates);
                self.state_tx.send_replace(GeolocationState {
                    coordinates: Some(coordinates),
                    status: GeolocationStatus::Ready,
                });
            }
            Err(e) => {
                tracing::warn!("Position request failed: {}", e);
                self.state_tx.send_replace(GeolocationState {
                    coordinates: None,
                    status: GeolocationStatus::Failed(e),
                });
            }
        }
    }

    /// Adopt coordinates the user chose explicitly (e.g. from search),
    /// bypassing the permission flow entirely.
    pub fn set_manual_coordinates(&self, coordinates: Coordinates) {
        self.persist_coordinates(coordinates);
        self.state_tx.send_replace(GeolocationState {
            coordinates: Some(coordinates),
            status: GeolocationStatus::Ready,
        });
    }

    /// Whether any earlier session already asked for permission.
    pub fn has_requested_before(&self) -> bool {
        Self::memo_set(self.store.as_ref())
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> GeolocationState {
        self.state_tx.borrow().clone()
    }

    /// Watch for state changes.
    pub fn subscribe(&self) -> watch::Receiver<GeolocationState> {
        self.state_tx.subscribe()
    }

    fn mark_requested(&self) {
        if let Err(e) = self.store.set(PERMISSION_REQUESTED_KEY, "true") {
            tracing::warn!("Failed to persist permission memo: {}", e);
        }
    }

    fn persist_coordinates(&self, coordinates: Coordinates) {
        match serde_json::to_string(&coordinates) {
            Ok(json) => {
                if let Err(e) = self.store.set(COORDINATES_KEY, &json) {
                    tracing::warn!("Failed to persist coordinates: {}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to serialize coordinates: {}", e),
        }
    }

    fn load_cached(store: &dyn KeyValueStore) -> Option<Coordinates> {
        let raw = store.get(COORDINATES_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(coordinates) => Some(coordinates),
            Err(e) => {
                tracing::warn!("Stored coordinates are unreadable, ignoring: {}", e);
                None
            }
        }
    }

    fn memo_set(store: &dyn KeyValueStore) -> bool {
        store.get(PERMISSION_REQUESTED_KEY).as_deref() == Some("true")
    }
}
