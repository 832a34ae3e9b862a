//! Debounced location search with persisted history.
//!
//! Keystrokes are fed to [`SearchSuggestionController::input`]; a fetch
//! fires only after the configured quiet period. Every input bumps a
//! generation counter and results are applied only if their generation is
//! still current, so a slow response can never clobber a newer query.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

use vane_core::{Coordinates, KeyValueStore, SearchConfig};

use crate::geocode::{GeocodingClient, LocationSuggestion};

pub const SEARCH_HISTORY_KEY: &str = "weather-app-search-history";

/// A location the user picked from the suggestions.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSelection {
    pub coordinates: Coordinates,
    pub display_name: String,
}

/// What the search box is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchPhase {
    #[default]
    Idle,
    /// A keystroke landed; the fetch fires once the quiet period passes.
    Debouncing,
    /// A suggestion fetch is in flight.
    Searching,
}

/// Observable search box state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchState {
    pub query: String,
    pub phase: SearchPhase,
    pub suggestions: Vec<LocationSuggestion>,
    /// Whether the suggestion panel is showing.
    pub open: bool,
}

/// Recent selections, most recent first, capped and persisted.
#[derive(Debug)]
struct SearchHistory {
    entries: Vec<String>,
    limit: usize,
}

impl SearchHistory {
    fn load(store: &dyn KeyValueStore, limit: usize) -> Self {
        let mut entries = Vec::new();
        if let Some(raw) = store.get(SEARCH_HISTORY_KEY) {
            match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(mut stored) => {
                    stored.truncate(limit);
                    entries = stored;
                }
                Err(e) => {
                    tracing::warn!("Stored search history is unreadable, starting fresh: {}", e);
                }
            }
        }
        Self { entries, limit }
    }

    /// Move (or insert) a name to the front, dropping the oldest past the cap.
    fn push(&mut self, name: &str) {
        self.entries.retain(|entry| entry != name);
        self.entries.insert(0, name.to_string());
        self.entries.truncate(self.limit);
    }

    fn remove(&mut self, name: &str) {
        self.entries.retain(|entry| entry != name);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn entries(&self) -> &[String] {
        &self.entries
    }
}

struct ControllerInner {
    geocoder: GeocodingClient,
    store: Arc<dyn KeyValueStore>,
    config: SearchConfig,
    state_tx: watch::Sender<SearchState>,
    history: Mutex<SearchHistory>,
    selection_tx: mpsc::UnboundedSender<LocationSelection>,
    generation: AtomicU64,
}

/// Search box backend. Cheap to clone; spawned debounce tasks hold a clone.
#[derive(Clone)]
pub struct SearchSuggestionController {
    inner: Arc<ControllerInner>,
}

impl SearchSuggestionController {
    /// Build a controller and the channel selections are reported on.
    pub fn new(
        geocoder: GeocodingClient,
        store: Arc<dyn KeyValueStore>,
        config: SearchConfig,
    ) -> (Self, mpsc::UnboundedReceiver<LocationSelection>) {
        let history = SearchHistory::load(store.as_ref(), config.history_limit);
        let (selection_tx, selection_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(SearchState::default());

        let controller = Self {
            inner: Arc::new(ControllerInner {
                geocoder,
                store,
                config,
                state_tx,
                history: Mutex::new(history),
                selection_tx,
                generation: AtomicU64::new(0),
            }),
        };
        (controller, selection_rx)
    }

    /// Feed the current text box contents.
    ///
    /// Queries below the minimum length clear the suggestions right away.
    /// Anything else schedules a fetch after the quiet period; another call
    /// within that period restarts the countdown.
    pub fn input(&self, query: &str) {
        let generation = self.bump_generation();

        if query.chars().count() < self.inner.config.min_query_len {
            self.inner.state_tx.send_replace(SearchState {
                query: query.to_string(),
                phase: SearchPhase::Idle,
                suggestions: Vec::new(),
                open: !query.is_empty(),
            });
            return;
        }

        self.inner.state_tx.send_modify(|state| {
            state.query = query.to_string();
            state.phase = SearchPhase::Debouncing;
            state.open = true;
        });

        let controller = self.clone();
        let query = query.to_string();
        let debounce = Duration::from_millis(self.inner.config.debounce_ms);
        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if !controller.is_current(generation) {
                return;
            }
            controller.run_search(generation, &query).await;
        });
    }

    /// Search the current query right now, skipping the debounce
    /// (the user hit Enter).
    pub async fn submit(&self) {
        let query = self.inner.state_tx.borrow().query.clone();
        if query.trim().is_empty() {
            return;
        }

        let generation = self.bump_generation();

        if query.chars().count() < self.inner.config.min_query_len {
            self.inner.state_tx.send_modify(|state| {
                state.phase = SearchPhase::Idle;
                state.suggestions.clear();
            });
            return;
        }

        self.inner.state_tx.send_modify(|state| {
            state.open = true;
        });
        self.run_search(generation, &query).await;
    }

    /// Adopt a suggestion: remember it, close the panel, and report the
    /// selection.
    pub fn select(&self, suggestion: &LocationSuggestion) {
        self.bump_generation();

        self.inner.state_tx.send_modify(|state| {
            state.query = suggestion.display_name.clone();
            state.phase = SearchPhase::Idle;
            state.suggestions = Vec::new();
            state.open = false;
        });

        self.push_history(&suggestion.display_name);

        let selection = LocationSelection {
            coordinates: suggestion.coordinates,
            display_name: suggestion.display_name.clone(),
        };
        if self.inner.selection_tx.send(selection).is_err() {
            tracing::debug!("Selection receiver dropped");
        }
    }

    /// Re-run a remembered search and adopt its best match.
    ///
    /// A history entry only stores the place name, so it is geocoded again
    /// before the selection is reported. No matches is not an error.
    pub async fn select_history(&self, name: &str) {
        let generation = self.bump_generation();

        self.inner.state_tx.send_modify(|state| {
            state.query = name.to_string();
            state.phase = SearchPhase::Searching;
            state.open = false;
        });

        let suggestions = self.inner.geocoder.forward_search(name).await;

        if !self.is_current(generation) {
            tracing::debug!("Dropping stale history lookup for {:?}", name);
            return;
        }

        self.inner.state_tx.send_modify(|state| {
            state.phase = SearchPhase::Idle;
        });

        match suggestions.first() {
            Some(best) => self.select(best),
            None => tracing::debug!("No matches for history entry {:?}", name),
        }
    }

    /// Close the suggestion panel without discarding its contents.
    pub fn close_suggestions(&self) {
        self.inner.state_tx.send_modify(|state| {
            state.open = false;
        });
    }

    /// Reset the search box entirely.
    pub fn clear(&self) {
        self.bump_generation();
        self.inner.state_tx.send_replace(SearchState::default());
    }

    /// Remembered place names, most recent first.
    pub fn history(&self) -> Vec<String> {
        self.inner.history.lock().entries().to_vec()
    }

    /// Drop one remembered name.
    pub fn remove_history_entry(&self, name: &str) {
        let mut history = self.inner.history.lock();
        history.remove(name);
        self.persist_history(&history);
    }

    /// Forget all remembered names.
    pub fn clear_history(&self) {
        let mut history = self.inner.history.lock();
        history.clear();
        if let Err(e) = self.inner.store.remove(SEARCH_HISTORY_KEY) {
            tracing::warn!("Failed to clear search history: {}", e);
        }
    }

    /// Snapshot of the current search state.
    pub fn state(&self) -> SearchState {
        self.inner.state_tx.borrow().clone()
    }

    /// Watch for search state changes.
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.inner.state_tx.subscribe()
    }

    async fn run_search(&self, generation: u64, query: &str) {
        self.inner.state_tx.send_modify(|state| {
            state.phase = SearchPhase::Searching;
        });

        let suggestions = self.inner.geocoder.forward_search(query).await;

        if !self.is_current(generation) {
            tracing::debug!("Dropping stale search results for {:?}", query);
            return;
        }

        self.inner.state_tx.send_modify(|state| {
            state.phase = SearchPhase::Idle;
            state.suggestions = suggestions;
        });
    }

    fn push_history(&self, name: &str) {
        let mut history = self.inner.history.lock();
        history.push(name);
        self.persist_history(&history);
    }

    fn persist_history(&self, history: &SearchHistory) {
        match serde_json::to_string(history.entries()) {
            Ok(json) => {
                if let Err(e) = self.inner.store.set(SEARCH_HISTORY_KEY, &json) {
                    tracing::warn!("Failed to persist search history: {}", e);
                }
            }
            Err(e) => tracing::warn!("Failed to serialize search history: {}", e),
        }
    }

    fn bump_generation(&self) -> u64 {
        self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.inner.generation.load(Ordering::SeqCst) == generation
    }
}
