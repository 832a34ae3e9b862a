//! Location services for Vane
//!
//! Covers device geolocation with permission memory, forward and reverse
//! geocoding via Nominatim, and the debounced search box backend.

pub mod error;
pub mod geocode;
pub mod location;
pub mod resolver;
pub mod search;

pub use error::GeolocationError;
pub use geocode::{GeocodingClient, LocationSuggestion};
pub use location::{LocationProvider, PositionRequest, SystemLocationProvider};
pub use resolver::{GeolocationResolver, GeolocationState, GeolocationStatus, ResolverOptions};
pub use search::{LocationSelection, SearchPhase, SearchState, SearchSuggestionController};
