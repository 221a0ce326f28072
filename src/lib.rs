//! `venuemap` - nearby courts on a map and in a list
//!
//! This library provides the venue map view: a map surface centered on a
//! default location, the venues fetched from the courts endpoint rendered as
//! markers and list rows, and a location control that recenters and refetches.

pub mod config;
pub mod error;
pub mod geolocation;
pub mod map;
pub mod models;
pub mod render;
pub mod venues;
pub mod view;
pub mod web;

// Re-export core types for public API
pub use self::config::VenueMapConfig;
pub use error::{GeolocationError, MapError, VenueMapError};
pub use geolocation::{Geolocator, PositionOptions, StaticGeolocator};
pub use map::{HeadlessMap, MapSurface};
pub use models::{Bounds, Coordinate, Venue};
pub use venues::{HttpVenueSource, VenueSource};
pub use view::{FetchOutcome, ListPanel, LocateOutcome, VenueMapView};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, VenueMapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
