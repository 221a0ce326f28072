//! One-shot geolocation requests

use std::time::Duration;

use tracing::{debug, warn};

use crate::error::GeolocationError;
use crate::models::Coordinate;

/// Options passed along with every position request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    /// Longest wait for a fix before giving up
    pub timeout: Duration,
    /// Oldest cached position that may be returned; zero forces a fresh fix
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_millis(5000),
            maximum_age: Duration::ZERO,
        }
    }
}

/// A source of position fixes
pub trait Geolocator {
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<Coordinate, GeolocationError>;
}

/// Always answers with the same fix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticGeolocator(pub Coordinate);

impl Geolocator for StaticGeolocator {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinate, GeolocationError> {
        Ok(self.0)
    }
}

/// Always fails with the same error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailingGeolocator(pub GeolocationError);

impl Geolocator for FailingGeolocator {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinate, GeolocationError> {
        Err(self.0)
    }
}

/// Ask `geolocator` for a single fix, bounded by `options.timeout`.
///
/// `None` stands for a host without geolocation; no request is made.
pub async fn locate<G: Geolocator>(
    geolocator: Option<&G>,
    options: &PositionOptions,
) -> Result<Coordinate, GeolocationError> {
    let Some(geolocator) = geolocator else {
        warn!("Geolocation requested but not supported");
        return Err(GeolocationError::Unsupported);
    };

    debug!(
        "Requesting position (high_accuracy={}, timeout={:?}, maximum_age={:?})",
        options.high_accuracy, options.timeout, options.maximum_age
    );

    match tokio::time::timeout(options.timeout, geolocator.current_position(options)).await {
        Ok(result) => result,
        Err(_) => Err(GeolocationError::Timeout),
    }
}
