//! Error types and handling for the venue map view

use thiserror::Error;

/// Reasons a geolocation request can fail
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeolocationError {
    /// The host offers no geolocation capability at all
    #[error("geolocation is not supported")]
    Unsupported,

    /// The user (or policy) refused the request
    #[error("permission denied")]
    PermissionDenied,

    /// The device could not determine a position
    #[error("position unavailable")]
    PositionUnavailable,

    /// No fix arrived within the requested timeout
    #[error("timed out waiting for a position")]
    Timeout,
}

/// Failures raised by a map surface
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("map container `{0}` not found")]
    ContainerNotFound(String),

    #[error("map surface has not been created")]
    NotCreated,

    #[error("unknown marker {0}")]
    UnknownMarker(u64),
}

/// Main error type for the venue map view
#[derive(Error, Debug)]
pub enum VenueMapError {
    /// The map surface could not be constructed
    #[error("Map initialization error: {source}")]
    MapInit {
        #[from]
        source: MapError,
    },

    /// Geolocation unavailable, denied or timed out
    #[error("Geolocation error: {source}")]
    Geolocation {
        #[from]
        source: GeolocationError,
    },

    /// Transport-level failure talking to the venues endpoint
    #[error("Network error: {message}")]
    Network { message: String },

    /// The venues endpoint answered with a non-success status
    #[error("HTTP error! status: {status}")]
    HttpStatus { status: u16 },

    /// The venues response body was not a list of venues
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl VenueMapError {
    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a new status error
    #[must_use]
    pub fn http_status(status: u16) -> Self {
        Self::HttpStatus { status }
    }

    /// Create a new parse error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Get the message shown to the user in the list panel
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            VenueMapError::MapInit { .. } => {
                "Error initializing map. Please refresh the page.".to_string()
            }
            VenueMapError::Geolocation {
                source: GeolocationError::Unsupported,
            } => "Geolocation is not supported by your browser.".to_string(),
            VenueMapError::Geolocation { .. } => {
                "Unable to get your location. Please enter it manually.".to_string()
            }
            VenueMapError::Network { .. }
            | VenueMapError::HttpStatus { .. }
            | VenueMapError::Parse { .. } => "Error loading courts. Please try again.".to_string(),
            VenueMapError::Validation { message } => format!("Invalid input: {message}"),
            VenueMapError::Config { .. } => {
                "Configuration error. Please check your config file.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_status_error_message_carries_code() {
        let err = VenueMapError::http_status(503);
        assert_eq!(err.to_string(), "HTTP error! status: 503");
    }

    #[rstest]
    #[case(VenueMapError::network("connection refused"))]
    #[case(VenueMapError::http_status(500))]
    #[case(VenueMapError::parse("expected a sequence"))]
    fn test_fetch_failures_share_generic_message(#[case] err: VenueMapError) {
        assert_eq!(err.user_message(), "Error loading courts. Please try again.");
    }

    #[rstest]
    #[case(GeolocationError::PermissionDenied)]
    #[case(GeolocationError::PositionUnavailable)]
    #[case(GeolocationError::Timeout)]
    fn test_failed_fix_message(#[case] source: GeolocationError) {
        let err: VenueMapError = source.into();
        assert!(err.user_message().starts_with("Unable to get your location"));
    }

    #[test]
    fn test_unsupported_geolocation_message() {
        let err: VenueMapError = GeolocationError::Unsupported.into();
        assert!(err.user_message().contains("not supported"));
    }

    #[test]
    fn test_map_error_conversion() {
        let err: VenueMapError = MapError::ContainerNotFound("map".into()).into();
        assert!(matches!(err, VenueMapError::MapInit { .. }));
        assert!(err.user_message().contains("Error initializing map"));
    }
}
