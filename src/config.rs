//! Configuration management for the venue map view
//!
//! Handles loading configuration from files and environment variables,
//! and validates the map, endpoint and geolocation settings.

use crate::VenueMapError;
use crate::geolocation::PositionOptions;
use crate::map::{MapOptions, TileLayer};
use crate::models::Coordinate;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VenueMapConfig {
    /// Map surface and tile settings
    #[serde(default)]
    pub map: MapConfig,
    /// Venues endpoint and link targets
    #[serde(default)]
    pub endpoint: EndpointConfig,
    /// Position request options
    #[serde(default)]
    pub geolocation: GeolocationConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Preview server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Map surface settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Id of the element hosting the map
    #[serde(default = "default_container")]
    pub container: String,
    #[serde(default = "default_latitude")]
    pub default_latitude: f64,
    #[serde(default = "default_longitude")]
    pub default_longitude: f64,
    /// Zoom used for the default location
    #[serde(default = "default_zoom")]
    pub zoom: u8,
    /// Zoom used after a successful geolocation fix
    #[serde(default = "default_located_zoom")]
    pub located_zoom: u8,
    #[serde(default = "default_tile_url")]
    pub tile_url: String,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: u8,
    #[serde(default = "default_attribution")]
    pub attribution: String,
    /// Margin added around the markers when fitting, as a fraction of the span
    #[serde(default = "default_fit_padding")]
    pub fit_padding: f64,
}

/// Venues endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Origin serving the courts endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_courts_path")]
    pub courts_path: String,
    /// Prefix of booking links, rendered as `<prefix>/<id>`
    #[serde(default = "default_booking_prefix")]
    pub booking_prefix: String,
    /// Request timeout in seconds; unset means wait indefinitely
    #[serde(default)]
    pub timeout_seconds: Option<u32>,
}

/// Position request options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeolocationConfig {
    #[serde(default = "default_high_accuracy")]
    pub high_accuracy: bool,
    #[serde(default = "default_geolocation_timeout")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub maximum_age_ms: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Preview server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

// Default value functions
fn default_container() -> String {
    "map".to_string()
}

fn default_latitude() -> f64 {
    40.7128
}

fn default_longitude() -> f64 {
    -74.0060
}

fn default_zoom() -> u8 {
    12
}

fn default_located_zoom() -> u8 {
    13
}

fn default_tile_url() -> String {
    "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string()
}

fn default_max_zoom() -> u8 {
    19
}

fn default_attribution() -> String {
    "© OpenStreetMap contributors".to_string()
}

fn default_fit_padding() -> f64 {
    0.1
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_courts_path() -> String {
    "/courts".to_string()
}

fn default_booking_prefix() -> String {
    "/book".to_string()
}

fn default_high_accuracy() -> bool {
    true
}

fn default_geolocation_timeout() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            container: default_container(),
            default_latitude: default_latitude(),
            default_longitude: default_longitude(),
            zoom: default_zoom(),
            located_zoom: default_located_zoom(),
            tile_url: default_tile_url(),
            max_zoom: default_max_zoom(),
            attribution: default_attribution(),
            fit_padding: default_fit_padding(),
        }
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            courts_path: default_courts_path(),
            booking_prefix: default_booking_prefix(),
            timeout_seconds: None,
        }
    }
}

impl Default for GeolocationConfig {
    fn default() -> Self {
        Self {
            high_accuracy: default_high_accuracy(),
            timeout_ms: default_geolocation_timeout(),
            maximum_age_ms: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl MapConfig {
    #[must_use]
    pub fn default_center(&self) -> Coordinate {
        Coordinate::new(self.default_latitude, self.default_longitude)
    }

    #[must_use]
    pub fn map_options(&self) -> MapOptions {
        MapOptions {
            container: self.container.clone(),
            center: self.default_center(),
            zoom: self.zoom,
        }
    }

    #[must_use]
    pub fn tile_layer(&self) -> TileLayer {
        TileLayer {
            url_template: self.tile_url.clone(),
            max_zoom: self.max_zoom,
            attribution: self.attribution.clone(),
        }
    }
}

impl EndpointConfig {
    /// Full URL of the courts endpoint
    #[must_use]
    pub fn courts_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.courts_path.trim_start_matches('/')
        )
    }
}

impl GeolocationConfig {
    #[must_use]
    pub fn position_options(&self) -> PositionOptions {
        PositionOptions {
            high_accuracy: self.high_accuracy,
            timeout: Duration::from_millis(self.timeout_ms),
            maximum_age: Duration::from_millis(self.maximum_age_ms),
        }
    }
}

impl VenueMapConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. VENUEMAP_ENDPOINT__BASE_URL
        builder = builder.add_source(
            Environment::with_prefix("VENUEMAP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: VenueMapConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("venuemap").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.map.container.is_empty() {
            self.map.container = default_container();
        }
        if self.map.tile_url.is_empty() {
            self.map.tile_url = default_tile_url();
        }
        if self.map.attribution.is_empty() {
            self.map.attribution = default_attribution();
        }
        if self.map.max_zoom == 0 {
            self.map.max_zoom = default_max_zoom();
        }
        if self.endpoint.base_url.is_empty() {
            self.endpoint.base_url = default_base_url();
        }
        if self.endpoint.courts_path.is_empty() {
            self.endpoint.courts_path = default_courts_path();
        }
        if self.endpoint.booking_prefix.is_empty() {
            self.endpoint.booking_prefix = default_booking_prefix();
        }
        if self.geolocation.timeout_ms == 0 {
            self.geolocation.timeout_ms = default_geolocation_timeout();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.server.port == 0 {
            self.server.port = default_port();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_map()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_map(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.map.default_latitude) {
            return Err(VenueMapError::config("Default latitude must be within -90..=90").into());
        }

        if !(-180.0..=180.0).contains(&self.map.default_longitude) {
            return Err(
                VenueMapError::config("Default longitude must be within -180..=180").into(),
            );
        }

        if self.map.zoom > self.map.max_zoom || self.map.located_zoom > self.map.max_zoom {
            return Err(VenueMapError::config(format!(
                "Map zoom levels cannot exceed max zoom {}",
                self.map.max_zoom
            ))
            .into());
        }

        if !(self.map.fit_padding > 0.0 && self.map.fit_padding <= 1.0) {
            return Err(VenueMapError::config("Fit padding must be within (0.0, 1.0]").into());
        }

        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.map.max_zoom > 22 {
            return Err(VenueMapError::config("Max zoom cannot exceed 22").into());
        }

        if self.geolocation.timeout_ms > 60_000 {
            return Err(
                VenueMapError::config("Geolocation timeout cannot exceed 60000 ms").into(),
            );
        }

        if let Some(timeout) = self.endpoint.timeout_seconds {
            if timeout == 0 || timeout > 300 {
                return Err(VenueMapError::config(
                    "Endpoint timeout must be between 1 and 300 seconds",
                )
                .into());
            }
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(VenueMapError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(VenueMapError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.endpoint.base_url.starts_with("http://")
            && !self.endpoint.base_url.starts_with("https://")
        {
            return Err(VenueMapError::config(
                "Endpoint base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        if !self.endpoint.courts_path.starts_with('/') {
            return Err(VenueMapError::config("Courts path must start with '/'").into());
        }

        Ok(())
    }
}
