//! Venue sources
//!
//! [`HttpVenueSource`] reads the courts endpoint. The coordinate handed to
//! [`VenueSource::fetch_venues`] is not transmitted: the endpoint takes no
//! query parameters and answers with every venue it knows.

use std::time::Duration;

use reqwest::{Client, header};
use tracing::{debug, info, instrument};

use crate::config::EndpointConfig;
use crate::error::VenueMapError;
use crate::models::{Coordinate, Venue};
use crate::Result;

/// Anything that can list venues around a coordinate
pub trait VenueSource {
    async fn fetch_venues(&self, near: Coordinate) -> Result<Vec<Venue>>;
}

/// Courts endpoint client
#[derive(Debug, Clone)]
pub struct HttpVenueSource {
    client: Client,
    url: String,
}

impl HttpVenueSource {
    /// Create a new client for the configured endpoint
    pub fn new(config: &EndpointConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(concat!("venuemap/", env!("CARGO_PKG_VERSION")));
        if let Some(seconds) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(u64::from(seconds)));
        }
        let client = builder
            .build()
            .map_err(|e| VenueMapError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: config.courts_url(),
        })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl VenueSource for HttpVenueSource {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch_venues(&self, near: Coordinate) -> Result<Vec<Venue>> {
        debug!("Fetching courts near {}", near.format_coordinates());

        let response = self
            .client
            .get(&self.url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                debug!("Courts request failed: {}", e);
                VenueMapError::network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            debug!("Courts endpoint answered {}", status);
            return Err(VenueMapError::http_status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| {
            debug!("Failed to read courts response: {}", e);
            VenueMapError::network(e.to_string())
        })?;

        let venues: Vec<Venue> = serde_json::from_slice(&body).map_err(|e| {
            debug!("Failed to parse courts response: {}", e);
            VenueMapError::parse(e.to_string())
        })?;

        info!("Fetched {} courts", venues.len());
        Ok(venues)
    }
}
