//! Geographic coordinates and bounding boxes

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VenueMapError;

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinate {
    /// Create a new coordinate
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Create a coordinate, rejecting non-finite or out-of-range degrees
    pub fn checked(latitude: f64, longitude: f64) -> Result<Self, VenueMapError> {
        let coordinate = Self::new(latitude, longitude);
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(VenueMapError::validation(format!(
                "coordinate out of range: {}",
                coordinate.format_coordinates()
            )));
        }
        Ok(coordinate)
    }

    /// Format coordinate as `lat, lon`
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

impl FromStr for Coordinate {
    type Err = VenueMapError;

    /// Parse `lat,lon`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| VenueMapError::validation(format!("expected `lat,lon`, got `{s}`")))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<f64>()
                .map_err(|e| VenueMapError::validation(format!("invalid coordinate `{part}`: {e}")))
        };
        Self::checked(parse(lat)?, parse(lon)?)
    }
}

/// Axis-aligned box between a south-west and a north-east corner
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub south_west: Coordinate,
    pub north_east: Coordinate,
}

impl Bounds {
    /// Smallest box holding every coordinate, `None` when there are none
    pub fn from_coordinates<I>(coordinates: I) -> Option<Self>
    where
        I: IntoIterator<Item = Coordinate>,
    {
        let mut iter = coordinates.into_iter();
        let first = iter.next()?;
        let mut bounds = Self {
            south_west: first,
            north_east: first,
        };
        for coordinate in iter {
            bounds.extend(coordinate);
        }
        Some(bounds)
    }

    /// Grow the box so it also holds `coordinate`
    pub fn extend(&mut self, coordinate: Coordinate) {
        self.south_west.latitude = self.south_west.latitude.min(coordinate.latitude);
        self.south_west.longitude = self.south_west.longitude.min(coordinate.longitude);
        self.north_east.latitude = self.north_east.latitude.max(coordinate.latitude);
        self.north_east.longitude = self.north_east.longitude.max(coordinate.longitude);
    }

    /// Grow each side by `ratio` times the span on that axis
    #[must_use]
    pub fn pad(&self, ratio: f64) -> Self {
        let lat_buffer = self.lat_span() * ratio;
        let lon_buffer = self.lon_span() * ratio;
        Self {
            south_west: Coordinate::new(
                self.south_west.latitude - lat_buffer,
                self.south_west.longitude - lon_buffer,
            ),
            north_east: Coordinate::new(
                self.north_east.latitude + lat_buffer,
                self.north_east.longitude + lon_buffer,
            ),
        }
    }

    /// Widen each axis around the center until it spans at least `min_span` degrees
    #[must_use]
    pub fn with_min_span(&self, min_span: f64) -> Self {
        let center = self.center();
        let half_lat = self.lat_span().max(min_span) / 2.0;
        let half_lon = self.lon_span().max(min_span) / 2.0;
        Self {
            south_west: Coordinate::new(center.latitude - half_lat, center.longitude - half_lon),
            north_east: Coordinate::new(center.latitude + half_lat, center.longitude + half_lon),
        }
    }

    #[must_use]
    pub fn lat_span(&self) -> f64 {
        self.north_east.latitude - self.south_west.latitude
    }

    #[must_use]
    pub fn lon_span(&self) -> f64 {
        self.north_east.longitude - self.south_west.longitude
    }

    #[must_use]
    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.south_west.latitude + self.north_east.latitude) / 2.0,
            (self.south_west.longitude + self.north_east.longitude) / 2.0,
        )
    }

    /// Inclusive containment test
    #[must_use]
    pub fn contains(&self, coordinate: Coordinate) -> bool {
        coordinate.latitude >= self.south_west.latitude
            && coordinate.latitude <= self.north_east.latitude
            && coordinate.longitude >= self.south_west.longitude
            && coordinate.longitude <= self.north_east.longitude
    }

    /// Containment with at least `margin` degrees to every edge
    #[must_use]
    pub fn contains_with_margin(&self, coordinate: Coordinate, margin: f64) -> bool {
        coordinate.latitude - self.south_west.latitude >= margin
            && self.north_east.latitude - coordinate.latitude >= margin
            && coordinate.longitude - self.south_west.longitude >= margin
            && self.north_east.longitude - coordinate.longitude >= margin
    }
}
