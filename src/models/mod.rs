//! Data models for the venue map view
//!
//! This module contains the plain value types the view works with:
//! - Coordinate: latitude/longitude pairs and bounding boxes
//! - Venue: records returned by the courts endpoint

pub mod coordinate;
pub mod venue;

// Re-export all public types for convenient access
pub use coordinate::{Bounds, Coordinate};
pub use venue::Venue;
