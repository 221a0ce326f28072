//! Venue records as served by the courts endpoint

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// A bookable venue
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Venue {
    pub id: u64,
    pub name: String,
    pub address: String,
    pub price_per_hour: f64,
    pub latitude: f64,
    pub longitude: f64,
}

impl Venue {
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Relative link into the booking flow, `<prefix>/<id>`
    #[must_use]
    pub fn booking_path(&self, prefix: &str) -> String {
        format!("{}/{}", prefix.trim_end_matches('/'), self.id)
    }

    /// Hourly price as `$<value>/hour`
    #[must_use]
    pub fn price_label(&self) -> String {
        format!("${}/hour", format_number(self.price_per_hour))
    }
}

/// Shortest round-trip form, switching to `1e+21` / `1.5e-7` notation
/// outside `1e-6..1e21` the way browsers print numbers
fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    let magnitude = value.abs();
    if (1e-6..1e21).contains(&magnitude) {
        return format!("{value}");
    }

    let formatted = format!("{value:e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => formatted,
    }
}
