//! Fixed observation point.

use serde::{Deserialize, Serialize};

/// Latitude of the reference deployment (Ann Arbor, MI).
pub const DEFAULT_LATITUDE: f64 = 42.2808;
/// Longitude of the reference deployment (Ann Arbor, MI).
pub const DEFAULT_LONGITUDE: f64 = -83.7430;

/// Geographic point that all sun times are requested for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Location {
    /// Degrees north, `-90.0..=90.0`.
    pub latitude: f64,
    /// Degrees east, `-180.0..=180.0`.
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Returns whether both coordinates are finite and inside their ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new(DEFAULT_LATITUDE, DEFAULT_LONGITUDE)
    }
}
