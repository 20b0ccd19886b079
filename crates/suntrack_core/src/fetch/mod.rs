//! Remote sunrise/sunset lookups.
//!
//! # Responsibility
//! - Define the fetch contract consumed by the ingestion pipeline.
//! - Provide the HTTP implementation against a sunrisesunset.io-style API.
//!
//! # Invariants
//! - Every failure mode collapses into `Unavailable`; callers never see
//!   transport or parse errors.
//! - One call performs at most one network round-trip and never retries.

pub mod sunrise_api;

use crate::model::location::Location;
use crate::model::sun_times::SunTimes;
use chrono::NaiveDate;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// No usable sun times exist for the requested date, whatever the cause.
///
/// `reason` is diagnostic text for logs only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unavailable {
    pub reason: String,
}

impl Unavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Display for Unavailable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "sun times unavailable: {}", self.reason)
    }
}

impl Error for Unavailable {}

/// Fetch capability for one date at one location.
pub trait SunTimesFetcher {
    fn fetch(&self, location: Location, date: NaiveDate) -> Result<SunTimes, Unavailable>;
}

impl<F: SunTimesFetcher + ?Sized> SunTimesFetcher for &F {
    fn fetch(&self, location: Location, date: NaiveDate) -> Result<SunTimes, Unavailable> {
        (**self).fetch(location, date)
    }
}
