//! Sunrise/sunset value types.
//!
//! # Responsibility
//! - Parse and format the 12-hour clock strings used by the remote service
//!   and by the `SunriseSunset` table.
//! - Provide the unit conversions used by aggregation and charting.
//!
//! # Invariants
//! - `ClockTime` is always a valid time of day with zero sub-second part.
//! - Stored strings are canonical `hh:mm:ss AM|PM` (zero-padded hour).

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// `strftime` pattern for calendar dates.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";
const CLOCK_12H_FORMAT: &str = "%I:%M:%S %p";
const CLOCK_24H_FORMAT: &str = "%H:%M:%S";
const SECONDS_PER_DAY: u32 = 24 * 60 * 60;

/// Error returned when a clock string is not a 12-hour `h:mm:ss AM|PM` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockTimeParseError {
    pub value: String,
}

impl Display for ClockTimeParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid 12-hour clock time `{}`", self.value)
    }
}

impl Error for ClockTimeParseError {}

/// Time of day without a date, at whole-second precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(NaiveTime);

impl ClockTime {
    /// Builds a clock time from 24-hour components.
    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, second).map(Self)
    }

    /// Builds a clock time from seconds since midnight (`0..86400`).
    pub fn from_seconds_since_midnight(seconds: u32) -> Option<Self> {
        if seconds >= SECONDS_PER_DAY {
            return None;
        }
        NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0).map(Self)
    }

    /// Parses `h:mm:ss AM` / `hh:mm:ss PM`. Hour padding and designator case
    /// are not significant; surrounding whitespace is ignored.
    pub fn parse_12h(value: &str) -> Result<Self, ClockTimeParseError> {
        NaiveTime::parse_from_str(value.trim(), CLOCK_12H_FORMAT)
            .map(|time| Self(time.with_nanosecond(0).unwrap_or(time)))
            .map_err(|_| ClockTimeParseError {
                value: value.to_string(),
            })
    }

    /// Canonical storage form, e.g. `06:42:13 AM`.
    pub fn to_12h_string(self) -> String {
        self.0.format(CLOCK_12H_FORMAT).to_string()
    }

    /// Report form, e.g. `18:05:00`.
    pub fn to_24h_string(self) -> String {
        self.0.format(CLOCK_24H_FORMAT).to_string()
    }

    pub fn seconds_since_midnight(self) -> u32 {
        self.0.num_seconds_from_midnight()
    }

    /// Hour of day as a fraction: `hour + minute / 60 + second / 3600`.
    pub fn fractional_hours(self) -> f64 {
        f64::from(self.0.hour())
            + f64::from(self.0.minute()) / 60.0
            + f64::from(self.0.second()) / 3600.0
    }
}

impl Display for ClockTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_12h_string())
    }
}

impl FromStr for ClockTime {
    type Err = ClockTimeParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse_12h(value)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = ClockTimeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_12h(&value)
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_12h_string()
    }
}

/// Sunrise and sunset for one calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SunTimes {
    pub sunrise: ClockTime,
    pub sunset: ClockTime,
}

impl SunTimes {
    pub fn new(sunrise: ClockTime, sunset: ClockTime) -> Self {
        Self { sunrise, sunset }
    }

    /// Hours between sunrise and sunset.
    pub fn day_length_hours(&self) -> f64 {
        self.sunset.fractional_hours() - self.sunrise.fractional_hours()
    }
}

/// One joined `Dates` + `SunriseSunset` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    pub date: NaiveDate,
    pub times: SunTimes,
}

impl DayRecord {
    pub fn new(date: NaiveDate, times: SunTimes) -> Self {
        Self { date, times }
    }
}

/// Whether `date` has a four-digit year, so its `YYYY-MM-DD` text sorts in
/// calendar order.
pub fn is_storable_date(date: NaiveDate) -> bool {
    (0..=9999).contains(&date.year())
}

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_iso_date(value: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value.trim(), ISO_DATE_FORMAT)
}

/// Formats a calendar date as `YYYY-MM-DD`.
pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}
