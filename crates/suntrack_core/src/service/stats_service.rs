//! Descriptive statistics over stored sun times.
//!
//! # Responsibility
//! - Build the weekday histogram and floor-mean sunrise/sunset.
//! - Render and write the plain-text report.
//!
//! # Invariants
//! - Weekday bucket 0 is Monday, bucket 6 is Sunday.
//! - Means are computed over seconds since midnight with floor division.
//! - Aggregating zero records is an error, never a default value.
//! - The report file is fully overwritten on each write.

use crate::model::sun_times::{ClockTime, DayRecord};
use crate::repo::sun_repo::{RepoError, SunTimesRepository};
use chrono::{Datelike, NaiveDate};
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub const WEEKDAY_BUCKETS: usize = 7;
const REPORT_HEADER: &str = "Day of the week counts (Monday=0, ..., Sunday=6):";

pub type StatsResult<T> = Result<T, StatsError>;

#[derive(Debug)]
pub enum StatsError {
    /// No stored records to aggregate.
    NoData,
    Repo(RepoError),
    Io(std::io::Error),
}

impl Display for StatsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoData => write!(f, "no stored sun-times records to aggregate"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "failed to write report: {err}"),
        }
    }
}

impl Error for StatsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NoData => None,
            Self::Repo(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<RepoError> for StatsError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<std::io::Error> for StatsError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Aggregates plus the per-record series consumed by charting.
#[derive(Debug, Clone, PartialEq)]
pub struct SunSummary {
    /// Count of records per weekday, Monday = 0.
    pub weekday_counts: [u32; WEEKDAY_BUCKETS],
    pub mean_sunrise: ClockTime,
    pub mean_sunset: ClockTime,
    pub dates: Vec<NaiveDate>,
    pub sunrises: Vec<ClockTime>,
    pub sunsets: Vec<ClockTime>,
}

/// Weekday bucket for `date`, Monday = 0 .. Sunday = 6.
pub fn weekday_index(date: NaiveDate) -> usize {
    date.weekday().num_days_from_monday() as usize
}

/// Floor mean of clock times, or `None` for an empty slice.
pub fn mean_clock_time(times: &[ClockTime]) -> Option<ClockTime> {
    if times.is_empty() {
        return None;
    }
    let total: u64 = times
        .iter()
        .map(|time| u64::from(time.seconds_since_midnight()))
        .sum();
    let mean = total / times.len() as u64;
    // Mean of values below 86400 stays below 86400.
    u32::try_from(mean)
        .ok()
        .and_then(ClockTime::from_seconds_since_midnight)
}

/// Computes the summary over `records` in the order given.
///
/// # Errors
/// - `StatsError::NoData` when `records` is empty.
pub fn summarize(records: &[DayRecord]) -> StatsResult<SunSummary> {
    let mut weekday_counts = [0_u32; WEEKDAY_BUCKETS];
    let mut dates = Vec::with_capacity(records.len());
    let mut sunrises = Vec::with_capacity(records.len());
    let mut sunsets = Vec::with_capacity(records.len());

    for record in records {
        weekday_counts[weekday_index(record.date)] += 1;
        dates.push(record.date);
        sunrises.push(record.times.sunrise);
        sunsets.push(record.times.sunset);
    }

    let mean_sunrise = mean_clock_time(&sunrises).ok_or(StatsError::NoData)?;
    let mean_sunset = mean_clock_time(&sunsets).ok_or(StatsError::NoData)?;

    Ok(SunSummary {
        weekday_counts,
        mean_sunrise,
        mean_sunset,
        dates,
        sunrises,
        sunsets,
    })
}

/// Renders the report text, one trailing newline per line.
pub fn render_report(summary: &SunSummary) -> String {
    let histogram = summary
        .weekday_counts
        .iter()
        .enumerate()
        .map(|(day, count)| format!("{day}: {count}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "{REPORT_HEADER}\n{histogram}\nAverage sunrise time: {}\nAverage sunset time: {}\n",
        summary.mean_sunrise.to_24h_string(),
        summary.mean_sunset.to_24h_string()
    )
}

/// Writes the report to `path`, replacing any previous content.
pub fn write_report(path: impl AsRef<Path>, summary: &SunSummary) -> StatsResult<()> {
    let path = path.as_ref();
    match std::fs::write(path, render_report(summary)) {
        Ok(()) => {
            info!(
                "event=report_write module=stats status=ok path={} records={}",
                path.display(),
                summary.dates.len()
            );
            Ok(())
        }
        Err(err) => {
            error!(
                "event=report_write module=stats status=error path={} error={}",
                path.display(),
                err
            );
            Err(err.into())
        }
    }
}

/// Aggregation use-cases backed by a repository.
pub struct StatsService<R: SunTimesRepository> {
    repo: R,
}

impl<R: SunTimesRepository> StatsService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Summarizes every stored record.
    pub fn summarize(&self) -> StatsResult<SunSummary> {
        let records = self.repo.all_records()?;
        summarize(&records)
    }

    /// Summarizes every stored record and writes the report file.
    pub fn write_report(&self, path: impl AsRef<Path>) -> StatsResult<SunSummary> {
        let summary = self.summarize()?;
        write_report(path, &summary)?;
        Ok(summary)
    }
}
