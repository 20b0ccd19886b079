//! Incremental ingestion of sun times into the store.
//!
//! # Responsibility
//! - Walk a fixed-size window of dates after the latest stored date.
//! - Fetch and commit each missing date independently.
//!
//! # Invariants
//! - The rolling reference always ends at `start + window_days`, whatever
//!   the fetch outcomes, unless it would leave years `0000..=9999`; the
//!   window then stops at the last storable date.
//! - A date is written only after a successful fetch, together with its
//!   times, and never twice.
//! - `Unavailable` results are absorbed here; store errors abort the run.
//! - Unavailable dates behind a later stored date are never revisited,
//!   because the next run starts at the latest stored date. Unavailable
//!   dates at the tail of a window are retried by the next run.

use crate::fetch::SunTimesFetcher;
use crate::model::location::Location;
use crate::model::sun_times::{format_iso_date, is_storable_date};
use crate::repo::sun_repo::{RepoResult, SunTimesRepository};
use chrono::{Days, NaiveDate};
use log::{error, info, warn};
use std::time::Instant;

/// Outcome of one ingestion run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Reference date the window was counted from (exclusive).
    pub start: NaiveDate,
    /// Final rolling reference, `start + window_days` short of year 10000.
    pub window_end: NaiveDate,
    /// Dates fetched and committed during this run.
    pub added: u32,
    /// Dates skipped because they were already stored.
    pub skipped_existing: u32,
    /// Dates left unstored because the fetcher reported `Unavailable`.
    pub unavailable: Vec<NaiveDate>,
}

/// Ingestion pipeline over a repository and a fetcher.
pub struct IngestService<R: SunTimesRepository, F: SunTimesFetcher> {
    repo: R,
    fetcher: F,
    location: Location,
    window_days: u32,
}

impl<R: SunTimesRepository, F: SunTimesFetcher> IngestService<R, F> {
    pub fn new(repo: R, fetcher: F, location: Location, window_days: u32) -> Self {
        Self {
            repo,
            fetcher,
            location,
            window_days,
        }
    }

    /// Window start: the latest stored date, else the day before `today`.
    pub fn window_start(&self, today: NaiveDate) -> RepoResult<NaiveDate> {
        Ok(match self.repo.latest_date()? {
            Some(latest) => latest,
            None => today.pred_opt().unwrap_or(today),
        })
    }

    /// Runs one ingestion window.
    ///
    /// # Errors
    /// - Any repository error, including `DuplicateDate`, aborts the run.
    ///   Dates committed before the failure stay committed.
    pub fn run(&self, today: NaiveDate) -> RepoResult<IngestReport> {
        let started_at = Instant::now();
        let start = self.window_start(today)?;
        info!(
            "event=ingest_run module=ingest status=start start={} window_days={}",
            format_iso_date(start),
            self.window_days
        );

        let mut report = IngestReport {
            start,
            window_end: start,
            added: 0,
            skipped_existing: 0,
            unavailable: Vec::new(),
        };

        let mut reference = start;
        for _ in 0..self.window_days {
            let next = reference
                .checked_add_days(Days::new(1))
                .filter(|date| is_storable_date(*date));
            let Some(candidate) = next else {
                warn!(
                    "event=ingest_run module=ingest status=calendar_end reference={}",
                    format_iso_date(reference)
                );
                break;
            };

            if let Err(err) = self.ingest_date(candidate, &mut report) {
                error!(
                    "event=ingest_run module=ingest status=error date={} added={} duration_ms={} error={}",
                    format_iso_date(candidate),
                    report.added,
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err);
            }
            reference = candidate;
        }
        report.window_end = reference;

        let stored_total = self.repo.count_records()?;
        info!(
            "event=ingest_run module=ingest status=ok start={} window_end={} added={} skipped={} unavailable={} stored_total={} duration_ms={}",
            format_iso_date(report.start),
            format_iso_date(report.window_end),
            report.added,
            report.skipped_existing,
            report.unavailable.len(),
            stored_total,
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    fn ingest_date(&self, date: NaiveDate, report: &mut IngestReport) -> RepoResult<()> {
        if self.repo.has_date(date)? {
            report.skipped_existing += 1;
            info!(
                "event=ingest_date module=ingest status=skipped date={}",
                format_iso_date(date)
            );
            return Ok(());
        }

        match self.fetcher.fetch(self.location, date) {
            Ok(times) => {
                self.repo.insert(date, times)?;
                report.added += 1;
                info!(
                    "event=ingest_date module=ingest status=ok date={} sunrise={} sunset={}",
                    format_iso_date(date),
                    times.sunrise,
                    times.sunset
                );
            }
            Err(unavailable) => {
                report.unavailable.push(date);
                warn!(
                    "event=ingest_date module=ingest status=unavailable date={} reason={}",
                    format_iso_date(date),
                    unavailable.reason
                );
            }
        }
        Ok(())
    }
}
