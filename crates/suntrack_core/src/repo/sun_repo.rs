//! Sun-times repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the store operations over `Dates` and `SunriseSunset`.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - At most one `Dates` row per calendar date.
//! - Every `SunriseSunset` row references an existing `Dates` row, and the
//!   pair is committed in one transaction.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::sun_times::{
    format_iso_date, is_storable_date, parse_iso_date, ClockTime, DayRecord, SunTimes,
};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const RECORD_SELECT_SQL: &str = "SELECT
    d.date AS date,
    s.sunrise AS sunrise,
    s.sunset AS sunset
FROM Dates d
JOIN SunriseSunset s ON d.id = s.date_id";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for sun-times persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Insert attempted for a date that is already stored. Callers are
    /// expected to check `has_date` first, so this signals a logic error.
    DuplicateDate(NaiveDate),
    /// Year outside `0000..=9999`; its text form would not sort by date.
    UnsupportedDate(NaiveDate),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicateDate(date) => {
                write!(f, "date already stored: {}", format_iso_date(*date))
            }
            Self::UnsupportedDate(date) => {
                write!(f, "date outside years 0000-9999: {}", format_iso_date(*date))
            }
            Self::InvalidData(message) => write!(f, "invalid persisted sun-times data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::DuplicateDate(_) => None,
            Self::UnsupportedDate(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Store contract for dated sunrise/sunset pairs.
pub trait SunTimesRepository {
    /// Greatest stored date, or `None` when the store is empty.
    fn latest_date(&self) -> RepoResult<Option<NaiveDate>>;
    fn has_date(&self, date: NaiveDate) -> RepoResult<bool>;
    /// Inserts the date and its times atomically.
    ///
    /// # Errors
    /// - `RepoError::DuplicateDate` when `date` is already stored.
    /// - `RepoError::UnsupportedDate` when the year is not four digits.
    fn insert(&self, date: NaiveDate, times: SunTimes) -> RepoResult<()>;
    /// Every joined record, ordered by date ascending.
    fn all_records(&self) -> RepoResult<Vec<DayRecord>>;
    fn count_records(&self) -> RepoResult<u64>;
}

impl<R: SunTimesRepository + ?Sized> SunTimesRepository for &R {
    fn latest_date(&self) -> RepoResult<Option<NaiveDate>> {
        (**self).latest_date()
    }

    fn has_date(&self, date: NaiveDate) -> RepoResult<bool> {
        (**self).has_date(date)
    }

    fn insert(&self, date: NaiveDate, times: SunTimes) -> RepoResult<()> {
        (**self).insert(date, times)
    }

    fn all_records(&self) -> RepoResult<Vec<DayRecord>> {
        (**self).all_records()
    }

    fn count_records(&self) -> RepoResult<u64> {
        (**self).count_records()
    }
}

/// SQLite-backed sun-times repository.
pub struct SqliteSunTimesRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSunTimesRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SunTimesRepository for SqliteSunTimesRepository<'_> {
    fn latest_date(&self) -> RepoResult<Option<NaiveDate>> {
        // ISO dates sort lexicographically in calendar order.
        let latest: Option<String> = self
            .conn
            .query_row(
                "SELECT date FROM Dates ORDER BY date DESC LIMIT 1;",
                [],
                |row| row.get(0),
            )
            .optional()?;

        latest.as_deref().map(parse_stored_date).transpose()
    }

    fn has_date(&self, date: NaiveDate) -> RepoResult<bool> {
        date_exists(self.conn, date)
    }

    fn insert(&self, date: NaiveDate, times: SunTimes) -> RepoResult<()> {
        if !is_storable_date(date) {
            return Err(RepoError::UnsupportedDate(date));
        }
        let tx = self.conn.unchecked_transaction()?;

        if date_exists(&tx, date)? {
            return Err(RepoError::DuplicateDate(date));
        }

        tx.execute(
            "INSERT INTO Dates (date) VALUES (?1);",
            [format_iso_date(date)],
        )?;
        let date_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO SunriseSunset (date_id, sunrise, sunset) VALUES (?1, ?2, ?3);",
            params![
                date_id,
                times.sunrise.to_12h_string(),
                times.sunset.to_12h_string(),
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    fn all_records(&self) -> RepoResult<Vec<DayRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{RECORD_SELECT_SQL} ORDER BY d.date ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();

        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }

        Ok(records)
    }

    fn count_records(&self) -> RepoResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM Dates d JOIN SunriseSunset s ON d.id = s.date_id;",
            [],
            |row| row.get(0),
        )?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative record count `{count}`")))
    }
}

fn date_exists(conn: &Connection, date: NaiveDate) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM Dates WHERE date = ?1);",
        [format_iso_date(date)],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn parse_record_row(row: &Row<'_>) -> RepoResult<DayRecord> {
    let date_text: String = row.get("date")?;
    let date = parse_stored_date(&date_text)?;

    let sunrise_text: String = row.get("sunrise")?;
    let sunrise = parse_stored_clock(&sunrise_text, "sunrise")?;

    let sunset_text: String = row.get("sunset")?;
    let sunset = parse_stored_clock(&sunset_text, "sunset")?;

    Ok(DayRecord::new(date, SunTimes::new(sunrise, sunset)))
}

fn parse_stored_date(value: &str) -> RepoResult<NaiveDate> {
    parse_iso_date(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid date `{value}` in Dates.date")))
}

fn parse_stored_clock(value: &str, column: &str) -> RepoResult<ClockTime> {
    ClockTime::parse_12h(value).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid clock time `{value}` in SunriseSunset.{column}"
        ))
    })
}
