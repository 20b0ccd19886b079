//! Schema migration registry and executor for the sun-times store.
//!
//! # Responsibility
//! - Register schema migrations in strictly increasing order.
//! - Adopt unversioned databases that already hold `Dates`/`SunriseSunset`
//!   (as written by the pre-versioning tool) after checking their columns.
//! - Apply pending migrations in one transaction.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - An unversioned table missing a required column is never adopted.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct Migration {
    version: u32,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    sql: include_str!("0001_init.sql"),
}];

/// Columns an unversioned table must already have to be adopted.
const LEGACY_TABLES: &[(&str, &[&str])] = &[
    ("Dates", &["id", "date"]),
    ("SunriseSunset", &["id", "date_id", "sunrise", "sunset"]),
];

/// What `apply_migrations` did to the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    UpToDate { version: u32 },
    /// Fresh or partially migrated database brought to `version`.
    Migrated { from: u32, version: u32 },
    /// Unversioned database with existing tables, rows kept in place.
    AdoptedLegacy { version: u32, legacy_dates: u64 },
}

/// Returns the latest migration version known by this binary.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies all pending migrations on the provided connection.
///
/// # Errors
/// - `UnsupportedSchemaVersion` for a database written by a newer binary.
/// - `IncompatibleLegacyTable` when an unversioned table lacks a column.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<MigrationOutcome> {
    let current_version = current_user_version(conn)?;
    let latest = latest_version();

    if current_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current_version,
            latest_supported: latest,
        });
    }

    if current_version == latest {
        return Ok(MigrationOutcome::UpToDate { version: latest });
    }

    let legacy_dates = if current_version == 0 {
        check_legacy_tables(conn)?
    } else {
        None
    };

    let tx = conn.transaction()?;
    for migration in MIGRATIONS {
        if migration.version <= current_version {
            continue;
        }

        tx.execute_batch(migration.sql)?;
        tx.execute_batch(&format!("PRAGMA user_version = {};", migration.version))?;
    }
    tx.commit()?;

    let outcome = match legacy_dates {
        Some(legacy_dates) => {
            info!(
                "event=db_migrate module=db status=adopted from=0 to={} legacy_dates={}",
                latest, legacy_dates
            );
            MigrationOutcome::AdoptedLegacy {
                version: latest,
                legacy_dates,
            }
        }
        None => {
            info!(
                "event=db_migrate module=db status=ok from={} to={}",
                current_version, latest
            );
            MigrationOutcome::Migrated {
                from: current_version,
                version: latest,
            }
        }
    };
    Ok(outcome)
}

/// Returns the legacy `Dates` row count when any legacy table exists.
fn check_legacy_tables(conn: &Connection) -> DbResult<Option<u64>> {
    let mut found_any = false;
    for (table, required) in LEGACY_TABLES {
        let columns = table_columns(conn, table)?;
        if columns.is_empty() {
            continue;
        }
        found_any = true;
        if let Some(missing) = required
            .iter()
            .find(|column| !columns.iter().any(|existing| existing == *column))
        {
            return Err(DbError::IncompatibleLegacyTable {
                table: (*table).to_string(),
                missing_column: (*missing).to_string(),
            });
        }
    }

    if !found_any {
        return Ok(None);
    }
    if table_columns(conn, "Dates")?.is_empty() {
        return Ok(Some(0));
    }
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM Dates;", [], |row| row.get(0))?;
    Ok(Some(u64::try_from(count).unwrap_or(0)))
}

fn table_columns(conn: &Connection, table: &str) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let columns = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::{apply_migrations, latest_version, MigrationOutcome};
    use crate::db::DbError;
    use rusqlite::Connection;

    #[test]
    fn fresh_database_is_migrated_then_up_to_date() {
        let mut conn = Connection::open_in_memory().unwrap();

        assert_eq!(
            apply_migrations(&mut conn).unwrap(),
            MigrationOutcome::Migrated {
                from: 0,
                version: latest_version()
            }
        );
        assert_eq!(
            apply_migrations(&mut conn).unwrap(),
            MigrationOutcome::UpToDate {
                version: latest_version()
            }
        );
    }

    #[test]
    fn legacy_tables_are_adopted_with_their_rows() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE Dates (id INTEGER PRIMARY KEY AUTOINCREMENT, date TEXT UNIQUE);
             CREATE TABLE SunriseSunset (id INTEGER PRIMARY KEY, date_id INTEGER, sunrise TEXT, sunset TEXT);
             INSERT INTO Dates (date) VALUES ('2024-08-01'), ('2024-08-02');",
        )
        .unwrap();

        assert_eq!(
            apply_migrations(&mut conn).unwrap(),
            MigrationOutcome::AdoptedLegacy {
                version: latest_version(),
                legacy_dates: 2
            }
        );
    }

    #[test]
    fn legacy_table_missing_column_is_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE SunriseSunset (id INTEGER PRIMARY KEY, date_id INTEGER);")
            .unwrap();

        let err = apply_migrations(&mut conn).unwrap_err();
        match err {
            DbError::IncompatibleLegacyTable {
                table,
                missing_column,
            } => {
                assert_eq!(table, "SunriseSunset");
                assert_eq!(missing_column, "sunrise");
            }
            other => panic!("unexpected error: {other}"),
        }
        let version: u32 = conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, 0);
    }
}
