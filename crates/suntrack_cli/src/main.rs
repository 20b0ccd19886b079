//! Command-line entry point for one tracker run.
//!
//! # Responsibility
//! - Resolve configuration and start logging.
//! - Sequence ingest, report and chart steps against one database.
//!
//! # Invariants
//! - Ingestion failures stop the run before any downstream step.
//! - Report or chart failures never touch already committed data.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use suntrack_core::db::open_db;
use suntrack_core::model::sun_times::{is_storable_date, parse_iso_date};
use suntrack_core::{
    init_logging, load_config, ChartSeries, ChartSink, HttpSunTimesFetcher, IngestService,
    SqliteSunTimesRepository, StatsError, StatsService, SunTimesFetcher, SunTimesRepository,
    TrackerConfig,
};

#[derive(Debug, Parser)]
#[command(name = "suntrack", version, about = "Collects daily sunrise/sunset times")]
struct Cli {
    /// TOML configuration file; built-in defaults are used when omitted.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Overrides the calendar date used to seed the first window.
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_today)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Command {
    /// Ingest one window, then write the report and chart (default).
    Run,
    /// Ingest one window only.
    Ingest,
    /// Write the report and chart from stored data only.
    Report,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match resolve_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(message) => {
            eprintln!("suntrack: {message}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = start_logging(&config) {
        eprintln!("suntrack: {err}");
        return ExitCode::FAILURE;
    }

    let today = cli.today.unwrap_or_else(|| Local::now().date_naive());
    match run(&config, cli.command.unwrap_or(Command::Run), today) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_run module=cli status=error error={message}");
            ExitCode::FAILURE
        }
    }
}

fn resolve_config(path: Option<&Path>) -> Result<TrackerConfig, String> {
    match path {
        Some(path) => load_config(path).map_err(|err| err.to_string()),
        None => Ok(TrackerConfig::default()),
    }
}

fn start_logging(config: &TrackerConfig) -> Result<(), String> {
    let log_dir = if config.log_dir.is_absolute() {
        config.log_dir.clone()
    } else {
        std::env::current_dir()
            .map_err(|err| format!("cannot resolve log directory: {err}"))?
            .join(&config.log_dir)
    };
    init_logging(&config.log_level, &log_dir).map_err(|err| err.to_string())
}

fn run(config: &TrackerConfig, command: Command, today: NaiveDate) -> Result<(), String> {
    let conn = open_db(&config.db_path).map_err(|err| err.to_string())?;
    let repo = SqliteSunTimesRepository::new(&conn);
    let make_fetcher = || {
        HttpSunTimesFetcher::new(&config.api_base_url, config.request_timeout())
            .map_err(|err| format!("cannot build http client: {err}"))
    };

    #[cfg(feature = "chart")]
    let sink = suntrack_core::PngChartSink::new(&config.chart_path);
    #[cfg(not(feature = "chart"))]
    let sink = DisabledChartSink;

    run_with(config, &repo, make_fetcher, &sink, command, today)
}

/// Runs `command` against an open store. The fetcher is only built when the
/// command ingests.
fn run_with<R, F>(
    config: &TrackerConfig,
    repo: &R,
    make_fetcher: impl FnOnce() -> Result<F, String>,
    sink: &dyn ChartSink,
    command: Command,
    today: NaiveDate,
) -> Result<(), String>
where
    R: SunTimesRepository,
    F: SunTimesFetcher,
{
    if matches!(command, Command::Run | Command::Ingest) {
        let fetcher = make_fetcher()?;
        let report = IngestService::new(repo, fetcher, config.location, config.window_days)
            .run(today)
            .map_err(|err| err.to_string())?;
        println!(
            "ingested {} new date(s) from {} through {} ({} unavailable)",
            report.added,
            report.start.succ_opt().unwrap_or(report.start),
            report.window_end,
            report.unavailable.len()
        );
    }

    if command == Command::Ingest {
        return Ok(());
    }

    let summary = match StatsService::new(repo).write_report(&config.report_path) {
        Ok(summary) => summary,
        Err(StatsError::NoData) => {
            warn!("event=cli_run module=cli status=skipped reason=no_data");
            println!("no stored records yet; report and chart skipped");
            return Ok(());
        }
        Err(err) => return Err(err.to_string()),
    };
    println!(
        "report written to {} ({} records)",
        config.report_path.display(),
        summary.dates.len()
    );

    sink.render(&ChartSeries::from_summary(&summary, config.chart_range))
        .map_err(|err| err.to_string())?;
    info!("event=cli_run module=cli status=ok");
    Ok(())
}

/// Parses `--today`, limited to four-digit years.
fn parse_today(value: &str) -> Result<NaiveDate, String> {
    let date = parse_iso_date(value).map_err(|err| format!("expected YYYY-MM-DD: {err}"))?;
    if !is_storable_date(date) {
        return Err(format!("year must be between 0000 and 9999, got `{value}`"));
    }
    Ok(date)
}

#[cfg(not(feature = "chart"))]
struct DisabledChartSink;

#[cfg(not(feature = "chart"))]
impl ChartSink for DisabledChartSink {
    fn render(&self, series: &ChartSeries) -> Result<(), suntrack_core::ChartError> {
        info!(
            "event=chart_render module=cli status=skipped reason=feature_disabled points={}",
            series.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_today, run_with, Cli, Command};
    use chrono::NaiveDate;
    use clap::Parser;
    use std::cell::RefCell;
    use suntrack_core::db::open_db;
    use suntrack_core::{
        ChartError, ChartSeries, ChartSink, ClockTime, Location, SqliteSunTimesRepository,
        SunTimes, SunTimesFetcher, SunTimesRepository, TrackerConfig, Unavailable,
    };
    use tempfile::TempDir;

    struct FixedFetcher;

    impl SunTimesFetcher for FixedFetcher {
        fn fetch(&self, _location: Location, _date: NaiveDate) -> Result<SunTimes, Unavailable> {
            Ok(SunTimes::new(
                ClockTime::from_hms(6, 30, 0).unwrap(),
                ClockTime::from_hms(20, 0, 0).unwrap(),
            ))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        rendered: RefCell<Vec<usize>>,
    }

    impl ChartSink for RecordingSink {
        fn render(&self, series: &ChartSeries) -> Result<(), ChartError> {
            self.rendered.borrow_mut().push(series.len());
            Ok(())
        }
    }

    fn test_config(dir: &TempDir) -> TrackerConfig {
        TrackerConfig {
            window_days: 5,
            db_path: dir.path().join("sunrise_sunset.db"),
            report_path: dir.path().join("calculated_data.txt"),
            chart_path: dir.path().join("sunrise_sunset.png"),
            ..TrackerConfig::default()
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, 1).unwrap()
    }

    fn no_fetcher() -> Result<FixedFetcher, String> {
        Err("fetcher must not be built".to_string())
    }

    #[test]
    fn defaults_to_run_without_subcommand() {
        let cli = Cli::try_parse_from(["suntrack"]).unwrap();
        assert_eq!(cli.command, None);
        assert!(cli.config.is_none());
    }

    #[test]
    fn parses_config_today_and_subcommand() {
        let cli = Cli::try_parse_from([
            "suntrack",
            "--config",
            "suntrack.toml",
            "--today",
            "2024-08-01",
            "report",
        ])
        .unwrap();
        assert_eq!(cli.command, Some(Command::Report));
        assert_eq!(cli.today, Some(today()));
    }

    #[test]
    fn rejects_malformed_today() {
        assert!(Cli::try_parse_from(["suntrack", "--today", "08/01/2024"]).is_err());
    }

    #[test]
    fn rejects_today_beyond_four_digit_years() {
        assert!(parse_today("+262142-12-31").is_err());
        assert!(parse_today("10000-01-01").is_err());
        assert_eq!(
            parse_today("9999-12-31").unwrap(),
            NaiveDate::from_ymd_opt(9999, 12, 31).unwrap()
        );
    }

    #[test]
    fn report_on_empty_store_skips_report_and_chart() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        let conn = open_db(&config.db_path).unwrap();
        let repo = SqliteSunTimesRepository::new(&conn);
        let sink = RecordingSink::default();

        run_with(&config, &repo, no_fetcher, &sink, Command::Report, today()).unwrap();

        assert!(!config.report_path.exists());
        assert!(sink.rendered.borrow().is_empty());
    }

    #[test]
    fn ingest_stores_window_without_report_or_chart() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        let conn = open_db(&config.db_path).unwrap();
        let repo = SqliteSunTimesRepository::new(&conn);
        let sink = RecordingSink::default();

        run_with(&config, &repo, || Ok(FixedFetcher), &sink, Command::Ingest, today()).unwrap();

        assert_eq!(repo.count_records().unwrap(), 5);
        assert!(!config.report_path.exists());
        assert!(sink.rendered.borrow().is_empty());
    }

    #[test]
    fn run_ingests_then_writes_report_and_chart() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        let conn = open_db(&config.db_path).unwrap();
        let repo = SqliteSunTimesRepository::new(&conn);
        let sink = RecordingSink::default();

        run_with(&config, &repo, || Ok(FixedFetcher), &sink, Command::Run, today()).unwrap();

        let report = std::fs::read_to_string(&config.report_path).unwrap();
        assert!(report.contains("Average sunrise time: 06:30:00\n"));
        assert!(report.contains("Average sunset time: 20:00:00\n"));
        assert_eq!(*sink.rendered.borrow(), vec![5]);
    }

    #[test]
    fn report_uses_stored_data_without_building_fetcher() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(&dir);
        let conn = open_db(&config.db_path).unwrap();
        let repo = SqliteSunTimesRepository::new(&conn);
        let sink = RecordingSink::default();
        run_with(&config, &repo, || Ok(FixedFetcher), &sink, Command::Ingest, today()).unwrap();

        run_with(&config, &repo, no_fetcher, &sink, Command::Report, today()).unwrap();

        assert!(config.report_path.exists());
        assert_eq!(repo.count_records().unwrap(), 5);
        assert_eq!(*sink.rendered.borrow(), vec![5]);
    }
}
