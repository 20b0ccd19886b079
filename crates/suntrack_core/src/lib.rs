//! Core of the sunrise/sunset tracker.
//! Owns every storage and ingestion invariant; the CLI only wires it up.

pub mod chart;
pub mod config;
pub mod db;
pub mod fetch;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use chart::{ChartError, ChartSeries, ChartSink};
#[cfg(feature = "chart")]
pub use chart::PngChartSink;
pub use config::{load_config, ChartRange, ConfigError, TrackerConfig};
pub use fetch::sunrise_api::{parse_payload, HttpSunTimesFetcher};
pub use fetch::{SunTimesFetcher, Unavailable};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::location::Location;
pub use model::sun_times::{ClockTime, ClockTimeParseError, DayRecord, SunTimes};
pub use repo::sun_repo::{RepoError, RepoResult, SqliteSunTimesRepository, SunTimesRepository};
pub use service::ingest_service::{IngestReport, IngestService};
pub use service::stats_service::{StatsError, StatsResult, StatsService, SunSummary};
