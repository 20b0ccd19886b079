//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the data access contract used by ingestion and aggregation.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - A date row is only ever written together with its sun-times row.
//! - Repository APIs return semantic errors (`DuplicateDate`) in addition to
//!   DB transport errors.

pub mod sun_repo;
