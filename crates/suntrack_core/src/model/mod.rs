//! Domain model for stored sunrise/sunset observations.
//!
//! # Responsibility
//! - Define clock-time, date and location values shared by store, fetcher
//!   and aggregation code.
//!
//! # Invariants
//! - Dates are calendar days in ISO 8601 (`YYYY-MM-DD`) form.
//! - Clock times carry no date and have whole-second precision.

pub mod location;
pub mod sun_times;
