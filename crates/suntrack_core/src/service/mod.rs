//! Use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and fetcher calls into run-level operations.
//! - Keep the CLI decoupled from storage and transport details.

pub mod ingest_service;
pub mod stats_service;
