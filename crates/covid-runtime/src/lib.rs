//! Runtime layer for covid-series.
//!
//! Owns ingestion results on behalf of long-running hosts: a TTL-cached
//! manager and a tokio loop that re-ingests periodically and publishes
//! immutable snapshots.

pub mod data_manager;
pub mod orchestrator;

pub use covid_core as core;
pub use covid_data as data;
