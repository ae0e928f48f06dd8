//! # Worker
//!
//! The job-processing loop: [`ScrapeWorker`] composes a queue client, a cache
//! and a fetcher and implements the status record state machine.

pub mod scrape_worker;

pub use scrape_worker::{ScrapeWorker, WorkerSettings, WorkerStatsSnapshot};
