//! # Data Model
//!
//! - [`scrape_job`] - the immutable job envelope placed on the queue
//! - [`cache_record`] - the per-identifier status record kept in the cache

pub mod cache_record;
pub mod scrape_job;

pub use cache_record::{CacheRecord, JobState};
pub use scrape_job::{QueueStatus, ScrapeJobMessage};
