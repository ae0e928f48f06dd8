//! # System Constants
//!
//! Wire-level names and operational defaults shared by producers, the queue
//! client, the cache client and the worker.

use std::time::Duration;

/// Job discriminators carried in the `job` field of queue payloads
pub mod jobs {
    /// Scrape job: fetch the external record for a 14-digit identifier
    pub const SCRAPE: &str = "SCRAPE";
}

/// Cache key layout
pub mod cache_keys {
    /// Prefix for per-identifier scrape job status records
    pub const SCRAPE_JOB_PREFIX: &str = "scrape_job:";

    /// Build the status record key for an identifier
    pub fn scrape_job(identifier: &str) -> String {
        format!("{SCRAPE_JOB_PREFIX}{identifier}")
    }
}

/// Number of digits a normalized identifier must have
pub const IDENTIFIER_LENGTH: usize = 14;

/// Expiration applied to every status record write (seconds)
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 3600;

/// First reconnect delay after the queue connection is lost
pub const DEFAULT_RECONNECT_BACKOFF: Duration = Duration::from_secs(5);

/// Upper bound for the exponential reconnect delay
pub const DEFAULT_MAX_RECONNECT_BACKOFF: Duration = Duration::from_secs(60);

/// Deadline applied to a single fetch when none is configured
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(300);

/// Default durable queue name
pub const DEFAULT_QUEUE_NAME: &str = "scrape_jobs";

/// AMQP persistent delivery mode
pub const PERSISTENT_DELIVERY_MODE: u8 = 2;
