//! # Scrape Worker
//!
//! Consumes scrape jobs and drives each one through the status record
//! lifecycle:
//!
//! ```text
//! (no record) -> IN_PROGRESS -> COMPLETED | FAILED
//! ```
//!
//! `IN_PROGRESS` is written before the fetch starts. Every fetch failure,
//! including a panic or an expired deadline, ends in a `FAILED` record and
//! never reaches the queue layer. Records expire after the configured TTL.
//! Concurrent workers share the key space without locking, so the last
//! terminal write for an identifier wins.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::cache::{CacheClient, CacheService};
use crate::constants::{DEFAULT_CACHE_TTL_SECONDS, DEFAULT_FETCH_TIMEOUT};
use crate::error::ScrapeResult;
use crate::fetch::{FetchError, FetchedFields, Fetcher};
use crate::logging::log_job_operation;
use crate::messaging::{HandlerOutcome, MessageHandler, QueueClient};
use crate::models::{CacheRecord, JobState, ScrapeJobMessage};

/// Per-worker tunables
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerSettings {
    /// Expiration applied to every status record write
    pub cache_ttl: Duration,
    /// Deadline for a single fetch; `None` waits indefinitely
    pub fetch_timeout: Option<Duration>,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS),
            fetch_timeout: Some(DEFAULT_FETCH_TIMEOUT),
        }
    }
}

#[derive(Debug, Default)]
struct WorkerStats {
    received: AtomicU64,
    rejected: AtomicU64,
    processed: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    cache_write_failures: AtomicU64,
}

/// Point-in-time copy of the worker counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerStatsSnapshot {
    pub received: u64,
    pub rejected: u64,
    pub processed: u64,
    pub completed: u64,
    pub failed: u64,
    pub cache_write_failures: u64,
}

/// Job-processing worker over an injected queue, cache and fetcher
pub struct ScrapeWorker<Q, C, F> {
    name: String,
    queue: Q,
    cache: CacheClient<C>,
    fetcher: F,
    settings: WorkerSettings,
    stats: WorkerStats,
}

impl<Q, C, F> std::fmt::Debug for ScrapeWorker<Q, C, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrapeWorker")
            .field("name", &self.name)
            .field("settings", &self.settings)
            .field("stats", &self.stats)
            .finish()
    }
}

impl<Q, C, F> ScrapeWorker<Q, C, F>
where
    Q: QueueClient,
    C: CacheService + 'static,
    F: Fetcher + 'static,
{
    pub fn new(queue: Q, cache: C, fetcher: F, settings: WorkerSettings) -> Self {
        Self {
            name: format!("scrape-worker-{}", std::process::id()),
            queue,
            cache: CacheClient::new(cache),
            fetcher,
            settings,
            stats: WorkerStats::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn cache(&self) -> &CacheClient<C> {
        &self.cache
    }

    pub fn settings(&self) -> &WorkerSettings {
        &self.settings
    }

    /// Connect the queue and cache, then consume until shutdown.
    ///
    /// Returns an error only when a connection cannot be established at
    /// startup or the consume loop gives up reconnecting.
    pub async fn start_worker(&self) -> ScrapeResult<()> {
        info!(
            worker = %self.name,
            queue = %self.queue.queue_name(),
            queue_provider = self.queue.provider_name(),
            cache_provider = self.cache.provider_name(),
            fetcher = self.fetcher.name(),
            "🚀 Starting scrape worker"
        );

        self.queue.connect().await?;
        self.cache.connect().await?;

        self.queue.consume_forever(self).await?;

        info!(worker = %self.name, stats = ?self.stats(), "✅ Scrape worker stopped");
        Ok(())
    }

    /// Handle one dequeued payload.
    ///
    /// Payloads that do not match the job contract are rejected without
    /// touching the cache. Everything else is processed to a terminal record.
    pub async fn process(&self, payload: Value) -> HandlerOutcome {
        self.stats.received.fetch_add(1, Ordering::Relaxed);

        let job = match ScrapeJobMessage::from_payload(payload) {
            Ok(job) => job,
            Err(e) => {
                self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                warn!(worker = %self.name, error = %e, "Abandoning malformed job message");
                return HandlerOutcome::rejected(e.reason);
            }
        };

        self.process_job(&job).await;
        HandlerOutcome::Processed
    }

    /// Run a parsed job and return the terminal record that was written
    pub async fn process_job(&self, job: &ScrapeJobMessage) -> CacheRecord {
        let identifier = job.identifier();
        let key = job.cache_key();
        self.stats.processed.fetch_add(1, Ordering::Relaxed);

        self.write_record(&key, &CacheRecord::in_progress()).await;
        log_job_operation("process", Some(identifier), "IN_PROGRESS", None);

        let record = match self.run_fetch(identifier).await {
            Ok(fields) if fields.is_empty() => {
                CacheRecord::failed(&FetchError::Empty(identifier.to_string()))
            }
            Ok(fields) => CacheRecord::completed(fields),
            Err(e) => CacheRecord::failed(&e),
        };

        match record.status {
            JobState::Completed => {
                self.stats.completed.fetch_add(1, Ordering::Relaxed);
                info!(identifier = %identifier, fields = record.data.len(), "Job completed");
            }
            _ => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                warn!(
                    identifier = %identifier,
                    error = record.data.get("error").map(String::as_str).unwrap_or_default(),
                    "Job failed"
                );
            }
        }

        self.write_record(&key, &record).await;
        log_job_operation(
            "process",
            Some(identifier),
            &record.status.to_string(),
            record.data.get("kind").map(String::as_str),
        );

        record
    }

    /// Invoke the fetcher under the deadline, turning panics into failures
    async fn run_fetch(&self, identifier: &str) -> Result<FetchedFields, FetchError> {
        let guarded = AssertUnwindSafe(self.fetcher.fetch(identifier)).catch_unwind();

        let outcome = match self.settings.fetch_timeout {
            Some(deadline) => match tokio::time::timeout(deadline, guarded).await {
                Ok(outcome) => outcome,
                Err(_) => return Err(FetchError::Timeout(deadline)),
            },
            None => guarded.await,
        };

        outcome.unwrap_or_else(|panic| {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(identifier = %identifier, reason = %reason, "Fetcher panicked");
            Err(FetchError::Failed(format!("fetcher panicked: {}", reason)))
        })
    }

    /// Store a record; failures only cost this job its bookkeeping
    async fn write_record(&self, key: &str, record: &CacheRecord) -> bool {
        match self
            .cache
            .set(key, record, Some(self.settings.cache_ttl))
            .await
        {
            Ok(()) => true,
            Err(e) => {
                self.stats.cache_write_failures.fetch_add(1, Ordering::Relaxed);
                error!(key = %key, status = %record.status, error = %e, "Failed to write status record");
                false
            }
        }
    }

    /// Stop consuming and release both connections
    pub async fn shutdown(&self) -> ScrapeResult<()> {
        info!(worker = %self.name, "🛑 Shutting down scrape worker");
        self.queue.close().await?;
        self.cache.close().await?;
        Ok(())
    }

    pub fn stats(&self) -> WorkerStatsSnapshot {
        WorkerStatsSnapshot {
            received: self.stats.received.load(Ordering::Relaxed),
            rejected: self.stats.rejected.load(Ordering::Relaxed),
            processed: self.stats.processed.load(Ordering::Relaxed),
            completed: self.stats.completed.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
            cache_write_failures: self.stats.cache_write_failures.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl<Q, C, F> MessageHandler for ScrapeWorker<Q, C, F>
where
    Q: QueueClient,
    C: CacheService + 'static,
    F: Fetcher + 'static,
{
    async fn handle(&self, payload: Value) -> HandlerOutcome {
        self.process(payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MokaCacheService;
    use crate::messaging::InMemoryQueueClient;
    use serde_json::json;

    struct MapFetcher;

    #[async_trait]
    impl Fetcher for MapFetcher {
        async fn fetch(&self, identifier: &str) -> Result<FetchedFields, FetchError> {
            match identifier {
                "00022244000175" => Ok(FetchedFields::from([
                    ("Name".to_string(), "Acme".to_string()),
                    ("Status".to_string(), "Active".to_string()),
                ])),
                "11111111111111" => Ok(FetchedFields::new()),
                "22222222222222" => panic!("selector not found"),
                "33333333333333" => {
                    tokio::time::sleep(Duration::from_secs(10)).await;
                    Ok(FetchedFields::new())
                }
                _ => Err(FetchError::Network("timeout".to_string())),
            }
        }
    }

    fn worker(
        settings: WorkerSettings,
    ) -> ScrapeWorker<InMemoryQueueClient, MokaCacheService, MapFetcher> {
        ScrapeWorker::new(
            InMemoryQueueClient::new("test"),
            MokaCacheService::new(100),
            MapFetcher,
            settings,
        )
    }

    async fn record(
        worker: &ScrapeWorker<InMemoryQueueClient, MokaCacheService, MapFetcher>,
        identifier: &str,
    ) -> CacheRecord {
        worker
            .cache()
            .get(&format!("scrape_job:{identifier}"))
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_completed_record() {
        let worker = worker(WorkerSettings::default());
        let job = ScrapeJobMessage::new("00022244000175").unwrap();

        let outcome = worker.process(job.to_json()).await;
        assert_eq!(outcome, HandlerOutcome::Processed);

        let stored = serde_json::to_value(record(&worker, "00022244000175").await).unwrap();
        assert_eq!(
            stored,
            json!({"status": "COMPLETED", "data": {"Name": "Acme", "Status": "Active"}})
        );
        assert_eq!(worker.stats().completed, 1);
    }

    #[tokio::test]
    async fn test_empty_result_is_failure() {
        let worker = worker(WorkerSettings::default());
        let job = ScrapeJobMessage::new("11111111111111").unwrap();

        let written = worker.process_job(&job).await;
        assert_eq!(written.status, JobState::Failed);
        assert_eq!(written.data["kind"], "empty");
    }

    #[tokio::test]
    async fn test_fetcher_panic_becomes_failed_record() {
        let worker = worker(WorkerSettings::default());
        let job = ScrapeJobMessage::new("22222222222222").unwrap();

        let written = worker.process_job(&job).await;
        assert_eq!(written.status, JobState::Failed);
        assert!(written.data["error"].contains("selector not found"));
        assert_eq!(record(&worker, "22222222222222").await, written);
    }

    #[tokio::test]
    async fn test_fetch_deadline() {
        let worker = worker(WorkerSettings {
            fetch_timeout: Some(Duration::from_millis(20)),
            ..Default::default()
        });
        let job = ScrapeJobMessage::new("33333333333333").unwrap();

        let written = worker.process_job(&job).await;
        assert_eq!(written.status, JobState::Failed);
        assert_eq!(written.data["kind"], "timeout");
        assert_eq!(written.data["error"], "Fetch timed out after 20ms");
    }

    #[tokio::test]
    async fn test_malformed_payload_is_rejected_without_record() {
        let worker = worker(WorkerSettings::default());

        let outcome = worker
            .process(json!({"job": "SCRAPE", "status": "QUEUED"}))
            .await;
        assert!(outcome.is_rejected());

        let stats = worker.stats();
        assert_eq!(stats.rejected, 1);
        assert_eq!(stats.processed, 0);
    }
}
