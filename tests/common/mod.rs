//! Shared test doubles: a recording cache spy and scripted fetchers

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use scrape_worker::cache::{CacheError, CacheResult, CacheService, MokaCacheService};
use scrape_worker::fetch::{FetchError, FetchedFields, Fetcher};

/// One `set` call as seen by [`RecordingCache`]
#[derive(Debug, Clone)]
pub struct RecordedWrite {
    pub key: String,
    pub value: Value,
    pub ttl: Option<Duration>,
}

/// Cache spy: stores through to Moka and remembers every write in order
#[derive(Debug, Clone)]
pub struct RecordingCache {
    inner: MokaCacheService,
    writes: Arc<Mutex<Vec<RecordedWrite>>>,
    fail_writes: Arc<AtomicBool>,
}

impl Default for RecordingCache {
    fn default() -> Self {
        Self {
            inner: MokaCacheService::new(1_000),
            writes: Arc::new(Mutex::new(Vec::new())),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl RecordingCache {
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.lock().clone()
    }

    /// Status labels written under `key`, oldest first
    pub fn statuses_for(&self, key: &str) -> Vec<String> {
        self.writes
            .lock()
            .iter()
            .filter(|w| w.key == key)
            .filter_map(|w| w.value["status"].as_str().map(str::to_string))
            .collect()
    }

    /// Make every following write fail with a backend error
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl CacheService for RecordingCache {
    async fn connect(&self) -> CacheResult<()> {
        self.inner.connect().await
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::BackendError("simulated write failure".to_string()));
        }
        let parsed = serde_json::from_str(value).unwrap_or(Value::Null);
        self.writes.lock().push(RecordedWrite {
            key: key.to_string(),
            value: parsed,
            ttl,
        });
        self.inner.set(key, value, ttl).await
    }

    async fn close(&self) -> CacheResult<()> {
        self.inner.close().await
    }

    async fn health_check(&self) -> CacheResult<bool> {
        Ok(true)
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

type FetchOutcome = Result<FetchedFields, FetchError>;

/// Fetcher answering from a script keyed by identifier
///
/// Each identifier has a queue of outcomes; the last one repeats. Unknown
/// identifiers fail with [`FetchError::Empty`].
#[derive(Debug, Default)]
pub struct StubFetcher {
    script: Mutex<HashMap<String, VecDeque<FetchOutcome>>>,
    calls: AtomicUsize,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fields(self, identifier: &str, fields: &[(&str, &str)]) -> Self {
        self.then(identifier, Ok(fields_of(fields)))
    }

    pub fn with_error(self, identifier: &str, error: FetchError) -> Self {
        self.then(identifier, Err(error))
    }

    /// Append an outcome for the next call on `identifier`
    pub fn then(self, identifier: &str, outcome: FetchOutcome) -> Self {
        self.script
            .lock()
            .entry(identifier.to_string())
            .or_default()
            .push_back(outcome);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, identifier: &str) -> Result<FetchedFields, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock();
        match script.get_mut(identifier) {
            Some(outcomes) if outcomes.len() > 1 => outcomes
                .pop_front()
                .unwrap_or_else(|| Err(FetchError::Empty(identifier.to_string()))),
            Some(outcomes) => outcomes
                .front()
                .cloned()
                .unwrap_or_else(|| Err(FetchError::Empty(identifier.to_string()))),
            None => Err(FetchError::Empty(identifier.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

pub fn fields_of(pairs: &[(&str, &str)]) -> FetchedFields {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Poll `condition` every few milliseconds until it holds or `limit` passes
pub async fn wait_until(limit: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
