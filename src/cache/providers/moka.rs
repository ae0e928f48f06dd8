//! In-memory cache provider using Moka
//!
//! In-process cache with per-entry TTL for tests and single-instance
//! deployments. Not distributed: every process sees only its own records.

use crate::cache::errors::CacheResult;
use crate::cache::traits::CacheService;
use moka::Expiry;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct CachedEntry {
    value: String,
    ttl: Option<Duration>,
}

/// Expires each entry after the TTL it was written with
struct PerEntryTtl;

impl Expiry<String, CachedEntry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        value.ttl
    }

    // A write replaces the record, so the expiry restarts from the new TTL
    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        value.ttl
    }
}

/// In-memory cache service using Moka
#[derive(Clone)]
pub struct MokaCacheService {
    cache: moka::future::Cache<String, CachedEntry>,
}

impl std::fmt::Debug for MokaCacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaCacheService")
            .field("max_capacity", &self.cache.policy().max_capacity())
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}

impl Default for MokaCacheService {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl MokaCacheService {
    pub fn new(max_capacity: u64) -> Self {
        let cache = moka::future::Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        debug!(max_capacity = max_capacity, "Moka in-memory cache service created");

        Self { cache }
    }
}

impl CacheService for MokaCacheService {
    async fn connect(&self) -> CacheResult<()> {
        Ok(())
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let result = self.cache.get(key).await.map(|entry| entry.value);

        if result.is_some() {
            debug!(key = key, "Cache HIT (moka)");
        } else {
            debug!(key = key, "Cache MISS (moka)");
        }

        Ok(result)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()> {
        self.cache
            .insert(
                key.to_string(),
                CachedEntry {
                    value: value.to_string(),
                    ttl,
                },
            )
            .await;

        debug!(key = key, ttl_seconds = ?ttl.map(|t| t.as_secs_f64()), "Cache SET (moka)");
        Ok(())
    }

    async fn close(&self) -> CacheResult<()> {
        Ok(())
    }

    async fn health_check(&self) -> CacheResult<bool> {
        // In-memory cache is always healthy
        Ok(true)
    }

    fn provider_name(&self) -> &'static str {
        "moka"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_moka_get_returns_none_on_miss() {
        let svc = MokaCacheService::new(100);
        assert_eq!(svc.get("nonexistent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_moka_set_replaces_value() {
        let svc = MokaCacheService::new(100);
        svc.set("key1", "first", None).await.unwrap();
        svc.set("key1", "second", None).await.unwrap();
        assert_eq!(svc.get("key1").await.unwrap(), Some("second".to_string()));
    }

    #[tokio::test]
    async fn test_moka_entry_expires_after_its_ttl() {
        let svc = MokaCacheService::new(100);
        svc.set("short", "v", Some(Duration::from_millis(50)))
            .await
            .unwrap();
        svc.set("long", "v", Some(Duration::from_secs(60)))
            .await
            .unwrap();
        assert!(svc.get("short").await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(svc.get("short").await.unwrap().is_none());
        assert!(svc.get("long").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_moka_health_and_name() {
        let svc = MokaCacheService::default();
        assert!(svc.health_check().await.unwrap());
        assert_eq!(svc.provider_name(), "moka");
        assert!(svc.close().await.is_ok());
    }
}
