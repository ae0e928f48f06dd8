//! Cache service trait definition

use super::errors::CacheResult;
use std::time::Duration;

/// Raw string key-value operations implemented by each cache backend
///
/// Values are opaque strings here; JSON encoding is layered on top by
/// [`CacheClient`](super::CacheClient).
pub trait CacheService: Send + Sync {
    /// Establish the backend connection (idempotent)
    fn connect(&self) -> impl std::future::Future<Output = CacheResult<()>> + Send;

    /// Get a value from the cache by key
    ///
    /// Returns `Ok(Some(value))` on cache hit, `Ok(None)` on cache miss or expiry.
    fn get(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = CacheResult<Option<String>>> + Send;

    /// Store a value, replacing any previous one; `None` keeps it until evicted
    fn set(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> impl std::future::Future<Output = CacheResult<()>> + Send;

    /// Release the backend connection (idempotent, safe when never connected)
    fn close(&self) -> impl std::future::Future<Output = CacheResult<()>> + Send;

    /// Check if the cache backend is healthy
    fn health_check(&self) -> impl std::future::Future<Output = CacheResult<bool>> + Send;

    /// Get the name of the cache provider
    fn provider_name(&self) -> &'static str;
}
