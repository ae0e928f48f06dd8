//! Redis cache provider
//!
//! Uses `redis::aio::ConnectionManager` for an async multiplexed connection
//! that reconnects on its own. The manager is created on first use.

use crate::cache::errors::{CacheError, CacheResult};
use crate::cache::traits::CacheService;
use crate::logging::redact_url;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Redis-backed cache service
pub struct RedisCacheService {
    client: redis::Client,
    url: String,
    connection: Mutex<Option<ConnectionManager>>,
}

impl std::fmt::Debug for RedisCacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheService")
            .field("url", &redact_url(&self.url))
            .field("connection_manager", &"ConnectionManager")
            .finish()
    }
}

impl RedisCacheService {
    /// Create a service for `url`; no connection is made yet
    pub fn new(url: &str) -> CacheResult<Self> {
        let client = redis::Client::open(url).map_err(|e| {
            CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
        })?;

        Ok(Self {
            client,
            url: url.to_string(),
            connection: Mutex::new(None),
        })
    }

    /// Connected manager, established lazily
    async fn manager(&self) -> CacheResult<ConnectionManager> {
        let mut guard = self.connection.lock().await;
        if let Some(manager) = guard.as_ref() {
            return Ok(manager.clone());
        }

        let manager = ConnectionManager::new(self.client.clone())
            .await
            .map_err(|e| CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e)))?;

        info!(url = %redact_url(&self.url), "Redis cache service connected");
        *guard = Some(manager.clone());
        Ok(manager)
    }
}

/// `PX` argument for a TTL; Redis rejects a zero expiry
fn expiry_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

impl CacheService for RedisCacheService {
    async fn connect(&self) -> CacheResult<()> {
        self.manager().await.map(|_| ())
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.manager().await?;
        let result: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::BackendError(format!("Redis GET failed: {}", e)))?;

        if result.is_some() {
            debug!(key = key, "Cache HIT");
        } else {
            debug!(key = key, "Cache MISS");
        }

        Ok(result)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()> {
        let mut conn = self.manager().await?;
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);

        let ttl_millis = ttl.map(expiry_millis);
        if let Some(millis) = ttl_millis {
            cmd.arg("PX").arg(millis);
        }

        let _: () = cmd
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::BackendError(format!("Redis SET failed: {}", e)))?;

        debug!(key = key, ttl_millis = ?ttl_millis, "Cache SET");
        Ok(())
    }

    async fn close(&self) -> CacheResult<()> {
        if self.connection.lock().await.take().is_some() {
            debug!(url = %redact_url(&self.url), "Redis connection released");
        }
        Ok(())
    }

    async fn health_check(&self) -> CacheResult<bool> {
        let mut conn = self.manager().await?;
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| CacheError::BackendError(format!("Redis PING failed: {}", e)))?;

        Ok(pong == "PONG")
    }

    fn provider_name(&self) -> &'static str {
        "redis"
    }
}
