//! JSON layer over a [`CacheService`]

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

use super::errors::{CacheError, CacheResult};
use super::traits::CacheService;

/// Stores serde values as JSON strings
///
/// A stored value that no longer parses as `T` reads back as absent; the
/// difference from a plain miss only shows up in the logs.
#[derive(Debug)]
pub struct CacheClient<S> {
    service: S,
}

impl<S: CacheService> CacheClient<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub async fn connect(&self) -> CacheResult<()> {
        self.service.connect().await
    }

    /// Serialize and store `value`, fully replacing the previous one
    pub async fn set<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        let encoded = serde_json::to_string(value)
            .map_err(|e| CacheError::SerializationError(e.to_string()))?;
        self.service.set(key, &encoded, ttl).await
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        let Some(raw) = self.service.get(key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key = key, error = %e, "Ignoring corrupt cache entry");
                Ok(None)
            }
        }
    }

    pub async fn close(&self) -> CacheResult<()> {
        self.service.close().await
    }

    pub async fn health_check(&self) -> CacheResult<bool> {
        self.service.health_check().await
    }

    pub fn provider_name(&self) -> &'static str {
        self.service.provider_name()
    }
}
