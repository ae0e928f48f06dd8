//! # Fetch Capability
//!
//! The long-running, failure-prone external operation a worker runs for each
//! job. The worker only sees the [`Fetcher`] trait; concrete implementations
//! (browser automation sidecar, plain HTTP, test stubs) are injected.

pub mod http;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub use http::{HttpFetcher, HttpFetcherConfig};

/// Extracted field name -> value
pub type FetchedFields = BTreeMap<String, String>;

/// Failure modes of a fetch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Fetch network error: {0}")]
    Network(String),

    #[error("Fetch parse error: {0}")]
    Parse(String),

    #[error("Fetch timed out after {0:?}")]
    Timeout(Duration),

    #[error("Fetch returned no usable data for {0}")]
    Empty(String),

    #[error("Fetch failed: {0}")]
    Failed(String),
}

impl FetchError {
    /// Short machine-readable label stored next to the description
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "network",
            FetchError::Parse(_) => "parse",
            FetchError::Timeout(_) => "timeout",
            FetchError::Empty(_) => "empty",
            FetchError::Failed(_) => "failed",
        }
    }
}

/// Capability that retrieves the external record for a validated identifier
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, identifier: &str) -> Result<FetchedFields, FetchError>;

    /// Name for logging
    fn name(&self) -> &'static str {
        "fetcher"
    }
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    async fn fetch(&self, identifier: &str) -> Result<FetchedFields, FetchError> {
        (**self).fetch(identifier).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
