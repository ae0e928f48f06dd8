//! # Job Submitter
//!
//! Producer-side facade: validate caller input, publish the job, and read
//! its status record back from the cache. Publishes run through a circuit
//! breaker so producers fail fast while the broker is down.

use tracing::{debug, info};

use crate::cache::{CacheClient, CacheService};
use crate::error::ScrapeResult;
use crate::logging::log_job_operation;
use crate::messaging::{MessagingError, QueueClient};
use crate::models::{CacheRecord, ScrapeJobMessage};
use crate::resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
use crate::validation::normalize_identifier;
use crate::constants::cache_keys;

#[derive(Debug)]
pub struct JobSubmitter<Q, C> {
    queue: Q,
    cache: CacheClient<C>,
    publish_breaker: CircuitBreaker,
}

impl<Q, C> JobSubmitter<Q, C>
where
    Q: QueueClient,
    C: CacheService,
{
    pub fn new(queue: Q, cache: C, breaker_config: CircuitBreakerConfig) -> Self {
        Self {
            queue,
            cache: CacheClient::new(cache),
            publish_breaker: CircuitBreaker::new("queue_publish".to_string(), breaker_config),
        }
    }

    /// Validate `raw_identifier` and enqueue a scrape job for it.
    ///
    /// Returns the published message. Invalid input fails with a validation
    /// error before anything is sent.
    pub async fn submit(&self, raw_identifier: &str) -> ScrapeResult<ScrapeJobMessage> {
        let message = ScrapeJobMessage::new(raw_identifier)?;

        let published = self
            .publish_breaker
            .call(|| async { self.queue.publish(&message).await })
            .await
            .map_err(MessagingError::from)?;

        info!(
            identifier = %published.identifier(),
            queue = %self.queue.queue_name(),
            "Scrape job submitted"
        );
        log_job_operation(
            "submit",
            Some(published.identifier()),
            &published.status().to_string(),
            None,
        );
        Ok(published)
    }

    /// Current status record for an identifier, if any
    pub async fn result(&self, raw_identifier: &str) -> ScrapeResult<Option<CacheRecord>> {
        let identifier = normalize_identifier(raw_identifier)?;
        let key = cache_keys::scrape_job(&identifier);
        let record = self.cache.get::<CacheRecord>(&key).await?;
        debug!(key = %key, found = record.is_some(), "Status record lookup");
        Ok(record)
    }

    pub fn publish_circuit_state(&self) -> CircuitState {
        self.publish_breaker.state()
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub async fn close(&self) -> ScrapeResult<()> {
        self.queue.close().await?;
        self.cache.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MokaCacheService;
    use crate::error::ScrapeError;
    use crate::messaging::InMemoryQueueClient;

    fn submitter() -> JobSubmitter<InMemoryQueueClient, MokaCacheService> {
        JobSubmitter::new(
            InMemoryQueueClient::new("test"),
            MokaCacheService::new(100),
            CircuitBreakerConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_submit_normalizes_and_publishes() {
        let submitter = submitter();
        let message = submitter.submit("00.022.244/0001-75").await.unwrap();

        assert_eq!(message.identifier(), "00022244000175");
        assert_eq!(submitter.queue().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_rejects_invalid_input() {
        let submitter = submitter();
        let err = submitter.submit("123").await.unwrap_err();

        assert!(matches!(err, ScrapeError::Validation(_)));
        assert!(submitter.queue().is_empty());
    }

    #[tokio::test]
    async fn test_result_absent_before_processing() {
        let submitter = submitter();
        assert!(submitter.result("00022244000175").await.unwrap().is_none());
    }
}
