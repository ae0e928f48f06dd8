//! # Queue Client Traits
//!
//! Provider-agnostic contract for the job queue: one named durable queue,
//! publish with confirmation, and a consume loop that hands each delivery to
//! a [`MessageHandler`] and acknowledges it once the handler returns.

use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::FutureExt;
use serde_json::Value;
use tracing::{error, warn};

use super::{MessagingError, MessagingResult};
use crate::models::ScrapeJobMessage;
use crate::resilience::ConnectionState;

/// What the handler made of a delivery
///
/// Every outcome is acknowledged; only `Rejected` deliveries are eligible
/// for dead-letter routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// Handled, whatever the job's own result was
    Processed,
    /// Payload did not match the message contract
    Rejected { reason: String },
    /// Handler panicked; the delivery is acknowledged and dropped
    Failed { reason: String },
}

impl HandlerOutcome {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// How a delivery is settled with the broker once its handler returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Ack,
    /// Negative acknowledgement without requeue, routed to the dead letter queue
    NackNoRequeue,
}

/// Settle every outcome with an ack, except rejected payloads when
/// dead-lettering is enabled
pub fn settlement(outcome: &HandlerOutcome, dead_letter_rejected: bool) -> Settlement {
    match outcome {
        HandlerOutcome::Rejected { .. } if dead_letter_rejected => Settlement::NackNoRequeue,
        _ => Settlement::Ack,
    }
}

/// Callback invoked for every parsed delivery
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, payload: Value) -> HandlerOutcome;
}

#[async_trait]
pub trait QueueClient: Send + Sync + 'static {
    /// Establish the broker session and declare the queue (idempotent)
    async fn connect(&self) -> MessagingResult<()>;

    /// Publish an already-serialized payload with persistent delivery and
    /// wait for the broker confirmation
    async fn publish_payload(&self, payload: Vec<u8>) -> MessagingResult<()>;

    /// Validate, serialize and publish a job, returning the published message
    async fn publish(&self, message: &ScrapeJobMessage) -> MessagingResult<ScrapeJobMessage> {
        message.validate()?;
        let payload = serde_json::to_vec(&message.to_json())?;
        self.publish_payload(payload).await?;
        Ok(message.clone())
    }

    /// Consume until [`close`](Self::close) is called or reconnecting gives up
    async fn consume_forever(&self, handler: &dyn MessageHandler) -> MessagingResult<()>;

    /// Release the session and stop a running consume loop (idempotent)
    async fn close(&self) -> MessagingResult<()>;

    async fn health_check(&self) -> MessagingResult<bool>;

    fn connection_state(&self) -> ConnectionState;

    fn queue_name(&self) -> &str;

    fn provider_name(&self) -> &'static str;
}

#[async_trait]
impl<T: QueueClient> QueueClient for std::sync::Arc<T> {
    async fn connect(&self) -> MessagingResult<()> {
        (**self).connect().await
    }

    async fn publish_payload(&self, payload: Vec<u8>) -> MessagingResult<()> {
        (**self).publish_payload(payload).await
    }

    async fn consume_forever(&self, handler: &dyn MessageHandler) -> MessagingResult<()> {
        (**self).consume_forever(handler).await
    }

    async fn close(&self) -> MessagingResult<()> {
        (**self).close().await
    }

    async fn health_check(&self) -> MessagingResult<bool> {
        (**self).health_check().await
    }

    fn connection_state(&self) -> ConnectionState {
        (**self).connection_state()
    }

    fn queue_name(&self) -> &str {
        (**self).queue_name()
    }

    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }
}

/// Parse a raw delivery body and run the handler on it.
///
/// Undecodable bodies are rejected without reaching the handler. A panicking
/// handler is contained so the consume loop keeps running.
pub async fn dispatch_delivery(handler: &dyn MessageHandler, body: &[u8]) -> HandlerOutcome {
    let payload: Value = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(e) => {
            let err = MessagingError::from(e);
            warn!(error = %err, bytes = body.len(), "Dropping undecodable delivery");
            return HandlerOutcome::rejected(err.to_string());
        }
    };

    match AssertUnwindSafe(handler.handle(payload)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "handler panicked".to_string());
            error!(reason = %reason, "Message handler panicked");
            HandlerOutcome::Failed { reason }
        }
    }
}
