//! # In-Memory Queue Client
//!
//! Process-local FIFO implementing [`QueueClient`] for tests and development.
//!
//! - Messages are delivered once, in publish order, with no redelivery
//! - `close()` lets a running consumer drain what is buffered, then return
//! - Failure hooks simulate an unreachable broker and lost sessions so the
//!   reconnect path can be exercised without RabbitMQ

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::constants::DEFAULT_QUEUE_NAME;
use crate::messaging::traits::{
    dispatch_delivery, settlement, HandlerOutcome, MessageHandler, QueueClient, Settlement,
};
use crate::messaging::{MessagingError, MessagingResult};
use crate::resilience::{ConnectionState, ReconnectPolicy, ReconnectStateMachine};

#[derive(Debug, Default)]
struct QueueState {
    messages: VecDeque<Vec<u8>>,
    dead_letters: Vec<Vec<u8>>,
    connected: bool,
    closed: bool,
    unavailable: bool,
    failing_sessions: u32,
}

/// In-memory queue client
///
/// # Example
///
/// ```rust
/// use scrape_worker::messaging::{InMemoryQueueClient, QueueClient};
/// use scrape_worker::models::ScrapeJobMessage;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let queue = InMemoryQueueClient::new("scrape_jobs");
/// let job = ScrapeJobMessage::new("00.022.244/0001-75").unwrap();
/// queue.publish(&job).await.unwrap();
/// assert_eq!(queue.len(), 1);
/// # }
/// ```
#[derive(Debug)]
pub struct InMemoryQueueClient {
    queue_name: String,
    dead_letter_malformed: bool,
    state: Mutex<QueueState>,
    notify: Notify,
    reconnect: ReconnectStateMachine,
    total_published: AtomicU64,
    total_acked: AtomicU64,
}

impl Default for InMemoryQueueClient {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_NAME)
    }
}

impl InMemoryQueueClient {
    pub fn new(queue_name: impl Into<String>) -> Self {
        Self {
            queue_name: queue_name.into(),
            dead_letter_malformed: false,
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
            reconnect: ReconnectStateMachine::new(ReconnectPolicy::default()),
            total_published: AtomicU64::new(0),
            total_acked: AtomicU64::new(0),
        }
    }

    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = ReconnectStateMachine::new(policy);
        self
    }

    pub fn with_dead_letter(mut self, enabled: bool) -> Self {
        self.dead_letter_malformed = enabled;
        self
    }

    /// Enqueue a raw body, bypassing validation
    pub fn inject_raw(&self, body: impl Into<Vec<u8>>) {
        self.state.lock().messages.push_back(body.into());
        self.notify.notify_one();
    }

    /// Simulate an unreachable broker for connect and publish
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.lock().unavailable = unavailable;
    }

    /// Make the next `count` consumer sessions fail to open
    pub fn fail_next_sessions(&self, count: u32) {
        self.state.lock().failing_sessions = count;
    }

    /// Bodies routed to the dead letter queue
    pub fn dead_letters(&self) -> Vec<Vec<u8>> {
        self.state.lock().dead_letters.clone()
    }

    /// Messages buffered and not yet delivered
    pub fn len(&self) -> usize {
        self.state.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_published(&self) -> u64 {
        self.total_published.load(Ordering::Relaxed)
    }

    pub fn total_acked(&self) -> u64 {
        self.total_acked.load(Ordering::Relaxed)
    }

    fn open_session(&self) -> MessagingResult<()> {
        let mut state = self.state.lock();
        if state.unavailable {
            return Err(MessagingError::connection("in-memory broker unavailable"));
        }
        if state.failing_sessions > 0 {
            state.failing_sessions -= 1;
            return Err(MessagingError::connection("simulated session loss"));
        }
        state.connected = true;
        Ok(())
    }

    /// Next buffered body, `Err(())` once closed and drained
    fn next_message(&self) -> Result<Option<Vec<u8>>, ()> {
        let mut state = self.state.lock();
        match state.messages.pop_front() {
            Some(body) => Ok(Some(body)),
            None if state.closed => Err(()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl QueueClient for InMemoryQueueClient {
    async fn connect(&self) -> MessagingResult<()> {
        self.state.lock().closed = false;
        self.open_session()?;
        self.reconnect.on_connected();
        Ok(())
    }

    async fn publish_payload(&self, payload: Vec<u8>) -> MessagingResult<()> {
        {
            let mut state = self.state.lock();
            if state.unavailable {
                return Err(MessagingError::send(
                    &self.queue_name,
                    "in-memory broker unavailable",
                ));
            }
            state.connected = true;
            state.messages.push_back(payload);
        }
        self.total_published.fetch_add(1, Ordering::Relaxed);
        self.notify.notify_one();
        Ok(())
    }

    async fn consume_forever(&self, handler: &dyn MessageHandler) -> MessagingResult<()> {
        'session: loop {
            if let Err(err) = self.open_session() {
                warn!(queue = %self.queue_name, error = %err, "Queue session lost");
                match self.reconnect.on_disconnected() {
                    Ok(backoff) => {
                        tokio::select! {
                            _ = tokio::time::sleep(backoff) => {}
                            _ = self.notify.notified() => {}
                        }
                        let drained = {
                            let state = self.state.lock();
                            state.closed && state.messages.is_empty()
                        };
                        if drained {
                            break 'session;
                        }
                        continue 'session;
                    }
                    Err(attempts) => return Err(MessagingError::ReconnectExhausted { attempts }),
                }
            }
            self.reconnect.on_connected();

            loop {
                match self.next_message() {
                    Ok(Some(body)) => {
                        let outcome = dispatch_delivery(handler, &body).await;
                        if let HandlerOutcome::Rejected { reason } = &outcome {
                            warn!(queue = %self.queue_name, reason = %reason, "Rejected message");
                        }
                        match settlement(&outcome, self.dead_letter_malformed) {
                            Settlement::NackNoRequeue => self.state.lock().dead_letters.push(body),
                            Settlement::Ack => {
                                self.total_acked.fetch_add(1, Ordering::Relaxed);
                            }
                        }
                    }
                    Ok(None) => self.notify.notified().await,
                    Err(()) => break 'session,
                }
            }
        }

        info!(queue = %self.queue_name, "Consume loop stopped");
        Ok(())
    }

    async fn close(&self) -> MessagingResult<()> {
        {
            let mut state = self.state.lock();
            state.closed = true;
            state.connected = false;
        }
        self.reconnect.on_closed();
        self.notify.notify_one();
        debug!(queue = %self.queue_name, "In-memory queue closed");
        Ok(())
    }

    async fn health_check(&self) -> MessagingResult<bool> {
        let state = self.state.lock();
        Ok(state.connected && !state.unavailable)
    }

    fn connection_state(&self) -> ConnectionState {
        self.reconnect.state()
    }

    fn queue_name(&self) -> &str {
        &self.queue_name
    }

    fn provider_name(&self) -> &'static str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScrapeJobMessage;
    use serde_json::Value;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<Value>>);

    #[async_trait]
    impl MessageHandler for Recorder {
        async fn handle(&self, payload: Value) -> HandlerOutcome {
            let outcome = if payload.get("identifier").is_some() {
                HandlerOutcome::Processed
            } else {
                HandlerOutcome::rejected("missing field `identifier`")
            };
            self.0.lock().push(payload);
            outcome
        }
    }

    #[tokio::test]
    async fn test_publish_then_drain_after_close() {
        let queue = InMemoryQueueClient::new("test_queue");
        let job = ScrapeJobMessage::new("00022244000175").unwrap();

        let published = queue.publish(&job).await.unwrap();
        assert_eq!(published, job);
        queue.close().await.unwrap();

        let recorder = Recorder::default();
        queue.consume_forever(&recorder).await.unwrap();

        let seen = recorder.0.lock().clone();
        assert_eq!(seen, vec![job.to_json()]);
        assert_eq!(queue.total_acked(), 1);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_rejected_message_dead_lettered_when_enabled() {
        let queue = InMemoryQueueClient::new("test_queue").with_dead_letter(true);
        queue.inject_raw(br#"{"job":"SCRAPE","status":"QUEUED"}"#.to_vec());
        queue.close().await.unwrap();

        queue.consume_forever(&Recorder::default()).await.unwrap();
        assert_eq!(queue.dead_letters().len(), 1);
        assert_eq!(queue.total_acked(), 0);
    }

    #[tokio::test]
    async fn test_rejected_message_dropped_by_default() {
        let queue = InMemoryQueueClient::new("test_queue");
        queue.inject_raw(b"not json".to_vec());
        queue.close().await.unwrap();

        queue.consume_forever(&Recorder::default()).await.unwrap();
        assert!(queue.dead_letters().is_empty());
        assert_eq!(queue.total_acked(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_broker_fails_publish() {
        let queue = InMemoryQueueClient::new("test_queue");
        queue.set_unavailable(true);

        let job = ScrapeJobMessage::new("00022244000175").unwrap();
        let err = queue.publish(&job).await.unwrap_err();
        assert!(err.is_connection_error());
        assert!(queue.connect().await.is_err());
    }

    #[tokio::test]
    async fn test_reconnect_exhausted() {
        let queue = InMemoryQueueClient::new("test_queue").with_reconnect_policy(
            ReconnectPolicy::fixed(Duration::from_millis(1)).with_max_attempts(2),
        );
        queue.fail_next_sessions(10);

        let err = queue
            .consume_forever(&Recorder::default())
            .await
            .unwrap_err();
        assert!(matches!(err, MessagingError::ReconnectExhausted { attempts: 2 }));
        assert_eq!(
            queue.connection_state(),
            ConnectionState::Exhausted { attempts: 2 }
        );
    }

    #[tokio::test]
    async fn test_recovers_after_lost_sessions() {
        let queue = InMemoryQueueClient::new("test_queue")
            .with_reconnect_policy(ReconnectPolicy::fixed(Duration::from_millis(1)));
        queue.fail_next_sessions(2);

        let job = ScrapeJobMessage::new("00022244000175").unwrap();
        queue.publish(&job).await.unwrap();
        queue.close().await.unwrap();

        let recorder = Recorder::default();
        queue.consume_forever(&recorder).await.unwrap();
        assert_eq!(recorder.0.lock().len(), 1);
    }
}
