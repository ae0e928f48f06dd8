//! # Messaging Module
//!
//! Job queue client: a provider-agnostic [`QueueClient`] trait, a RabbitMQ
//! implementation over `lapin`, and an in-memory implementation for tests
//! and local development.

pub mod errors;
pub mod providers;
pub mod traits;

pub use errors::{MessagingError, MessagingResult};
pub use providers::{InMemoryQueueClient, RabbitMqClient, RabbitMqSettings};
pub use traits::{
    dispatch_delivery, settlement, HandlerOutcome, MessageHandler, QueueClient, Settlement,
};
