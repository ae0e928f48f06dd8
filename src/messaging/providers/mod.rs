//! # Queue Client Providers
//!
//! - [`RabbitMqClient`] - RabbitMQ via the lapin crate
//! - [`InMemoryQueueClient`] - process-local FIFO for tests and development

mod in_memory;
mod rabbitmq;

pub use in_memory::InMemoryQueueClient;
pub use rabbitmq::{RabbitMqClient, RabbitMqSettings};
