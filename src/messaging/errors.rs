//! # Messaging Error Types
//!
//! Structured errors for the queue client, built with `thiserror`.

use crate::error::ValidationError;
use crate::resilience::CircuitBreakerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MessagingError {
    #[error("Queue connection error: {message}")]
    Connection { message: String },

    #[error("Queue operation failed: {queue_name}: {operation}: {message}")]
    QueueOperation {
        queue_name: String,
        operation: String,
        message: String,
    },

    #[error("Message serialization error: {message}")]
    MessageSerialization { message: String },

    #[error("Message deserialization error: {message}")]
    MessageDeserialization { message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Circuit breaker is open for component: {component}")]
    CircuitBreakerOpen { component: String },

    #[error("Reconnect attempts exhausted after {attempts} attempts")]
    ReconnectExhausted { attempts: u32 },

    #[error("Configuration error: {component}: {message}")]
    Configuration { component: String, message: String },
}

impl MessagingError {
    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a queue operation error
    pub fn queue_operation(
        queue_name: impl Into<String>,
        operation: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::QueueOperation {
            queue_name: queue_name.into(),
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::MessageSerialization {
            message: message.into(),
        }
    }

    pub fn deserialization(message: impl Into<String>) -> Self {
        Self::MessageDeserialization {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a queue creation error
    pub fn queue_creation(queue_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::queue_operation(queue_name, "create", message)
    }

    /// Create a send error
    pub fn send(queue_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::queue_operation(queue_name, "send", message)
    }

    /// Create a receive error
    pub fn receive(queue_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::queue_operation(queue_name, "receive", message)
    }

    /// Create an ack error
    pub fn ack(queue_name: impl Into<String>, delivery_tag: u64, message: impl Into<String>) -> Self {
        Self::queue_operation(queue_name, format!("ack(delivery_tag={})", delivery_tag), message)
    }

    /// Create a nack error
    pub fn nack(
        queue_name: impl Into<String>,
        delivery_tag: u64,
        message: impl Into<String>,
    ) -> Self {
        Self::queue_operation(
            queue_name,
            format!("nack(delivery_tag={})", delivery_tag),
            message,
        )
    }

    /// Whether the broker session is gone and a reconnect may help.
    ///
    /// Producers count these against the publish circuit breaker; the
    /// consumer loop treats them as a lost session.
    pub fn is_connection_error(&self) -> bool {
        match self {
            Self::Connection { .. } => true,
            Self::QueueOperation { operation, .. } => {
                operation == "send" || operation == "receive" || operation.starts_with("ack")
            }
            _ => false,
        }
    }
}

impl From<CircuitBreakerError<MessagingError>> for MessagingError {
    fn from(err: CircuitBreakerError<MessagingError>) -> Self {
        match err {
            CircuitBreakerError::CircuitOpen { component } => {
                MessagingError::CircuitBreakerOpen { component }
            }
            CircuitBreakerError::OperationFailed(inner) => inner,
        }
    }
}

impl From<serde_json::Error> for MessagingError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_eof() {
            MessagingError::deserialization(err.to_string())
        } else {
            MessagingError::serialization(err.to_string())
        }
    }
}

impl From<lapin::Error> for MessagingError {
    fn from(err: lapin::Error) -> Self {
        MessagingError::connection(err.to_string())
    }
}

pub type MessagingResult<T> = Result<T, MessagingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helper_constructors() {
        let err = MessagingError::send("scrape_jobs", "Publish failed: channel closed");
        assert_eq!(
            err.to_string(),
            "Queue operation failed: scrape_jobs: send: Publish failed: channel closed"
        );
        assert!(err.is_connection_error());

        let err = MessagingError::queue_creation("scrape_jobs", "access refused");
        assert!(!err.is_connection_error());
    }

    #[test]
    fn test_circuit_breaker_conversion() {
        let open: CircuitBreakerError<MessagingError> = CircuitBreakerError::CircuitOpen {
            component: "queue_publish".to_string(),
        };
        assert!(matches!(
            MessagingError::from(open),
            MessagingError::CircuitBreakerOpen { .. }
        ));

        let failed = CircuitBreakerError::OperationFailed(MessagingError::connection("refused"));
        assert!(MessagingError::from(failed).is_connection_error());
    }

    #[test]
    fn test_validation_is_transparent() {
        let err: MessagingError = ValidationError::new("identifier", "expected 14 digits").into();
        assert_eq!(err.to_string(), "Validation error: identifier: expected 14 digits");
    }
}
