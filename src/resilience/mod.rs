//! # Resilience Module
//!
//! Fault handling around the queue broker:
//!
//! - **Circuit Breaker**: producers fail fast while the broker keeps refusing publishes
//! - **Reconnect State Machine**: `Connected -> Disconnected(backoff) -> Connected`
//!   with exponential backoff and an optional attempt limit for the consumer loop
//!
//! ## Usage
//!
//! ```rust,no_run
//! use scrape_worker::resilience::{CircuitBreaker, CircuitBreakerConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CircuitBreakerConfig {
//!     failure_threshold: 3,
//!     timeout: Duration::from_secs(15),
//!     success_threshold: 1,
//! };
//!
//! let circuit_breaker = CircuitBreaker::new("queue_publish".to_string(), config);
//!
//! let result = circuit_breaker.call(|| async {
//!     Ok::<&str, std::io::Error>("published")
//! }).await?;
//! # Ok(())
//! # }
//! ```

pub mod circuit_breaker;
pub mod config;
pub mod reconnect;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerError, CircuitBreakerMetrics, CircuitState};
pub use config::CircuitBreakerConfig;
pub use reconnect::{ConnectionState, ReconnectPolicy, ReconnectStateMachine};
