//! # Circuit Breaker Implementation
//!
//! Classic three-state breaker: Closed (normal operation), Open (failing
//! fast), Half-Open (letting a few calls through to test recovery).

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::resilience::CircuitBreakerConfig;

/// Circuit breaker states representing the current operational mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CircuitState {
    /// Normal operation - all calls are allowed through
    Closed = 0,
    /// Failure mode - all calls fail fast without executing
    Open = 1,
    /// Testing recovery - limited calls allowed to test system health
    HalfOpen = 2,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            2 => CircuitState::HalfOpen,
            _ => CircuitState::Open,
        }
    }
}

/// Errors that can occur during circuit breaker operation
#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    /// Circuit is open, rejecting all calls
    #[error("Circuit breaker is open for {component}")]
    CircuitOpen { component: String },

    /// Operation failed and was recorded
    #[error("Operation failed: {0}")]
    OperationFailed(E),
}

/// Snapshot of breaker counters
#[derive(Debug, Clone, Default, Serialize)]
pub struct CircuitBreakerMetrics {
    pub total_calls: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub rejected_count: u64,
    pub consecutive_failures: u64,
    pub half_open_calls: u64,
}

#[derive(Debug, Default)]
struct BreakerInner {
    metrics: CircuitBreakerMetrics,
    opened_at: Option<Instant>,
    /// Test calls let through since entering half-open, finished or not
    half_open_admitted: u64,
}

/// Circuit breaker with atomic state and mutex-protected counters
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    state: AtomicU8,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(name: String, config: CircuitBreakerConfig) -> Self {
        info!(
            component = %name,
            failure_threshold = config.failure_threshold,
            timeout_seconds = config.timeout.as_secs(),
            success_threshold = config.success_threshold,
            "Circuit breaker initialized"
        );

        Self {
            name,
            state: AtomicU8::new(CircuitState::Closed as u8),
            config,
            inner: Mutex::new(BreakerInner::default()),
        }
    }

    pub fn state(&self) -> CircuitState {
        CircuitState::from(self.state.load(Ordering::Acquire))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execute an operation with circuit breaker protection
    pub async fn call<F, T, E, Fut>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.should_allow_call() {
            self.inner.lock().metrics.rejected_count += 1;
            return Err(CircuitBreakerError::CircuitOpen {
                component: self.name.clone(),
            });
        }

        let start_time = Instant::now();
        let result = operation().await;
        let duration = start_time.elapsed();

        match &result {
            Ok(_) => self.record_success(duration),
            Err(_) => self.record_failure(duration),
        }

        result.map_err(CircuitBreakerError::OperationFailed)
    }

    /// Admission decision, taken under the lock so concurrent callers
    /// cannot exceed the half-open budget
    fn should_allow_call(&self) -> bool {
        let mut inner = self.inner.lock();
        match self.state() {
            CircuitState::Closed => true,
            CircuitState::Open => match inner.opened_at.map(|at| at.elapsed()) {
                Some(elapsed) if elapsed >= self.config.timeout => {
                    self.enter_half_open(&mut inner);
                    inner.half_open_admitted = 1;
                    true
                }
                Some(_) => false,
                None => {
                    warn!(component = %self.name, "Circuit open but no timestamp recorded");
                    true
                }
            },
            CircuitState::HalfOpen => {
                if inner.half_open_admitted < self.config.success_threshold as u64 {
                    inner.half_open_admitted += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    fn record_success(&self, duration: Duration) {
        let close = {
            let mut inner = self.inner.lock();
            inner.metrics.total_calls += 1;
            inner.metrics.success_count += 1;
            inner.metrics.consecutive_failures = 0;

            if self.state() == CircuitState::HalfOpen {
                inner.metrics.half_open_calls += 1;
                inner.metrics.half_open_calls >= self.config.success_threshold as u64
            } else {
                false
            }
        };

        debug!(
            component = %self.name,
            duration_ms = duration.as_millis() as u64,
            "Protected operation succeeded"
        );

        if close {
            self.transition_to_closed();
        }
    }

    fn record_failure(&self, duration: Duration) {
        let open = {
            let mut inner = self.inner.lock();
            inner.metrics.total_calls += 1;
            inner.metrics.failure_count += 1;
            inner.metrics.consecutive_failures += 1;

            match self.state() {
                CircuitState::Closed => {
                    inner.metrics.consecutive_failures >= self.config.failure_threshold as u64
                }
                // Any failure while probing reopens immediately
                CircuitState::HalfOpen => true,
                CircuitState::Open => false,
            }
        };

        warn!(
            component = %self.name,
            duration_ms = duration.as_millis() as u64,
            "Protected operation failed"
        );

        if open {
            self.transition_to_open();
        }
    }

    fn transition_to_closed(&self) {
        self.state.store(CircuitState::Closed as u8, Ordering::Release);
        let mut inner = self.inner.lock();
        inner.metrics.consecutive_failures = 0;
        inner.metrics.half_open_calls = 0;
        inner.half_open_admitted = 0;
        inner.opened_at = None;

        info!(component = %self.name, "Circuit breaker closed (recovered)");
    }

    fn transition_to_open(&self) {
        self.state.store(CircuitState::Open as u8, Ordering::Release);
        let mut inner = self.inner.lock();
        inner.opened_at = Some(Instant::now());
        inner.metrics.half_open_calls = 0;
        inner.half_open_admitted = 0;

        error!(
            component = %self.name,
            consecutive_failures = inner.metrics.consecutive_failures,
            timeout_seconds = self.config.timeout.as_secs(),
            "Circuit breaker opened (failing fast)"
        );
    }

    fn enter_half_open(&self, inner: &mut BreakerInner) {
        self.state.store(CircuitState::HalfOpen as u8, Ordering::Release);
        inner.metrics.half_open_calls = 0;
        inner.half_open_admitted = 0;

        info!(component = %self.name, "Circuit breaker half-open (testing recovery)");
    }

    /// Force circuit to closed state (operator recovery)
    pub fn force_closed(&self) {
        warn!(component = %self.name, "Circuit breaker forced closed");
        self.transition_to_closed();
    }

    pub fn metrics(&self) -> CircuitBreakerMetrics {
        self.inner.lock().metrics.clone()
    }
}
