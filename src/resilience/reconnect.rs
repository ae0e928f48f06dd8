//! # Reconnect State Machine
//!
//! Tracks the consumer's broker session: `Idle -> Connected -> Disconnected
//! -> Connected ...`, ending in `Closed` on shutdown or `Exhausted` once an
//! attempt limit is configured and reached.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use crate::constants::{DEFAULT_MAX_RECONNECT_BACKOFF, DEFAULT_RECONNECT_BACKOFF};

/// Backoff schedule between reconnect attempts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconnectPolicy {
    pub initial_backoff: Duration,
    pub multiplier: f64,
    pub max_backoff: Duration,
    /// `None` retries forever
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: DEFAULT_RECONNECT_BACKOFF,
            multiplier: 2.0,
            max_backoff: DEFAULT_MAX_RECONNECT_BACKOFF,
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Constant delay, unbounded attempts
    pub fn fixed(delay: Duration) -> Self {
        Self {
            initial_backoff: delay,
            multiplier: 1.0,
            max_backoff: delay,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Delay before the given 1-based attempt
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32) as i32;
        let secs = self.initial_backoff.as_secs_f64() * self.multiplier.max(1.0).powi(exponent);
        let capped = secs.min(self.max_backoff.as_secs_f64());
        Duration::from_secs_f64(capped.max(0.0))
    }
}

/// Observable session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionState {
    Idle,
    Connected,
    Disconnected { attempt: u32, backoff: Duration },
    Exhausted { attempts: u32 },
    Closed,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

#[derive(Debug)]
pub struct ReconnectStateMachine {
    policy: ReconnectPolicy,
    state: Mutex<ConnectionState>,
}

impl ReconnectStateMachine {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(ConnectionState::Idle),
        }
    }

    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    pub fn on_connected(&self) {
        let mut state = self.state.lock();
        if let ConnectionState::Disconnected { attempt, .. } = *state {
            info!(attempt, "Broker session re-established");
        }
        *state = ConnectionState::Connected;
    }

    /// Record a lost or failed session.
    ///
    /// Returns the delay to wait before the next attempt, or the number of
    /// attempts made once the limit is reached.
    pub fn on_disconnected(&self) -> Result<Duration, u32> {
        let mut state = self.state.lock();
        let attempt = match *state {
            ConnectionState::Disconnected { attempt, .. } => attempt + 1,
            ConnectionState::Exhausted { attempts } => return Err(attempts),
            _ => 1,
        };

        if let Some(max) = self.policy.max_attempts {
            if attempt > max {
                warn!(attempts = max, "Reconnect attempts exhausted");
                *state = ConnectionState::Exhausted { attempts: max };
                return Err(max);
            }
        }

        let backoff = self.policy.backoff_for(attempt);
        warn!(
            attempt,
            backoff_seconds = backoff.as_secs_f64(),
            "Broker session lost, scheduling reconnect"
        );
        *state = ConnectionState::Disconnected { attempt, backoff };
        Ok(backoff)
    }

    pub fn on_closed(&self) {
        *self.state.lock() = ConnectionState::Closed;
    }
}
