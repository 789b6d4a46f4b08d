//! Platform-agnostic reconnection backoff for the game socket.
//!
//! This is deliberately free of any runtime dependencies (tokio etc.). The
//! connection manager owns a [`BackoffState`] and asks it how long to wait
//! before each reconnection attempt.

use std::time::Duration;

use super::shared::{BACKOFF_MULTIPLIER, INITIAL_RETRY_DELAY_MS, MAX_RETRY_DELAY_MS};

/// How reconnection delays evolve. Attempts are unlimited.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconnectPolicy {
    pub initial_delay: Duration,
    /// `1.0` keeps the delay fixed; larger values back off exponentially.
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(INITIAL_RETRY_DELAY_MS),
            multiplier: BACKOFF_MULTIPLIER,
            max_delay: Duration::from_millis(MAX_RETRY_DELAY_MS),
        }
    }
}

impl ReconnectPolicy {
    /// A fixed interval between attempts.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            initial_delay: delay,
            multiplier: 1.0,
            max_delay: delay,
        }
    }
}

/// Backoff state shared by reconnect logic.
#[derive(Debug, Clone, Copy)]
pub struct BackoffState {
    policy: ReconnectPolicy,
    attempts: u32,
    delay: Duration,
}

impl BackoffState {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            delay: policy.initial_delay,
        }
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
        self.delay = self.policy.initial_delay;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Advance to the next attempt, updating the delay for the subsequent attempt.
    ///
    /// Returns the delay to wait *before* performing this attempt.
    pub fn next_delay_and_advance(&mut self) -> Duration {
        let current = self.delay;
        self.attempts = self.attempts.saturating_add(1);
        let max_secs = self.policy.max_delay.as_secs_f64();
        let grown = (current.as_secs_f64() * self.policy.multiplier).min(max_secs);
        let grown = if grown.is_finite() && grown >= 0.0 { grown } else { max_secs };
        self.delay = Duration::from_secs_f64(grown)
            .max(self.policy.initial_delay.min(self.policy.max_delay));
        current
    }
}

impl Default for BackoffState {
    fn default() -> Self {
        Self::new(ReconnectPolicy::default())
    }
}
