use std::time::Duration;

use super::defaults::{DEFAULT_RECONNECT_INITIAL, DEFAULT_RECONNECT_MAX};

/// Exponential backoff for subscriber reconnects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Consecutive failed attempts before giving up. `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_delay: DEFAULT_RECONNECT_INITIAL,
            max_delay: DEFAULT_RECONNECT_MAX,
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Ensure `max_delay >= initial_delay`.
    pub fn normalized(mut self) -> Self {
        if self.max_delay < self.initial_delay {
            self.max_delay = self.initial_delay;
        }
        self
    }

    /// Delay before retry number `attempt` (1-based): initial, 2x, 4x, ...
    /// capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    pub fn is_exhausted(&self, failed_attempts: u32) -> bool {
        self.max_attempts
            .is_some_and(|limit| failed_attempts >= limit)
    }
}
