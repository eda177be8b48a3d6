//! Per-request backoff bookkeeping for rate-limited (429) responses.

use crate::client::{exponential_backoff, ClientConfig};
use std::time::Duration;

/// Hard ceiling on 429 retries, whatever the configured attempt count.
pub const MAX_BACK_OFF_ATTEMPTS: u32 = 10;

/// Tracks retries for one top-level request.
///
/// A fresh state is created for every request submitted to the transport, so
/// no backoff history is shared between operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffState {
    attempts: u32,
    limit: u32,
    initial: Duration,
}

impl BackoffState {
    /// Create a state allowing `attempts` retries starting at `initial`.
    pub fn new(attempts: u32, initial: Duration) -> Self {
        BackoffState {
            attempts: 0,
            limit: attempts.min(MAX_BACK_OFF_ATTEMPTS),
            initial,
        }
    }

    /// Backoff state for a client configuration. Backing off disabled means
    /// no retries at all.
    pub fn from_config(config: &ClientConfig) -> Self {
        let attempts = if config.should_back_off {
            config.back_off_attempts
        } else {
            0
        };
        Self::new(attempts, Duration::from_millis(config.initial_back_off_ms))
    }

    /// Delay before the next retry, or `None` once retries are exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.limit {
            return None;
        }
        let delay = exponential_backoff(self.attempts, self.initial);
        self.attempts += 1;
        Some(delay)
    }

    /// Retries taken so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Maximum retries this state allows.
    pub fn limit(&self) -> u32 {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delays_double() {
        let mut state = BackoffState::new(3, Duration::from_millis(250));
        assert_eq!(state.next_delay(), Some(Duration::from_millis(250)));
        assert_eq!(state.next_delay(), Some(Duration::from_millis(500)));
        assert_eq!(state.next_delay(), Some(Duration::from_millis(1000)));
        assert_eq!(state.next_delay(), None);
        assert_eq!(state.attempts(), 3);
    }

    #[test]
    fn test_hard_ceiling() {
        let mut state = BackoffState::new(50, Duration::from_millis(1));
        assert_eq!(state.limit(), MAX_BACK_OFF_ATTEMPTS);

        let mut retries = 0;
        while state.next_delay().is_some() {
            retries += 1;
        }
        assert_eq!(retries, 10);
    }

    #[test]
    fn test_disabled_by_config() {
        let config = ClientConfig {
            should_back_off: false,
            back_off_attempts: 5,
            ..Default::default()
        };
        let mut state = BackoffState::from_config(&config);
        assert_eq!(state.next_delay(), None);
    }

    #[test]
    fn test_from_config() {
        let config = ClientConfig::default().with_back_off(2, 100);
        let mut state = BackoffState::from_config(&config);
        assert_eq!(state.next_delay(), Some(Duration::from_millis(100)));
        assert_eq!(state.next_delay(), Some(Duration::from_millis(200)));
        assert_eq!(state.next_delay(), None);
    }
}
