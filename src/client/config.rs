//! Configuration for the Settee client.
//!
//! This module defines the [`ClientConfig`] struct that controls backoff on
//! rate limiting, queue concurrency, logging and credentials.
//!
//! # Configuration Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `should_back_off` | false | Retry 429 responses after a delay |
//! | `back_off_attempts` | 3 | Retries after a 429 (hard limit 10) |
//! | `initial_back_off_ms` | 250 | First backoff delay, doubled per retry |
//! | `max_concurrent_operations` | None | Queue concurrency bound |
//! | `enable_logging` | false | Log backoff retries at warn level |
//! | `username` / `password` | None | Basic credentials |
//! | `max_idle_connections` | 100 | Idle pooled connections per host |
//!
//! # Examples
//!
//! ```
//! use settee::client::ClientConfig;
//!
//! let config = ClientConfig::default()
//!     .with_back_off(5, 100)
//!     .with_max_concurrent_operations(4);
//! assert!(config.should_back_off);
//! assert_eq!(config.back_off_attempts, 5);
//! assert_eq!(config.max_concurrent_operations, Some(4));
//! ```

use std::fmt;

/// Configuration for a [`SetteeClient`](crate::SetteeClient).
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Retry requests answered with 429 after a delay.
    pub should_back_off: bool,

    /// Number of retries after a 429 response.
    ///
    /// The client never retries more than
    /// [`MAX_BACK_OFF_ATTEMPTS`](crate::http::MAX_BACK_OFF_ATTEMPTS) times,
    /// whatever this is set to.
    pub back_off_attempts: u32,

    /// First backoff delay in milliseconds.
    ///
    /// Each further retry doubles the delay, so choose this together with
    /// `back_off_attempts`.
    pub initial_back_off_ms: u64,

    /// Maximum number of operations executing at once. `None` is unbounded.
    /// `Some(0)` is rejected when the client is created.
    pub max_concurrent_operations: Option<usize>,

    /// Log backoff retries through `tracing`.
    pub enable_logging: bool,

    /// Username for basic authentication.
    pub username: Option<String>,

    /// Password for basic authentication.
    pub password: Option<String>,

    /// Idle pooled connections kept per host.
    pub max_idle_connections: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            should_back_off: false,
            back_off_attempts: 3,
            initial_back_off_ms: 250,
            max_concurrent_operations: None,
            enable_logging: false,
            username: None,
            password: None,
            max_idle_connections: 100,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("should_back_off", &self.should_back_off)
            .field("back_off_attempts", &self.back_off_attempts)
            .field("initial_back_off_ms", &self.initial_back_off_ms)
            .field("max_concurrent_operations", &self.max_concurrent_operations)
            .field("enable_logging", &self.enable_logging)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("max_idle_connections", &self.max_idle_connections)
            .finish()
    }
}

impl ClientConfig {
    /// Enable backing off on 429 with `attempts` retries starting at
    /// `initial_ms` milliseconds.
    #[must_use]
    pub fn with_back_off(mut self, attempts: u32, initial_ms: u64) -> Self {
        self.should_back_off = true;
        self.back_off_attempts = attempts;
        self.initial_back_off_ms = initial_ms;
        self
    }

    /// Bound the number of operations executing at once. `max` must be at
    /// least 1; [`SetteeClient::new`](crate::SetteeClient::new) rejects 0.
    #[must_use]
    pub fn with_max_concurrent_operations(mut self, max: usize) -> Self {
        self.max_concurrent_operations = Some(max);
        self
    }

    /// Authenticate with basic credentials.
    #[must_use]
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Log backoff retries.
    #[must_use]
    pub fn with_logging(mut self, enable: bool) -> Self {
        self.enable_logging = enable;
        self
    }
}
