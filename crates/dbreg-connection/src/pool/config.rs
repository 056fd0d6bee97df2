//! Pool configuration types

use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_MAX_IDLE: usize = 2;

/// Configuration for a connection pool
///
/// Controls pool sizing, acquire timeout, and connection lifetime.
/// A `max_open` of zero means unlimited; a `max_idle` of zero keeps no
/// idle connections at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum number of connections open at once (0 = unlimited)
    max_open: usize,
    /// Maximum number of idle connections kept for reuse
    max_idle: usize,
    /// Timeout in milliseconds when acquiring a connection from the pool
    acquire_timeout_ms: u64,
    /// Maximum lifetime of a connection in milliseconds before it's recycled
    max_lifetime_ms: Option<u64>,
}

impl PoolConfig {
    /// Create a new pool configuration with the given open and idle limits
    ///
    /// `max_idle` is clamped to `max_open` when `max_open` is non-zero.
    pub fn new(max_open: usize, max_idle: usize) -> Self {
        let mut config = Self {
            max_open: 0,
            max_idle,
            acquire_timeout_ms: 30_000, // 30 seconds default
            max_lifetime_ms: None,
        };
        config.set_max_open(max_open);
        config
    }

    /// Set the acquire timeout in milliseconds
    pub fn with_acquire_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.acquire_timeout_ms = timeout_ms;
        self
    }

    /// Set the maximum connection lifetime in milliseconds
    pub fn with_max_lifetime_ms(mut self, lifetime_ms: u64) -> Self {
        self.set_max_lifetime(Duration::from_millis(lifetime_ms));
        self
    }

    /// Change the open-connection limit
    pub fn set_max_open(&mut self, max_open: usize) {
        self.max_open = max_open;
        if max_open > 0 && self.max_idle > max_open {
            self.max_idle = max_open;
        }
    }

    /// Change the idle-connection limit
    pub fn set_max_idle(&mut self, max_idle: usize) {
        self.max_idle = if self.max_open > 0 {
            max_idle.min(self.max_open)
        } else {
            max_idle
        };
    }

    /// Change the connection lifetime; zero removes the limit
    pub fn set_max_lifetime(&mut self, lifetime: Duration) {
        self.max_lifetime_ms = if lifetime.is_zero() {
            None
        } else {
            Some(u64::try_from(lifetime.as_millis()).unwrap_or(u64::MAX))
        };
    }

    /// Get the open-connection limit (0 = unlimited)
    pub fn max_open(&self) -> usize {
        self.max_open
    }

    /// Get the idle-connection limit
    pub fn max_idle(&self) -> usize {
        self.max_idle
    }

    /// Get the acquire timeout as a Duration
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    /// Get the maximum lifetime as a Duration if set
    pub fn max_lifetime(&self) -> Option<Duration> {
        self.max_lifetime_ms.map(Duration::from_millis)
    }

    /// Check whether another connection may be opened given `open` already exist
    pub(super) fn has_capacity(&self, open: usize) -> bool {
        self.max_open == 0 || open < self.max_open
    }
}

impl Default for PoolConfig {
    /// Create a default pool configuration
    ///
    /// Defaults:
    /// - max_open: unlimited
    /// - max_idle: 2
    /// - acquire_timeout: 30 seconds
    /// - max_lifetime: None
    fn default() -> Self {
        Self::new(0, DEFAULT_MAX_IDLE)
    }
}
