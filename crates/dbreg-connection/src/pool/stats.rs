//! Pool statistics types

use serde::{Deserialize, Serialize};

/// Statistics about a connection pool's current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    /// Total number of open connections (idle + in use)
    open: usize,
    /// Number of idle connections available in the pool
    idle: usize,
    /// Number of connections currently in use
    in_use: usize,
    /// Number of requests waiting for a connection
    waiting: usize,
}

impl PoolStats {
    /// Create new pool statistics
    pub fn new(open: usize, idle: usize, in_use: usize, waiting: usize) -> Self {
        Self {
            open,
            idle,
            in_use,
            waiting,
        }
    }

    /// Get the number of open connections
    pub fn open(&self) -> usize {
        self.open
    }

    /// Get the number of idle connections
    pub fn idle(&self) -> usize {
        self.idle
    }

    /// Get the number of in-use connections
    pub fn in_use(&self) -> usize {
        self.in_use
    }

    /// Get the number of waiting requests
    pub fn waiting(&self) -> usize {
        self.waiting
    }

    /// Calculate pool utilization as a fraction (0.0 to 1.0)
    ///
    /// Returns 0.0 if nothing is open.
    pub fn utilization(&self) -> f64 {
        if self.open == 0 {
            0.0
        } else {
            self.in_use as f64 / self.open as f64
        }
    }

    /// Sum the statistics of several pools
    pub fn merge(self, other: PoolStats) -> PoolStats {
        PoolStats::new(
            self.open + other.open,
            self.idle + other.idle,
            self.in_use + other.in_use,
            self.waiting + other.waiting,
        )
    }
}

impl Default for PoolStats {
    fn default() -> Self {
        Self::new(0, 0, 0, 0)
    }
}
