//! Probe outcome classification

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Health of a node as observed by one probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Answered within the healthy threshold
    Healthy,
    /// Answered, but slower than the healthy threshold
    Degraded,
    /// Answered too slowly, or not at all
    Unhealthy,
}

impl HealthStatus {
    /// Classify a probe latency with the default thresholds
    pub fn from_latency(latency: Duration) -> Self {
        HealthThresholds::default().classify(latency)
    }

    /// Classify a probe outcome; a failed probe is always `Unhealthy`
    pub fn from_probe<E>(outcome: &Result<Duration, E>, thresholds: &HealthThresholds) -> Self {
        match outcome {
            Ok(latency) => thresholds.classify(*latency),
            Err(_) => HealthStatus::Unhealthy,
        }
    }

    /// Both `Healthy` and `Degraded` nodes can serve requests.
    pub fn is_usable(&self) -> bool {
        !matches!(self, HealthStatus::Unhealthy)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
        };
        f.write_str(label)
    }
}

/// Latency limits separating the health classes
///
/// Both limits are inclusive: a latency equal to `healthy` is still healthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthThresholds {
    pub healthy: Duration,
    pub degraded: Duration,
}

impl HealthThresholds {
    /// Build thresholds from milliseconds; `degraded_ms` is raised to `healthy_ms` if lower.
    pub fn from_millis(healthy_ms: u64, degraded_ms: u64) -> Self {
        Self {
            healthy: Duration::from_millis(healthy_ms),
            degraded: Duration::from_millis(degraded_ms.max(healthy_ms)),
        }
    }

    pub fn classify(&self, latency: Duration) -> HealthStatus {
        if latency <= self.healthy {
            HealthStatus::Healthy
        } else if latency <= self.degraded {
            HealthStatus::Degraded
        } else {
            HealthStatus::Unhealthy
        }
    }
}

impl Default for HealthThresholds {
    /// healthy <= 100ms, degraded <= 500ms
    fn default() -> Self {
        Self::from_millis(100, 500)
    }
}
