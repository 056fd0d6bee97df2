//! Connectivity probing for database connections
//!
//! The registry trusts a handle only after it answers one probe. This module
//! provides the probe itself and a latency classification used when logging
//! probe outcomes.
//!
//! # Example
//!
//! ```ignore
//! use dbreg_connection::health::{ping_connection, HealthStatus};
//!
//! let latency = ping_connection(&*connection, "SELECT 1").await?;
//! let status = HealthStatus::from_latency(latency);
//! ```

mod ping;
mod status;


pub use ping::ping_connection;
pub use status::{HealthStatus, HealthThresholds};
