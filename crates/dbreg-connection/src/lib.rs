//! dbreg Connection - Named connection registry
//!
//! This crate owns the lifecycle of named database handles: lazy opening on
//! first use, a connectivity probe before a handle is cached, an optional
//! post-open hook, and coordinated shutdown. It also provides the default
//! multi-node client (`ClusterDatabase`) and the per-node pool it is built on.

pub mod cluster;
mod config;
pub mod health;
pub mod pool;
mod registry;

pub use cluster::{ClusterDatabase, ClusterOpener};
pub use config::{AfterOpen, ConnectionConfig, Configs, DEFAULT_CONNECTION};
pub use health::{HealthStatus, HealthThresholds, ping_connection};
pub use pool::{
    ConnectionFactory, ConnectionPool, DriverFactory, PoolConfig, PoolStats, PooledConnection,
};
pub use registry::Registry;

pub use dbreg_core::{Database, DatabaseOpener, DbRegError, Result};
