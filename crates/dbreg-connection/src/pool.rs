//! Connection pooling for a single database node
//!
//! Each node of a `ClusterDatabase` owns one `ConnectionPool`. The pool opens
//! connections lazily, keeps a bounded number of idle connections for reuse,
//! and enforces the open-connection and lifetime limits the registry tunes
//! after opening a handle.
//!
//! # Example
//!
//! ```ignore
//! use dbreg_connection::pool::{ConnectionPool, DriverFactory, PoolConfig};
//!
//! let config = PoolConfig::new(20, 5).with_max_lifetime_ms(300_000);
//! let pool = ConnectionPool::new(config, DriverFactory::new(driver, "/tmp/app.db"));
//! let conn = pool.get().await?;
//! // Use connection...
//! // Connection returned to pool on drop
//! ```

mod config;
mod pool;
mod stats;


pub use config::PoolConfig;
pub use pool::{ConnectionFactory, ConnectionPool, DriverFactory, PooledConnection};
pub use stats::PoolStats;
