//! dbreg Drivers - Database driver implementations
//!
//! This crate provides concrete implementations of the driver traits
//! defined in `dbreg-core` and a registry to look them up by name.

#[cfg(feature = "sqlite")]
pub use dbreg_driver_sqlite as sqlite;

mod registry;

pub use registry::DriverRegistry;

/// Re-export commonly used types from dbreg-core
pub use dbreg_core::{
    Connection, DatabaseDriver, DbRegError, QueryResult, Result, Row, StatementResult, Value,
};
