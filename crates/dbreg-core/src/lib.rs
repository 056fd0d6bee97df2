//! dbreg Core - Core abstractions shared by the registry, pool and drivers
//!
//! This crate provides the fundamental traits and types that all other
//! dbreg crates depend on. It defines:
//!
//! - `DatabaseDriver` - Trait for database driver implementations
//! - `Connection` - Trait for a single physical database connection
//! - `Database` - Trait for a pooled, possibly multi-node database handle
//! - `DatabaseOpener` - Trait for the client library that opens `Database` handles
//! - Common types like `Value`, `Row`, `QueryResult`

mod connection;
mod database;
mod driver;
mod error;
mod types;

pub use connection::*;
pub use database::*;
pub use driver::*;
pub use error::*;
pub use types::*;
