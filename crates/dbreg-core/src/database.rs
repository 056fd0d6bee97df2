//! Database handle traits
//!
//! A `Database` is what the connection registry caches per name: a
//! long-lived handle that owns its own pooling and may span several
//! nodes. A `DatabaseOpener` is the client library that produces them.

use crate::{QueryResult, Result, StatementResult, Value};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Separator used to join node addresses into a single data source string
pub const NODE_SEPARATOR: &str = ";";

/// A live, pooled database handle
#[async_trait]
pub trait Database: Send + Sync {
    /// Driver this handle was opened with
    fn driver_name(&self) -> &str;

    /// Limit the number of open connections. Zero means unlimited.
    fn set_max_open_conns(&self, max: usize);

    /// Limit the number of idle connections kept for reuse. Zero keeps none.
    fn set_max_idle_conns(&self, max: usize);

    /// Limit how long a connection may be reused. Zero means forever.
    fn set_conn_max_lifetime(&self, lifetime: Duration);

    /// Verify the handle can reach its database
    async fn ping(&self) -> Result<()>;

    /// Execute a statement that modifies data
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult>;

    /// Execute a query that returns rows
    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult>;

    /// Close the handle and every connection it owns
    async fn close(&self) -> Result<()>;

    /// Check if the handle has been closed
    fn is_closed(&self) -> bool;
}

/// Client library entry point that opens `Database` handles
#[async_trait]
pub trait DatabaseOpener: Send + Sync {
    /// Open a handle for `driver` against `nodes`, a `NODE_SEPARATOR`-joined list
    /// of node addresses.
    async fn open(&self, driver: &str, nodes: &str) -> Result<Arc<dyn Database>>;
}

/// Join node addresses into the data source string passed to `DatabaseOpener::open`
pub fn join_nodes<S: AsRef<str>>(nodes: &[S]) -> String {
    nodes
        .iter()
        .map(|n| n.as_ref())
        .collect::<Vec<_>>()
        .join(NODE_SEPARATOR)
}

/// Split a joined data source string back into trimmed, non-empty node addresses
pub fn split_nodes(nodes: &str) -> Vec<String> {
    nodes
        .split(NODE_SEPARATOR)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect()
}
