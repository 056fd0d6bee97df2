//! Database ping implementation
//!
//! Provides lightweight health checking by executing a minimal query
//! and measuring response time.

use dbreg_core::{Connection, DbRegError, Result};
use std::time::{Duration, Instant};

/// Ping a database connection to check if it's alive.
///
/// Executes `ping_query` (usually `SELECT 1`, see
/// `DatabaseDriver::ping_query`) and returns the round-trip time.
///
/// # Errors
///
/// * `DbRegError::Closed` if the connection was already closed
/// * whatever error the driver reports for the query, unchanged
pub async fn ping_connection(conn: &dyn Connection, ping_query: &str) -> Result<Duration> {
    if conn.is_closed() {
        return Err(DbRegError::Closed);
    }

    let start = Instant::now();
    conn.query(ping_query, &[]).await?;
    Ok(start.elapsed())
}
