//! SQLite driver implementation

use async_trait::async_trait;
use dbreg_core::{Connection, DatabaseDriver, DbRegError, Result};
use std::sync::Arc;

use crate::SqliteConnection;

/// SQLite database driver
///
/// The data source is a file path, `:memory:`, or a `file:` URI.
pub struct SqliteDriver;

impl SqliteDriver {
    /// Create a new SQLite driver instance
    pub fn new() -> Self {
        tracing::debug!("SQLite driver initialized");
        Self
    }
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseDriver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn display_name(&self) -> &'static str {
        "SQLite"
    }

    #[tracing::instrument(skip(self))]
    async fn connect(&self, dsn: &str) -> Result<Arc<dyn Connection>> {
        if dsn.trim().is_empty() {
            return Err(DbRegError::Configuration(
                "SQLite requires a path. Example: /path/to/database.db or :memory:".into(),
            ));
        }
        let conn = SqliteConnection::open(dsn).inspect_err(|e| {
            tracing::error!(error = %e, "failed to connect to SQLite database");
        })?;
        Ok(Arc::new(conn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_dsn_is_rejected() {
        let err = SqliteDriver::new().connect("  ").await.err().expect("no path");
        assert!(matches!(err, DbRegError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_connect_in_memory() {
        let conn = SqliteDriver::new().connect(":memory:").await.unwrap();
        assert_eq!(conn.driver_name(), "sqlite");
        assert!(!conn.is_closed());
    }
}
