//! Database driver trait definition

use crate::{Connection, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Core driver trait that all database drivers must implement
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Driver identifier used in configuration (e.g. "sqlite")
    fn name(&self) -> &'static str;

    /// Human readable name
    fn display_name(&self) -> &'static str {
        self.name()
    }

    /// Lightweight round-trip statement used to probe a connection
    fn ping_query(&self) -> &'static str {
        "SELECT 1"
    }

    /// Open a new physical connection to the given data source
    async fn connect(&self, dsn: &str) -> Result<Arc<dyn Connection>>;
}
