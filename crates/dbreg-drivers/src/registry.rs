//! Driver registry for managing available database drivers

use dbreg_core::DatabaseDriver;
use std::collections::HashMap;
use std::sync::Arc;

/// Drivers available to open handles with, keyed by `DatabaseDriver::name`
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn DatabaseDriver>>,
}

impl DriverRegistry {
    /// Create a registry with no drivers
    pub fn new() -> Self {
        Self {
            drivers: HashMap::new(),
        }
    }

    /// Create a registry holding every driver enabled by cargo features
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();

        #[cfg(feature = "sqlite")]
        registry.register(Arc::new(crate::sqlite::SqliteDriver::new()));

        registry
    }

    /// Register `driver` under its name, returning the driver it replaced
    pub fn register(&mut self, driver: Arc<dyn DatabaseDriver>) -> Option<Arc<dyn DatabaseDriver>> {
        let name = driver.name();
        tracing::debug!(driver = name, "registering database driver");
        let previous = self.drivers.insert(name.to_string(), driver);
        if previous.is_some() {
            tracing::info!(driver = name, "replaced database driver");
        }
        previous
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn DatabaseDriver>> {
        let driver = self.drivers.get(name).cloned();
        if driver.is_none() {
            tracing::warn!(driver = %name, known = ?self.list(), "unknown database driver");
        }
        driver
    }

    /// Registered driver names, sorted
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.drivers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn has(&self, name: &str) -> bool {
        self.drivers.contains_key(name)
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.list()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dbreg_core::{Connection, DbRegError, Result};

    struct NullDriver;

    #[async_trait]
    impl DatabaseDriver for NullDriver {
        fn name(&self) -> &'static str {
            "null"
        }

        async fn connect(&self, _dsn: &str) -> Result<Arc<dyn Connection>> {
            Err(DbRegError::Connection("null driver never connects".into()))
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = DriverRegistry::new();
        assert!(!registry.has("null"));
        assert!(registry.get("null").is_none());

        assert!(registry.register(Arc::new(NullDriver)).is_none());
        assert!(registry.has("null"));
        assert_eq!(registry.get("null").unwrap().display_name(), "null");
        assert_eq!(registry.list(), vec!["null"]);

        let replaced = registry.register(Arc::new(NullDriver));
        assert_eq!(replaced.map(|d| d.name()), Some("null"));
        assert_eq!(format!("{:?}", registry), r#"{"null"}"#);
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn test_defaults_include_sqlite() {
        let registry = DriverRegistry::with_defaults();
        let driver = registry.get("sqlite").expect("sqlite driver registered");
        assert_eq!(driver.display_name(), "SQLite");
        assert_eq!(driver.ping_query(), "SELECT 1");

        let conn = driver.connect(":memory:").await.unwrap();
        let result = conn.query("SELECT 1 AS one", &[]).await.unwrap();
        assert_eq!(result.rows[0].get(0).and_then(|v| v.as_i64()), Some(1));
    }
}
