//! Named connection configuration

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dbreg_core::Database;
use serde::{Deserialize, Serialize};

/// Name used by `Registry::default_connection` and `Registry::default_driver`
pub const DEFAULT_CONNECTION: &str = "default";

/// Configuration for every named connection, keyed by name
pub type Configs = HashMap<String, ConnectionConfig>;

/// Action run once, synchronously, right after a handle passes its probe
pub trait AfterOpen: Send + Sync {
    fn after_open(&self, name: &str, database: &Arc<dyn Database>);
}

impl<F> AfterOpen for F
where
    F: Fn(&str, &Arc<dyn Database>) + Send + Sync,
{
    fn after_open(&self, name: &str, database: &Arc<dyn Database>) {
        self(name, database)
    }
}

/// Parameters of one named connection
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Node addresses, primary first
    pub nodes: Vec<String>,

    /// Driver identifier (sqlite, ...)
    pub driver: String,

    /// Maximum open connections per node (0 = unlimited)
    #[serde(default)]
    pub max_open_conns: usize,

    /// Maximum idle connections kept per node
    #[serde(default)]
    pub max_idle_conns: usize,

    /// How long a connection may be reused, in milliseconds (0 = forever)
    #[serde(default)]
    pub conn_max_lifetime_ms: u64,

    #[serde(skip)]
    after_open: Option<Arc<dyn AfterOpen>>,
}

impl ConnectionConfig {
    pub fn new<I, S>(driver: impl Into<String>, nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            nodes: nodes.into_iter().map(Into::into).collect(),
            driver: driver.into(),
            ..Self::default()
        }
    }

    pub fn with_max_open_conns(mut self, max: usize) -> Self {
        self.max_open_conns = max;
        self
    }

    pub fn with_max_idle_conns(mut self, max: usize) -> Self {
        self.max_idle_conns = max;
        self
    }

    /// Zero keeps connections forever
    pub fn with_conn_max_lifetime(mut self, lifetime: Duration) -> Self {
        self.conn_max_lifetime_ms = u64::try_from(lifetime.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Run `hook` after the connection is opened and pinged
    pub fn with_after_open(mut self, hook: impl AfterOpen + 'static) -> Self {
        self.after_open = Some(Arc::new(hook));
        self
    }

    pub fn conn_max_lifetime(&self) -> Duration {
        Duration::from_millis(self.conn_max_lifetime_ms)
    }

    pub fn after_open(&self) -> Option<&Arc<dyn AfterOpen>> {
        self.after_open.as_ref()
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("nodes", &self.nodes)
            .field("driver", &self.driver)
            .field("max_open_conns", &self.max_open_conns)
            .field("max_idle_conns", &self.max_idle_conns)
            .field("conn_max_lifetime", &self.conn_max_lifetime())
            .field("after_open", &self.after_open.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_json_configs() {
        let configs: Configs = serde_json::from_str(
            r#"{
                "default": {
                    "nodes": ["primary.db", "replica.db"],
                    "driver": "sqlite",
                    "max_open_conns": 5,
                    "max_idle_conns": 2,
                    "conn_max_lifetime_ms": 60000
                },
                "reporting": { "nodes": ["reports.db"], "driver": "sqlite" }
            }"#,
        )
        .unwrap();

        let default = &configs[DEFAULT_CONNECTION];
        assert_eq!(default.nodes, vec!["primary.db", "replica.db"]);
        assert_eq!(default.driver, "sqlite");
        assert_eq!(default.max_open_conns, 5);
        assert_eq!(default.max_idle_conns, 2);
        assert_eq!(default.conn_max_lifetime(), Duration::from_secs(60));
        assert!(default.after_open().is_none());

        let reporting = &configs["reporting"];
        assert_eq!(reporting.max_open_conns, 0);
        assert_eq!(reporting.conn_max_lifetime(), Duration::ZERO);
    }

    #[test]
    fn test_parse_toml_configs() {
        let configs: Configs = toml::from_str(
            r#"
            [default]
            nodes = ["app.db"]
            driver = "sqlite"
            max_open_conns = 10
            "#,
        )
        .unwrap();
        assert_eq!(configs["default"].max_open_conns, 10);
        assert_eq!(configs["default"].max_idle_conns, 0);
    }

    #[test]
    fn test_lifetime_field_matches_accessor() {
        let mut config = ConnectionConfig::new("sqlite", ["app.db"]);
        config.conn_max_lifetime_ms = 2_500;
        assert_eq!(config.conn_max_lifetime(), Duration::from_millis(2_500));

        let config = config.with_conn_max_lifetime(Duration::MAX);
        assert_eq!(config.conn_max_lifetime_ms, u64::MAX);
    }

    #[test]
    fn test_builder() {
        let config = ConnectionConfig::new("x", ["n1", "n2"])
            .with_max_open_conns(5)
            .with_max_idle_conns(1)
            .with_conn_max_lifetime(Duration::from_millis(1500))
            .with_after_open(|_: &str, _: &Arc<dyn Database>| {});

        assert_eq!(config.nodes, vec!["n1", "n2"]);
        assert_eq!(config.conn_max_lifetime(), Duration::from_millis(1500));
        assert!(config.after_open().is_some());

        let debug = format!("{:?}", config);
        assert!(debug.contains("after_open: true"));
    }

    #[test]
    fn test_hook_is_not_serialized() {
        let config = ConnectionConfig::new("sqlite", ["a.db"])
            .with_after_open(|_: &str, _: &Arc<dyn Database>| {});
        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("after_open").is_none());
        assert_eq!(json["conn_max_lifetime_ms"], 0);
    }
}
