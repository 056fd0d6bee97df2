//! Registry of named, lazily opened database handles

use std::collections::HashMap;
use std::sync::Arc;

use dbreg_core::{Database, DatabaseOpener, DbRegError, Result, join_nodes};
use tokio::sync::Mutex;

use crate::cluster::ClusterOpener;
use crate::config::{Configs, ConnectionConfig, DEFAULT_CONNECTION};

/// Hands out one cached `Database` per configured name
///
/// A handle is opened the first time its name is requested, pinged, passed
/// to the configured `AfterOpen` hook and then cached for the lifetime of the
/// registry (or until `close`). Every operation runs under one lock, held
/// across the open sequence, so a name is never opened twice concurrently.
pub struct Registry {
    dbs: Mutex<HashMap<String, Arc<dyn Database>>>,
    configs: Configs,
    opener: Arc<dyn DatabaseOpener>,
}

impl Registry {
    /// Create a registry that opens handles with the built-in cluster client
    pub fn new(configs: Configs) -> Self {
        Self::with_opener(configs, Arc::new(ClusterOpener::default()))
    }

    /// Create a registry that opens handles through `opener`
    pub fn with_opener(configs: Configs, opener: Arc<dyn DatabaseOpener>) -> Self {
        tracing::debug!(connections = configs.len(), "creating connection registry");
        Self {
            dbs: Mutex::new(HashMap::new()),
            configs,
            opener,
        }
    }

    /// Get the handle for `name`, opening it on first use
    ///
    /// Fails with `DbRegError::UnknownConnection` when `name` is not
    /// configured. Open and probe errors are returned as they are and leave
    /// nothing cached, so the next call starts over.
    #[tracing::instrument(skip(self))]
    pub async fn connection(&self, name: &str) -> Result<Arc<dyn Database>> {
        let mut dbs = self.dbs.lock().await;
        if let Some(db) = dbs.get(name) {
            return Ok(Arc::clone(db));
        }

        let db = self.open(name).await?;
        dbs.insert(name.to_string(), Arc::clone(&db));
        tracing::info!("connection opened");
        Ok(db)
    }

    /// Get the handle named `"default"`
    pub async fn default_connection(&self) -> Result<Arc<dyn Database>> {
        self.connection(DEFAULT_CONNECTION).await
    }

    /// Driver configured for `name`; does not open anything
    pub async fn driver(&self, name: &str) -> Result<String> {
        let _dbs = self.dbs.lock().await;
        self.config(name).map(|config| config.driver.clone())
    }

    /// Driver configured for `"default"`
    pub async fn default_driver(&self) -> Result<String> {
        self.driver(DEFAULT_CONNECTION).await
    }

    /// Close and forget every cached handle
    ///
    /// Stops at the first close failure and returns it. Handles closed
    /// before the failure stay removed; the failing handle and any not yet
    /// reached stay cached.
    #[tracing::instrument(skip(self))]
    pub async fn close(&self) -> Result<()> {
        let mut dbs = self.dbs.lock().await;
        let names: Vec<String> = dbs.keys().cloned().collect();

        for name in names {
            let Some(db) = dbs.get(&name).cloned() else {
                continue;
            };
            if let Err(e) = db.close().await {
                tracing::warn!(connection = %name, error = %e, "failed to close connection");
                return Err(e);
            }
            dbs.remove(&name);
            tracing::debug!(connection = %name, "connection closed");
        }
        Ok(())
    }

    /// Check if `name` currently has a cached handle
    pub async fn is_open(&self, name: &str) -> bool {
        self.dbs.lock().await.contains_key(name)
    }

    /// Names with a cached handle, sorted
    pub async fn open_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.dbs.lock().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Every configured name, sorted
    pub fn configured_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.configs.keys().cloned().collect();
        names.sort();
        names
    }

    fn config(&self, name: &str) -> Result<&ConnectionConfig> {
        self.configs
            .get(name)
            .ok_or_else(|| DbRegError::UnknownConnection(name.to_string()))
    }

    /// Open, tune, probe and announce a handle. Caller holds the cache lock.
    async fn open(&self, name: &str) -> Result<Arc<dyn Database>> {
        let config = self.config(name)?;

        let db = self
            .opener
            .open(&config.driver, &join_nodes(&config.nodes))
            .await?;

        db.set_max_open_conns(config.max_open_conns);
        db.set_max_idle_conns(config.max_idle_conns);
        db.set_conn_max_lifetime(config.conn_max_lifetime());

        if let Err(e) = db.ping().await {
            tracing::warn!(error = %e, "connectivity probe failed");
            if let Err(close_err) = db.close().await {
                tracing::warn!(error = %close_err, "failed to close unpinged connection");
            }
            return Err(e);
        }

        if let Some(hook) = config.after_open() {
            hook.after_open(name, &db);
        }
        Ok(db)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("configured", &self.configured_names())
            .finish_non_exhaustive()
    }
}
