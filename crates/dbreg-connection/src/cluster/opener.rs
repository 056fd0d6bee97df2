//! Default `DatabaseOpener`

use std::sync::Arc;

use async_trait::async_trait;
use dbreg_core::{Database, DatabaseOpener, DbRegError, Result};
use dbreg_drivers::DriverRegistry;

use super::ClusterDatabase;
use crate::pool::PoolConfig;

/// Opens `ClusterDatabase` handles using drivers from a `DriverRegistry`
pub struct ClusterOpener {
    drivers: DriverRegistry,
    pool: PoolConfig,
}

impl ClusterOpener {
    pub fn new(drivers: DriverRegistry) -> Self {
        Self {
            drivers,
            pool: PoolConfig::default(),
        }
    }

    /// Initial pool configuration for every node of every opened cluster
    pub fn with_pool_config(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    pub fn drivers(&self) -> &DriverRegistry {
        &self.drivers
    }
}

impl Default for ClusterOpener {
    fn default() -> Self {
        Self::new(DriverRegistry::with_defaults())
    }
}

#[async_trait]
impl DatabaseOpener for ClusterOpener {
    async fn open(&self, driver_name: &str, nodes: &str) -> Result<Arc<dyn Database>> {
        let driver = self
            .drivers
            .get(driver_name)
            .ok_or_else(|| DbRegError::UnknownDriver(driver_name.to_string()))?;

        let database = ClusterDatabase::open(driver, nodes, self.pool.clone())?;
        Ok(Arc::new(database))
    }
}
