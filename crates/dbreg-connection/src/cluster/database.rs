//! Cluster database handle

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dbreg_core::{
    Database, DatabaseDriver, DbRegError, QueryResult, Result, StatementResult, Value, split_nodes,
};

use crate::health::{HealthStatus, HealthThresholds, ping_connection};
use crate::pool::{ConnectionPool, DriverFactory, PoolConfig, PoolStats};

struct Node {
    address: String,
    pool: ConnectionPool,
}

/// A pooled handle over one primary node and any number of replicas
pub struct ClusterDatabase {
    driver: Arc<dyn DatabaseDriver>,
    /// Never empty; index 0 is the primary
    nodes: Vec<Node>,
    next_replica: AtomicUsize,
    closed: AtomicBool,
    thresholds: HealthThresholds,
}

impl ClusterDatabase {
    /// Create a handle for the `;`-separated node list without connecting
    ///
    /// Blank entries are ignored. An empty node list is a configuration error.
    pub fn open(driver: Arc<dyn DatabaseDriver>, nodes: &str, pool: PoolConfig) -> Result<Self> {
        let addresses = split_nodes(nodes);
        if addresses.is_empty() {
            return Err(DbRegError::Configuration(format!(
                "no nodes configured for driver {}",
                driver.name()
            )));
        }

        tracing::debug!(driver = driver.name(), nodes = addresses.len(), "opening cluster");
        let nodes = addresses
            .into_iter()
            .map(|address| Node {
                pool: ConnectionPool::new(
                    pool.clone(),
                    DriverFactory::new(Arc::clone(&driver), address.clone()),
                ),
                address,
            })
            .collect();

        Ok(Self {
            driver,
            nodes,
            next_replica: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            thresholds: HealthThresholds::default(),
        })
    }

    /// Use custom latency thresholds when logging probe outcomes
    pub fn with_thresholds(mut self, thresholds: HealthThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Node addresses paired with their pools, primary first
    pub fn node_pools(&self) -> impl Iterator<Item = (&str, &ConnectionPool)> {
        self.nodes.iter().map(|n| (n.address.as_str(), &n.pool))
    }

    /// Combined statistics of every node pool
    pub fn stats(&self) -> PoolStats {
        self.nodes
            .iter()
            .map(|n| n.pool.stats())
            .fold(PoolStats::default(), PoolStats::merge)
    }

    fn primary(&self) -> &Node {
        &self.nodes[0]
    }

    fn replica(&self) -> &Node {
        let replicas = self.nodes.len() - 1;
        if replicas == 0 {
            return self.primary();
        }
        let idx = self.next_replica.fetch_add(1, Ordering::Relaxed) % replicas;
        &self.nodes[1 + idx]
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DbRegError::Closed);
        }
        Ok(())
    }

    async fn probe(&self, node: &Node) -> Result<Duration> {
        let outcome = match node.pool.get().await {
            Ok(conn) => ping_connection(&*conn, self.driver.ping_query()).await,
            Err(e) => Err(e),
        };

        let status = HealthStatus::from_probe(&outcome, &self.thresholds);
        match &outcome {
            Ok(latency) => {
                tracing::debug!(node = %node.address, %status, latency_ms = latency.as_millis() as u64, "node probed")
            }
            Err(e) => tracing::warn!(node = %node.address, %status, error = %e, "node probe failed"),
        }
        outcome
    }
}

#[async_trait]
impl Database for ClusterDatabase {
    fn driver_name(&self) -> &str {
        self.driver.name()
    }

    fn set_max_open_conns(&self, max: usize) {
        self.nodes.iter().for_each(|n| n.pool.set_max_open(max));
    }

    fn set_max_idle_conns(&self, max: usize) {
        self.nodes.iter().for_each(|n| n.pool.set_max_idle(max));
    }

    fn set_conn_max_lifetime(&self, lifetime: Duration) {
        self.nodes
            .iter()
            .for_each(|n| n.pool.set_max_lifetime(lifetime));
    }

    /// Probe every node concurrently; the first failure is returned unchanged
    #[tracing::instrument(skip(self), fields(driver = self.driver.name()))]
    async fn ping(&self) -> Result<()> {
        self.ensure_open()?;
        futures::future::try_join_all(self.nodes.iter().map(|node| self.probe(node))).await?;
        Ok(())
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<StatementResult> {
        self.ensure_open()?;
        let conn = self.primary().pool.get().await?;
        conn.execute(sql, params).await
    }

    async fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        self.ensure_open()?;
        let conn = self.replica().pool.get().await?;
        conn.query(sql, params).await
    }

    /// Close every node pool, returning the first error after trying them all
    ///
    /// The handle counts as closed only once every node closed cleanly; after
    /// a failure the next `close` retries the connections that are left.
    #[tracing::instrument(skip(self), fields(driver = self.driver.name()))]
    async fn close(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Ok(());
        }

        let mut first_error = None;
        for node in &self.nodes {
            if let Err(e) = node.pool.close().await {
                tracing::warn!(node = %node.address, error = %e, "failed to close node");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                self.closed.store(true, Ordering::SeqCst);
                tracing::debug!("cluster closed");
                Ok(())
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
