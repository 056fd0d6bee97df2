//! Connection pool implementation

use std::collections::VecDeque;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dbreg_core::{Connection, DatabaseDriver, DbRegError, Result};
use parking_lot::Mutex;
use tokio::sync::Notify;

use super::config::PoolConfig;
use super::stats::PoolStats;

/// Factory trait for creating new connections
#[async_trait]
pub trait ConnectionFactory: Send + Sync + 'static {
    /// Create a new connection
    async fn create(&self) -> Result<Arc<dyn Connection>>;

    /// Validate that an idle connection is still usable before handing it out
    ///
    /// Default implementation only checks that the connection is not closed.
    async fn validate(&self, conn: &dyn Connection) -> bool {
        !conn.is_closed()
    }
}

#[async_trait]
impl<T: ConnectionFactory> ConnectionFactory for Arc<T> {
    async fn create(&self) -> Result<Arc<dyn Connection>> {
        (**self).create().await
    }

    async fn validate(&self, conn: &dyn Connection) -> bool {
        (**self).validate(conn).await
    }
}

/// Creates connections to one data source through a `DatabaseDriver`
pub struct DriverFactory {
    driver: Arc<dyn DatabaseDriver>,
    dsn: String,
}

impl DriverFactory {
    pub fn new(driver: Arc<dyn DatabaseDriver>, dsn: impl Into<String>) -> Self {
        Self {
            driver,
            dsn: dsn.into(),
        }
    }

    /// Data source this factory connects to
    pub fn dsn(&self) -> &str {
        &self.dsn
    }

    pub fn driver(&self) -> &Arc<dyn DatabaseDriver> {
        &self.driver
    }
}

#[async_trait]
impl ConnectionFactory for DriverFactory {
    async fn create(&self) -> Result<Arc<dyn Connection>> {
        self.driver.connect(&self.dsn).await
    }
}

struct IdleConnection {
    connection: Arc<dyn Connection>,
    created_at: Instant,
}

struct PoolState {
    config: PoolConfig,
    idle: VecDeque<IdleConnection>,
    /// Connections whose close failed during `close`, retried by the next `close`
    unclosed: Vec<Arc<dyn Connection>>,
    /// Connections that exist right now, idle or in use, plus reserved slots
    open: usize,
    closed: bool,
}

impl PoolState {
    fn is_expired(&self, created_at: Instant) -> bool {
        self.config
            .max_lifetime()
            .is_some_and(|lifetime| created_at.elapsed() >= lifetime)
    }

    fn over_capacity(&self) -> bool {
        self.config.max_open() > 0 && self.open > self.config.max_open()
    }

    /// Remove idle connections beyond the idle limit, oldest first
    fn trim_idle(&mut self) -> Vec<Arc<dyn Connection>> {
        let mut trimmed = Vec::new();
        while self.idle.len() > self.config.max_idle() {
            if let Some(idle) = self.idle.pop_front() {
                self.open = self.open.saturating_sub(1);
                trimmed.push(idle.connection);
            }
        }
        trimmed
    }
}

enum Checkout {
    Idle(IdleConnection),
    Reserved,
    Exhausted,
}

/// A connection pool for one data source
///
/// Connections are opened on demand and returned to the pool when the
/// `PooledConnection` wrapper is dropped. Limits may be changed at any time;
/// they apply to connections handed out or returned afterwards.
pub struct ConnectionPool {
    factory: Arc<dyn ConnectionFactory>,
    state: Mutex<PoolState>,
    /// Signalled whenever a connection or a slot becomes available
    released: Notify,
    waiting: AtomicUsize,
}

impl ConnectionPool {
    /// Create a new connection pool with the given configuration and factory
    pub fn new<F: ConnectionFactory>(config: PoolConfig, factory: F) -> Self {
        Self {
            factory: Arc::new(factory),
            state: Mutex::new(PoolState {
                config,
                idle: VecDeque::new(),
                unclosed: Vec::new(),
                open: 0,
                closed: false,
            }),
            released: Notify::new(),
            waiting: AtomicUsize::new(0),
        }
    }

    /// Get a connection from the pool
    ///
    /// This will:
    /// 1. Reuse an idle connection that is neither expired nor invalid
    /// 2. Otherwise open a new connection if the open limit allows it
    /// 3. Otherwise wait for a connection to be returned (with timeout)
    pub async fn get(&self) -> Result<PooledConnection<'_>> {
        let timeout = self.state.lock().config.acquire_timeout();

        let result = {
            let _waiting = WaitingGuard::new(&self.waiting);
            tokio::time::timeout(timeout, self.acquire()).await
        };

        match result {
            Ok(Ok((connection, created_at))) => Ok(PooledConnection {
                connection,
                created_at,
                pool: self,
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(DbRegError::Timeout(format!(
                "Timed out waiting for connection (timeout: {:?})",
                timeout
            ))),
        }
    }

    async fn acquire(&self) -> Result<(Arc<dyn Connection>, Instant)> {
        loop {
            // Register interest before inspecting state so a release in between is not lost
            let notified = self.released.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let (checkout, expired) = self.checkout()?;
            if !expired.is_empty() {
                tracing::debug!(count = expired.len(), "closing connections past their max lifetime");
                expired.into_iter().for_each(discard);
            }

            match checkout {
                Checkout::Idle(idle) => {
                    let slot = SlotReservation::new(self);
                    if self.factory.validate(&*idle.connection).await {
                        slot.commit();
                        return Ok((idle.connection, idle.created_at));
                    }
                    drop(slot);
                    tracing::debug!("discarding idle connection that failed validation");
                    close_quietly(idle.connection).await;
                }
                Checkout::Reserved => {
                    let slot = SlotReservation::new(self);
                    let connection = self.factory.create().await?;
                    slot.commit();
                    return Ok((connection, Instant::now()));
                }
                Checkout::Exhausted => notified.await,
            }
        }
    }

    fn checkout(&self) -> Result<(Checkout, Vec<Arc<dyn Connection>>)> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(DbRegError::Closed);
        }

        let mut expired = Vec::new();
        while let Some(idle) = state.idle.pop_front() {
            if state.is_expired(idle.created_at) {
                state.open = state.open.saturating_sub(1);
                expired.push(idle.connection);
                continue;
            }
            return Ok((Checkout::Idle(idle), expired));
        }

        if state.config.has_capacity(state.open) {
            state.open += 1;
            return Ok((Checkout::Reserved, expired));
        }

        Ok((Checkout::Exhausted, expired))
    }

    fn release_slot(&self) {
        {
            let mut state = self.state.lock();
            state.open = state.open.saturating_sub(1);
        }
        self.released.notify_one();
    }

    /// Return a connection to the pool
    fn return_connection(&self, connection: Arc<dyn Connection>, created_at: Instant) {
        let keep = {
            let mut state = self.state.lock();
            let keep = !state.closed
                && !connection.is_closed()
                && !state.is_expired(created_at)
                && !state.over_capacity()
                && state.idle.len() < state.config.max_idle();
            if keep {
                state.idle.push_back(IdleConnection {
                    connection: Arc::clone(&connection),
                    created_at,
                });
            } else {
                state.open = state.open.saturating_sub(1);
            }
            keep
        };

        if !keep {
            discard(connection);
        }
        self.released.notify_one();
    }

    /// Change the open-connection limit (0 = unlimited)
    pub fn set_max_open(&self, max_open: usize) {
        let trimmed = {
            let mut state = self.state.lock();
            state.config.set_max_open(max_open);
            state.trim_idle()
        };
        trimmed.into_iter().for_each(discard);
        self.released.notify_waiters();
    }

    /// Change the idle-connection limit
    pub fn set_max_idle(&self, max_idle: usize) {
        let trimmed = {
            let mut state = self.state.lock();
            state.config.set_max_idle(max_idle);
            state.trim_idle()
        };
        trimmed.into_iter().for_each(discard);
    }

    /// Change the maximum connection lifetime (zero = unlimited)
    ///
    /// Connections past the new lifetime are closed the next time they are
    /// checked out or returned.
    pub fn set_max_lifetime(&self, lifetime: Duration) {
        self.state.lock().config.set_max_lifetime(lifetime);
    }

    /// Get current pool statistics
    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        let idle = state.idle.len();
        let waiting = self.waiting.load(Ordering::SeqCst);
        PoolStats::new(state.open, idle, state.open.saturating_sub(idle), waiting)
    }

    /// Get a snapshot of the pool configuration
    pub fn config(&self) -> PoolConfig {
        self.state.lock().config.clone()
    }

    /// Check if the pool has been closed
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Close the pool
    ///
    /// Idle connections are closed now; connections in use are closed when
    /// they are returned. Waiters and later `get` calls fail with
    /// `DbRegError::Closed`. Returns the first close error, after attempting
    /// every idle connection. Connections that failed to close are retried by
    /// the next call; once all of them are closed, closing again is a no-op.
    pub async fn close(&self) -> Result<()> {
        let pending: Vec<Arc<dyn Connection>> = {
            let mut state = self.state.lock();
            let first_close = !state.closed;
            state.closed = true;
            let drained: Vec<_> = state.idle.drain(..).collect();
            state.open = state.open.saturating_sub(drained.len());
            let mut pending = std::mem::take(&mut state.unclosed);
            pending.extend(drained.into_iter().map(|idle| idle.connection));
            if !first_close && pending.is_empty() {
                return Ok(());
            }
            pending
        };
        self.released.notify_waiters();

        let mut first_error = None;
        let mut failed = Vec::new();
        for connection in pending {
            if let Err(e) = connection.close().await {
                tracing::warn!(error = %e, "failed to close idle connection");
                first_error.get_or_insert(e);
                failed.push(connection);
            }
        }

        match first_error {
            Some(e) => {
                self.state.lock().unclosed.extend(failed);
                Err(e)
            }
            None => Ok(()),
        }
    }

    /// Check if connections that failed to close are waiting for another `close`
    pub fn has_unclosed(&self) -> bool {
        !self.state.lock().unclosed.is_empty()
    }
}

/// Counts a caller in `waiting` for as long as its `get` is in flight
struct WaitingGuard<'a> {
    waiting: &'a AtomicUsize,
}

impl<'a> WaitingGuard<'a> {
    fn new(waiting: &'a AtomicUsize) -> Self {
        waiting.fetch_add(1, Ordering::SeqCst);
        Self { waiting }
    }
}

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.waiting.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Holds an open-connection slot until the connection it was reserved for exists
struct SlotReservation<'a> {
    pool: &'a ConnectionPool,
    committed: bool,
}

impl<'a> SlotReservation<'a> {
    fn new(pool: &'a ConnectionPool) -> Self {
        Self {
            pool,
            committed: false,
        }
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for SlotReservation<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.pool.release_slot();
        }
    }
}

async fn close_quietly(connection: Arc<dyn Connection>) {
    if let Err(e) = connection.close().await {
        tracing::warn!(error = %e, "failed to close discarded connection");
    }
}

/// Close a connection the pool no longer wants without blocking the caller
///
/// Outside a tokio runtime the connection is simply dropped.
fn discard(connection: Arc<dyn Connection>) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(close_quietly(connection));
        }
        Err(_) => drop(connection),
    }
}

/// A connection borrowed from the pool
///
/// When dropped, the connection is automatically returned to the pool.
pub struct PooledConnection<'a> {
    connection: Arc<dyn Connection>,
    created_at: Instant,
    pool: &'a ConnectionPool,
}

impl Deref for PooledConnection<'_> {
    type Target = dyn Connection;

    fn deref(&self) -> &Self::Target {
        &*self.connection
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        self.pool
            .return_connection(Arc::clone(&self.connection), self.created_at);
    }
}

impl PooledConnection<'_> {
    /// Get the underlying connection as an Arc
    pub fn inner(&self) -> &Arc<dyn Connection> {
        &self.connection
    }

    /// When the underlying connection was opened
    pub fn created_at(&self) -> Instant {
        self.created_at
    }
}
