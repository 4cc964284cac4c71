//! Connection pool behind [`super::DieselRecipeStore`].
//!
//! The store owns no connection of its own. Each repository call checks one
//! out of this pool for its whole duration and hands it back afterwards, so
//! a transaction opened by one call is invisible to every other call. A
//! connection that comes back with a transaction still open (the caller's
//! future was dropped mid-write) fails the manager's health check and is
//! closed rather than reused, which makes PostgreSQL roll the work back.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};

/// Connection checked out for a single repository call.
pub type StoreConnection<'a> = PooledConnection<'a, AsyncPgConnection>;

/// Failures while building the pool or checking out a connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// No connection became free before the checkout timeout.
    #[error("no store connection available: {message}")]
    Checkout {
        /// Diagnostic reported by bb8.
        message: String,
    },

    /// The pool could not open its initial connections.
    #[error("could not open the store pool: {message}")]
    Build {
        /// Diagnostic reported by bb8.
        message: String,
    },
}

impl PoolError {
    /// Checkout failure carrying `message`.
    pub fn checkout(message: impl Into<String>) -> Self {
        Self::Checkout {
            message: message.into(),
        }
    }

    /// Build failure carrying `message`.
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build {
            message: message.into(),
        }
    }
}

/// Sizing and timeouts for the store pool.
///
/// Size the pool for the number of concurrent repository calls, not the
/// number of tables a call touches: a recipe write holds exactly one
/// connection while it updates every table.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use recipe_manager::outbound::persistence::PoolConfig;
///
/// let config = PoolConfig::new("postgres://chef@localhost/recipes")
///     .with_max_size(20)
///     .with_min_idle(Some(5))
///     .with_connection_timeout(Duration::from_secs(10));
/// assert_eq!(config.max_size(), 20);
/// ```
#[derive(Debug, Clone)]
pub struct PoolConfig {
    database_url: String,
    max_size: u32,
    min_idle: Option<u32>,
    connection_timeout: Duration,
}

impl PoolConfig {
    /// Settings for `database_url` with 10 connections at most, 2 kept warm
    /// and a 30 second checkout timeout.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_size: 10,
            min_idle: Some(2),
            connection_timeout: Duration::from_secs(30),
        }
    }

    /// Cap the number of concurrent repository calls.
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    /// Keep `min_idle` connections open between calls.
    pub fn with_min_idle(mut self, min_idle: Option<u32>) -> Self {
        self.min_idle = min_idle;
        self
    }

    /// Give up on a checkout after `timeout`.
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// PostgreSQL URL the pool connects to.
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Upper bound on open connections.
    pub fn max_size(&self) -> u32 {
        self.max_size
    }

    /// Connections kept open while idle.
    pub fn min_idle(&self) -> Option<u32> {
        self.min_idle
    }

    /// Longest wait for a free connection.
    pub fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }
}

/// Snapshot of pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Open connections, idle or checked out.
    pub connections: u32,
    /// Open connections waiting for a caller.
    pub idle: u32,
}

impl PoolStatus {
    /// Connections currently held by callers.
    pub const fn in_use(self) -> u32 {
        self.connections.saturating_sub(self.idle)
    }
}

/// bb8 pool of async PostgreSQL connections shared by every store clone.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    /// Open the pool described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Build`] when the URL is invalid or the initial
    /// connections cannot be opened.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(config.database_url);
        let inner = Pool::builder()
            .max_size(config.max_size)
            .min_idle(config.min_idle)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(|err| PoolError::build(err.to_string()))?;
        Ok(Self { inner })
    }

    /// Check out a connection for one repository call.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Checkout`] when no connection frees up within the
    /// configured timeout.
    pub async fn get(&self) -> Result<StoreConnection<'_>, PoolError> {
        self.inner
            .get()
            .await
            .map_err(|err| PoolError::checkout(err.to_string()))
    }

    /// Current occupancy; every connection is idle again once all calls
    /// have finished.
    pub fn status(&self) -> PoolStatus {
        let state = self.inner.state();
        PoolStatus {
            connections: state.connections,
            idle: state.idle_connections,
        }
    }
}
