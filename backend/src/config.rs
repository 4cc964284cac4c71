//! Store configuration loaded via OrthoConfig.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::outbound::persistence::PoolConfig;

/// Errors raised when settings cannot describe a usable store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreSettingsError {
    /// No database URL was supplied by any configuration layer.
    #[error("RECIPES_DB_DATABASE_URL is not set")]
    MissingDatabaseUrl,
}

/// Connection settings for the recipe store.
///
/// Values are layered from CLI flags, `RECIPES_DB_*` environment variables
/// and configuration files.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "RECIPES_DB")]
pub struct StoreSettings {
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Upper bound on pooled connections.
    #[ortho_config(default = 10)]
    pub max_connections: u32,
    /// Idle connections kept warm by the pool.
    #[ortho_config(default = 2)]
    pub min_idle: u32,
    /// Seconds to wait for a pooled connection before giving up.
    #[ortho_config(default = 30)]
    pub connection_timeout_secs: u64,
}

impl StoreSettings {
    /// Build the pool configuration described by these settings.
    ///
    /// # Errors
    ///
    /// Returns [`StoreSettingsError::MissingDatabaseUrl`] when no URL was
    /// configured.
    pub fn to_pool_config(&self) -> Result<PoolConfig, StoreSettingsError> {
        let url = self
            .database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(StoreSettingsError::MissingDatabaseUrl)?;
        Ok(PoolConfig::new(url)
            .with_max_size(self.max_connections)
            .with_min_idle(Some(self.min_idle))
            .with_connection_timeout(Duration::from_secs(self.connection_timeout_secs)))
    }
}
