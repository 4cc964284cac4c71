//! Apply the recipe store's embedded migrations.
//!
//! The database URL and pool settings are read through [`StoreSettings`],
//! so `RECIPES_DB_DATABASE_URL` and `--database-url` both work.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;

use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig as _;
use recipe_manager::config::StoreSettings;
use recipe_manager::outbound::persistence::{PoolConfig, run_pending_migrations};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// Layer `args` over the environment and build the pool settings.
fn pool_config_from<I>(args: I) -> Result<PoolConfig>
where
    I: IntoIterator<Item = OsString>,
{
    let settings = StoreSettings::load_from_iter(args)
        .map_err(|e| eyre!("failed to load store settings: {e}"))?;
    settings
        .to_pool_config()
        .wrap_err("store settings are incomplete")
}

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let pool_config = pool_config_from(std::env::args_os())?;
    let applied = run_pending_migrations(pool_config.database_url())
        .wrap_err("failed to migrate the recipe store")?;

    if applied.is_empty() {
        info!("schema already up to date");
    }
    for version in &applied {
        info!(%version, "applied migration");
    }
    Ok(())
}
