//! PostgreSQL persistence for the recipe manager using Diesel ORM.
//!
//! This module provides the concrete implementation of every domain store
//! port, backed by PostgreSQL via `diesel-async` and `bb8` connection
//! pooling.
//!
//! # Architecture
//!
//! - **One store, many ports**: [`DieselRecipeStore`] implements each
//!   repository trait in its own file, grouped by aggregate.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) never leave this module.
//! - **Batched relations**: recipe listings load their relations with a
//!   fixed number of queries per batch (see `aggregate.rs`).
//! - **Explicit transactions**: multi-statement writes run inside
//!   [`with_transaction`], which rolls back on error and on panic.
//!
//! # Example
//!
//! ```ignore
//! use recipe_manager::outbound::persistence::{DbPool, DieselRecipeStore, PoolConfig};
//!
//! let config = PoolConfig::new("postgres://localhost/recipes");
//! let pool = DbPool::new(config).await?;
//! let store = DieselRecipeStore::new(pool);
//! ```

mod aggregate;
pub(crate) mod diesel_helpers;
mod diesel_meal_plan_store;
mod diesel_recipe_store;
mod diesel_reference_data_store;
mod diesel_shopping_list_store;
mod diesel_user_store;
mod migrations;
mod models;
mod pool;
mod relation_loader;
mod schema;
mod transaction;
mod votes;

pub use diesel_recipe_store::DieselRecipeStore;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError, PoolStatus, StoreConnection};
pub use transaction::{TransactionalConnection, with_transaction};
