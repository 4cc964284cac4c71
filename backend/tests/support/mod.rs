//! Shared helpers for recipe store integration tests.
//!
//! Integration tests compile as separate crates under `backend/tests/`, so
//! this module is pulled into each suite with `mod support;`. Every test
//! gets its own throwaway database created on the server named by
//! `RECIPES_TEST_DATABASE_URL`, migrated with the embedded migrations and
//! dropped when the [`TestStore`] goes out of scope. Without a reachable
//! server the suites fail unless `SKIP_TEST_CLUSTER` is set.
//!
//! The `postgres` client used for provisioning and seeding is blocking and
//! must never run inside the Tokio runtime; tests seed first and then drive
//! the store through [`TestStore::block_on`].

#![allow(dead_code, reason = "each suite uses a different subset of helpers")]

use std::future::Future;
use std::sync::Arc;

use postgres::{Client, NoTls};
use recipe_manager::domain::{RecipeService, UserId};
use recipe_manager::outbound::persistence::{
    DbPool, DieselRecipeStore, PoolConfig, run_pending_migrations,
};
use tokio::runtime::Runtime;
use url::Url;
use uuid::Uuid;

const DATABASE_URL_VAR: &str = "RECIPES_TEST_DATABASE_URL";

/// Render a `postgres` error with enough detail to be useful in CI logs.
///
/// The `postgres::Error` `Display` implementation often collapses database
/// errors to a generic `db error`, which hides the message and SQLSTATE.
pub fn format_postgres_error(error: &postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };

    let mut summary = format!(
        "postgres error {:?}: {}",
        db_error.code(),
        db_error.message()
    );
    if let Some(detail) = db_error.detail() {
        summary.push_str("; detail: ");
        summary.push_str(detail);
    }
    summary
}

/// Returns true when `SKIP_TEST_CLUSTER` is set to a truthy value.
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER").is_ok_and(|value| is_truthy(&value))
}

/// Truthy values: "1", "true", "yes" (case-insensitive).
fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "1" | "true" | "yes")
}

/// Handles database setup failures consistently across integration tests.
///
/// When `SKIP_TEST_CLUSTER` is truthy, prints a skip marker and returns
/// `None`. Otherwise panics, so a missing or unreachable server fails the run
/// instead of letting every test pass without touching a database.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    setup_failure_outcome(should_skip_test_cluster(), reason)
}

fn setup_failure_outcome<T>(skip: bool, reason: impl std::fmt::Display) -> Option<T> {
    if skip {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test database setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}

/// A database created for one test and dropped afterwards.
pub struct TemporaryDatabase {
    admin_url: String,
    name: String,
    url: String,
}

impl TemporaryDatabase {
    /// Create and migrate a fresh database on the configured server.
    pub fn create() -> Result<Self, String> {
        let admin_url = std::env::var(DATABASE_URL_VAR)
            .map_err(|_| format!("{DATABASE_URL_VAR} is not set"))?;
        let name = format!("recipes_test_{}", Uuid::new_v4().simple());

        let mut url = Url::parse(&admin_url).map_err(|err| err.to_string())?;
        url.set_path(&format!("/{name}"));

        let mut admin =
            Client::connect(&admin_url, NoTls).map_err(|err| format_postgres_error(&err))?;
        admin
            .batch_execute(&format!("CREATE DATABASE \"{name}\""))
            .map_err(|err| format_postgres_error(&err))?;

        let database = Self {
            admin_url,
            name,
            url: url.to_string(),
        };
        run_pending_migrations(&database.url).map_err(|err| err.to_string())?;
        Ok(database)
    }

    /// Connection URL of the temporary database.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Open a blocking client for seeding and inspection.
    pub fn client(&self) -> Client {
        Client::connect(&self.url, NoTls)
            .unwrap_or_else(|err| panic!("connect to {}: {}", self.name, format_postgres_error(&err)))
    }
}

impl Drop for TemporaryDatabase {
    fn drop(&mut self) {
        let dropped = Client::connect(&self.admin_url, NoTls).and_then(|mut admin| {
            admin.batch_execute(&format!(
                "DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)",
                self.name
            ))
        });
        if let Err(err) = dropped {
            eprintln!("failed to drop {}: {}", self.name, format_postgres_error(&err));
        }
    }
}

/// A migrated database, a runtime and a store bound to both.
///
/// Fields drop in declaration order: the store releases its pooled
/// connections before the runtime stops and the database is dropped.
pub struct TestStore {
    pub store: DieselRecipeStore,
    runtime: Runtime,
    database: TemporaryDatabase,
}

impl TestStore {
    /// Provision a database and connect a store to it.
    pub fn setup() -> Result<Self, String> {
        let database = TemporaryDatabase::create()?;
        let runtime = Runtime::new().map_err(|err| err.to_string())?;
        let config = PoolConfig::new(database.url())
            .with_max_size(4)
            .with_min_idle(Some(1));
        let pool = runtime
            .block_on(DbPool::new(config))
            .map_err(|err| err.to_string())?;
        Ok(Self {
            store: DieselRecipeStore::new(pool),
            runtime,
            database,
        })
    }

    /// A service sharing this store's pool.
    pub fn service(&self) -> RecipeService<DieselRecipeStore> {
        RecipeService::new(Arc::new(self.store.clone()))
    }

    /// Drive an async block to completion on the test runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Blocking client for seeding and direct inspection.
    pub fn client(&self) -> Client {
        self.database.client()
    }

    /// Insert a confirmed user named `name` and return its id.
    pub fn seed_user(&self, name: &str) -> UserId {
        let email = format!("{name}@example.test");
        let row = self
            .client()
            .query_one(
                "INSERT INTO users (email, password_hash, is_confirmed) \
                 VALUES ($1, 'seeded', TRUE) RETURNING id",
                &[&email],
            )
            .unwrap_or_else(|err| panic!("seed user: {}", format_postgres_error(&err)));
        UserId::new(row.get(0))
    }

    /// Insert a nutrient and return its id.
    pub fn seed_nutrient(&self, name: &str, unit: &str) -> i64 {
        self.client()
            .query_one(
                "INSERT INTO nutrients (name, unit) VALUES ($1, $2) RETURNING id",
                &[&name, &unit],
            )
            .unwrap_or_else(|err| panic!("seed nutrient: {}", format_postgres_error(&err)))
            .get(0)
    }

    /// Count rows in `table`.
    pub fn count(&self, table: &str) -> i64 {
        self.client()
            .query_one(&format!("SELECT COUNT(*) FROM {table}"), &[])
            .unwrap_or_else(|err| panic!("count {table}: {}", format_postgres_error(&err)))
            .get(0)
    }
}

/// Provision a store or skip the test.
pub fn test_store() -> Option<TestStore> {
    match TestStore::setup() {
        Ok(store) => Some(store),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

#[cfg(test)]
mod tests {
    //! Skip policy checks; these never touch a database or the environment.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1", true)]
    #[case("TRUE", true)]
    #[case("yes", true)]
    #[case("0", false)]
    #[case("", false)]
    fn skip_flag_values(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(is_truthy(value), expected);
    }

    #[rstest]
    fn skipping_returns_no_store() {
        let outcome: Option<()> = setup_failure_outcome(true, "server unreachable");
        assert!(outcome.is_none());
    }

    #[rstest]
    #[should_panic(expected = "Test database setup failed")]
    fn setup_failures_fail_the_run_without_a_skip_flag() {
        let _: Option<()> = setup_failure_outcome(false, "RECIPES_TEST_DATABASE_URL is not set");
    }
}
