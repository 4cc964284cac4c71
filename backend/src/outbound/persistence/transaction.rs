//! Scoped transactions for multi-statement writes.
//!
//! [`with_transaction`] runs a closure inside one transaction on one
//! connection. The closure only ever sees a borrowed connection, so
//! transaction state cannot outlive the call or be shared between callers.
//! Outcomes:
//!
//! - closure returns `Ok`: commit, and a failed commit becomes
//!   [`StoreError::TransactionCommit`];
//! - closure returns `Err`: roll back and return the error unchanged;
//! - closure panics: roll back, then resume the panic.
//!
//! A future dropped mid-transaction drops its pooled connection with the
//! transaction still open; the pool's manager treats such connections as
//! broken and closes them, so PostgreSQL rolls the work back.

use std::panic::{AssertUnwindSafe, resume_unwind};

use async_trait::async_trait;
use diesel::QueryResult;
use diesel_async::scoped_futures::ScopedBoxFuture;
use diesel_async::{AnsiTransactionManager, AsyncPgConnection, TransactionManager};
use futures_util::FutureExt as _;
use tracing::{debug, warn};

use crate::domain::ports::StoreError;

/// Connection that can open, commit and abandon one transaction.
#[async_trait]
pub trait TransactionalConnection: Send {
    /// Open a transaction.
    async fn begin(&mut self) -> QueryResult<()>;
    /// Commit the open transaction.
    async fn commit(&mut self) -> QueryResult<()>;
    /// Roll back the open transaction.
    async fn rollback(&mut self) -> QueryResult<()>;
}

#[async_trait]
impl TransactionalConnection for AsyncPgConnection {
    async fn begin(&mut self) -> QueryResult<()> {
        AnsiTransactionManager::begin_transaction(self).await
    }

    async fn commit(&mut self) -> QueryResult<()> {
        AnsiTransactionManager::commit_transaction(self).await
    }

    async fn rollback(&mut self) -> QueryResult<()> {
        AnsiTransactionManager::rollback_transaction(self).await
    }
}

/// Run `work` inside a transaction on `conn`.
///
/// # Errors
///
/// Returns [`StoreError::TransactionStart`] when the transaction cannot be
/// opened, [`StoreError::TransactionCommit`] when committing fails, and the
/// closure's own error (after rolling back) when it fails.
pub async fn with_transaction<'a, C, R, E, F>(conn: &mut C, work: F) -> Result<R, E>
where
    C: TransactionalConnection,
    F: for<'r> FnOnce(&'r mut C) -> ScopedBoxFuture<'a, 'r, Result<R, E>> + Send + 'a,
    R: Send + 'a,
    E: From<StoreError> + Send + 'a,
{
    conn.begin().await.map_err(|err| {
        debug!(error = %err, "failed to open transaction");
        StoreError::transaction_start(err.to_string())
    })?;

    let outcome = AssertUnwindSafe(work(&mut *conn)).catch_unwind().await;
    match outcome {
        Ok(Ok(value)) => match conn.commit().await {
            Ok(()) => Ok(value),
            Err(err) => {
                warn!(error = %err, "transaction commit failed");
                roll_back(conn).await;
                Err(StoreError::transaction_commit(err.to_string()).into())
            }
        },
        Ok(Err(err)) => {
            roll_back(conn).await;
            Err(err)
        }
        Err(panic) => {
            roll_back(conn).await;
            resume_unwind(panic)
        }
    }
}

async fn roll_back<C: TransactionalConnection>(conn: &mut C) {
    match conn.rollback().await {
        Ok(()) => debug!("transaction rolled back"),
        // A failed rollback leaves the connection marked broken; the pool
        // discards it on return.
        Err(err) => debug!(error = %err, "transaction rollback failed"),
    }
}
