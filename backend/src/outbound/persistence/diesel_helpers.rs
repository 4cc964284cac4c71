//! Shared helpers for the Diesel recipe store.
//!
//! This module provides common utilities for database access:
//! - Error mapping from pool and Diesel errors to [`StoreError`]
//! - Grouping of relation rows by their owning id
//! - Checked conversions between domain counters and SQL integers
//! - Keyset filtering for listings ordered by `(name, id)`

use std::collections::HashMap;
use std::hash::Hash;

use tracing::debug;

use crate::domain::ports::StoreError;

use super::pool::PoolError;

/// Map pool errors to store connection errors.
pub(crate) fn map_pool_error(error: PoolError) -> StoreError {
    debug!(error = %error, "pool checkout failed");
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            StoreError::connection(message)
        }
    }
}

/// Map Diesel errors to store errors.
///
/// `NotFound` keeps the generic entity name `record`; callers that know
/// which entity they addressed should match on `diesel::result::Error`
/// first and raise a precise [`StoreError::NotFound`].
pub(crate) fn map_diesel_error(error: diesel::result::Error) -> StoreError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = ?info.constraint_name(),
                "diesel operation failed"
            );
        }
        _ => debug!(error = %error, "diesel operation failed"),
    }

    match error {
        DieselError::NotFound => StoreError::not_found("record"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            StoreError::connection("database connection closed")
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
            StoreError::query(format!("foreign key violation: {}", info.message()))
        }
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            StoreError::conflict(info.message())
        }
        other => StoreError::query(other.to_string()),
    }
}

/// Map a Diesel error, naming the entity when the row was missing.
pub(crate) fn map_diesel_error_for(
    entity: impl FnOnce() -> String,
) -> impl FnOnce(diesel::result::Error) -> StoreError {
    move |error| match error {
        diesel::result::Error::NotFound => StoreError::not_found(entity()),
        other => map_diesel_error(other),
    }
}

/// Fail with [`StoreError::NotFound`] when a mutation touched no rows.
pub(crate) fn require_affected(
    affected: usize,
    entity: impl FnOnce() -> String,
) -> Result<(), StoreError> {
    if affected == 0 {
        Err(StoreError::not_found(entity()))
    } else {
        Ok(())
    }
}

/// Group rows by owner in one pass, keeping each group's row order.
pub(crate) fn group_by<K, T, I>(rows: I, owner: impl Fn(&T) -> K) -> HashMap<K, Vec<T>>
where
    K: Eq + Hash,
    I: IntoIterator<Item = T>,
{
    let mut groups: HashMap<K, Vec<T>> = HashMap::new();
    for row in rows {
        groups.entry(owner(&row)).or_default().push(row);
    }
    groups
}

/// Convert a position in a draft list into a `sort_order` column value.
pub(crate) fn sort_position(index: usize) -> Result<i32, StoreError> {
    i32::try_from(index).map_err(|_| StoreError::query(format!("position {index} out of range")))
}

/// Restrict a boxed query to rows after a `(name, id)` keyset cursor.
///
/// The query must be ordered by `($name, $id)` ascending for the cursor to
/// address a stable position.
macro_rules! after_name_cursor {
    ($query:expr, $cursor:expr, $name:expr, $id:expr) => {
        match $cursor {
            Some(cursor) => $query.filter(
                $name
                    .gt(cursor.name.clone())
                    .or($name.eq(cursor.name).and($id.gt(cursor.id))),
            ),
            None => $query,
        }
    };
}

pub(crate) use after_name_cursor;
