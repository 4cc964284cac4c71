//! Driven port for measuring units.

use async_trait::async_trait;
use pagination::{Page, Paginated};

use super::StoreError;
use crate::domain::{Unit, UnitDraft};

/// Persistence contract for units.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UnitRepository: Send + Sync {
    /// Page through units ordered by name.
    async fn get_units(&self, page: &Page) -> Result<Paginated<Unit>, StoreError>;

    /// Create a unit.
    async fn create_unit(&self, draft: &UnitDraft) -> Result<Unit, StoreError>;

    /// Replace a unit's name and symbol.
    async fn update_unit(&self, id: i64, draft: &UnitDraft) -> Result<Unit, StoreError>;

    /// Delete a unit that no step references.
    async fn delete_unit(&self, id: i64) -> Result<(), StoreError>;
}
