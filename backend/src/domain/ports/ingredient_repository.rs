//! Driven port for ingredients and their nutrient profiles.

use async_trait::async_trait;
use pagination::{Page, Paginated};

use super::StoreError;
use crate::domain::{Ingredient, IngredientDraft};

/// Persistence contract for ingredients.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IngredientRepository: Send + Sync {
    /// Page through ingredients ordered by name, nutrients included.
    async fn get_ingredients(&self, page: &Page) -> Result<Paginated<Ingredient>, StoreError>;

    /// Create an ingredient and its nutrient profile.
    async fn create_ingredient(&self, draft: &IngredientDraft) -> Result<Ingredient, StoreError>;

    /// Rename an ingredient and replace its nutrient profile.
    async fn update_ingredient(
        &self,
        id: i64,
        draft: &IngredientDraft,
    ) -> Result<Ingredient, StoreError>;

    /// Delete an ingredient that no step references.
    async fn delete_ingredient(&self, id: i64) -> Result<(), StoreError>;
}
