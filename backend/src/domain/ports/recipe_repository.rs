//! Driven port for the recipe aggregate.

use async_trait::async_trait;
use pagination::{Page, Paginated};

use super::StoreError;
use crate::domain::{Recipe, RecipeDraft, RecipeId, UserId};

/// Persistence contract for recipes.
///
/// Every returned [`Recipe`] is fully assembled: tags, images, steps with
/// their ingredients (and nutrients), and the vote tally.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    /// All recipes ordered by name, without a viewer (own votes are zero).
    async fn browse_recipes(&self) -> Result<Vec<Recipe>, StoreError>;

    /// Persist a new recipe and return it as stored.
    async fn create_recipe(&self, draft: &RecipeDraft) -> Result<Recipe, StoreError>;

    /// Replace a recipe's fields, steps, images and tags.
    async fn update_recipe(&self, id: RecipeId, draft: &RecipeDraft)
    -> Result<Recipe, StoreError>;

    /// Delete a recipe and everything it owns.
    async fn delete_recipe(&self, id: RecipeId) -> Result<(), StoreError>;

    /// Load one recipe with votes seen by `viewer`.
    async fn get_recipe_by_id(&self, viewer: UserId, id: RecipeId) -> Result<Recipe, StoreError>;

    /// Page through the recipes `user` created, ordered by name.
    async fn get_recipes_by_user(
        &self,
        user: UserId,
        page: &Page,
    ) -> Result<Paginated<Recipe>, StoreError>;
}
