//! Driven port for recipe votes.

use async_trait::async_trait;

use super::StoreError;
use crate::domain::{RecipeId, UserId};

/// Persistence contract for up/down votes. Each user holds at most one vote
/// per recipe; value checks happen in the service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoteRepository: Send + Sync {
    /// Cast or replace `user`'s vote on `recipe`.
    async fn add_vote(&self, recipe: RecipeId, user: UserId, vote: i16) -> Result<(), StoreError>;

    /// Withdraw `user`'s vote; a missing vote is not an error.
    async fn remove_vote(&self, recipe: RecipeId, user: UserId) -> Result<(), StoreError>;

    /// Sum of all votes on `recipe`; zero when nobody voted.
    async fn get_recipe_votes(&self, recipe: RecipeId) -> Result<i64, StoreError>;

    /// `user`'s vote on `recipe`; zero when they have not voted.
    async fn get_user_vote(&self, recipe: RecipeId, user: UserId) -> Result<i16, StoreError>;
}
