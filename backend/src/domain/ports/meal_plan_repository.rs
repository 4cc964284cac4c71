//! Driven port for per-user meal plans.

use async_trait::async_trait;
use chrono::NaiveDate;
use pagination::{Page, Paginated};

use super::StoreError;
use crate::domain::{MealPlan, MealPlanEntry, RecipeId, UserId};

/// Persistence contract for meal plans.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MealPlanRepository: Send + Sync {
    /// Page through the days in `from..=until` on which `user` planned
    /// recipes, earliest first.
    async fn get_meal_plan(
        &self,
        user: UserId,
        from: NaiveDate,
        until: NaiveDate,
        page: &Page,
    ) -> Result<Paginated<MealPlan>, StoreError>;

    /// Schedule a recipe on a day and return the stored entry.
    ///
    /// A recipe already planned on that day keeps its position; the entry
    /// returned then carries the stored `sort_order`, not the requested one.
    async fn create_meal_plan_entry(
        &self,
        entry: MealPlanEntry,
    ) -> Result<MealPlanEntry, StoreError>;

    /// Remove a scheduled recipe from a day.
    async fn delete_meal_plan_entry(
        &self,
        user: UserId,
        recipe: RecipeId,
        date: NaiveDate,
    ) -> Result<(), StoreError>;
}
