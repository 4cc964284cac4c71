//! Recipe aggregate and its meal plan projection.
//!
//! A [`Recipe`] is the aggregate root: steps and images are owned by it and
//! only reachable through it. Tags, units and ingredients are reference data
//! shared by id (see [`crate::domain::ingredient`]).

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use url::Url;

use super::ingredient::{Ingredient, Unit};
use super::user::UserId;

/// Database identifier of a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipeId(i64);

impl RecipeId {
    /// Wrap a raw database id.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Access the raw database id.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for RecipeId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for RecipeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Free-form label attached to recipes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag id.
    pub id: i64,
    /// Unique display name.
    pub name: String,
}

/// Image owned by a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeImage {
    /// Image id.
    pub id: i64,
    /// Location of the uploaded image.
    pub url: Url,
}

/// An ingredient quantity used by one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepIngredient {
    /// Unit the amount is expressed in.
    pub unit: Unit,
    /// Referenced ingredient, including its nutrients.
    pub ingredient: Ingredient,
    /// Quantity in `unit`.
    pub amount: f64,
}

/// One instruction step of a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeStep {
    /// Step id. Steps are recreated on every recipe update, so ids change.
    pub id: i64,
    /// Instruction text.
    pub instructions: String,
    /// Ingredients in the order they were entered.
    pub ingredients: Vec<StepIngredient>,
}

/// Vote tally of a recipe from the point of view of one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeVotes {
    /// Sum of all votes cast on the recipe.
    pub total: i64,
    /// The viewer's own vote: `1`, `-1`, or `0` when they have not voted.
    pub user_own: i16,
}

/// Fully assembled recipe aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Recipe id.
    pub id: RecipeId,
    /// Display name.
    pub name: String,
    /// Longer description.
    pub description: String,
    /// Number of servings the quantities yield.
    pub servings: i32,
    /// Preparation time in minutes.
    pub minutes: i32,
    /// Owner of the recipe.
    pub created_by: UserId,
    /// Tags ordered by name.
    pub tags: Vec<Tag>,
    /// Images in upload order.
    pub images: Vec<RecipeImage>,
    /// Steps in recipe order.
    pub steps: Vec<RecipeStep>,
    /// Vote tally for the requesting user.
    pub votes: RecipeVotes,
}

/// Ingredient line of a [`StepDraft`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepIngredientDraft {
    /// Referenced ingredient.
    pub ingredient_id: i64,
    /// Referenced unit.
    pub unit_id: i64,
    /// Quantity in the unit.
    pub amount: f64,
}

/// Step of a [`RecipeDraft`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDraft {
    /// Instruction text.
    pub instructions: String,
    /// Ingredient lines in display order.
    pub ingredients: Vec<StepIngredientDraft>,
}

/// Write model for creating or replacing a recipe.
///
/// Updates replace steps, images and tags wholesale; there are no partial
/// step edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDraft {
    /// Display name.
    pub name: String,
    /// Longer description.
    pub description: String,
    /// Number of servings.
    pub servings: i32,
    /// Preparation time in minutes.
    pub minutes: i32,
    /// Owner of the recipe.
    pub created_by: UserId,
    /// Tag names; unknown names are created on write.
    pub tags: Vec<String>,
    /// Image locations in display order.
    pub images: Vec<Url>,
    /// Steps in recipe order.
    pub steps: Vec<StepDraft>,
}

/// Recipes planned for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    /// Planned day.
    pub date: NaiveDate,
    /// Recipes in planned order.
    pub recipes: Vec<Recipe>,
}

/// One recipe scheduled on one day for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanEntry {
    /// Planning user.
    pub user_id: UserId,
    /// Planned recipe.
    pub recipe_id: RecipeId,
    /// Planned day.
    pub date: NaiveDate,
    /// Position among the day's recipes.
    pub sort_order: i32,
}
