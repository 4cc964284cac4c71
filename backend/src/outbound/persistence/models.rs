//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

use super::schema::{
    ingredient_nutrients, ingredients, meal_plan_entries, nutrients, password_resets,
    recipe_images, recipe_steps, recipe_tags, recipe_votes, recipes, shopping_list_items,
    shopping_lists, step_ingredients, tags, units, user_registrations, users,
};
use crate::domain::{Nutrient, RecipeId, ShoppingListItem, Tag, Unit, User, UserId};

// ---------------------------------------------------------------------------
// Recipe root
// ---------------------------------------------------------------------------

/// Row struct for reading from the recipes table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RecipeRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub servings: i32,
    pub minutes: i32,
    pub created_by: i64,
}

impl RecipeRow {
    pub(crate) const fn recipe_id(&self) -> RecipeId {
        RecipeId::new(self.id)
    }
}

/// Insertable and changeset struct for recipe roots.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = recipes)]
pub(crate) struct RecipeValues<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub servings: i32,
    pub minutes: i32,
    pub created_by: i64,
}

// ---------------------------------------------------------------------------
// Recipe children
// ---------------------------------------------------------------------------

/// Row struct for reading from the tags table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tags)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TagRow {
    pub id: i64,
    pub name: String,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

/// Insertable struct for tags upserted by name.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tags)]
pub(crate) struct NewTagRow<'a> {
    pub name: &'a str,
}

/// Insertable struct linking a recipe to a tag.
#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = recipe_tags)]
pub(crate) struct RecipeTagRow {
    pub recipe_id: i64,
    pub tag_id: i64,
}

/// Row struct for reading from the recipe_images table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = recipe_images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ImageRow {
    pub id: i64,
    pub recipe_id: i64,
    pub url: String,
}

/// Insertable struct for recipe images.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = recipe_images)]
pub(crate) struct NewImageRow<'a> {
    pub recipe_id: i64,
    pub url: &'a str,
    pub sort_order: i32,
}

/// Row struct for reading from the recipe_steps table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = recipe_steps)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct StepRow {
    pub id: i64,
    pub recipe_id: i64,
    pub instructions: String,
}

/// Insertable struct for recipe steps.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = recipe_steps)]
pub(crate) struct NewStepRow<'a> {
    pub recipe_id: i64,
    pub instructions: &'a str,
    pub sort_order: i32,
}

/// Insertable struct for step ingredient quantities.
#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = step_ingredients)]
pub(crate) struct NewStepIngredientRow {
    pub step_id: i64,
    pub ingredient_id: i64,
    pub unit_id: i64,
    pub amount: f64,
    pub sort_order: i32,
}

/// Step ingredient joined with its unit and ingredient.
#[derive(Debug, Clone)]
pub(crate) struct StepIngredientRow {
    pub step_id: i64,
    pub amount: f64,
    pub unit: UnitRow,
    pub ingredient: IngredientRow,
}

// ---------------------------------------------------------------------------
// Reference data
// ---------------------------------------------------------------------------

/// Row struct for reading from the units table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = units)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UnitRow {
    pub id: i64,
    pub name: String,
    pub symbol: Option<String>,
}

impl From<UnitRow> for Unit {
    fn from(row: UnitRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            symbol: row.symbol,
        }
    }
}

/// Insertable and changeset struct for units.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = units)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UnitValues<'a> {
    pub name: &'a str,
    pub symbol: Option<&'a str>,
}

/// Row struct for reading from the ingredients table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = ingredients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct IngredientRow {
    pub id: i64,
    pub name: String,
}

/// Insertable and changeset struct for ingredients.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = ingredients)]
pub(crate) struct IngredientValues<'a> {
    pub name: &'a str,
}

/// Row struct for reading from the nutrients table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = nutrients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct NutrientRow {
    pub id: i64,
    pub name: String,
    pub unit: String,
}

impl From<NutrientRow> for Nutrient {
    fn from(row: NutrientRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            unit: row.unit,
        }
    }
}

/// Insertable struct for an ingredient's nutrient amount.
#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = ingredient_nutrients)]
pub(crate) struct NewIngredientNutrientRow {
    pub ingredient_id: i64,
    pub nutrient_id: i64,
    pub amount: f64,
}

/// Nutrient amount joined with its nutrient.
#[derive(Debug, Clone)]
pub(crate) struct IngredientNutrientRow {
    pub ingredient_id: i64,
    pub amount: f64,
    pub nutrient: NutrientRow,
}

// ---------------------------------------------------------------------------
// Votes and meal plans
// ---------------------------------------------------------------------------

/// Insertable struct for a user's vote.
#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = recipe_votes)]
pub(crate) struct NewVoteRow {
    pub recipe_id: i64,
    pub user_id: i64,
    pub vote: i16,
}

/// Row struct for reading from the meal_plan_entries table.
#[derive(Debug, Clone, Copy, Queryable, Selectable)]
#[diesel(table_name = meal_plan_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MealPlanEntryRow {
    pub id: i64,
    pub recipe_id: i64,
    pub date: NaiveDate,
}

/// Insertable struct for meal plan entries.
#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = meal_plan_entries)]
pub(crate) struct NewMealPlanEntryRow {
    pub user_id: i64,
    pub recipe_id: i64,
    pub date: NaiveDate,
    pub sort_order: i32,
}

// ---------------------------------------------------------------------------
// Shopping lists
// ---------------------------------------------------------------------------

/// Row struct for reading from the shopping_lists table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = shopping_lists)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ShoppingListRow {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
}

impl ShoppingListRow {
    pub(crate) const fn owner(&self) -> UserId {
        UserId::new(self.user_id)
    }
}

/// Insertable struct for shopping lists.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = shopping_lists)]
pub(crate) struct NewShoppingListRow<'a> {
    pub user_id: i64,
    pub name: &'a str,
}

/// Row struct for reading from the shopping_list_items table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = shopping_list_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ShoppingListItemRow {
    pub id: i64,
    pub list_id: i64,
    pub ingredient: String,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub done: bool,
    pub sort_order: i32,
}

impl From<ShoppingListItemRow> for ShoppingListItem {
    fn from(row: ShoppingListItemRow) -> Self {
        Self {
            id: row.id,
            ingredient: row.ingredient,
            quantity: row.quantity,
            unit: row.unit,
            done: row.done,
            sort_order: row.sort_order,
        }
    }
}

/// Insertable struct for shopping list items.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = shopping_list_items)]
pub(crate) struct NewShoppingListItemRow<'a> {
    pub list_id: i64,
    pub ingredient: &'a str,
    pub quantity: Option<&'a str>,
    pub unit: Option<&'a str>,
    pub done: bool,
    pub sort_order: i32,
}

impl<'a> NewShoppingListItemRow<'a> {
    pub(crate) fn from_item(list_id: i64, item: &'a ShoppingListItem) -> Self {
        Self {
            list_id,
            ingredient: &item.ingredient,
            quantity: item.quantity.as_deref(),
            unit: item.unit.as_deref(),
            done: item.done,
            sort_order: item.sort_order,
        }
    }
}

/// Changeset struct for editing a shopping list item in place.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = shopping_list_items)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ShoppingListItemChanges<'a> {
    pub ingredient: &'a str,
    pub quantity: Option<&'a str>,
    pub unit: Option<&'a str>,
    pub done: bool,
}

impl<'a> From<&'a ShoppingListItem> for ShoppingListItemChanges<'a> {
    fn from(item: &'a ShoppingListItem) -> Self {
        Self {
            ingredient: &item.ingredient,
            quantity: item.quantity.as_deref(),
            unit: item.unit.as_deref(),
            done: item.done,
        }
    }
}

// ---------------------------------------------------------------------------
// Accounts and tokens
// ---------------------------------------------------------------------------

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub is_confirmed: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            email: row.email,
            password_hash: row.password_hash,
            confirmed: row.is_confirmed,
        }
    }
}

/// Insertable struct for new accounts.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
}

/// Changeset struct for the editable account fields.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserChanges<'a> {
    pub email: &'a str,
    pub is_confirmed: bool,
}

impl<'a> From<&'a User> for UserChanges<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            email: &user.email,
            is_confirmed: user.confirmed,
        }
    }
}

/// Row struct for reading from the user_registrations table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = user_registrations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RegistrationRow {
    pub token: String,
    pub created_at: DateTime<Utc>,
}

/// Row struct for reading from the password_resets table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = password_resets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PasswordResetRow {
    pub user_id: i64,
    pub token: String,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for registration tokens.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_registrations)]
pub(crate) struct NewRegistrationRow<'a> {
    pub user_id: i64,
    pub token: &'a str,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for password reset tokens.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = password_resets)]
pub(crate) struct NewPasswordResetRow<'a> {
    pub user_id: i64,
    pub token: &'a str,
    pub created_at: DateTime<Utc>,
}
