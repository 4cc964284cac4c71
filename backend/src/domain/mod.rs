//! Domain primitives, aggregates and ports.
//!
//! Purpose: Define strongly typed domain entities used by the recipe service
//! and the persistence adapter. Keep types plain data and document
//! invariants and serialisation contracts (serde) in each type's Rustdoc.
//!
//! Public surface:
//! - Error (alias to `error::DomainError`) — service error payload.
//! - ErrorCode (alias to `error::ErrorCode`) — stable error identifier.
//! - Recipe (alias to `recipe::Recipe`) — the recipe aggregate root.
//! - RecipeService — validation and ownership rules over the ports.

pub mod error;
pub mod ingredient;
pub mod ports;
pub mod recipe;
pub mod recipe_service;
pub mod shopping;
pub mod user;

pub use self::error::{DomainError, Error, ErrorCode, ErrorValidationError};
pub use self::ingredient::{
    Ingredient, IngredientDraft, IngredientNutrient, Nutrient, NutrientAmount, Unit, UnitDraft,
};
pub use self::recipe::{
    MealPlan, MealPlanEntry, Recipe, RecipeDraft, RecipeId, RecipeImage, RecipeStep, RecipeVotes,
    StepDraft, StepIngredient, StepIngredientDraft, Tag,
};
pub use self::recipe_service::RecipeService;
pub use self::shopping::{ShoppingList, ShoppingListItem};
pub use self::user::{Credentials, PasswordResetToken, User, UserId, UserRegistration};

/// Convenient service result alias.
///
/// # Examples
/// ```
/// use recipe_manager::domain::{DomainResult, Error};
///
/// fn handler() -> DomainResult<()> {
///     Err(Error::authorization("not your recipe"))
/// }
/// assert!(handler().is_err());
/// ```
pub type DomainResult<T> = Result<T, Error>;
