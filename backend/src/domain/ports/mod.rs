//! Domain ports and supporting types for the hexagonal boundary.
//!
//! The persistence adapter in [`crate::outbound::persistence`] implements
//! every port on a single store; the domain service only sees the traits.

mod macros;
pub(crate) use macros::define_port_error;

mod ingredient_repository;
mod meal_plan_repository;
mod recipe_repository;
mod shopping_list_repository;
mod store_error;
mod tag_repository;
mod unit_repository;
mod user_repository;
mod vote_repository;

pub use ingredient_repository::IngredientRepository;
#[cfg(test)]
pub use ingredient_repository::MockIngredientRepository;
pub use meal_plan_repository::MealPlanRepository;
#[cfg(test)]
pub use meal_plan_repository::MockMealPlanRepository;
#[cfg(test)]
pub use recipe_repository::MockRecipeRepository;
pub use recipe_repository::RecipeRepository;
#[cfg(test)]
pub use shopping_list_repository::MockShoppingListRepository;
pub use shopping_list_repository::ShoppingListRepository;
pub use store_error::StoreError;
#[cfg(test)]
pub use tag_repository::MockTagRepository;
pub use tag_repository::TagRepository;
#[cfg(test)]
pub use unit_repository::MockUnitRepository;
pub use unit_repository::UnitRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::UserRepository;
#[cfg(test)]
pub use vote_repository::MockVoteRepository;
pub use vote_repository::VoteRepository;
