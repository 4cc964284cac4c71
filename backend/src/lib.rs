//! Persistence layer for a recipe manager.
//!
//! The crate is split along hexagonal lines:
//!
//! - [`domain`]: recipes, ingredients, meal plans and shopping lists, the
//!   store ports they are read and written through, and the
//!   [`domain::RecipeService`] that applies ownership and validation rules.
//! - [`outbound`]: the PostgreSQL adapter implementing every port.
//! - [`config`]: layered store settings.

pub mod config;
pub mod domain;
pub mod outbound;
