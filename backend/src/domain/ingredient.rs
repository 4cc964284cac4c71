//! Reference data shared across recipes: ingredients, nutrients and units.

use serde::{Deserialize, Serialize};

/// A nutrient tracked per ingredient (protein, fat, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nutrient {
    /// Nutrient id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Unit-of-measure label, e.g. `g` or `kcal`.
    pub unit: String,
}

/// Amount of one nutrient contained in an ingredient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientNutrient {
    /// The nutrient.
    pub nutrient: Nutrient,
    /// Amount per reference quantity of the ingredient.
    pub amount: f64,
}

/// Ingredient with its nutrient profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Ingredient id.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Nutrient profile ordered by nutrient name.
    pub nutrients: Vec<IngredientNutrient>,
}

/// Measuring unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Unit id.
    pub id: i64,
    /// Display name, e.g. `tablespoon`.
    pub name: String,
    /// Optional abbreviation, e.g. `tbsp`.
    pub symbol: Option<String>,
}

/// Nutrient amount in an [`IngredientDraft`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientAmount {
    /// Referenced nutrient.
    pub nutrient_id: i64,
    /// Amount per reference quantity.
    pub amount: f64,
}

/// Write model for creating or replacing an ingredient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientDraft {
    /// Display name.
    pub name: String,
    /// Nutrient profile; replaces the stored profile on update.
    pub nutrients: Vec<NutrientAmount>,
}

/// Write model for creating or replacing a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDraft {
    /// Display name.
    pub name: String,
    /// Optional abbreviation.
    pub symbol: Option<String>,
}
