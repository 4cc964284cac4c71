//! Recipe aggregate assembly.
//!
//! Turns a batch of root rows into complete [`Recipe`] values with a fixed
//! number of relation queries, whatever the batch size. Relation rows are
//! grouped by owner in one pass and joined purely on ids.

use std::collections::{BTreeSet, HashMap};

use url::Url;

use super::diesel_helpers::group_by;
use super::models::{IngredientNutrientRow, IngredientRow, RecipeRow, StepIngredientRow};
use super::relation_loader::RelationSource;
use super::votes::load_recipe_votes;
use crate::domain::ports::StoreError;
use crate::domain::{
    Ingredient, IngredientNutrient, Recipe, RecipeImage, RecipeStep, StepIngredient, Tag, UserId,
};

/// Assemble full recipes for `roots`, preserving their order.
///
/// `viewer` decides whose own vote is reported; without one, own votes are
/// zero and the own-vote query is skipped.
pub(crate) async fn assemble_recipes<S>(
    source: &mut S,
    roots: Vec<RecipeRow>,
    viewer: Option<UserId>,
) -> Result<Vec<Recipe>, StoreError>
where
    S: RelationSource + ?Sized,
{
    if roots.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i64> = roots.iter().map(|root| root.id).collect();

    let mut tags = group_by(source.tags_for(&ids).await?, |(recipe, _)| *recipe);
    let mut images = group_by(source.images_for(&ids).await?, |row| row.recipe_id);
    let steps = source.steps_for(&ids).await?;
    let step_ingredients = source.step_ingredients_for(&ids).await?;
    let ingredients = populate_step_ingredients(source, &step_ingredients).await?;
    let mut ingredients_by_step = group_by(step_ingredients, |row| row.step_id);
    let votes = load_recipe_votes(source, viewer, &ids).await?;

    let mut steps_by_recipe = group_by(
        steps.into_iter().map(|step| {
            let step_lines = ingredients_by_step
                .remove(&step.id)
                .unwrap_or_default()
                .into_iter()
                .filter_map(|line| {
                    ingredients
                        .get(&line.ingredient.id)
                        .map(|ingredient| StepIngredient {
                            unit: line.unit.into(),
                            ingredient: ingredient.clone(),
                            amount: line.amount,
                        })
                })
                .collect();
            (
                step.recipe_id,
                RecipeStep {
                    id: step.id,
                    instructions: step.instructions,
                    ingredients: step_lines,
                },
            )
        }),
        |(recipe, _)| *recipe,
    );

    roots
        .into_iter()
        .map(|root| {
            let recipe_id = root.recipe_id();
            let attached = images
                .remove(&root.id)
                .unwrap_or_default()
                .into_iter()
                .map(|row| {
                    Url::parse(&row.url)
                        .map(|url| RecipeImage { id: row.id, url })
                        .map_err(|err| {
                            StoreError::query(format!("image {} has an invalid url: {err}", row.id))
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Recipe {
                id: recipe_id,
                name: root.name,
                description: root.description,
                servings: root.servings,
                minutes: root.minutes,
                created_by: UserId::new(root.created_by),
                tags: tags
                    .remove(&root.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(_, tag)| Tag::from(tag))
                    .collect(),
                images: attached,
                steps: steps_by_recipe
                    .remove(&root.id)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(_, step)| step)
                    .collect(),
                votes: votes.get(&recipe_id).copied().unwrap_or_default(),
            })
        })
        .collect()
}

/// Attach nutrient profiles to ingredient rows, preserving their order.
pub(crate) async fn assemble_ingredients<S>(
    source: &mut S,
    rows: Vec<IngredientRow>,
) -> Result<Vec<Ingredient>, StoreError>
where
    S: RelationSource + ?Sized,
{
    let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
    let mut nutrients = load_nutrients(source, &ids).await?;
    Ok(rows
        .into_iter()
        .map(|row| Ingredient {
            id: row.id,
            name: row.name,
            nutrients: nutrients.remove(&row.id).unwrap_or_default(),
        })
        .collect())
}

/// Distinct ingredients referenced by `lines`, each with its nutrients.
async fn populate_step_ingredients<S>(
    source: &mut S,
    lines: &[StepIngredientRow],
) -> Result<HashMap<i64, Ingredient>, StoreError>
where
    S: RelationSource + ?Sized,
{
    let distinct: BTreeSet<i64> = lines.iter().map(|line| line.ingredient.id).collect();
    let ids: Vec<i64> = distinct.into_iter().collect();
    let mut nutrients = load_nutrients(source, &ids).await?;

    let mut ingredients = HashMap::with_capacity(ids.len());
    for line in lines {
        ingredients
            .entry(line.ingredient.id)
            .or_insert_with(|| Ingredient {
                id: line.ingredient.id,
                name: line.ingredient.name.clone(),
                nutrients: nutrients.remove(&line.ingredient.id).unwrap_or_default(),
            });
    }
    Ok(ingredients)
}

async fn load_nutrients<S>(
    source: &mut S,
    ingredient_ids: &[i64],
) -> Result<HashMap<i64, Vec<IngredientNutrient>>, StoreError>
where
    S: RelationSource + ?Sized,
{
    if ingredient_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = source.nutrients_for(ingredient_ids).await?;
    let grouped = group_by(rows, |row: &IngredientNutrientRow| row.ingredient_id);
    Ok(grouped
        .into_iter()
        .map(|(ingredient, rows)| {
            let nutrients = rows
                .into_iter()
                .map(|row| IngredientNutrient {
                    nutrient: row.nutrient.into(),
                    amount: row.amount,
                })
                .collect();
            (ingredient, nutrients)
        })
        .collect())
}
