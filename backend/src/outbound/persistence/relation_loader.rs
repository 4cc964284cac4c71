//! Batched relation queries for recipe aggregates.
//!
//! Each method fetches one relation for a whole batch of owners in a single
//! query. Rows come back ordered by owner and then by the relation's own
//! sort keys; callers group them in memory (see [`super::aggregate`]).

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use super::diesel_helpers::map_diesel_error;
use super::models::{
    ImageRow, IngredientNutrientRow, IngredientRow, NutrientRow, StepIngredientRow, StepRow,
    TagRow, UnitRow,
};
use super::schema::{
    ingredient_nutrients, ingredients, nutrients, recipe_images, recipe_steps, recipe_tags,
    recipe_votes, step_ingredients, tags, units,
};
use crate::domain::UserId;
use crate::domain::ports::StoreError;

/// Source of relation rows for a batch of recipes.
#[async_trait]
pub(crate) trait RelationSource: Send {
    /// `(recipe_id, tag)` pairs, tags ordered by name then id.
    async fn tags_for(&mut self, recipe_ids: &[i64]) -> Result<Vec<(i64, TagRow)>, StoreError>;

    /// Images ordered by recipe, sort order and id.
    async fn images_for(&mut self, recipe_ids: &[i64]) -> Result<Vec<ImageRow>, StoreError>;

    /// Steps ordered by recipe, sort order and id.
    async fn steps_for(&mut self, recipe_ids: &[i64]) -> Result<Vec<StepRow>, StoreError>;

    /// Step ingredients of the recipes' steps, joined with unit and
    /// ingredient, ordered by step, sort order and id.
    async fn step_ingredients_for(
        &mut self,
        recipe_ids: &[i64],
    ) -> Result<Vec<StepIngredientRow>, StoreError>;

    /// Nutrient amounts ordered by ingredient, then nutrient name.
    async fn nutrients_for(
        &mut self,
        ingredient_ids: &[i64],
    ) -> Result<Vec<IngredientNutrientRow>, StoreError>;

    /// `(recipe_id, sum)` for recipes with at least one vote.
    async fn vote_totals(
        &mut self,
        recipe_ids: &[i64],
    ) -> Result<Vec<(i64, Option<i64>)>, StoreError>;

    /// `(recipe_id, vote)` for the recipes `user` voted on.
    async fn own_votes(
        &mut self,
        user: UserId,
        recipe_ids: &[i64],
    ) -> Result<Vec<(i64, i16)>, StoreError>;
}

/// Relation queries on a PostgreSQL connection.
pub(crate) struct PgRelations<'c> {
    conn: &'c mut AsyncPgConnection,
}

impl<'c> PgRelations<'c> {
    pub(crate) fn new(conn: &'c mut AsyncPgConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl RelationSource for PgRelations<'_> {
    async fn tags_for(&mut self, recipe_ids: &[i64]) -> Result<Vec<(i64, TagRow)>, StoreError> {
        recipe_tags::table
            .inner_join(tags::table)
            .filter(recipe_tags::recipe_id.eq_any(recipe_ids))
            .order_by((tags::name.asc(), tags::id.asc()))
            .select((recipe_tags::recipe_id, TagRow::as_select()))
            .load(&mut *self.conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn images_for(&mut self, recipe_ids: &[i64]) -> Result<Vec<ImageRow>, StoreError> {
        recipe_images::table
            .filter(recipe_images::recipe_id.eq_any(recipe_ids))
            .order_by((
                recipe_images::recipe_id.asc(),
                recipe_images::sort_order.asc(),
                recipe_images::id.asc(),
            ))
            .select(ImageRow::as_select())
            .load(&mut *self.conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn steps_for(&mut self, recipe_ids: &[i64]) -> Result<Vec<StepRow>, StoreError> {
        recipe_steps::table
            .filter(recipe_steps::recipe_id.eq_any(recipe_ids))
            .order_by((
                recipe_steps::recipe_id.asc(),
                recipe_steps::sort_order.asc(),
                recipe_steps::id.asc(),
            ))
            .select(StepRow::as_select())
            .load(&mut *self.conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn step_ingredients_for(
        &mut self,
        recipe_ids: &[i64],
    ) -> Result<Vec<StepIngredientRow>, StoreError> {
        let rows: Vec<(i64, f64, UnitRow, IngredientRow)> = step_ingredients::table
            .inner_join(recipe_steps::table)
            .inner_join(units::table)
            .inner_join(ingredients::table)
            .filter(recipe_steps::recipe_id.eq_any(recipe_ids))
            .order_by((
                step_ingredients::step_id.asc(),
                step_ingredients::sort_order.asc(),
                step_ingredients::id.asc(),
            ))
            .select((
                step_ingredients::step_id,
                step_ingredients::amount,
                UnitRow::as_select(),
                IngredientRow::as_select(),
            ))
            .load(&mut *self.conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows
            .into_iter()
            .map(|(step_id, amount, unit, ingredient)| StepIngredientRow {
                step_id,
                amount,
                unit,
                ingredient,
            })
            .collect())
    }

    async fn nutrients_for(
        &mut self,
        ingredient_ids: &[i64],
    ) -> Result<Vec<IngredientNutrientRow>, StoreError> {
        let rows: Vec<(i64, f64, NutrientRow)> = ingredient_nutrients::table
            .inner_join(nutrients::table)
            .filter(ingredient_nutrients::ingredient_id.eq_any(ingredient_ids))
            .order_by((
                ingredient_nutrients::ingredient_id.asc(),
                nutrients::name.asc(),
                nutrients::id.asc(),
            ))
            .select((
                ingredient_nutrients::ingredient_id,
                ingredient_nutrients::amount,
                NutrientRow::as_select(),
            ))
            .load(&mut *self.conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows
            .into_iter()
            .map(|(ingredient_id, amount, nutrient)| IngredientNutrientRow {
                ingredient_id,
                amount,
                nutrient,
            })
            .collect())
    }

    async fn vote_totals(
        &mut self,
        recipe_ids: &[i64],
    ) -> Result<Vec<(i64, Option<i64>)>, StoreError> {
        recipe_votes::table
            .filter(recipe_votes::recipe_id.eq_any(recipe_ids))
            .group_by(recipe_votes::recipe_id)
            .select((recipe_votes::recipe_id, diesel::dsl::sum(recipe_votes::vote)))
            .load(&mut *self.conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn own_votes(
        &mut self,
        user: UserId,
        recipe_ids: &[i64],
    ) -> Result<Vec<(i64, i16)>, StoreError> {
        recipe_votes::table
            .filter(recipe_votes::user_id.eq(user.get()))
            .filter(recipe_votes::recipe_id.eq_any(recipe_ids))
            .select((recipe_votes::recipe_id, recipe_votes::vote))
            .load(&mut *self.conn)
            .await
            .map_err(map_diesel_error)
    }
}
