//! Ingredients, units and tags.
//!
//! All three listings share the `(name, id)` keyset order. Ingredient
//! writes replace the nutrient profile inside the same transaction as the
//! ingredient row.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use pagination::{NameCursor, Page, Paginated};
use tracing::instrument;

use super::DieselRecipeStore;
use super::aggregate::assemble_ingredients;
use super::diesel_helpers::{
    after_name_cursor, map_diesel_error, map_diesel_error_for, map_pool_error, require_affected,
};
use super::models::{
    IngredientRow, IngredientValues, NewIngredientNutrientRow, TagRow, UnitRow, UnitValues,
};
use super::relation_loader::PgRelations;
use super::schema::{ingredient_nutrients, ingredients, tags, units};
use super::transaction::with_transaction;
use crate::domain::ports::{IngredientRepository, StoreError, TagRepository, UnitRepository};
use crate::domain::{Ingredient, IngredientDraft, Tag, Unit, UnitDraft};

fn name_cursor(id: i64, name: &str) -> NameCursor {
    NameCursor {
        id,
        name: name.to_owned(),
    }
}

async fn read_ingredient(
    conn: &mut AsyncPgConnection,
    id: i64,
) -> Result<Ingredient, StoreError> {
    let row: IngredientRow = ingredients::table
        .find(id)
        .select(IngredientRow::as_select())
        .first(conn)
        .await
        .map_err(map_diesel_error_for(|| format!("ingredient {id}")))?;
    assemble_ingredients(&mut PgRelations::new(conn), vec![row])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::not_found(format!("ingredient {id}")))
}

async fn write_nutrients(
    conn: &mut AsyncPgConnection,
    ingredient_id: i64,
    draft: &IngredientDraft,
) -> Result<(), StoreError> {
    if draft.nutrients.is_empty() {
        return Ok(());
    }
    let rows: Vec<NewIngredientNutrientRow> = draft
        .nutrients
        .iter()
        .map(|entry| NewIngredientNutrientRow {
            ingredient_id,
            nutrient_id: entry.nutrient_id,
            amount: entry.amount,
        })
        .collect();
    diesel::insert_into(ingredient_nutrients::table)
        .values(&rows)
        .execute(conn)
        .await
        .map_err(map_diesel_error)?;
    Ok(())
}

#[async_trait]
impl IngredientRepository for DieselRecipeStore {
    async fn get_ingredients(&self, page: &Page) -> Result<Paginated<Ingredient>, StoreError> {
        let cursor = page.cursor::<NameCursor>()?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let query = ingredients::table
            .select(IngredientRow::as_select())
            .into_boxed();
        let rows: Vec<IngredientRow> =
            after_name_cursor!(query, cursor, ingredients::name, ingredients::id)
                .order_by((ingredients::name.asc(), ingredients::id.asc()))
                .limit(page.fetch_limit())
                .load(&mut conn)
                .await
                .map_err(map_diesel_error)?;

        let rows = Paginated::from_overfetch(rows, page.limit(), |row| {
            name_cursor(row.id, &row.name)
        });
        let assembled = assemble_ingredients(&mut PgRelations::new(&mut conn), rows.data).await?;
        Ok(Paginated {
            data: assembled,
            next_cursor: rows.next_cursor,
            has_more: rows.has_more,
        })
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    async fn create_ingredient(&self, draft: &IngredientDraft) -> Result<Ingredient, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        with_transaction(&mut *conn, |tx| {
            async move {
                let id: i64 = diesel::insert_into(ingredients::table)
                    .values(&IngredientValues { name: &draft.name })
                    .returning(ingredients::id)
                    .get_result(tx)
                    .await
                    .map_err(map_diesel_error)?;
                write_nutrients(tx, id, draft).await?;
                read_ingredient(tx, id).await
            }
            .scope_boxed()
        })
        .await
    }

    #[instrument(skip(self, draft))]
    async fn update_ingredient(
        &self,
        id: i64,
        draft: &IngredientDraft,
    ) -> Result<Ingredient, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        with_transaction(&mut *conn, |tx| {
            async move {
                let affected = diesel::update(ingredients::table.find(id))
                    .set(&IngredientValues { name: &draft.name })
                    .execute(tx)
                    .await
                    .map_err(map_diesel_error)?;
                require_affected(affected, || format!("ingredient {id}"))?;
                diesel::delete(
                    ingredient_nutrients::table.filter(ingredient_nutrients::ingredient_id.eq(id)),
                )
                .execute(tx)
                .await
                .map_err(map_diesel_error)?;
                write_nutrients(tx, id, draft).await?;
                read_ingredient(tx, id).await
            }
            .scope_boxed()
        })
        .await
    }

    #[instrument(skip(self))]
    async fn delete_ingredient(&self, id: i64) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let affected = diesel::delete(ingredients::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        require_affected(affected, || format!("ingredient {id}"))
    }
}

impl<'a> From<&'a UnitDraft> for UnitValues<'a> {
    fn from(draft: &'a UnitDraft) -> Self {
        Self {
            name: &draft.name,
            symbol: draft.symbol.as_deref(),
        }
    }
}

#[async_trait]
impl UnitRepository for DieselRecipeStore {
    async fn get_units(&self, page: &Page) -> Result<Paginated<Unit>, StoreError> {
        let cursor = page.cursor::<NameCursor>()?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let query = units::table.select(UnitRow::as_select()).into_boxed();
        let rows: Vec<UnitRow> = after_name_cursor!(query, cursor, units::name, units::id)
            .order_by((units::name.asc(), units::id.asc()))
            .limit(page.fetch_limit())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(
            Paginated::from_overfetch(rows, page.limit(), |row| name_cursor(row.id, &row.name))
                .map(Unit::from),
        )
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    async fn create_unit(&self, draft: &UnitDraft) -> Result<Unit, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: UnitRow = diesel::insert_into(units::table)
            .values(&UnitValues::from(draft))
            .returning(UnitRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(row.into())
    }

    #[instrument(skip(self, draft))]
    async fn update_unit(&self, id: i64, draft: &UnitDraft) -> Result<Unit, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UnitRow> = diesel::update(units::table.find(id))
            .set(&UnitValues::from(draft))
            .returning(UnitRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Unit::from)
            .ok_or_else(|| StoreError::not_found(format!("unit {id}")))
    }

    #[instrument(skip(self))]
    async fn delete_unit(&self, id: i64) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let affected = diesel::delete(units::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        require_affected(affected, || format!("unit {id}"))
    }
}

#[async_trait]
impl TagRepository for DieselRecipeStore {
    async fn get_tags(&self, page: &Page) -> Result<Paginated<Tag>, StoreError> {
        let cursor = page.cursor::<NameCursor>()?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let query = tags::table.select(TagRow::as_select()).into_boxed();
        let rows: Vec<TagRow> = after_name_cursor!(query, cursor, tags::name, tags::id)
            .order_by((tags::name.asc(), tags::id.asc()))
            .limit(page.fetch_limit())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(
            Paginated::from_overfetch(rows, page.limit(), |row| name_cursor(row.id, &row.name))
                .map(Tag::from),
        )
    }
}
