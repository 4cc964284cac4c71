//! PostgreSQL-backed recipe store: the recipe aggregate.
//!
//! Writes replace a recipe's steps, images and tags wholesale inside one
//! transaction and re-read the aggregate before committing, so callers get
//! exactly what was persisted.

use std::collections::BTreeSet;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use pagination::{NameCursor, Page, Paginated};
use tracing::{debug, instrument};

use super::aggregate::assemble_recipes;
use super::diesel_helpers::{
    after_name_cursor, map_diesel_error, map_pool_error, require_affected, sort_position,
};
use super::models::{
    NewImageRow, NewStepIngredientRow, NewStepRow, NewTagRow, RecipeRow, RecipeTagRow,
    RecipeValues,
};
use super::pool::DbPool;
use super::relation_loader::PgRelations;
use super::schema::{recipe_images, recipe_steps, recipe_tags, recipes, step_ingredients, tags};
use super::transaction::with_transaction;
use crate::domain::ports::{RecipeRepository, StoreError};
use crate::domain::{Recipe, RecipeDraft, RecipeId, UserId};

/// Diesel-backed store implementing every recipe manager port.
///
/// The store holds nothing but the pool. Each call checks out its own
/// connection, so concurrent callers never share transaction state.
#[derive(Clone)]
pub struct DieselRecipeStore {
    pub(crate) pool: DbPool,
}

impl DieselRecipeStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// The pool every call checks its connection out of.
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl<'a> From<&'a RecipeDraft> for RecipeValues<'a> {
    fn from(draft: &'a RecipeDraft) -> Self {
        Self {
            name: &draft.name,
            description: &draft.description,
            servings: draft.servings,
            minutes: draft.minutes,
            created_by: draft.created_by.get(),
        }
    }
}

/// Load one recipe with its relations, or fail with `NotFound`.
pub(crate) async fn read_recipe(
    conn: &mut AsyncPgConnection,
    id: RecipeId,
    viewer: Option<UserId>,
) -> Result<Recipe, StoreError> {
    let root: Option<RecipeRow> = recipes::table
        .find(id.get())
        .select(RecipeRow::as_select())
        .first(conn)
        .await
        .optional()
        .map_err(map_diesel_error)?;
    let root = root.ok_or_else(|| StoreError::not_found(format!("recipe {id}")))?;

    assemble_recipes(&mut PgRelations::new(conn), vec![root], viewer)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| StoreError::not_found(format!("recipe {id}")))
}

/// Delete every child row of a recipe. Step ingredients cascade with steps.
async fn clear_children(conn: &mut AsyncPgConnection, recipe_id: i64) -> Result<(), StoreError> {
    diesel::delete(recipe_steps::table.filter(recipe_steps::recipe_id.eq(recipe_id)))
        .execute(conn)
        .await
        .map_err(map_diesel_error)?;
    diesel::delete(recipe_images::table.filter(recipe_images::recipe_id.eq(recipe_id)))
        .execute(conn)
        .await
        .map_err(map_diesel_error)?;
    diesel::delete(recipe_tags::table.filter(recipe_tags::recipe_id.eq(recipe_id)))
        .execute(conn)
        .await
        .map_err(map_diesel_error)?;
    Ok(())
}

/// Insert steps (with their ingredients), images and tags, in that order.
async fn write_children(
    conn: &mut AsyncPgConnection,
    recipe_id: i64,
    draft: &RecipeDraft,
) -> Result<(), StoreError> {
    write_steps(conn, recipe_id, draft).await?;
    write_images(conn, recipe_id, draft).await?;
    write_tags(conn, recipe_id, draft).await
}

async fn write_steps(
    conn: &mut AsyncPgConnection,
    recipe_id: i64,
    draft: &RecipeDraft,
) -> Result<(), StoreError> {
    if draft.steps.is_empty() {
        return Ok(());
    }
    let step_rows = draft
        .steps
        .iter()
        .enumerate()
        .map(|(index, step)| {
            Ok(NewStepRow {
                recipe_id,
                instructions: &step.instructions,
                sort_order: sort_position(index)?,
            })
        })
        .collect::<Result<Vec<_>, StoreError>>()?;
    let inserted: Vec<(i64, i32)> = diesel::insert_into(recipe_steps::table)
        .values(&step_rows)
        .returning((recipe_steps::id, recipe_steps::sort_order))
        .get_results(conn)
        .await
        .map_err(map_diesel_error)?;

    let mut lines = Vec::new();
    for (step_id, sort_order) in inserted {
        let step = usize::try_from(sort_order)
            .ok()
            .and_then(|index| draft.steps.get(index))
            .ok_or_else(|| {
                StoreError::query(format!("step position {sort_order} not in draft"))
            })?;
        for (index, line) in step.ingredients.iter().enumerate() {
            lines.push(NewStepIngredientRow {
                step_id,
                ingredient_id: line.ingredient_id,
                unit_id: line.unit_id,
                amount: line.amount,
                sort_order: sort_position(index)?,
            });
        }
    }
    if lines.is_empty() {
        return Ok(());
    }
    diesel::insert_into(step_ingredients::table)
        .values(&lines)
        .execute(conn)
        .await
        .map_err(map_diesel_error)?;
    Ok(())
}

async fn write_images(
    conn: &mut AsyncPgConnection,
    recipe_id: i64,
    draft: &RecipeDraft,
) -> Result<(), StoreError> {
    if draft.images.is_empty() {
        return Ok(());
    }
    let rows = draft
        .images
        .iter()
        .enumerate()
        .map(|(index, url)| {
            Ok(NewImageRow {
                recipe_id,
                url: url.as_str(),
                sort_order: sort_position(index)?,
            })
        })
        .collect::<Result<Vec<_>, StoreError>>()?;
    diesel::insert_into(recipe_images::table)
        .values(&rows)
        .execute(conn)
        .await
        .map_err(map_diesel_error)?;
    Ok(())
}

async fn write_tags(
    conn: &mut AsyncPgConnection,
    recipe_id: i64,
    draft: &RecipeDraft,
) -> Result<(), StoreError> {
    let unique: BTreeSet<&str> = draft
        .tags
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .collect();
    if unique.is_empty() {
        return Ok(());
    }
    let names: Vec<&str> = unique.into_iter().collect();
    let new_tags: Vec<NewTagRow<'_>> = names
        .iter()
        .copied()
        .map(|name| NewTagRow { name })
        .collect();
    diesel::insert_into(tags::table)
        .values(&new_tags)
        .on_conflict(tags::name)
        .do_nothing()
        .execute(conn)
        .await
        .map_err(map_diesel_error)?;

    let tag_ids: Vec<i64> = tags::table
        .filter(tags::name.eq_any(names))
        .select(tags::id)
        .load(conn)
        .await
        .map_err(map_diesel_error)?;
    let links: Vec<RecipeTagRow> = tag_ids
        .into_iter()
        .map(|tag_id| RecipeTagRow { recipe_id, tag_id })
        .collect();
    diesel::insert_into(recipe_tags::table)
        .values(&links)
        .on_conflict_do_nothing()
        .execute(conn)
        .await
        .map_err(map_diesel_error)?;
    Ok(())
}

#[async_trait]
impl RecipeRepository for DieselRecipeStore {
    async fn browse_recipes(&self) -> Result<Vec<Recipe>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let roots: Vec<RecipeRow> = recipes::table
            .order_by((recipes::name.asc(), recipes::id.asc()))
            .select(RecipeRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        assemble_recipes(&mut PgRelations::new(&mut conn), roots, None).await
    }

    #[instrument(skip(self, draft), fields(owner = %draft.created_by))]
    async fn create_recipe(&self, draft: &RecipeDraft) -> Result<Recipe, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let recipe = with_transaction(&mut *conn, |tx| {
            async move {
                let recipe_id: i64 = diesel::insert_into(recipes::table)
                    .values(&RecipeValues::from(draft))
                    .returning(recipes::id)
                    .get_result(tx)
                    .await
                    .map_err(map_diesel_error)?;
                write_children(tx, recipe_id, draft).await?;
                read_recipe(tx, RecipeId::new(recipe_id), Some(draft.created_by)).await
            }
            .scope_boxed()
        })
        .await?;
        debug!(recipe = %recipe.id, "recipe created");
        Ok(recipe)
    }

    #[instrument(skip(self, draft))]
    async fn update_recipe(
        &self,
        id: RecipeId,
        draft: &RecipeDraft,
    ) -> Result<Recipe, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        with_transaction(&mut *conn, |tx| {
            async move {
                let affected = diesel::update(recipes::table.find(id.get()))
                    .set(&RecipeValues::from(draft))
                    .execute(tx)
                    .await
                    .map_err(map_diesel_error)?;
                require_affected(affected, || format!("recipe {id}"))?;
                clear_children(tx, id.get()).await?;
                write_children(tx, id.get(), draft).await?;
                read_recipe(tx, id, Some(draft.created_by)).await
            }
            .scope_boxed()
        })
        .await
    }

    #[instrument(skip(self))]
    async fn delete_recipe(&self, id: RecipeId) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let affected = diesel::delete(recipes::table.find(id.get()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        require_affected(affected, || format!("recipe {id}"))
    }

    async fn get_recipe_by_id(&self, viewer: UserId, id: RecipeId) -> Result<Recipe, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        read_recipe(&mut conn, id, Some(viewer)).await
    }

    async fn get_recipes_by_user(
        &self,
        user: UserId,
        page: &Page,
    ) -> Result<Paginated<Recipe>, StoreError> {
        let cursor = page.cursor::<NameCursor>()?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let query = recipes::table
            .filter(recipes::created_by.eq(user.get()))
            .select(RecipeRow::as_select())
            .into_boxed();
        let rows: Vec<RecipeRow> = after_name_cursor!(query, cursor, recipes::name, recipes::id)
            .order_by((recipes::name.asc(), recipes::id.asc()))
            .limit(page.fetch_limit())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let rows = Paginated::from_overfetch(rows, page.limit(), |row| NameCursor {
            id: row.id,
            name: row.name.clone(),
        });
        let assembled =
            assemble_recipes(&mut PgRelations::new(&mut conn), rows.data, Some(user)).await?;
        Ok(Paginated {
            data: assembled,
            next_cursor: rows.next_cursor,
            has_more: rows.has_more,
        })
    }
}
