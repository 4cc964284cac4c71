//! Meal plan persistence on the recipe store.
//!
//! Meal plans page over days rather than entries: one page holds up to
//! `limit` distinct dates, each with every recipe planned on it.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::{DateCursor, Page, Paginated};
use tracing::instrument;

use super::DieselRecipeStore;
use super::aggregate::assemble_recipes;
use super::diesel_helpers::{
    map_diesel_error, map_diesel_error_for, map_pool_error, require_affected,
};
use super::models::{MealPlanEntryRow, NewMealPlanEntryRow, RecipeRow};
use super::relation_loader::PgRelations;
use super::schema::{meal_plan_entries, recipes};
use crate::domain::ports::{MealPlanRepository, StoreError};
use crate::domain::{MealPlan, MealPlanEntry, Recipe, RecipeId, UserId};

/// Split entries ordered by date into per-day groups, keeping order.
fn group_days(entries: Vec<MealPlanEntryRow>) -> Vec<(NaiveDate, Vec<MealPlanEntryRow>)> {
    let mut days: Vec<(NaiveDate, Vec<MealPlanEntryRow>)> = Vec::new();
    for entry in entries {
        match days.last_mut() {
            Some((date, rows)) if *date == entry.date => rows.push(entry),
            _ => days.push((entry.date, vec![entry])),
        }
    }
    days
}

#[async_trait]
impl MealPlanRepository for DieselRecipeStore {
    async fn get_meal_plan(
        &self,
        user: UserId,
        from: NaiveDate,
        until: NaiveDate,
        page: &Page,
    ) -> Result<Paginated<MealPlan>, StoreError> {
        let cursor = page.cursor::<DateCursor>()?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let mut days_query = meal_plan_entries::table
            .filter(meal_plan_entries::user_id.eq(user.get()))
            .filter(meal_plan_entries::date.between(from, until))
            .select(meal_plan_entries::date)
            .distinct()
            .into_boxed();
        if let Some(cursor) = cursor {
            days_query = days_query.filter(meal_plan_entries::date.gt(cursor.date));
        }
        let days: Vec<NaiveDate> = days_query
            .order_by(meal_plan_entries::date.asc())
            .limit(page.fetch_limit())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if days.is_empty() {
            return Ok(Paginated::empty());
        }

        let entries: Vec<MealPlanEntryRow> = meal_plan_entries::table
            .filter(meal_plan_entries::user_id.eq(user.get()))
            .filter(meal_plan_entries::date.eq_any(days))
            .order_by((
                meal_plan_entries::date.asc(),
                meal_plan_entries::sort_order.asc(),
                meal_plan_entries::id.asc(),
            ))
            .select(MealPlanEntryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        let day_page = Paginated::from_overfetch(group_days(entries), page.limit(), |(date, rows)| {
            DateCursor {
                id: rows.last().map_or(0, |row| row.id),
                date: *date,
            }
        });

        let recipe_ids: Vec<i64> = day_page
            .data
            .iter()
            .flat_map(|(_, rows)| rows.iter().map(|row| row.recipe_id))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let roots: Vec<RecipeRow> = recipes::table
            .filter(recipes::id.eq_any(recipe_ids))
            .select(RecipeRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let planned: HashMap<RecipeId, Recipe> =
            assemble_recipes(&mut PgRelations::new(&mut conn), roots, Some(user))
                .await?
                .into_iter()
                .map(|recipe| (recipe.id, recipe))
                .collect();

        Ok(day_page.map(|(date, rows)| MealPlan {
            date,
            recipes: rows
                .iter()
                .filter_map(|row| planned.get(&RecipeId::new(row.recipe_id)).cloned())
                .collect(),
        }))
    }

    #[instrument(skip(self))]
    async fn create_meal_plan_entry(
        &self,
        entry: MealPlanEntry,
    ) -> Result<MealPlanEntry, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewMealPlanEntryRow {
            user_id: entry.user_id.get(),
            recipe_id: entry.recipe_id.get(),
            date: entry.date,
            sort_order: entry.sort_order,
        };
        let inserted = diesel::insert_into(meal_plan_entries::table)
            .values(&row)
            .on_conflict((
                meal_plan_entries::user_id,
                meal_plan_entries::recipe_id,
                meal_plan_entries::date,
            ))
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if inserted > 0 {
            return Ok(entry);
        }

        let sort_order: i32 = meal_plan_entries::table
            .filter(meal_plan_entries::user_id.eq(row.user_id))
            .filter(meal_plan_entries::recipe_id.eq(row.recipe_id))
            .filter(meal_plan_entries::date.eq(row.date))
            .select(meal_plan_entries::sort_order)
            .first(&mut conn)
            .await
            .map_err(map_diesel_error_for(|| {
                format!(
                    "meal plan entry for recipe {} on {}",
                    entry.recipe_id, entry.date
                )
            }))?;
        Ok(MealPlanEntry {
            sort_order,
            ..entry
        })
    }

    #[instrument(skip(self))]
    async fn delete_meal_plan_entry(
        &self,
        user: UserId,
        recipe: RecipeId,
        date: NaiveDate,
    ) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let affected = diesel::delete(
            meal_plan_entries::table
                .filter(meal_plan_entries::user_id.eq(user.get()))
                .filter(meal_plan_entries::recipe_id.eq(recipe.get()))
                .filter(meal_plan_entries::date.eq(date)),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        require_affected(affected, || {
            format!("meal plan entry for recipe {recipe} on {date}")
        })
    }
}
