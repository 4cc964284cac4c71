//! Vote tallies and the vote repository.
//!
//! Totals come from one `SUM` query per batch. PostgreSQL returns `NULL` for
//! the sum of an empty group, which surfaces here as `Option<i64>` and is
//! read as zero. The viewer's own vote comes from a second query that is
//! skipped when there is no viewer.

use std::collections::HashMap;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::instrument;

use super::DieselRecipeStore;
use super::diesel_helpers::{map_diesel_error, map_pool_error};
use super::models::NewVoteRow;
use super::relation_loader::{PgRelations, RelationSource};
use super::schema::recipe_votes;
use crate::domain::ports::{StoreError, VoteRepository};
use crate::domain::{RecipeId, RecipeVotes, UserId};

/// Vote tallies for `recipe_ids` as seen by `viewer`.
///
/// Every requested id gets an entry, zero-filled when nobody voted.
pub(crate) async fn load_recipe_votes<S>(
    source: &mut S,
    viewer: Option<UserId>,
    recipe_ids: &[i64],
) -> Result<HashMap<RecipeId, RecipeVotes>, StoreError>
where
    S: RelationSource + ?Sized,
{
    if recipe_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let totals = source.vote_totals(recipe_ids).await?;
    let own = match viewer {
        Some(user) => source.own_votes(user, recipe_ids).await?,
        None => Vec::new(),
    };
    Ok(tally(recipe_ids, totals, own))
}

fn tally(
    recipe_ids: &[i64],
    totals: Vec<(i64, Option<i64>)>,
    own: Vec<(i64, i16)>,
) -> HashMap<RecipeId, RecipeVotes> {
    let mut votes: HashMap<RecipeId, RecipeVotes> = recipe_ids
        .iter()
        .map(|id| (RecipeId::new(*id), RecipeVotes::default()))
        .collect();
    for (id, total) in totals {
        if let Some(entry) = votes.get_mut(&RecipeId::new(id)) {
            entry.total = total.unwrap_or(0);
        }
    }
    for (id, vote) in own {
        if let Some(entry) = votes.get_mut(&RecipeId::new(id)) {
            entry.user_own = vote;
        }
    }
    votes
}

#[async_trait]
impl VoteRepository for DieselRecipeStore {
    #[instrument(skip(self))]
    async fn add_vote(&self, recipe: RecipeId, user: UserId, vote: i16) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewVoteRow {
            recipe_id: recipe.get(),
            user_id: user.get(),
            vote,
        };
        diesel::insert_into(recipe_votes::table)
            .values(&row)
            .on_conflict((recipe_votes::recipe_id, recipe_votes::user_id))
            .do_update()
            .set(recipe_votes::vote.eq(vote))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_vote(&self, recipe: RecipeId, user: UserId) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::delete(
            recipe_votes::table
                .filter(recipe_votes::recipe_id.eq(recipe.get()))
                .filter(recipe_votes::user_id.eq(user.get())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(())
    }

    async fn get_recipe_votes(&self, recipe: RecipeId) -> Result<i64, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut relations = PgRelations::new(&mut conn);
        let votes = load_recipe_votes(&mut relations, None, &[recipe.get()]).await?;
        Ok(votes.get(&recipe).map_or(0, |tally| tally.total))
    }

    async fn get_user_vote(&self, recipe: RecipeId, user: UserId) -> Result<i16, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let vote: Option<i16> = recipe_votes::table
            .filter(recipe_votes::recipe_id.eq(recipe.get()))
            .filter(recipe_votes::user_id.eq(user.get()))
            .select(recipe_votes::vote)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(vote.unwrap_or(0))
    }
}
