//! Shopping lists and their items.
//!
//! Lists are read with their items in two queries regardless of how many
//! lists a user owns.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::instrument;

use super::DieselRecipeStore;
use super::diesel_helpers::{
    group_by, map_diesel_error, map_diesel_error_for, map_pool_error, require_affected,
};
use super::models::{
    NewShoppingListItemRow, NewShoppingListRow, ShoppingListItemChanges, ShoppingListItemRow,
    ShoppingListRow,
};
use super::schema::{shopping_list_items, shopping_lists};
use crate::domain::ports::{ShoppingListRepository, StoreError};
use crate::domain::{ShoppingList, ShoppingListItem, UserId};

fn assemble_list(list: ShoppingListRow, items: Vec<ShoppingListItemRow>) -> ShoppingList {
    ShoppingList {
        id: list.id,
        user_id: list.owner(),
        name: list.name,
        items: items.into_iter().map(ShoppingListItem::from).collect(),
    }
}

/// Attach items to their lists, keeping list order.
fn attach_items(lists: Vec<ShoppingListRow>, items: Vec<ShoppingListItemRow>) -> Vec<ShoppingList> {
    let mut items = group_by(items, |item| item.list_id);
    lists
        .into_iter()
        .map(|list| {
            let own = items.remove(&list.id).unwrap_or_default();
            assemble_list(list, own)
        })
        .collect()
}

async fn load_items(
    conn: &mut AsyncPgConnection,
    list_ids: &[i64],
) -> Result<Vec<ShoppingListItemRow>, StoreError> {
    if list_ids.is_empty() {
        return Ok(Vec::new());
    }
    shopping_list_items::table
        .filter(shopping_list_items::list_id.eq_any(list_ids))
        .order_by((
            shopping_list_items::list_id.asc(),
            shopping_list_items::sort_order.asc(),
            shopping_list_items::id.asc(),
        ))
        .select(ShoppingListItemRow::as_select())
        .load(conn)
        .await
        .map_err(map_diesel_error)
}

async fn with_items(
    conn: &mut AsyncPgConnection,
    list: ShoppingListRow,
) -> Result<ShoppingList, StoreError> {
    let items = load_items(conn, &[list.id]).await?;
    Ok(assemble_list(list, items))
}

#[async_trait]
impl ShoppingListRepository for DieselRecipeStore {
    async fn get_shopping_lists_by_user(
        &self,
        user: UserId,
    ) -> Result<Vec<ShoppingList>, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let lists: Vec<ShoppingListRow> = shopping_lists::table
            .filter(shopping_lists::user_id.eq(user.get()))
            .order_by(shopping_lists::id.asc())
            .select(ShoppingListRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let ids: Vec<i64> = lists.iter().map(|list| list.id).collect();
        let items = load_items(&mut conn, &ids).await?;
        Ok(attach_items(lists, items))
    }

    async fn get_shopping_list(&self, id: i64) -> Result<ShoppingList, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let list: ShoppingListRow = shopping_lists::table
            .find(id)
            .select(ShoppingListRow::as_select())
            .first(&mut conn)
            .await
            .map_err(map_diesel_error_for(|| format!("shopping list {id}")))?;
        with_items(&mut conn, list).await
    }

    #[instrument(skip(self))]
    async fn create_shopping_list(
        &self,
        user: UserId,
        name: &str,
    ) -> Result<ShoppingList, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let list: ShoppingListRow = diesel::insert_into(shopping_lists::table)
            .values(&NewShoppingListRow {
                user_id: user.get(),
                name,
            })
            .returning(ShoppingListRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(assemble_list(list, Vec::new()))
    }

    #[instrument(skip(self))]
    async fn update_shopping_list(&self, id: i64, name: &str) -> Result<ShoppingList, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let list: ShoppingListRow = diesel::update(shopping_lists::table.find(id))
            .set(shopping_lists::name.eq(name))
            .returning(ShoppingListRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error_for(|| format!("shopping list {id}")))?;
        with_items(&mut conn, list).await
    }

    #[instrument(skip(self))]
    async fn delete_shopping_list(&self, id: i64) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let affected = diesel::delete(shopping_lists::table.find(id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        require_affected(affected, || format!("shopping list {id}"))
    }

    #[instrument(skip(self, item))]
    async fn create_shopping_list_item(
        &self,
        list_id: i64,
        item: &ShoppingListItem,
    ) -> Result<ShoppingListItem, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: ShoppingListItemRow = diesel::insert_into(shopping_list_items::table)
            .values(&NewShoppingListItemRow::from_item(list_id, item))
            .returning(ShoppingListItemRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(row.into())
    }

    #[instrument(skip(self, item))]
    async fn update_shopping_list_item(
        &self,
        item_id: i64,
        item: &ShoppingListItem,
    ) -> Result<ShoppingListItem, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: ShoppingListItemRow = diesel::update(shopping_list_items::table.find(item_id))
            .set(&ShoppingListItemChanges::from(item))
            .returning(ShoppingListItemRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error_for(|| format!("shopping list item {item_id}")))?;
        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn delete_shopping_list_item(&self, item_id: i64) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let affected = diesel::delete(shopping_list_items::table.find(item_id))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        require_affected(affected, || format!("shopping list item {item_id}"))
    }
}
