//! Driven port for shopping lists.

use async_trait::async_trait;

use super::StoreError;
use crate::domain::{ShoppingList, ShoppingListItem, UserId};

/// Persistence contract for shopping lists and their items.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShoppingListRepository: Send + Sync {
    /// All lists owned by `user`, items included.
    async fn get_shopping_lists_by_user(
        &self,
        user: UserId,
    ) -> Result<Vec<ShoppingList>, StoreError>;

    /// One list with its items.
    async fn get_shopping_list(&self, id: i64) -> Result<ShoppingList, StoreError>;

    /// Create an empty list.
    async fn create_shopping_list(
        &self,
        user: UserId,
        name: &str,
    ) -> Result<ShoppingList, StoreError>;

    /// Rename a list.
    async fn update_shopping_list(&self, id: i64, name: &str) -> Result<ShoppingList, StoreError>;

    /// Delete a list and its items.
    async fn delete_shopping_list(&self, id: i64) -> Result<(), StoreError>;

    /// Append an item to a list.
    async fn create_shopping_list_item(
        &self,
        list_id: i64,
        item: &ShoppingListItem,
    ) -> Result<ShoppingListItem, StoreError>;

    /// Replace an item's text, quantity, unit and done flag.
    async fn update_shopping_list_item(
        &self,
        item_id: i64,
        item: &ShoppingListItem,
    ) -> Result<ShoppingListItem, StoreError>;

    /// Delete one item.
    async fn delete_shopping_list_item(&self, item_id: i64) -> Result<(), StoreError>;
}
