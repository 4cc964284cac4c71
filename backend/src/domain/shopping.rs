//! Shopping lists owned by a single user.

use serde::{Deserialize, Serialize};

use super::user::UserId;

/// Entry on a shopping list.
///
/// Items are free text rather than ingredient references so users can jot
/// down anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListItem {
    /// Item id; ignored on create.
    pub id: i64,
    /// What to buy.
    pub ingredient: String,
    /// Optional quantity, kept as text ("2", "a handful").
    pub quantity: Option<String>,
    /// Optional unit label.
    pub unit: Option<String>,
    /// Whether the item has been ticked off.
    pub done: bool,
    /// Position on the list.
    pub sort_order: i32,
}

/// A named shopping list and its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingList {
    /// List id.
    pub id: i64,
    /// Owner.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Items ordered by `sort_order`.
    pub items: Vec<ShoppingListItem>,
}

impl ShoppingList {
    /// Sort position for an item appended to this list.
    ///
    /// # Examples
    /// ```
    /// use recipe_manager::domain::{ShoppingList, UserId};
    ///
    /// let list = ShoppingList { id: 1, user_id: UserId::new(1), name: "Market".into(), items: vec![] };
    /// assert_eq!(list.next_sort_order(), 0);
    /// ```
    pub fn next_sort_order(&self) -> i32 {
        self.items
            .iter()
            .map(|item| item.sort_order)
            .max()
            .map_or(0, |max| max.saturating_add(1))
    }
}
