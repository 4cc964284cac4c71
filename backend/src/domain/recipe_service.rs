//! Recipe domain service.
//!
//! Business rules that sit between callers and the repository ports:
//! ownership checks, vote values, non-empty names and sort positions.
//! Account rules cover email normalisation and one-time tokens. Each rule
//! set lives in its own `impl` block bounded only by the port it needs,
//! so a store implementing every port serves all of them.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use pagination::{MAX_LIMIT, Page, Paginated, PaginationError, validate_page};
use tracing::debug;

use crate::domain::ports::{
    IngredientRepository, MealPlanRepository, RecipeRepository, ShoppingListRepository,
    StoreError, TagRepository, UnitRepository, UserRepository, VoteRepository,
};
use crate::domain::user::normalise_email;
use crate::domain::{
    Credentials, Error, Ingredient, IngredientDraft, MealPlan, MealPlanEntry, PasswordResetToken,
    Recipe, RecipeDraft, RecipeId, ShoppingList, ShoppingListItem, Tag, Unit, UnitDraft, User,
    UserId, UserRegistration,
};

/// Domain service over a recipe store.
#[derive(Clone)]
pub struct RecipeService<S> {
    store: Arc<S>,
}

impl<S> RecipeService<S> {
    /// Create a service backed by `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    fn map_store_error(error: StoreError) -> Error {
        debug!(error = %error, "store call failed");
        match error {
            StoreError::NotFound { entity } => Error::not_found(format!("{entity} was not found")),
            StoreError::Conflict { message } => Error::conflict(message),
            StoreError::Pagination { message } => Error::pagination(message),
            StoreError::TransactionStart { message } => Error::transaction_start(message),
            StoreError::TransactionCommit { message } => Error::transaction_commit(message),
            StoreError::Connection { message } => {
                Error::unhandled(format!("store unavailable: {message}"))
            }
            StoreError::Query { message } => Error::unhandled(format!("store error: {message}")),
        }
    }

    fn page(cursor: &str, limit: i64) -> Result<Page, Error> {
        validate_page(cursor, limit)
            .map_err(|err: PaginationError| Error::pagination(err.to_string()))
    }

    fn require_name(kind: &str, name: &str) -> Result<(), Error> {
        if name.trim().is_empty() {
            return Err(Error::validation(format!("{kind} name must not be empty")));
        }
        Ok(())
    }
}

impl<S: RecipeRepository> RecipeService<S> {
    /// All recipes ordered by name.
    pub async fn browse_recipes(&self) -> Result<Vec<Recipe>, Error> {
        self.store
            .browse_recipes()
            .await
            .map_err(Self::map_store_error)
    }

    /// One recipe as seen by `viewer`.
    pub async fn get_recipe(&self, viewer: UserId, id: RecipeId) -> Result<Recipe, Error> {
        self.store
            .get_recipe_by_id(viewer, id)
            .await
            .map_err(Self::map_store_error)
    }

    /// Page through the recipes `user` created.
    pub async fn get_recipes_by_user(
        &self,
        user: UserId,
        cursor: &str,
        limit: i64,
    ) -> Result<Paginated<Recipe>, Error> {
        let page = Self::page(cursor, limit)?;
        self.store
            .get_recipes_by_user(user, &page)
            .await
            .map_err(Self::map_store_error)
    }

    /// Create a recipe owned by `draft.created_by`.
    pub async fn create_recipe(&self, draft: &RecipeDraft) -> Result<Recipe, Error> {
        Self::require_name("recipe", &draft.name)?;
        self.store
            .create_recipe(draft)
            .await
            .map_err(Self::map_store_error)
    }

    /// Replace a recipe owned by `user`. Ownership cannot be transferred.
    pub async fn update_recipe(
        &self,
        user: UserId,
        id: RecipeId,
        draft: &RecipeDraft,
    ) -> Result<Recipe, Error> {
        Self::require_name("recipe", &draft.name)?;
        self.ensure_recipe_owner(user, id).await?;
        let draft = RecipeDraft {
            created_by: user,
            ..draft.clone()
        };
        self.store
            .update_recipe(id, &draft)
            .await
            .map_err(Self::map_store_error)
    }

    /// Delete a recipe owned by `user`.
    pub async fn delete_recipe(&self, user: UserId, id: RecipeId) -> Result<(), Error> {
        self.ensure_recipe_owner(user, id).await?;
        self.store
            .delete_recipe(id)
            .await
            .map_err(Self::map_store_error)
    }

    async fn ensure_recipe_owner(&self, user: UserId, id: RecipeId) -> Result<(), Error> {
        let recipe = self.get_recipe(user, id).await?;
        if recipe.created_by != user {
            return Err(Error::authorization(format!(
                "recipe {id} does not belong to user {user}"
            )));
        }
        Ok(())
    }
}

impl<S: VoteRepository> RecipeService<S> {
    /// Cast or replace `user`'s vote; only `1` and `-1` are accepted.
    pub async fn vote(&self, user: UserId, recipe: RecipeId, vote: i16) -> Result<(), Error> {
        if vote != 1 && vote != -1 {
            return Err(Error::validation("vote must be 1 or -1"));
        }
        self.store
            .add_vote(recipe, user, vote)
            .await
            .map_err(Self::map_store_error)
    }

    /// Withdraw `user`'s vote.
    pub async fn remove_vote(&self, user: UserId, recipe: RecipeId) -> Result<(), Error> {
        self.store
            .remove_vote(recipe, user)
            .await
            .map_err(Self::map_store_error)
    }

    /// Sum of votes on a recipe.
    pub async fn recipe_votes(&self, recipe: RecipeId) -> Result<i64, Error> {
        self.store
            .get_recipe_votes(recipe)
            .await
            .map_err(Self::map_store_error)
    }

    /// `user`'s own vote, zero when absent.
    pub async fn user_vote(&self, user: UserId, recipe: RecipeId) -> Result<i16, Error> {
        self.store
            .get_user_vote(recipe, user)
            .await
            .map_err(Self::map_store_error)
    }
}

impl<S: MealPlanRepository> RecipeService<S> {
    /// Page through `user`'s planned days in `from..=until`.
    pub async fn get_meal_plan(
        &self,
        user: UserId,
        from: NaiveDate,
        until: NaiveDate,
        cursor: &str,
        limit: i64,
    ) -> Result<Paginated<MealPlan>, Error> {
        if until < from {
            return Err(Error::validation("meal plan range ends before it starts"));
        }
        let page = Self::page(cursor, limit)?;
        self.store
            .get_meal_plan(user, from, until, &page)
            .await
            .map_err(Self::map_store_error)
    }

    /// Plan `recipe` on `date`, after the recipes already planned that day.
    ///
    /// Planning a recipe that is already on the day leaves the plan as it
    /// is and returns the stored entry.
    pub async fn add_to_meal_plan(
        &self,
        user: UserId,
        recipe: RecipeId,
        date: NaiveDate,
    ) -> Result<MealPlanEntry, Error> {
        let whole_day = Page::first(i64::try_from(MAX_LIMIT).unwrap_or(i64::MAX));
        let day = self
            .store
            .get_meal_plan(user, date, date, &whole_day)
            .await
            .map_err(Self::map_store_error)?;
        let planned = day.data.first().map_or(0, |plan| plan.recipes.len());
        let entry = MealPlanEntry {
            user_id: user,
            recipe_id: recipe,
            date,
            sort_order: i32::try_from(planned).unwrap_or(i32::MAX),
        };
        self.store
            .create_meal_plan_entry(entry)
            .await
            .map_err(Self::map_store_error)
    }

    /// Remove `recipe` from `user`'s plan for `date`.
    pub async fn remove_from_meal_plan(
        &self,
        user: UserId,
        recipe: RecipeId,
        date: NaiveDate,
    ) -> Result<(), Error> {
        self.store
            .delete_meal_plan_entry(user, recipe, date)
            .await
            .map_err(Self::map_store_error)
    }
}

impl<S: IngredientRepository> RecipeService<S> {
    /// Page through ingredients.
    pub async fn get_ingredients(
        &self,
        cursor: &str,
        limit: i64,
    ) -> Result<Paginated<Ingredient>, Error> {
        let page = Self::page(cursor, limit)?;
        self.store
            .get_ingredients(&page)
            .await
            .map_err(Self::map_store_error)
    }

    /// Create an ingredient.
    pub async fn create_ingredient(&self, draft: &IngredientDraft) -> Result<Ingredient, Error> {
        Self::require_name("ingredient", &draft.name)?;
        self.store
            .create_ingredient(draft)
            .await
            .map_err(Self::map_store_error)
    }

    /// Replace an ingredient.
    pub async fn update_ingredient(
        &self,
        id: i64,
        draft: &IngredientDraft,
    ) -> Result<Ingredient, Error> {
        Self::require_name("ingredient", &draft.name)?;
        self.store
            .update_ingredient(id, draft)
            .await
            .map_err(Self::map_store_error)
    }

    /// Delete an ingredient.
    pub async fn delete_ingredient(&self, id: i64) -> Result<(), Error> {
        self.store
            .delete_ingredient(id)
            .await
            .map_err(Self::map_store_error)
    }
}

impl<S: UnitRepository> RecipeService<S> {
    /// Page through units.
    pub async fn get_units(&self, cursor: &str, limit: i64) -> Result<Paginated<Unit>, Error> {
        let page = Self::page(cursor, limit)?;
        self.store
            .get_units(&page)
            .await
            .map_err(Self::map_store_error)
    }

    /// Create a unit.
    pub async fn create_unit(&self, draft: &UnitDraft) -> Result<Unit, Error> {
        Self::require_name("unit", &draft.name)?;
        self.store
            .create_unit(draft)
            .await
            .map_err(Self::map_store_error)
    }

    /// Replace a unit.
    pub async fn update_unit(&self, id: i64, draft: &UnitDraft) -> Result<Unit, Error> {
        Self::require_name("unit", &draft.name)?;
        self.store
            .update_unit(id, draft)
            .await
            .map_err(Self::map_store_error)
    }

    /// Delete a unit.
    pub async fn delete_unit(&self, id: i64) -> Result<(), Error> {
        self.store
            .delete_unit(id)
            .await
            .map_err(Self::map_store_error)
    }
}

impl<S: TagRepository> RecipeService<S> {
    /// Page through tags.
    pub async fn get_tags(&self, cursor: &str, limit: i64) -> Result<Paginated<Tag>, Error> {
        let page = Self::page(cursor, limit)?;
        self.store
            .get_tags(&page)
            .await
            .map_err(Self::map_store_error)
    }
}

impl<S: ShoppingListRepository> RecipeService<S> {
    /// All shopping lists of `user`.
    pub async fn get_shopping_lists(&self, user: UserId) -> Result<Vec<ShoppingList>, Error> {
        self.store
            .get_shopping_lists_by_user(user)
            .await
            .map_err(Self::map_store_error)
    }

    /// One of `user`'s shopping lists.
    pub async fn get_shopping_list(&self, user: UserId, id: i64) -> Result<ShoppingList, Error> {
        let list = self
            .store
            .get_shopping_list(id)
            .await
            .map_err(Self::map_store_error)?;
        if list.user_id != user {
            return Err(Error::authorization(format!(
                "shopping list {id} does not belong to user {user}"
            )));
        }
        Ok(list)
    }

    /// Create an empty list for `user`.
    pub async fn create_shopping_list(
        &self,
        user: UserId,
        name: &str,
    ) -> Result<ShoppingList, Error> {
        Self::require_name("shopping list", name)?;
        self.store
            .create_shopping_list(user, name.trim())
            .await
            .map_err(Self::map_store_error)
    }

    /// Rename one of `user`'s lists.
    pub async fn rename_shopping_list(
        &self,
        user: UserId,
        id: i64,
        name: &str,
    ) -> Result<ShoppingList, Error> {
        Self::require_name("shopping list", name)?;
        self.get_shopping_list(user, id).await?;
        self.store
            .update_shopping_list(id, name.trim())
            .await
            .map_err(Self::map_store_error)
    }

    /// Delete one of `user`'s lists.
    pub async fn delete_shopping_list(&self, user: UserId, id: i64) -> Result<(), Error> {
        self.get_shopping_list(user, id).await?;
        self.store
            .delete_shopping_list(id)
            .await
            .map_err(Self::map_store_error)
    }

    /// Append an item at the end of one of `user`'s lists.
    pub async fn add_shopping_list_item(
        &self,
        user: UserId,
        list_id: i64,
        item: &ShoppingListItem,
    ) -> Result<ShoppingListItem, Error> {
        Self::require_name("shopping list item", &item.ingredient)?;
        let list = self.get_shopping_list(user, list_id).await?;
        let item = ShoppingListItem {
            sort_order: list.next_sort_order(),
            ..item.clone()
        };
        self.store
            .create_shopping_list_item(list_id, &item)
            .await
            .map_err(Self::map_store_error)
    }

    /// Replace an item on one of `user`'s lists.
    pub async fn update_shopping_list_item(
        &self,
        user: UserId,
        list_id: i64,
        item_id: i64,
        item: &ShoppingListItem,
    ) -> Result<ShoppingListItem, Error> {
        Self::require_name("shopping list item", &item.ingredient)?;
        let list = self.get_shopping_list(user, list_id).await?;
        Self::ensure_item_on_list(&list, item_id)?;
        self.store
            .update_shopping_list_item(item_id, item)
            .await
            .map_err(Self::map_store_error)
    }

    /// Remove an item from one of `user`'s lists.
    pub async fn remove_shopping_list_item(
        &self,
        user: UserId,
        list_id: i64,
        item_id: i64,
    ) -> Result<(), Error> {
        let list = self.get_shopping_list(user, list_id).await?;
        Self::ensure_item_on_list(&list, item_id)?;
        self.store
            .delete_shopping_list_item(item_id)
            .await
            .map_err(Self::map_store_error)
    }

    fn ensure_item_on_list(list: &ShoppingList, item_id: i64) -> Result<(), Error> {
        if list.items.iter().any(|item| item.id == item_id) {
            Ok(())
        } else {
            Err(Error::not_found(format!(
                "shopping list item {item_id} was not found on list {}",
                list.id
            )))
        }
    }
}

impl<S: UserRepository> RecipeService<S> {
    /// Create an unconfirmed account and its registration token.
    ///
    /// The email is trimmed and lowercased first; an email that already has
    /// an account is a conflict.
    pub async fn register_user(
        &self,
        credentials: &Credentials,
    ) -> Result<UserRegistration, Error> {
        let credentials = credentials.normalised();
        Self::require_email(&credentials.email)?;
        Self::require_password_hash(&credentials.password_hash)?;
        match self.store.get_user_by_email(&credentials.email).await {
            Ok(_) => {
                return Err(Error::conflict(format!(
                    "an account for {} already exists",
                    credentials.email
                )));
            }
            Err(StoreError::NotFound { .. }) => {}
            Err(other) => return Err(Self::map_store_error(other)),
        }
        self.store
            .register_user(&credentials)
            .await
            .map_err(Self::map_store_error)
    }

    /// Redeem a registration token and return the confirmed account.
    pub async fn confirm_user_by_token(&self, token: &str) -> Result<User, Error> {
        Self::require_token(token)?;
        self.store
            .confirm_user_by_token(token)
            .await
            .map_err(Self::map_store_error)
    }

    /// Issue a password reset for the account behind `email`.
    ///
    /// Returns `None` when a reset is already outstanding, so repeated
    /// requests do not rotate a token the user may already hold.
    pub async fn request_password_reset(
        &self,
        email: &str,
    ) -> Result<Option<PasswordResetToken>, Error> {
        let user = self.get_user_by_email(email).await?;
        match self.store.get_password_reset_token_by_user(&user).await {
            Ok(_) => Ok(None),
            Err(StoreError::NotFound { .. }) => self
                .store
                .create_password_reset_token(&user)
                .await
                .map(Some)
                .map_err(Self::map_store_error),
            Err(other) => Err(Self::map_store_error(other)),
        }
    }

    /// Redeem a password reset token with a new password hash.
    pub async fn update_password_by_token(
        &self,
        token: &str,
        password_hash: &str,
    ) -> Result<(), Error> {
        Self::require_token(token)?;
        Self::require_password_hash(password_hash)?;
        self.store
            .update_password_by_token(token, password_hash)
            .await
            .map_err(Self::map_store_error)
    }

    /// One account by id.
    pub async fn get_user(&self, id: UserId) -> Result<User, Error> {
        self.store
            .get_user_by_id(id)
            .await
            .map_err(Self::map_store_error)
    }

    /// One account by email, ignoring case and surrounding whitespace.
    pub async fn get_user_by_email(&self, email: &str) -> Result<User, Error> {
        let email = normalise_email(email);
        Self::require_email(&email)?;
        self.store
            .get_user_by_email(&email)
            .await
            .map_err(Self::map_store_error)
    }

    /// Change an account's email or confirmation flag.
    pub async fn update_user(&self, user: &User) -> Result<(), Error> {
        let user = User {
            email: normalise_email(&user.email),
            ..user.clone()
        };
        Self::require_email(&user.email)?;
        self.store
            .update_user(&user)
            .await
            .map_err(Self::map_store_error)
    }

    /// Drop registrations and password resets issued before `before`.
    ///
    /// Returns the number of registrations and resets removed.
    pub async fn expire_tokens(&self, before: DateTime<Utc>) -> Result<(usize, usize), Error> {
        let registrations = self
            .store
            .delete_registrations_before(before)
            .await
            .map_err(Self::map_store_error)?;
        let resets = self
            .store
            .delete_password_resets_before(before)
            .await
            .map_err(Self::map_store_error)?;
        debug!(registrations, resets, "expired tokens removed");
        Ok((registrations, resets))
    }

    fn require_email(email: &str) -> Result<(), Error> {
        if email.is_empty() || !email.contains('@') {
            return Err(Error::validation("email must be an address"));
        }
        Ok(())
    }

    fn require_password_hash(password_hash: &str) -> Result<(), Error> {
        if password_hash.is_empty() {
            return Err(Error::validation("password hash must not be empty"));
        }
        Ok(())
    }

    fn require_token(token: &str) -> Result<(), Error> {
        if token.trim().is_empty() {
            return Err(Error::validation("token must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "recipe_service_tests.rs"]
mod tests;
