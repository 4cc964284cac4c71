//! Tests for the recipe domain service.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone as _};
use mockall::predicate::eq;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    MockIngredientRepository, MockMealPlanRepository, MockRecipeRepository,
    MockShoppingListRepository, MockUnitRepository, MockUserRepository, MockVoteRepository,
};
use crate::domain::{ErrorCode, RecipeVotes};

fn service<S>(store: S) -> RecipeService<S> {
    RecipeService::new(Arc::new(store))
}

fn recipe_owned_by(id: i64, owner: i64) -> Recipe {
    Recipe {
        id: RecipeId::new(id),
        name: "Shakshuka".into(),
        description: "Eggs poached in spiced tomato".into(),
        servings: 2,
        minutes: 30,
        created_by: UserId::new(owner),
        tags: Vec::new(),
        images: Vec::new(),
        steps: Vec::new(),
        votes: RecipeVotes::default(),
    }
}

#[fixture]
fn draft() -> RecipeDraft {
    RecipeDraft {
        name: "Shakshuka".into(),
        description: "Eggs poached in spiced tomato".into(),
        servings: 2,
        minutes: 30,
        created_by: UserId::new(1),
        tags: vec!["breakfast".into()],
        images: Vec::new(),
        steps: Vec::new(),
    }
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 14).expect("valid date")
}

fn list_with_items(owner: i64, sort_orders: &[i32]) -> ShoppingList {
    ShoppingList {
        id: 5,
        user_id: UserId::new(owner),
        name: "Market".into(),
        items: sort_orders
            .iter()
            .zip(1_i64..)
            .map(|(sort_order, id)| ShoppingListItem {
                id,
                ingredient: format!("item {id}"),
                quantity: None,
                unit: None,
                done: false,
                sort_order: *sort_order,
            })
            .collect(),
    }
}

fn item(text: &str) -> ShoppingListItem {
    ShoppingListItem {
        id: 0,
        ingredient: text.into(),
        quantity: Some("2".into()),
        unit: None,
        done: false,
        sort_order: 0,
    }
}

#[rstest]
#[case(0)]
#[case(2)]
#[case(-2)]
#[tokio::test]
async fn vote_rejects_values_other_than_plus_or_minus_one(#[case] value: i16) {
    let mut store = MockVoteRepository::new();
    store.expect_add_vote().never();

    let error = service(store)
        .vote(UserId::new(1), RecipeId::new(2), value)
        .await
        .expect_err("invalid vote");
    assert_eq!(error.code(), ErrorCode::Validation);
}

#[rstest]
#[case(1)]
#[case(-1)]
#[tokio::test]
async fn vote_forwards_valid_values(#[case] value: i16) {
    let mut store = MockVoteRepository::new();
    store
        .expect_add_vote()
        .with(eq(RecipeId::new(2)), eq(UserId::new(1)), eq(value))
        .times(1)
        .return_once(|_, _, _| Ok(()));

    service(store)
        .vote(UserId::new(1), RecipeId::new(2), value)
        .await
        .expect("vote accepted");
}

#[rstest]
#[case("")]
#[case("   ")]
#[tokio::test]
async fn create_recipe_requires_a_name(mut draft: RecipeDraft, #[case] name: &str) {
    draft.name = name.into();
    let mut store = MockRecipeRepository::new();
    store.expect_create_recipe().never();

    let error = service(store)
        .create_recipe(&draft)
        .await
        .expect_err("empty name");
    assert_eq!(error.code(), ErrorCode::Validation);
}

#[rstest]
#[tokio::test]
async fn update_recipe_rejects_non_owner(draft: RecipeDraft) {
    let mut store = MockRecipeRepository::new();
    store
        .expect_get_recipe_by_id()
        .times(1)
        .return_once(|_, id| Ok(recipe_owned_by(id.get(), 99)));
    store.expect_update_recipe().never();

    let error = service(store)
        .update_recipe(UserId::new(1), RecipeId::new(7), &draft)
        .await
        .expect_err("not the owner");
    assert_eq!(error.code(), ErrorCode::Authorization);
}

#[rstest]
#[tokio::test]
async fn update_recipe_keeps_the_owner(mut draft: RecipeDraft) {
    draft.created_by = UserId::new(42);
    let mut store = MockRecipeRepository::new();
    store
        .expect_get_recipe_by_id()
        .times(1)
        .return_once(|_, id| Ok(recipe_owned_by(id.get(), 1)));
    store
        .expect_update_recipe()
        .withf(|id, draft| id.get() == 7 && draft.created_by == UserId::new(1))
        .times(1)
        .return_once(|id, _| Ok(recipe_owned_by(id.get(), 1)));

    let recipe = service(store)
        .update_recipe(UserId::new(1), RecipeId::new(7), &draft)
        .await
        .expect("owner may update");
    assert_eq!(recipe.created_by, UserId::new(1));
}

#[rstest]
#[tokio::test]
async fn delete_recipe_maps_missing_recipe_to_not_found() {
    let mut store = MockRecipeRepository::new();
    store
        .expect_get_recipe_by_id()
        .times(1)
        .return_once(|_, _| Err(StoreError::not_found("recipe 7")));
    store.expect_delete_recipe().never();

    let error = service(store)
        .delete_recipe(UserId::new(1), RecipeId::new(7))
        .await
        .expect_err("missing recipe");
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn malformed_cursor_is_rejected_before_the_store_is_called() {
    let mut store = MockRecipeRepository::new();
    store.expect_get_recipes_by_user().never();

    let error = service(store)
        .get_recipes_by_user(UserId::new(1), "%%%", 10)
        .await
        .expect_err("malformed cursor");
    assert_eq!(error.code(), ErrorCode::Pagination);
}

#[rstest]
#[case(StoreError::connection("pool exhausted"), ErrorCode::Unhandled)]
#[case(StoreError::query("syntax"), ErrorCode::Unhandled)]
#[case(StoreError::pagination("foreign cursor"), ErrorCode::Pagination)]
#[case(StoreError::conflict("users_email_key"), ErrorCode::Conflict)]
#[case(StoreError::transaction_start("refused"), ErrorCode::TransactionStart)]
#[case(StoreError::transaction_commit("serialization failure"), ErrorCode::TransactionCommit)]
#[tokio::test]
async fn store_errors_map_to_stable_codes(#[case] failure: StoreError, #[case] code: ErrorCode) {
    let mut store = MockRecipeRepository::new();
    store
        .expect_browse_recipes()
        .times(1)
        .return_once(move || Err(failure));

    let error = service(store)
        .browse_recipes()
        .await
        .expect_err("store failure");
    assert_eq!(error.code(), code);
}

#[rstest]
#[tokio::test]
async fn add_to_meal_plan_appends_after_existing_recipes() {
    let mut store = MockMealPlanRepository::new();
    store.expect_get_meal_plan().times(1).return_once(|_, _, _, _| {
        Ok(Paginated {
            data: vec![MealPlan {
                date: day(),
                recipes: vec![recipe_owned_by(1, 1), recipe_owned_by(2, 1)],
            }],
            next_cursor: None,
            has_more: false,
        })
    });
    store
        .expect_create_meal_plan_entry()
        .withf(|entry| entry.sort_order == 2 && entry.recipe_id == RecipeId::new(3))
        .times(1)
        .return_once(Ok);

    let entry = service(store)
        .add_to_meal_plan(UserId::new(1), RecipeId::new(3), day())
        .await
        .expect("entry created");
    assert_eq!(entry.sort_order, 2);
}

#[rstest]
#[tokio::test]
async fn add_to_meal_plan_starts_an_empty_day_at_zero() {
    let mut store = MockMealPlanRepository::new();
    store
        .expect_get_meal_plan()
        .times(1)
        .return_once(|_, _, _, _| Ok(Paginated::empty()));
    store
        .expect_create_meal_plan_entry()
        .withf(|entry| entry.sort_order == 0)
        .times(1)
        .return_once(Ok);

    service(store)
        .add_to_meal_plan(UserId::new(1), RecipeId::new(3), day())
        .await
        .expect("entry created");
}

#[rstest]
#[tokio::test]
async fn replanning_a_recipe_reports_its_stored_position() {
    let mut store = MockMealPlanRepository::new();
    store.expect_get_meal_plan().times(1).return_once(|_, _, _, _| {
        Ok(Paginated {
            data: vec![MealPlan {
                date: day(),
                recipes: vec![recipe_owned_by(3, 1), recipe_owned_by(4, 1)],
            }],
            next_cursor: None,
            has_more: false,
        })
    });
    store
        .expect_create_meal_plan_entry()
        .withf(|entry| entry.sort_order == 2)
        .times(1)
        .return_once(|entry| {
            Ok(MealPlanEntry {
                sort_order: 0,
                ..entry
            })
        });

    let entry = service(store)
        .add_to_meal_plan(UserId::new(1), RecipeId::new(3), day())
        .await
        .expect("already planned");
    assert_eq!(entry.sort_order, 0);
}

#[rstest]
#[tokio::test]
async fn meal_plan_rejects_inverted_ranges() {
    let mut store = MockMealPlanRepository::new();
    store.expect_get_meal_plan().never();

    let until = NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date");
    let error = service(store)
        .get_meal_plan(UserId::new(1), day(), until, "", 10)
        .await
        .expect_err("inverted range");
    assert_eq!(error.code(), ErrorCode::Validation);
}

#[rstest]
#[tokio::test]
async fn ingredient_names_must_not_be_blank() {
    let mut store = MockIngredientRepository::new();
    store.expect_create_ingredient().never();

    let draft = IngredientDraft {
        name: " ".into(),
        nutrients: Vec::new(),
    };
    let error = service(store)
        .create_ingredient(&draft)
        .await
        .expect_err("blank name");
    assert_eq!(error.code(), ErrorCode::Validation);
}

#[rstest]
#[tokio::test]
async fn unit_updates_are_forwarded() {
    let mut store = MockUnitRepository::new();
    store
        .expect_update_unit()
        .with(eq(4), mockall::predicate::always())
        .times(1)
        .return_once(|id, draft| {
            Ok(Unit {
                id,
                name: draft.name.clone(),
                symbol: draft.symbol.clone(),
            })
        });

    let draft = UnitDraft {
        name: "tablespoon".into(),
        symbol: Some("tbsp".into()),
    };
    let unit = service(store)
        .update_unit(4, &draft)
        .await
        .expect("unit updated");
    assert_eq!(unit.symbol.as_deref(), Some("tbsp"));
}

#[rstest]
#[tokio::test]
async fn shopping_list_of_another_user_is_forbidden() {
    let mut store = MockShoppingListRepository::new();
    store
        .expect_get_shopping_list()
        .times(1)
        .return_once(|_| Ok(list_with_items(99, &[])));

    let error = service(store)
        .get_shopping_list(UserId::new(1), 5)
        .await
        .expect_err("foreign list");
    assert_eq!(error.code(), ErrorCode::Authorization);
}

#[rstest]
#[case(&[], 0)]
#[case(&[0, 1, 2], 3)]
#[case(&[4, 1], 5)]
#[tokio::test]
async fn new_items_are_appended_after_the_highest_sort_order(
    #[case] existing: &'static [i32],
    #[case] expected: i32,
) {
    let mut store = MockShoppingListRepository::new();
    store
        .expect_get_shopping_list()
        .times(1)
        .return_once(move |_| Ok(list_with_items(1, existing)));
    store
        .expect_create_shopping_list_item()
        .withf(move |list_id, item| *list_id == 5 && item.sort_order == expected)
        .times(1)
        .return_once(|_, item| Ok(item.clone()));

    let created = service(store)
        .add_shopping_list_item(UserId::new(1), 5, &item("eggs"))
        .await
        .expect("item created");
    assert_eq!(created.sort_order, expected);
}

#[rstest]
#[tokio::test]
async fn items_must_belong_to_the_addressed_list() {
    let mut store = MockShoppingListRepository::new();
    store
        .expect_get_shopping_list()
        .times(1)
        .return_once(|_| Ok(list_with_items(1, &[0])));
    store.expect_delete_shopping_list_item().never();

    let error = service(store)
        .remove_shopping_list_item(UserId::new(1), 5, 77)
        .await
        .expect_err("item on another list");
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn shopping_list_names_are_trimmed() {
    let mut store = MockShoppingListRepository::new();
    store
        .expect_create_shopping_list()
        .withf(|user, name| *user == UserId::new(1) && name == "Market")
        .times(1)
        .return_once(|user, name| {
            Ok(ShoppingList {
                id: 1,
                user_id: user,
                name: name.to_owned(),
                items: Vec::new(),
            })
        });

    let list = service(store)
        .create_shopping_list(UserId::new(1), "  Market ")
        .await
        .expect("list created");
    assert_eq!(list.name, "Market");
}

fn account(id: i64, email: &str) -> User {
    User {
        id: UserId::new(id),
        email: email.into(),
        password_hash: "hash".into(),
        confirmed: false,
    }
}

fn issued() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 14, 9, 0, 0)
        .single()
        .expect("valid instant")
}

fn credentials(email: &str) -> Credentials {
    Credentials {
        email: email.into(),
        password_hash: "hash".into(),
    }
}

#[rstest]
#[tokio::test]
async fn register_user_normalises_the_email_before_storing() {
    let mut store = MockUserRepository::new();
    store
        .expect_get_user_by_email()
        .withf(|email| email == "ada@example.org")
        .times(1)
        .return_once(|_| Err(StoreError::not_found("user")));
    store
        .expect_register_user()
        .withf(|creds| creds.email == "ada@example.org")
        .times(1)
        .return_once(|creds| {
            Ok(UserRegistration {
                user: account(3, &creds.email),
                token: "abc".into(),
                created_at: issued(),
            })
        });

    let registration = service(store)
        .register_user(&credentials("  Ada@Example.ORG "))
        .await
        .expect("registered");
    assert_eq!(registration.user.email, "ada@example.org");
}

#[rstest]
#[tokio::test]
async fn register_user_rejects_a_taken_email() {
    let mut store = MockUserRepository::new();
    store
        .expect_get_user_by_email()
        .times(1)
        .return_once(|email| Ok(account(1, email)));
    store.expect_register_user().never();

    let error = service(store)
        .register_user(&credentials("ada@example.org"))
        .await
        .expect_err("email taken");
    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[case(credentials("not-an-address"))]
#[case(credentials("   "))]
#[case(Credentials {
    email: "ada@example.org".into(),
    password_hash: String::new(),
})]
#[tokio::test]
async fn register_user_validates_credentials(#[case] creds: Credentials) {
    let mut store = MockUserRepository::new();
    store.expect_get_user_by_email().never();
    store.expect_register_user().never();

    let error = service(store)
        .register_user(&creds)
        .await
        .expect_err("invalid credentials");
    assert_eq!(error.code(), ErrorCode::Validation);
}

#[rstest]
#[tokio::test]
async fn confirming_an_unknown_token_is_not_found() {
    let mut store = MockUserRepository::new();
    store
        .expect_confirm_user_by_token()
        .withf(|token| token == "stale")
        .times(1)
        .return_once(|_| Err(StoreError::not_found("registration")));

    let error = service(store)
        .confirm_user_by_token("stale")
        .await
        .expect_err("unknown token");
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn password_reset_requests_keep_an_outstanding_token() {
    let mut store = MockUserRepository::new();
    store
        .expect_get_user_by_email()
        .times(1)
        .return_once(|email| Ok(account(4, email)));
    store
        .expect_get_password_reset_token_by_user()
        .times(1)
        .return_once(|user| {
            Ok(PasswordResetToken {
                user: user.clone(),
                token: "outstanding".into(),
                created_at: issued(),
            })
        });
    store.expect_create_password_reset_token().never();

    let reset = service(store)
        .request_password_reset("ada@example.org")
        .await
        .expect("request accepted");
    assert_eq!(reset, None);
}

#[rstest]
#[tokio::test]
async fn password_reset_requests_issue_a_token_when_none_is_outstanding() {
    let mut store = MockUserRepository::new();
    store
        .expect_get_user_by_email()
        .times(1)
        .return_once(|email| Ok(account(4, email)));
    store
        .expect_get_password_reset_token_by_user()
        .times(1)
        .return_once(|user| {
            Err(StoreError::not_found(format!(
                "password reset of user {}",
                user.id
            )))
        });
    store
        .expect_create_password_reset_token()
        .times(1)
        .return_once(|user| {
            Ok(PasswordResetToken {
                user: user.clone(),
                token: "fresh".into(),
                created_at: issued(),
            })
        });

    let reset = service(store)
        .request_password_reset("ada@example.org")
        .await
        .expect("request accepted")
        .expect("token issued");
    assert_eq!(reset.token, "fresh");
    assert_eq!(reset.user.id, UserId::new(4));
}

#[rstest]
#[case("", "hash")]
#[case("token", "")]
#[tokio::test]
async fn password_updates_need_a_token_and_a_hash(#[case] token: &str, #[case] hash: &str) {
    let mut store = MockUserRepository::new();
    store.expect_update_password_by_token().never();

    let error = service(store)
        .update_password_by_token(token, hash)
        .await
        .expect_err("incomplete request");
    assert_eq!(error.code(), ErrorCode::Validation);
}

#[rstest]
#[tokio::test]
async fn expiring_tokens_reports_both_counts() {
    let mut store = MockUserRepository::new();
    store
        .expect_delete_registrations_before()
        .with(eq(issued()))
        .times(1)
        .return_once(|_| Ok(2));
    store
        .expect_delete_password_resets_before()
        .with(eq(issued()))
        .times(1)
        .return_once(|_| Ok(5));

    let counts = service(store)
        .expire_tokens(issued())
        .await
        .expect("tokens expired");
    assert_eq!(counts, (2, 5));
}
