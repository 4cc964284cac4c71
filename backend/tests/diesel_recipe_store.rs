//! Integration tests for the recipe aggregate in `DieselRecipeStore`.
//!
//! Each test runs against its own migrated database. Seeding uses a
//! blocking client outside the runtime; store calls run inside
//! `TestStore::block_on`.

use std::collections::HashSet;
use std::time::Duration;

use diesel::sql_types::BigInt;
use diesel_async::RunQueryDsl;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use pagination::Page;
use recipe_manager::domain::ports::{
    IngredientRepository, RecipeRepository, StoreError, UnitRepository, VoteRepository,
};
use recipe_manager::outbound::persistence::with_transaction;
use recipe_manager::domain::{
    IngredientDraft, RecipeDraft, RecipeId, RecipeVotes, StepDraft, StepIngredientDraft, UnitDraft,
    UserId,
};
use rstest::{fixture, rstest};
use url::Url;

mod support;

use support::{TestStore, test_store};

/// Ids of the reference rows every recipe in these tests draws on.
struct Pantry {
    cook: UserId,
    gram: i64,
    flour: i64,
    water: i64,
    salt: i64,
}

fn stock_pantry(ts: &TestStore) -> Pantry {
    let cook = ts.seed_user("ada");
    ts.block_on(async {
        let gram = ts
            .store
            .create_unit(&UnitDraft {
                name: "gram".to_owned(),
                symbol: Some("g".to_owned()),
            })
            .await
            .expect("unit created")
            .id;
        let ingredient = |name: &'static str| {
            let store = ts.store.clone();
            async move {
                store
                    .create_ingredient(&IngredientDraft {
                        name: name.to_owned(),
                        nutrients: Vec::new(),
                    })
                    .await
                    .expect("ingredient created")
                    .id
            }
        };
        Pantry {
            cook,
            gram,
            flour: ingredient("flour").await,
            water: ingredient("water").await,
            salt: ingredient("salt").await,
        }
    })
}

fn line(ingredient_id: i64, unit_id: i64, amount: f64) -> StepIngredientDraft {
    StepIngredientDraft {
        ingredient_id,
        unit_id,
        amount,
    }
}

fn bread(pantry: &Pantry) -> RecipeDraft {
    RecipeDraft {
        name: "Bread".to_owned(),
        description: "A plain loaf".to_owned(),
        servings: 8,
        minutes: 240,
        created_by: pantry.cook,
        tags: vec!["baking".to_owned(), "vegan".to_owned()],
        images: vec![Url::parse("https://img.example/bread.jpg").expect("valid url")],
        steps: vec![
            StepDraft {
                instructions: "Mix flour and water".to_owned(),
                ingredients: vec![
                    line(pantry.flour, pantry.gram, 500.0),
                    line(pantry.water, pantry.gram, 350.0),
                ],
            },
            StepDraft {
                instructions: "Season and bake".to_owned(),
                ingredients: vec![line(pantry.salt, pantry.gram, 10.0)],
            },
        ],
    }
}

fn named(pantry: &Pantry, name: &str) -> RecipeDraft {
    RecipeDraft {
        name: name.to_owned(),
        tags: Vec::new(),
        images: Vec::new(),
        steps: Vec::new(),
        ..bread(pantry)
    }
}

#[fixture]
fn store() -> Option<TestStore> {
    test_store()
}

#[rstest]
fn created_recipes_come_back_with_every_relation(store: Option<TestStore>) {
    let Some(ts) = store else { return };
    let pantry = stock_pantry(&ts);

    let created = ts
        .block_on(ts.store.create_recipe(&bread(&pantry)))
        .expect("recipe created");

    assert_eq!(created.name, "Bread");
    assert_eq!(created.created_by, pantry.cook);
    let tags: Vec<&str> = created.tags.iter().map(|tag| tag.name.as_str()).collect();
    assert_eq!(tags, vec!["baking", "vegan"]);
    assert_eq!(created.images.len(), 1);
    assert_eq!(created.steps.len(), 2);
    assert_eq!(created.steps[0].instructions, "Mix flour and water");
    let first_step: Vec<&str> = created.steps[0]
        .ingredients
        .iter()
        .map(|item| item.ingredient.name.as_str())
        .collect();
    assert_eq!(first_step, vec!["flour", "water"]);
    assert_eq!(created.steps[1].ingredients[0].unit.symbol.as_deref(), Some("g"));
    assert_eq!(created.votes, RecipeVotes::default());

    let read = ts
        .block_on(ts.store.get_recipe_by_id(pantry.cook, created.id))
        .expect("recipe readable");
    assert_eq!(read, created);
}

#[rstest]
fn updates_replace_children_wholesale(store: Option<TestStore>) {
    let Some(ts) = store else { return };
    let pantry = stock_pantry(&ts);
    let created = ts
        .block_on(ts.store.create_recipe(&bread(&pantry)))
        .expect("recipe created");

    let slimmer = RecipeDraft {
        tags: Vec::new(),
        images: Vec::new(),
        steps: vec![StepDraft {
            instructions: "Just mix".to_owned(),
            ingredients: vec![line(pantry.flour, pantry.gram, 250.0)],
        }],
        ..bread(&pantry)
    };
    let updated = ts
        .block_on(ts.store.update_recipe(created.id, &slimmer))
        .expect("recipe updated");

    assert_eq!(updated.steps.len(), 1);
    assert_eq!(updated.steps[0].ingredients.len(), 1);
    assert!(updated.tags.is_empty());
    assert!(updated.images.is_empty());
    assert_eq!(ts.count("recipe_steps"), 1);
    assert_eq!(ts.count("step_ingredients"), 1);
    assert_eq!(ts.count("recipe_tags"), 0);
    // Tags themselves are shared vocabulary and survive unlinking.
    assert_eq!(ts.count("tags"), 2);
}

#[rstest]
fn failed_step_ingredient_leaves_nothing_behind(store: Option<TestStore>) {
    let Some(ts) = store else { return };
    let pantry = stock_pantry(&ts);

    let mut broken = bread(&pantry);
    broken.steps[1].ingredients[0].unit_id = pantry.gram + 1000;
    let error = ts
        .block_on(ts.store.create_recipe(&broken))
        .expect_err("unknown unit violates a foreign key");

    assert!(matches!(error, StoreError::Query { .. }));
    for table in ["recipes", "recipe_steps", "step_ingredients", "recipe_images", "recipe_tags"] {
        assert_eq!(ts.count(table), 0, "{table} should be empty after rollback");
    }
}

#[rstest]
fn failed_update_keeps_the_previous_aggregate(store: Option<TestStore>) {
    let Some(ts) = store else { return };
    let pantry = stock_pantry(&ts);
    let created = ts
        .block_on(ts.store.create_recipe(&bread(&pantry)))
        .expect("recipe created");

    let mut broken = bread(&pantry);
    broken.name = "Renamed".to_owned();
    broken.steps[0].ingredients[0].ingredient_id = pantry.salt + 1000;
    ts.block_on(ts.store.update_recipe(created.id, &broken))
        .expect_err("unknown ingredient violates a foreign key");

    let read = ts
        .block_on(ts.store.get_recipe_by_id(pantry.cook, created.id))
        .expect("recipe readable");
    assert_eq!(read, created);
}

#[rstest]
fn concurrent_writes_are_isolated(store: Option<TestStore>) {
    let Some(ts) = store else { return };
    let pantry = stock_pantry(&ts);

    let mut broken = bread(&pantry);
    broken.name = "Broken".to_owned();
    broken.steps[1].ingredients[0].unit_id = pantry.gram + 1000;
    let good = bread(&pantry);

    let (ok, failed) = ts.block_on(async {
        tokio::join!(
            ts.store.create_recipe(&good),
            ts.store.create_recipe(&broken)
        )
    });

    let created = ok.expect("the valid recipe commits");
    assert!(failed.is_err());
    let all = ts.block_on(ts.store.browse_recipes()).expect("browse");
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, created.id);
    assert_eq!(ts.count("recipe_steps"), 2);
}

#[rstest]
fn missing_recipes_are_not_found(store: Option<TestStore>) {
    let Some(ts) = store else { return };
    let pantry = stock_pantry(&ts);
    let missing = RecipeId::new(4242);

    let read = ts.block_on(ts.store.get_recipe_by_id(pantry.cook, missing));
    assert!(matches!(read, Err(StoreError::NotFound { .. })));

    let update = ts.block_on(ts.store.update_recipe(missing, &bread(&pantry)));
    assert!(matches!(update, Err(StoreError::NotFound { .. })));
    assert_eq!(ts.count("recipe_steps"), 0);

    let delete = ts.block_on(ts.store.delete_recipe(missing));
    assert!(matches!(delete, Err(StoreError::NotFound { .. })));
}

#[rstest]
fn deleting_a_recipe_cascades_to_children(store: Option<TestStore>) {
    let Some(ts) = store else { return };
    let pantry = stock_pantry(&ts);
    let created = ts
        .block_on(ts.store.create_recipe(&bread(&pantry)))
        .expect("recipe created");

    ts.block_on(ts.store.delete_recipe(created.id))
        .expect("recipe deleted");

    for table in ["recipes", "recipe_steps", "step_ingredients", "recipe_images", "recipe_tags"] {
        assert_eq!(ts.count(table), 0, "{table} should be empty after delete");
    }
}

#[rstest]
fn paging_a_users_recipes_visits_each_once(store: Option<TestStore>) {
    let Some(ts) = store else { return };
    let pantry = stock_pantry(&ts);
    let other = ts.seed_user("grace");
    let names = ["Pie", "Apple cake", "Soup", "Bread", "Pie", "Stew", "Jam"];
    ts.block_on(async {
        for name in names {
            ts.store
                .create_recipe(&named(&pantry, name))
                .await
                .expect("recipe created");
        }
        let mut foreign = named(&pantry, "Borrowed");
        foreign.created_by = other;
        ts.store.create_recipe(&foreign).await.expect("recipe created");
    });

    let mut seen = Vec::new();
    let mut page = Page::first(3);
    let mut pages = 0;
    loop {
        let result = ts
            .block_on(ts.store.get_recipes_by_user(pantry.cook, &page))
            .expect("page loads");
        pages += 1;
        assert!(result.data.len() <= 3);
        seen.extend(result.data.into_iter().map(|recipe| (recipe.name, recipe.id)));
        match result.next_cursor {
            Some(token) => {
                assert!(result.has_more);
                page = pagination::validate_page(&token, 3).expect("cursor round-trips");
            }
            None => break,
        }
    }

    assert_eq!(pages, 3);
    assert_eq!(seen.len(), names.len());
    let unique: HashSet<_> = seen.iter().map(|(_, id)| *id).collect();
    assert_eq!(unique.len(), names.len());
    let mut sorted = seen.clone();
    sorted.sort();
    assert_eq!(seen, sorted);
    assert!(seen.iter().all(|(name, _)| name != "Borrowed"));
}

#[rstest]
fn votes_default_to_zero_and_follow_the_viewer(store: Option<TestStore>) {
    let Some(ts) = store else { return };
    let pantry = stock_pantry(&ts);
    let other = ts.seed_user("grace");
    let recipe = ts
        .block_on(ts.store.create_recipe(&named(&pantry, "Soup")))
        .expect("recipe created")
        .id;

    ts.block_on(async {
        assert_eq!(ts.store.get_recipe_votes(recipe).await, Ok(0));
        assert_eq!(ts.store.get_user_vote(recipe, pantry.cook).await, Ok(0));

        ts.store
            .add_vote(recipe, pantry.cook, 1)
            .await
            .expect("vote stored");

        let own = ts
            .store
            .get_recipe_by_id(pantry.cook, recipe)
            .await
            .expect("readable");
        assert_eq!(
            own.votes,
            RecipeVotes {
                total: 1,
                user_own: 1
            }
        );
        let theirs = ts
            .store
            .get_recipe_by_id(other, recipe)
            .await
            .expect("readable");
        assert_eq!(
            theirs.votes,
            RecipeVotes {
                total: 1,
                user_own: 0
            }
        );

        ts.store
            .add_vote(recipe, pantry.cook, -1)
            .await
            .expect("vote replaced");
        ts.store.add_vote(recipe, other, -1).await.expect("vote stored");
        assert_eq!(ts.store.get_recipe_votes(recipe).await, Ok(-2));

        ts.store
            .remove_vote(recipe, pantry.cook)
            .await
            .expect("vote removed");
        assert_eq!(ts.store.get_user_vote(recipe, pantry.cook).await, Ok(0));
        assert_eq!(ts.store.get_recipe_votes(recipe).await, Ok(-1));
    });
}

#[rstest]
fn browsing_shows_totals_without_an_own_vote(store: Option<TestStore>) {
    let Some(ts) = store else { return };
    let pantry = stock_pantry(&ts);
    let recipe = ts
        .block_on(ts.store.create_recipe(&named(&pantry, "Soup")))
        .expect("recipe created")
        .id;
    ts.block_on(ts.store.add_vote(recipe, pantry.cook, 1))
        .expect("vote stored");

    let all = ts.block_on(ts.store.browse_recipes()).expect("browse");
    assert_eq!(
        all[0].votes,
        RecipeVotes {
            total: 1,
            user_own: 0
        }
    );
}

#[rstest]
fn uncommitted_writes_stay_invisible(store: Option<TestStore>) {
    let Some(ts) = store else { return };
    let cook = stock_pantry(&ts).cook;
    let reader = ts.store.clone();

    let outcome = ts.block_on(async {
        let mut conn = ts.store.pool().get().await.expect("connection");
        with_transaction(&mut *conn, |tx| {
            async move {
                diesel::sql_query(
                    "INSERT INTO recipes (name, servings, minutes, created_by) \
                     VALUES ('Draft', 1, 1, $1)",
                )
                .bind::<BigInt, _>(cook.get())
                .execute(tx)
                .await
                .map_err(|err| StoreError::query(err.to_string()))?;
                let visible = reader.browse_recipes().await?;
                assert!(visible.is_empty(), "another call saw an open transaction");
                Err::<(), _>(StoreError::query("draft abandoned"))
            }
            .scope_boxed()
        })
        .await
    });

    assert_eq!(outcome, Err(StoreError::query("draft abandoned")));
    assert_eq!(ts.count("recipes"), 0);
}

#[rstest]
fn cancelled_creates_leave_nothing_behind(store: Option<TestStore>) {
    let Some(ts) = store else { return };
    let pantry = stock_pantry(&ts);
    let draft = bread(&pantry);

    let mut finished = 0_i64;
    for micros in [0_u64, 50, 200, 1_000, 5_000, 20_000, 100_000] {
        let attempt = ts.block_on(async {
            tokio::time::timeout(
                Duration::from_micros(micros),
                ts.store.create_recipe(&draft),
            )
            .await
        });
        if let Ok(result) = attempt {
            result.expect("a create that ran to completion commits");
            finished += 1;
        }
    }

    let recipes = ts.count("recipes");
    assert!(recipes >= finished);
    assert_eq!(ts.count("recipe_steps"), recipes * 2);
    assert_eq!(ts.count("step_ingredients"), recipes * 3);
    assert_eq!(ts.count("recipe_images"), recipes);
    assert_eq!(ts.count("recipe_tags"), recipes * 2);

    let after = ts
        .block_on(ts.store.create_recipe(&draft))
        .expect("the pool still serves writes");
    assert_eq!(after.steps.len(), 2);
    assert_eq!(ts.store.pool().status().in_use(), 0);
}
