//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. They are used
//! by Diesel for compile-time query validation and type-safe SQL generation.
//! `diesel print-schema` against a migrated database regenerates them.

diesel::table! {
    /// Accounts that own recipes, votes, meal plans and shopping lists.
    users (id) {
        id -> Int8,
        email -> Text,
        password_hash -> Text,
        is_confirmed -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Recipe labels; names are unique.
    tags (id) {
        id -> Int8,
        name -> Text,
    }
}

diesel::table! {
    /// Measuring units.
    units (id) {
        id -> Int8,
        name -> Text,
        symbol -> Nullable<Text>,
    }
}

diesel::table! {
    /// Nutrient reference data.
    nutrients (id) {
        id -> Int8,
        name -> Text,
        unit -> Text,
    }
}

diesel::table! {
    /// Ingredient reference data.
    ingredients (id) {
        id -> Int8,
        name -> Text,
    }
}

diesel::table! {
    /// Nutrient profile rows keyed by ingredient and nutrient.
    ingredient_nutrients (ingredient_id, nutrient_id) {
        ingredient_id -> Int8,
        nutrient_id -> Int8,
        amount -> Float8,
    }
}

diesel::table! {
    /// Recipe aggregate roots.
    recipes (id) {
        id -> Int8,
        name -> Text,
        description -> Text,
        servings -> Int4,
        minutes -> Int4,
        created_by -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Many-to-many link between recipes and tags.
    recipe_tags (recipe_id, tag_id) {
        recipe_id -> Int8,
        tag_id -> Int8,
    }
}

diesel::table! {
    /// Images owned by a recipe.
    recipe_images (id) {
        id -> Int8,
        recipe_id -> Int8,
        url -> Text,
        sort_order -> Int4,
    }
}

diesel::table! {
    /// Ordered instruction steps owned by a recipe.
    recipe_steps (id) {
        id -> Int8,
        recipe_id -> Int8,
        instructions -> Text,
        sort_order -> Int4,
    }
}

diesel::table! {
    /// Ordered ingredient quantities owned by a step.
    step_ingredients (id) {
        id -> Int8,
        step_id -> Int8,
        ingredient_id -> Int8,
        unit_id -> Int8,
        amount -> Float8,
        sort_order -> Int4,
    }
}

diesel::table! {
    /// One vote (`1` or `-1`) per user and recipe.
    recipe_votes (recipe_id, user_id) {
        recipe_id -> Int8,
        user_id -> Int8,
        vote -> Int2,
    }
}

diesel::table! {
    /// Recipes planned on a day by a user.
    meal_plan_entries (id) {
        id -> Int8,
        user_id -> Int8,
        recipe_id -> Int8,
        date -> Date,
        sort_order -> Int4,
    }
}

diesel::table! {
    /// Named shopping lists.
    shopping_lists (id) {
        id -> Int8,
        user_id -> Int8,
        name -> Text,
    }
}

diesel::table! {
    /// Free-text entries on a shopping list.
    shopping_list_items (id) {
        id -> Int8,
        list_id -> Int8,
        ingredient -> Text,
        quantity -> Nullable<Text>,
        unit -> Nullable<Text>,
        done -> Bool,
        sort_order -> Int4,
    }
}

diesel::table! {
    /// Outstanding registration tokens, at most one per account.
    user_registrations (user_id) {
        user_id -> Int8,
        token -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Outstanding password reset tokens, at most one per account.
    password_resets (user_id) {
        user_id -> Int8,
        token -> Text,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(ingredient_nutrients -> ingredients (ingredient_id));
diesel::joinable!(ingredient_nutrients -> nutrients (nutrient_id));
diesel::joinable!(meal_plan_entries -> recipes (recipe_id));
diesel::joinable!(meal_plan_entries -> users (user_id));
diesel::joinable!(password_resets -> users (user_id));
diesel::joinable!(recipe_images -> recipes (recipe_id));
diesel::joinable!(recipe_steps -> recipes (recipe_id));
diesel::joinable!(recipe_tags -> recipes (recipe_id));
diesel::joinable!(recipe_tags -> tags (tag_id));
diesel::joinable!(recipe_votes -> recipes (recipe_id));
diesel::joinable!(recipe_votes -> users (user_id));
diesel::joinable!(recipes -> users (created_by));
diesel::joinable!(shopping_list_items -> shopping_lists (list_id));
diesel::joinable!(shopping_lists -> users (user_id));
diesel::joinable!(step_ingredients -> ingredients (ingredient_id));
diesel::joinable!(step_ingredients -> recipe_steps (step_id));
diesel::joinable!(step_ingredients -> units (unit_id));
diesel::joinable!(user_registrations -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    ingredient_nutrients,
    ingredients,
    meal_plan_entries,
    nutrients,
    password_resets,
    recipe_images,
    recipe_steps,
    recipe_tags,
    recipe_votes,
    recipes,
    shopping_list_items,
    shopping_lists,
    step_ingredients,
    tags,
    units,
    user_registrations,
    users,
);
