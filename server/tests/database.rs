//! Checks that need a live PostgreSQL database.
//!
//! Set `DATABASE_URL` to a scratch database to run them; without it every
//! test returns early. Rows are created under unique names and removed at the
//! end of each test.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use diesel::prelude::*;
use foodgram_server::api::json::JsonBody;
use foodgram_server::api::recipes::{favorite, shopping_cart};
use foodgram_server::api::users::create::{create_user, CreateUserRequest};
use foodgram_server::api::users::subscribe::subscribe;
use foodgram_server::auth::AuthUser;
use foodgram_server::db::{create_pool, DbPool};
use foodgram_server::error::ApiError;
use foodgram_server::media::MediaStore;
use foodgram_server::models::{
    Ingredient, NewCartItem, NewIngredient, NewRecipe, NewRecipeIngredient, NewUser, Recipe, User,
};
use foodgram_server::schema::{cart_items, ingredients, recipe_ingredients, recipes, users};
use foodgram_server::shopping_list::{cart_totals, export_cart, ShoppingListRow, EMPTY_CART};
use foodgram_server::AppState;
use std::sync::{Arc, OnceLock};

/// One pool per test binary so migrations run once.
fn pool() -> Option<Arc<DbPool>> {
    static POOL: OnceLock<Option<Arc<DbPool>>> = OnceLock::new();
    POOL.get_or_init(|| {
        let url = std::env::var("DATABASE_URL").ok()?;
        Some(Arc::new(create_pool(&url).expect("DATABASE_URL should be reachable")))
    })
    .clone()
}

fn state(pool: Arc<DbPool>) -> AppState {
    AppState {
        pool,
        media: Arc::new(MediaStore::new(std::env::temp_dir().join("foodgram-tests"), "/media/")),
        session_ttl_days: 1,
    }
}

fn unique(prefix: &str) -> String {
    format!("{prefix}{}", uuid::Uuid::new_v4().simple())
}

fn insert_user(conn: &mut PgConnection) -> User {
    let username = unique("cook");
    let email = format!("{username}@example.com");
    diesel::insert_into(users::table)
        .values(&NewUser {
            email: &email,
            username: &username,
            first_name: "Test",
            last_name: "Cook",
            password_hash: "unused",
        })
        .returning(User::as_returning())
        .get_result(conn)
        .unwrap()
}

fn insert_ingredient(conn: &mut PgConnection, name: &str, unit: &str) -> Ingredient {
    diesel::insert_into(ingredients::table)
        .values(&NewIngredient {
            name,
            measurement_unit: unit,
        })
        .returning(Ingredient::as_returning())
        .get_result(conn)
        .unwrap()
}

/// A recipe by `author_id` using each `(ingredient, amount)` once.
fn insert_recipe(conn: &mut PgConnection, author_id: i32, uses: &[(&Ingredient, i16)]) -> Recipe {
    let name = unique("recipe");
    let recipe: Recipe = diesel::insert_into(recipes::table)
        .values(&NewRecipe {
            author_id,
            name: &name,
            image: "recipes/images/test.png",
            text: "Mix.",
            cooking_time: 10,
        })
        .returning(Recipe::as_returning())
        .get_result(conn)
        .unwrap();

    let rows: Vec<NewRecipeIngredient> = uses
        .iter()
        .map(|(ingredient, amount)| NewRecipeIngredient {
            recipe_id: recipe.id,
            ingredient_id: ingredient.id,
            amount: *amount,
        })
        .collect();
    diesel::insert_into(recipe_ingredients::table)
        .values(&rows)
        .execute(conn)
        .unwrap();
    recipe
}

fn put_in_cart(conn: &mut PgConnection, user_id: i32, recipe_id: i32) {
    diesel::insert_into(cart_items::table)
        .values(&NewCartItem { user_id, recipe_id })
        .execute(conn)
        .unwrap();
}

fn delete_users(conn: &mut PgConnection, ids: &[i32]) {
    diesel::delete(users::table.filter(users::id.eq_any(ids)))
        .execute(conn)
        .unwrap();
}

fn delete_ingredients(conn: &mut PgConnection, ids: &[i32]) {
    diesel::delete(ingredients::table.filter(ingredients::id.eq_any(ids)))
        .execute(conn)
        .unwrap();
}

fn row(name: &str, unit: &str, total_amount: i64) -> ShoppingListRow {
    ShoppingListRow {
        name: name.to_string(),
        unit: unit.to_string(),
        total_amount,
    }
}

#[test]
fn test_cart_totals_sum_across_recipes() {
    let Some(pool) = pool() else { return };
    let mut conn = pool.get().unwrap();

    let author = insert_user(&mut conn);
    let shopper = insert_user(&mut conn);
    let flour = insert_ingredient(&mut conn, &unique("flour"), "g");
    let sugar = insert_ingredient(&mut conn, &unique("sugar"), "g");

    let bread = insert_recipe(&mut conn, author.id, &[(&flour, 100)]);
    let cake = insert_recipe(&mut conn, author.id, &[(&flour, 150), (&sugar, 20)]);
    // not in the cart
    insert_recipe(&mut conn, author.id, &[(&flour, 1000)]);

    put_in_cart(&mut conn, shopper.id, bread.id);
    put_in_cart(&mut conn, shopper.id, cake.id);
    // someone else's cart
    put_in_cart(&mut conn, author.id, cake.id);

    let mut totals = cart_totals(&mut conn, shopper.id).unwrap();
    totals.sort_by(|a, b| a.name.cmp(&b.name));
    assert_eq!(
        totals,
        [row(&flour.name, "g", 250), row(&sugar.name, "g", 20)]
    );

    let csv = String::from_utf8(export_cart(&mut *conn, shopper.id).unwrap()).unwrap();
    assert!(csv.starts_with("name,unit,total_amount\n"));
    assert!(csv.contains(&format!("{},g,250\n", flour.name)));

    delete_users(&mut conn, &[author.id, shopper.id]);
    delete_ingredients(&mut conn, &[flour.id, sugar.id]);
}

#[test]
fn test_empty_cart_export_refused() {
    let Some(pool) = pool() else { return };
    let mut conn = pool.get().unwrap();
    let user = insert_user(&mut conn);

    let err = export_cart(&mut *conn, user.id).unwrap_err();
    assert!(matches!(&err, ApiError::Conflict(msg) if msg == EMPTY_CART));
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

    delete_users(&mut conn, &[user.id]);
}

#[tokio::test]
async fn test_toggles_on_unknown_targets_are_not_found() {
    let Some(pool) = pool() else { return };
    let user = insert_user(&mut pool.get().unwrap());
    let state = state(pool.clone());
    let missing = -1;

    let err = favorite::add_favorite(AuthUser(user.clone()), State(state.clone()), Path(missing))
        .await
        .unwrap_err();
    assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

    let err = favorite::remove_favorite(AuthUser(user.clone()), State(state.clone()), Path(missing))
        .await
        .unwrap_err();
    assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

    let err =
        shopping_cart::add_to_cart(AuthUser(user.clone()), State(state.clone()), Path(missing))
            .await
            .unwrap_err();
    assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

    let err = subscribe(AuthUser(user.clone()), State(state), Path(missing))
        .await
        .unwrap_err();
    assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

    delete_users(&mut pool.get().unwrap(), &[user.id]);
}

#[tokio::test]
async fn test_email_unique_ignoring_case() {
    let Some(pool) = pool() else { return };
    let local = unique("Cook");

    let request = |email: String| CreateUserRequest {
        email: Some(email),
        username: Some(unique("cook")),
        first_name: Some("Julia".to_string()),
        last_name: Some("Child".to_string()),
        password: Some("password".to_string()),
    };

    let (status, _) = create_user(
        State(pool.clone()),
        JsonBody(request(format!("{local}@Example.com"))),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);

    let err = create_user(
        State(pool.clone()),
        JsonBody(request(format!("{}@example.com", local.to_lowercase()))),
    )
    .await
    .unwrap_err();
    let ApiError::Validation(errors) = err else {
        panic!("expected a validation error, got {err:?}");
    };
    assert_eq!(
        errors.get("email").unwrap(),
        ["A user with that email already exists."]
    );
    assert!(errors.get("username").is_none());

    let mut conn = pool.get().unwrap();
    diesel::delete(users::table.filter(users::email.ilike(format!("{local}@example.com"))))
        .execute(&mut conn)
        .unwrap();
}
