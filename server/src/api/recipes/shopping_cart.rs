use super::repr::{short_recipe, ShortRecipeResponse};
use crate::auth::AuthUser;
use crate::error::{ApiError, DetailResponse, ErrorsResponse};
use crate::membership::{self, ShoppingCart};
use crate::models::Recipe;
use crate::schema::recipes;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use diesel::prelude::*;

#[utoipa::path(
    post,
    path = "/api/recipes/{id}/shopping_cart/",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    responses(
        (status = 201, description = "Added to the shopping cart", body = ShortRecipeResponse),
        (status = 400, description = "Already in the shopping cart", body = ErrorsResponse),
        (status = 401, description = "Unauthorized", body = DetailResponse),
        (status = 404, description = "Recipe not found", body = DetailResponse)
    ),
    security(("token_auth" = []))
)]
pub async fn add_to_cart(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<(StatusCode, Json<ShortRecipeResponse>), ApiError> {
    let mut conn = state.pool.get()?;

    let recipe: Recipe = recipes::table
        .find(id)
        .select(Recipe::as_select())
        .first(&mut conn)?;

    membership::add(&mut ShoppingCart(&mut conn), user.id, recipe.id)?;
    tracing::debug!(user_id = user.id, recipe_id = recipe.id, "added recipe to cart");

    Ok((StatusCode::CREATED, Json(short_recipe(&state.media, &recipe))))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/shopping_cart/",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Removed from the shopping cart"),
        (status = 400, description = "Not in the shopping cart", body = ErrorsResponse),
        (status = 401, description = "Unauthorized", body = DetailResponse),
        (status = 404, description = "Recipe not found", body = DetailResponse)
    ),
    security(("token_auth" = []))
)]
pub async fn remove_from_cart(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let mut conn = state.pool.get()?;

    let recipe_id: i32 = recipes::table
        .find(id)
        .select(recipes::id)
        .first(&mut conn)?;

    membership::remove(&mut ShoppingCart(&mut conn), user.id, recipe_id)?;
    tracing::debug!(user_id = user.id, recipe_id, "removed recipe from cart");

    Ok(StatusCode::NO_CONTENT)
}
