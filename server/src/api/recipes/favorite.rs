use super::repr::{short_recipe, ShortRecipeResponse};
use crate::auth::AuthUser;
use crate::error::{ApiError, DetailResponse, ErrorsResponse};
use crate::membership::{self, Favorites};
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
    path = "/api/recipes/{id}/favorite/",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    responses(
        (status = 201, description = "Added to favorites", body = ShortRecipeResponse),
        (status = 400, description = "Already in favorites", body = ErrorsResponse),
        (status = 401, description = "Unauthorized", body = DetailResponse),
        (status = 404, description = "Recipe not found", body = DetailResponse)
    ),
    security(("token_auth" = []))
)]
pub async fn add_favorite(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<(StatusCode, Json<ShortRecipeResponse>), ApiError> {
    let mut conn = state.pool.get()?;

    let recipe: Recipe = recipes::table
        .find(id)
        .select(Recipe::as_select())
        .first(&mut conn)?;

    membership::add(&mut Favorites(&mut conn), user.id, recipe.id)?;
    tracing::debug!(user_id = user.id, recipe_id = recipe.id, "favorited recipe");

    Ok((StatusCode::CREATED, Json(short_recipe(&state.media, &recipe))))
}

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/favorite/",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Removed from favorites"),
        (status = 400, description = "Not in favorites", body = ErrorsResponse),
        (status = 401, description = "Unauthorized", body = DetailResponse),
        (status = 404, description = "Recipe not found", body = DetailResponse)
    ),
    security(("token_auth" = []))
)]
pub async fn remove_favorite(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let mut conn = state.pool.get()?;

    let recipe_id: i32 = recipes::table
        .find(id)
        .select(recipes::id)
        .first(&mut conn)?;

    membership::remove(&mut Favorites(&mut conn), user.id, recipe_id)?;
    tracing::debug!(user_id = user.id, recipe_id, "unfavorited recipe");

    Ok(StatusCode::NO_CONTENT)
}
