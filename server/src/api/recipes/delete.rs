use super::write::NOT_AUTHOR;
use crate::auth::AuthUser;
use crate::error::{ApiError, DetailResponse};
use crate::models::Recipe;
use crate::schema::recipes;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use diesel::prelude::*;

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}/",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Unauthorized", body = DetailResponse),
        (status = 403, description = "Not the author", body = DetailResponse),
        (status = 404, description = "Recipe not found", body = DetailResponse)
    ),
    security(("token_auth" = []))
)]
pub async fn delete_recipe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let mut conn = state.pool.get()?;

    let recipe: Recipe = recipes::table
        .find(id)
        .select(Recipe::as_select())
        .first(&mut conn)?;

    if recipe.author_id != user.id {
        return Err(ApiError::Forbidden(NOT_AUTHOR));
    }

    // tags, ingredient lines, favorites and cart entries cascade
    diesel::delete(recipes::table.find(id)).execute(&mut conn)?;
    state.media.remove(&recipe.image);

    tracing::info!(recipe_id = id, "deleted recipe");

    Ok(StatusCode::NO_CONTENT)
}
