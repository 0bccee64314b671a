use super::repr::{recipe_response, RecipeResponse};
use crate::auth::MaybeUser;
use crate::error::{ApiError, DetailResponse};
use crate::models::Recipe;
use crate::schema::recipes;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use diesel::prelude::*;

#[utoipa::path(
    get,
    path = "/api/recipes/{id}/",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe details", body = RecipeResponse),
        (status = 404, description = "Recipe not found", body = DetailResponse)
    )
)]
pub async fn get_recipe(
    MaybeUser(viewer): MaybeUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let mut conn = state.pool.get()?;

    let recipe: Recipe = recipes::table
        .find(id)
        .select(Recipe::as_select())
        .first(&mut conn)?;

    Ok(Json(recipe_response(
        &mut conn,
        &state.media,
        viewer.map(|v| v.id),
        &recipe,
    )?))
}
