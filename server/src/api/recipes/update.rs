use super::repr::{recipe_response, RecipeResponse};
use super::write::{
    map_write_error, replace_ingredients, replace_tags, store_image, validate_write,
    RecipeWriteRequest, WriteMode, NOT_AUTHOR,
};
use crate::api::json::JsonBody;
use crate::auth::AuthUser;
use crate::error::{ApiError, DetailResponse, ValidationErrors};
use crate::models::{Recipe, RecipeChanges};
use crate::schema::recipes;
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use diesel::prelude::*;

#[utoipa::path(
    patch,
    path = "/api/recipes/{id}/",
    tag = "recipes",
    params(
        ("id" = i32, Path, description = "Recipe ID")
    ),
    request_body = RecipeWriteRequest,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Invalid fields", body = ValidationErrors),
        (status = 401, description = "Unauthorized", body = DetailResponse),
        (status = 403, description = "Not the author", body = DetailResponse),
        (status = 404, description = "Recipe not found", body = DetailResponse)
    ),
    security(("token_auth" = []))
)]
pub async fn update_recipe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    JsonBody(req): JsonBody<RecipeWriteRequest>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let mut conn = state.pool.get()?;

    let existing: Recipe = recipes::table
        .find(id)
        .select(Recipe::as_select())
        .first(&mut conn)?;

    if existing.author_id != user.id {
        return Err(ApiError::Forbidden(NOT_AUTHOR));
    }

    let valid = validate_write(&mut *conn, &req, WriteMode::Update, user.id)?;
    let new_image = req
        .image
        .as_deref()
        .map(|data_uri| store_image(&state.media, data_uri))
        .transpose()?;

    let changes = RecipeChanges {
        name: valid.name.as_deref(),
        image: new_image.as_deref(),
        text: valid.text.as_deref(),
        cooking_time: valid.cooking_time,
    };
    let has_changes = changes.name.is_some()
        || changes.image.is_some()
        || changes.text.is_some()
        || changes.cooking_time.is_some();

    let result = conn.transaction::<Recipe, ApiError, _>(|conn| {
        let recipe = if has_changes {
            diesel::update(recipes::table.find(id))
                .set(&changes)
                .returning(Recipe::as_returning())
                .get_result(conn)?
        } else {
            existing.clone()
        };

        replace_tags(conn, id, &valid.tags)?;
        replace_ingredients(conn, id, &valid.ingredients)?;
        Ok(recipe)
    });

    let recipe = match result {
        Ok(recipe) => recipe,
        Err(e) => {
            if let Some(image) = &new_image {
                state.media.remove(image);
            }
            return Err(map_write_error(e, valid.name.as_deref()));
        }
    };

    if new_image.is_some() {
        state.media.remove(&existing.image);
    }

    tracing::info!(recipe_id = recipe.id, "updated recipe");

    Ok(Json(recipe_response(&mut conn, &state.media, Some(user.id), &recipe)?))
}
