use super::repr::{recipe_response, RecipeResponse};
use super::write::{
    map_write_error, replace_ingredients, replace_tags, store_image, validate_write,
    RecipeWriteRequest, WriteMode,
};
use crate::api::json::JsonBody;
use crate::auth::AuthUser;
use crate::error::{ApiError, DetailResponse, ValidationErrors};
use crate::models::{NewRecipe, Recipe};
use crate::schema::recipes;
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use diesel::prelude::*;

#[utoipa::path(
    post,
    path = "/api/recipes/",
    tag = "recipes",
    request_body(content = RecipeWriteRequest, example = json!({
        "tags": [1, 2],
        "ingredients": [{"id": 1123, "amount": 10}],
        "name": "Pancakes",
        "image": "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==",
        "text": "Whisk, rest, fry.",
        "cooking_time": 20
    })),
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Invalid fields", body = ValidationErrors),
        (status = 401, description = "Unauthorized", body = DetailResponse)
    ),
    security(("token_auth" = []))
)]
pub async fn create_recipe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RecipeWriteRequest>,
) -> Result<(StatusCode, Json<RecipeResponse>), ApiError> {
    let mut conn = state.pool.get()?;

    let valid = validate_write(&mut *conn, &req, WriteMode::Create, user.id)?;
    let image = store_image(&state.media, req.image.as_deref().unwrap_or_default())?;

    let new_recipe = NewRecipe {
        author_id: user.id,
        name: valid.name.as_deref().unwrap_or_default(),
        image: &image,
        text: valid.text.as_deref().unwrap_or_default(),
        cooking_time: valid.cooking_time.unwrap_or(1),
    };

    let result = conn.transaction::<Recipe, ApiError, _>(|conn| {
        let recipe: Recipe = diesel::insert_into(recipes::table)
            .values(&new_recipe)
            .returning(Recipe::as_returning())
            .get_result(conn)?;

        replace_tags(conn, recipe.id, &valid.tags)?;
        replace_ingredients(conn, recipe.id, &valid.ingredients)?;
        Ok(recipe)
    });

    let recipe = match result {
        Ok(recipe) => recipe,
        Err(e) => {
            state.media.remove(&image);
            return Err(map_write_error(e, valid.name.as_deref()));
        }
    };

    tracing::info!(recipe_id = recipe.id, author_id = user.id, "created recipe");

    let response = recipe_response(&mut conn, &state.media, Some(user.id), &recipe)?;
    Ok((StatusCode::CREATED, Json(response)))
}
