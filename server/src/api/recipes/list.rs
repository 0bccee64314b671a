use super::filters::{parse_filter, RecipeFilter};
use super::repr::{recipe_responses, RecipeResponse};
use crate::auth::MaybeUser;
use crate::error::{ApiError, DetailResponse, ValidationErrors};
use crate::models::Recipe;
use crate::schema::{cart_items, favorites, recipe_tags, recipes, tags};
use crate::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use diesel::prelude::*;

/// Recipes matching `filter`, newest first. The favorite and cart flags only
/// narrow the list when set to true for an authenticated caller.
fn find_recipes(
    conn: &mut PgConnection,
    viewer: Option<i32>,
    filter: &RecipeFilter,
) -> QueryResult<Vec<Recipe>> {
    let mut query = recipes::table.into_boxed();

    if let Some(author_id) = filter.author {
        query = query.filter(recipes::author_id.eq(author_id));
    }

    if !filter.tags.is_empty() {
        query = query.filter(
            recipes::id.eq_any(
                recipe_tags::table
                    .inner_join(tags::table)
                    .filter(tags::slug.eq_any(&filter.tags))
                    .select(recipe_tags::recipe_id),
            ),
        );
    }

    if let Some(user_id) = viewer {
        if filter.is_favorited == Some(true) {
            query = query.filter(
                recipes::id.eq_any(
                    favorites::table
                        .filter(favorites::user_id.eq(user_id))
                        .select(favorites::recipe_id),
                ),
            );
        }
        if filter.is_in_shopping_cart == Some(true) {
            query = query.filter(
                recipes::id.eq_any(
                    cart_items::table
                        .filter(cart_items::user_id.eq(user_id))
                        .select(cart_items::recipe_id),
                ),
            );
        }
    }

    query
        .order((recipes::pub_date.desc(), recipes::id.desc()))
        .select(Recipe::as_select())
        .load(conn)
}

#[utoipa::path(
    get,
    path = "/api/recipes/",
    tag = "recipes",
    params(RecipeFilter),
    responses(
        (status = 200, description = "Recipes, newest first", body = Vec<RecipeResponse>),
        (status = 400, description = "Invalid filter", body = ValidationErrors),
        (status = 401, description = "Invalid token", body = DetailResponse)
    )
)]
pub async fn list_recipes(
    MaybeUser(viewer): MaybeUser,
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Vec<RecipeResponse>>, ApiError> {
    let filter = parse_filter(&pairs)?;
    let viewer_id = viewer.map(|v| v.id);

    let mut conn = state.pool.get()?;
    let found = find_recipes(&mut conn, viewer_id, &filter)?;

    Ok(Json(recipe_responses(&mut conn, &state.media, viewer_id, &found)?))
}
