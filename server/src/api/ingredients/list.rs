use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::Ingredient;
use crate::schema::ingredients;
use axum::{
    extract::{Query, State},
    Json,
};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IngredientResponse {
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
}

impl From<Ingredient> for IngredientResponse {
    fn from(ingredient: Ingredient) -> Self {
        Self {
            id: ingredient.id,
            name: ingredient.name,
            measurement_unit: ingredient.measurement_unit,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListIngredientsParams {
    /// Case-insensitive name prefix
    pub name: Option<String>,
}

/// Escape LIKE wildcards so the prefix is matched literally.
fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// `LIKE` pattern for a case-insensitive prefix match against `LOWER(name)`.
fn prefix_pattern(prefix: &str) -> String {
    format!("{}%", escape_like(&prefix.to_lowercase()))
}

#[utoipa::path(
    get,
    path = "/api/ingredients/",
    tag = "ingredients",
    params(ListIngredientsParams),
    responses(
        (status = 200, description = "Ingredients, optionally filtered by name prefix", body = Vec<IngredientResponse>)
    )
)]
pub async fn list_ingredients(
    State(pool): State<Arc<DbPool>>,
    Query(params): Query<ListIngredientsParams>,
) -> Result<Json<Vec<IngredientResponse>>, ApiError> {
    let mut conn = pool.get()?;

    let mut query = ingredients::table.into_boxed();
    if let Some(prefix) = params.name.as_deref().filter(|p| !p.is_empty()) {
        // matches the idx_ingredients_name_lower expression index
        query = query.filter(
            diesel::dsl::sql::<diesel::sql_types::Bool>("LOWER(name) LIKE ")
                .bind::<diesel::sql_types::Text, _>(prefix_pattern(prefix)),
        );
    }

    let found: Vec<Ingredient> = query
        .order(ingredients::id.asc())
        .select(Ingredient::as_select())
        .load(&mut conn)?;

    Ok(Json(found.into_iter().map(IngredientResponse::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("flour"), "flour");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn test_prefix_pattern_lowercases_and_escapes() {
        assert_eq!(prefix_pattern("Flo"), "flo%");
        assert_eq!(prefix_pattern("ЯЙЦА"), "яйца%");
        assert_eq!(prefix_pattern("50%_OFF"), "50\\%\\_off%");
    }
}
