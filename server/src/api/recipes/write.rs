//! Shared pieces of recipe create and update.

use crate::error::{ApiError, ValidationErrors};
use crate::media::{MediaError, MediaStore};
use crate::models::{NewRecipeIngredient, NewRecipeTag};
use crate::schema::{recipe_ingredients, recipe_tags};
use crate::validation::{
    cooking_time_error, name_error, validate_ingredients, validate_name, validate_tags, Catalog,
    IngredientAmount, IngredientAmountInput,
};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::Deserialize;
use utoipa::ToSchema;

pub const NOT_AUTHOR: &str = "You do not have permission to perform this action.";

/// Body of recipe create and update. Every key is optional at the parsing
/// level; which ones are required depends on [`WriteMode`].
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RecipeWriteRequest {
    /// Tag IDs
    pub tags: Option<Vec<i32>>,
    pub ingredients: Option<Vec<IngredientAmountInput>>,
    pub name: Option<String>,
    /// `data:<mime>;base64,<payload>`
    pub image: Option<String>,
    pub text: Option<String>,
    /// Minutes, 1..=32767
    pub cooking_time: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Update,
}

/// A write that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRecipeWrite {
    pub tags: Vec<i32>,
    pub ingredients: Vec<IngredientAmount>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i16>,
}

/// Scalar field checks. Required-ness only applies on create.
pub fn check_fields(req: &RecipeWriteRequest, mode: WriteMode) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    let required = mode == WriteMode::Create;

    match req.name.as_deref() {
        Some(name) => {
            if let Some(message) = name_error(name) {
                errors.add("name", message);
            }
        }
        None if required => errors.add("name", "This field is required."),
        None => {}
    }

    match req.text.as_deref() {
        Some(text) if text.trim().is_empty() => errors.add("text", "This field may not be blank."),
        Some(_) => {}
        None if required => errors.add("text", "This field is required."),
        None => {}
    }

    match req.cooking_time {
        Some(minutes) => {
            if let Some(message) = cooking_time_error(minutes) {
                errors.add("cooking_time", message);
            }
        }
        None if required => errors.add("cooking_time", "This field is required."),
        None => {}
    }

    match req.image.as_deref() {
        Some("") => errors.add("image", "This field may not be blank."),
        Some(_) => {}
        None if required => errors.add("image", "This field is required."),
        None => {}
    }

    errors
}

/// Run every recipe rule. `author_id` is used for the per-author name check
/// on create; renames are guarded by the unique constraint instead.
pub fn validate_write<C: Catalog>(
    catalog: &mut C,
    req: &RecipeWriteRequest,
    mode: WriteMode,
    author_id: i32,
) -> Result<ValidRecipeWrite, ApiError> {
    check_fields(req, mode).into_result()?;

    let tags = validate_tags(catalog, req.tags.as_deref())?;
    let ingredients = validate_ingredients(catalog, req.ingredients.as_deref())?;

    let name = req.name.as_deref().map(str::trim).map(str::to_string);
    if let (WriteMode::Create, Some(name)) = (mode, name.as_deref()) {
        validate_name(catalog, author_id, name)?;
    }

    Ok(ValidRecipeWrite {
        tags,
        ingredients,
        name,
        text: req.text.clone(),
        // range-checked by check_fields
        cooking_time: req.cooking_time.map(|minutes| minutes as i16),
    })
}

/// Decode and store an uploaded image, reporting failures against `image`.
pub fn store_image(media: &MediaStore, data_uri: &str) -> Result<String, ApiError> {
    media.save_recipe_image(data_uri).map_err(|e| match e {
        MediaError::Io(_) => ApiError::Internal(e.to_string()),
        other => ValidationErrors::field("image", other.to_string()).into(),
    })
}

/// Replace the recipe's tag set.
pub fn replace_tags(conn: &mut PgConnection, recipe_id: i32, tag_ids: &[i32]) -> QueryResult<()> {
    diesel::delete(recipe_tags::table.filter(recipe_tags::recipe_id.eq(recipe_id))).execute(conn)?;

    let rows: Vec<NewRecipeTag> = tag_ids
        .iter()
        .map(|&tag_id| NewRecipeTag { recipe_id, tag_id })
        .collect();
    if !rows.is_empty() {
        diesel::insert_into(recipe_tags::table)
            .values(&rows)
            .execute(conn)?;
    }
    Ok(())
}

/// Replace the recipe's ingredient lines.
pub fn replace_ingredients(
    conn: &mut PgConnection,
    recipe_id: i32,
    lines: &[IngredientAmount],
) -> QueryResult<()> {
    diesel::delete(recipe_ingredients::table.filter(recipe_ingredients::recipe_id.eq(recipe_id)))
        .execute(conn)?;

    let rows: Vec<NewRecipeIngredient> = lines
        .iter()
        .map(|line| NewRecipeIngredient {
            recipe_id,
            ingredient_id: line.ingredient_id,
            amount: line.amount,
        })
        .collect();
    if !rows.is_empty() {
        diesel::insert_into(recipe_ingredients::table)
            .values(&rows)
            .execute(conn)?;
    }
    Ok(())
}

/// Map a write failure, turning the per-author name constraint into the
/// same field error the create-time check produces.
pub fn map_write_error(error: ApiError, name: Option<&str>) -> ApiError {
    match error {
        ApiError::Database(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info))
            if info.constraint_name() == Some("unique_author_recipe_name") =>
        {
            ValidationErrors::field(
                "name",
                format!("Recipe named {} already exists.", name.unwrap_or_default()),
            )
            .into()
        }
        other => other,
    }
}
