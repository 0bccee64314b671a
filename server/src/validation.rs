//! Checks applied to recipe writes and tag creation.
//!
//! Lookups against stored tags, ingredients and recipes go through the
//! [`Catalog`] trait so the rules can be exercised without a database.

use crate::error::{ApiError, ValidationErrors};
use crate::schema::{ingredients, recipes, tags};
use diesel::prelude::*;
use serde::Deserialize;
use std::collections::HashSet;
use utoipa::ToSchema;

/// Upper bound shared by amounts and cooking times (they are stored as SMALLINT).
pub const MAX_SMALL_POSITIVE: i32 = i16::MAX as i32;

pub const MAX_RECIPE_NAME_LEN: usize = 200;

/// One `{id, amount}` entry of a recipe write. Both keys are optional here so
/// that a missing key is reported as a field error instead of a body rejection.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct IngredientAmountInput {
    pub id: Option<i32>,
    pub amount: Option<i32>,
}

/// A validated ingredient line, ready to be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientAmount {
    pub ingredient_id: i32,
    pub amount: i16,
}

/// Existence lookups needed by recipe validation.
pub trait Catalog {
    /// The subset of `ids` that refer to stored tags.
    fn existing_tag_ids(&mut self, ids: &[i32]) -> QueryResult<HashSet<i32>>;

    /// The subset of `ids` that refer to stored ingredients.
    fn existing_ingredient_ids(&mut self, ids: &[i32]) -> QueryResult<HashSet<i32>>;

    fn author_has_recipe_named(&mut self, author_id: i32, name: &str) -> QueryResult<bool>;
}

impl Catalog for PgConnection {
    fn existing_tag_ids(&mut self, ids: &[i32]) -> QueryResult<HashSet<i32>> {
        let found: Vec<i32> = tags::table
            .filter(tags::id.eq_any(ids))
            .select(tags::id)
            .load(self)?;
        Ok(found.into_iter().collect())
    }

    fn existing_ingredient_ids(&mut self, ids: &[i32]) -> QueryResult<HashSet<i32>> {
        let found: Vec<i32> = ingredients::table
            .filter(ingredients::id.eq_any(ids))
            .select(ingredients::id)
            .load(self)?;
        Ok(found.into_iter().collect())
    }

    fn author_has_recipe_named(&mut self, author_id: i32, name: &str) -> QueryResult<bool> {
        diesel::select(diesel::dsl::exists(
            recipes::table
                .filter(recipes::author_id.eq(author_id))
                .filter(recipes::name.eq(name)),
        ))
        .get_result(self)
    }
}

/// Tags must be present and every id must exist. Repeated ids collapse to one.
pub fn validate_tags<C: Catalog>(catalog: &mut C, tags: Option<&[i32]>) -> Result<Vec<i32>, ApiError> {
    let Some(tags) = tags else {
        return Err(ValidationErrors::field("tags", "This field is required.").into());
    };

    let mut seen = HashSet::new();
    let unique: Vec<i32> = tags.iter().copied().filter(|id| seen.insert(*id)).collect();

    let existing = catalog.existing_tag_ids(&unique)?;
    if let Some(missing) = unique.iter().find(|id| !existing.contains(*id)) {
        return Err(ValidationErrors::field("tags", format!("Tag with id={missing} not found.")).into());
    }

    Ok(unique)
}

/// Ingredients must be present, non-empty, free of repeats, carry both `id`
/// and a positive `amount`, and reference stored ingredients.
pub fn validate_ingredients<C: Catalog>(
    catalog: &mut C,
    items: Option<&[IngredientAmountInput]>,
) -> Result<Vec<IngredientAmount>, ApiError> {
    let Some(items) = items else {
        return Err(ValidationErrors::field("ingredients", "This field is required.").into());
    };

    if items.is_empty() {
        return Err(ValidationErrors::field("ingredients", "Ingredient list is empty.").into());
    }

    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        let (Some(ingredient_id), Some(amount)) = (item.id, item.amount) else {
            return Err(ValidationErrors::field(
                "ingredients",
                "Each ingredient needs both `id` and `amount`.",
            )
            .into());
        };
        lines.push((ingredient_id, amount));
    }

    let mut seen = HashSet::new();
    if !lines.iter().all(|(id, _)| seen.insert(*id)) {
        return Err(ValidationErrors::field(
            "ingredients",
            "Ingredient list must not contain repeats.",
        )
        .into());
    }

    if let Some((id, amount)) = lines
        .iter()
        .find(|(_, amount)| !(1..=MAX_SMALL_POSITIVE).contains(amount))
    {
        return Err(ValidationErrors::field(
            "ingredients",
            format!("Amount for ingredient id={id} must be between 1 and {MAX_SMALL_POSITIVE}, got {amount}."),
        )
        .into());
    }

    let ids: Vec<i32> = lines.iter().map(|(id, _)| *id).collect();
    let existing = catalog.existing_ingredient_ids(&ids)?;
    if let Some(missing) = ids.iter().find(|id| !existing.contains(*id)) {
        return Err(ValidationErrors::field(
            "ingredients",
            format!("Ingredient with id={missing} not found."),
        )
        .into());
    }

    Ok(lines
        .into_iter()
        .map(|(ingredient_id, amount)| IngredientAmount {
            ingredient_id,
            // range-checked above
            amount: amount as i16,
        })
        .collect())
}

/// Only used on create: an author cannot publish two recipes with the same name.
pub fn validate_name<C: Catalog>(catalog: &mut C, author_id: i32, name: &str) -> Result<(), ApiError> {
    if catalog.author_has_recipe_named(author_id, name)? {
        return Err(ValidationErrors::field("name", format!("Recipe named {name} already exists.")).into());
    }
    Ok(())
}

pub fn name_error(name: &str) -> Option<String> {
    if name.trim().is_empty() {
        Some("This field may not be blank.".to_string())
    } else if name.chars().count() > MAX_RECIPE_NAME_LEN {
        Some(format!(
            "Ensure this field has no more than {MAX_RECIPE_NAME_LEN} characters."
        ))
    } else {
        None
    }
}

pub fn cooking_time_error(minutes: i32) -> Option<String> {
    if minutes < 1 {
        Some("Cooking time must be at least 1 minute.".to_string())
    } else if minutes > MAX_SMALL_POSITIVE {
        Some(format!("Cooking time must not exceed {MAX_SMALL_POSITIVE} minutes."))
    } else {
        None
    }
}

/// `#` followed by 3 to 6 hex digits.
pub fn is_hex_color(color: &str) -> bool {
    let Some(digits) = color.strip_prefix('#') else {
        return false;
    };
    (3..=6).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// Letters, digits, hyphens and underscores only.
pub fn is_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[derive(Default)]
    struct FakeCatalog {
        tags: HashSet<i32>,
        ingredients: HashSet<i32>,
        recipes: HashSet<(i32, String)>,
    }

    impl Catalog for FakeCatalog {
        fn existing_tag_ids(&mut self, ids: &[i32]) -> QueryResult<HashSet<i32>> {
            Ok(ids.iter().copied().filter(|id| self.tags.contains(id)).collect())
        }

        fn existing_ingredient_ids(&mut self, ids: &[i32]) -> QueryResult<HashSet<i32>> {
            Ok(ids
                .iter()
                .copied()
                .filter(|id| self.ingredients.contains(id))
                .collect())
        }

        fn author_has_recipe_named(&mut self, author_id: i32, name: &str) -> QueryResult<bool> {
            Ok(self.recipes.contains(&(author_id, name.to_string())))
        }
    }

    fn catalog() -> FakeCatalog {
        FakeCatalog {
            tags: [1, 2, 3].into(),
            ingredients: [10, 11, 12].into(),
            recipes: [(7, "Borscht".to_string())].into(),
        }
    }

    fn line(id: i32, amount: i32) -> IngredientAmountInput {
        IngredientAmountInput {
            id: Some(id),
            amount: Some(amount),
        }
    }

    fn field_message(err: ApiError, field: &str) -> String {
        match err {
            ApiError::Validation(errors) => errors.get(field).expect("field error")[0].clone(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_tags_required() {
        let err = validate_tags(&mut catalog(), None).unwrap_err();
        assert_eq!(field_message(err, "tags"), "This field is required.");
    }

    #[test]
    fn test_unknown_tag_rejected() {
        let err = validate_tags(&mut catalog(), Some(&[1, 99][..])).unwrap_err();
        assert_eq!(field_message(err, "tags"), "Tag with id=99 not found.");
    }

    #[test]
    fn test_tags_deduplicated_in_order() {
        let tags = validate_tags(&mut catalog(), Some(&[3, 1, 3][..])).unwrap();
        assert_eq!(tags, vec![3, 1]);
    }

    #[test]
    fn test_empty_tag_list_is_allowed() {
        assert!(validate_tags(&mut catalog(), Some(&[][..])).unwrap().is_empty());
    }

    #[test]
    fn test_ingredients_required_and_non_empty() {
        let err = validate_ingredients(&mut catalog(), None).unwrap_err();
        assert_eq!(field_message(err, "ingredients"), "This field is required.");

        let err = validate_ingredients(&mut catalog(), Some(&[][..])).unwrap_err();
        assert_eq!(field_message(err, "ingredients"), "Ingredient list is empty.");
    }

    #[test]
    fn test_duplicate_ingredient_rejected() {
        let items = [line(10, 100), line(11, 5), line(10, 3)];
        let err = validate_ingredients(&mut catalog(), Some(&items[..])).unwrap_err();
        assert_eq!(
            field_message(err, "ingredients"),
            "Ingredient list must not contain repeats."
        );
    }

    #[test]
    fn test_missing_keys_rejected() {
        let items = [
            line(10, 100),
            IngredientAmountInput {
                id: Some(11),
                amount: None,
            },
        ];
        let err = validate_ingredients(&mut catalog(), Some(&items[..])).unwrap_err();
        assert!(field_message(err, "ingredients").contains("`id` and `amount`"));

        let items = [IngredientAmountInput {
            id: None,
            amount: Some(1),
        }];
        assert!(validate_ingredients(&mut catalog(), Some(&items[..])).is_err());
    }

    #[test]
    fn test_unknown_ingredient_rejected() {
        let items = [line(10, 100), line(404, 1)];
        let err = validate_ingredients(&mut catalog(), Some(&items[..])).unwrap_err();
        assert_eq!(
            field_message(err, "ingredients"),
            "Ingredient with id=404 not found."
        );
    }

    #[test]
    fn test_amount_bounds() {
        assert!(validate_ingredients(&mut catalog(), Some(&[line(10, 0)][..])).is_err());
        assert!(validate_ingredients(&mut catalog(), Some(&[line(10, 40_000)][..])).is_err());
        let ok = validate_ingredients(&mut catalog(), Some(&[line(10, 32_767)][..])).unwrap();
        assert_eq!(ok[0].amount, i16::MAX);
    }

    #[test]
    fn test_valid_ingredients_keep_order() {
        let items = [line(12, 3), line(10, 250)];
        let lines = validate_ingredients(&mut catalog(), Some(&items[..])).unwrap();
        assert_eq!(
            lines,
            vec![
                IngredientAmount {
                    ingredient_id: 12,
                    amount: 3
                },
                IngredientAmount {
                    ingredient_id: 10,
                    amount: 250
                },
            ]
        );
    }

    #[test]
    fn test_duplicate_name_per_author() {
        let err = validate_name(&mut catalog(), 7, "Borscht").unwrap_err();
        assert_eq!(field_message(err, "name"), "Recipe named Borscht already exists.");

        // same name, different author
        assert!(validate_name(&mut catalog(), 8, "Borscht").is_ok());
        assert!(validate_name(&mut catalog(), 7, "Pelmeni").is_ok());
    }

    #[test]
    fn test_name_and_cooking_time_rules() {
        assert!(name_error("Soup").is_none());
        assert!(name_error("   ").is_some());
        assert!(name_error(&"x".repeat(201)).is_some());
        assert!(cooking_time_error(1).is_none());
        assert!(cooking_time_error(0).is_some());
        assert!(cooking_time_error(-5).is_some());
        assert!(cooking_time_error(40_000).is_some());
    }

    #[test]
    fn test_hex_color() {
        assert!(is_hex_color("#FF0000"));
        assert!(is_hex_color("#fff"));
        assert!(is_hex_color("#6600cc"));
        assert!(!is_hex_color("notacolor"));
        assert!(!is_hex_color("FF0000"));
        assert!(!is_hex_color("#ff"));
        assert!(!is_hex_color("#FF00000"));
        assert!(!is_hex_color("#GGGGGG"));
    }

    #[test]
    fn test_slug() {
        assert!(is_slug("breakfast"));
        assert!(is_slug("quick-lunch_2"));
        assert!(!is_slug(""));
        assert!(!is_slug("two words"));
        assert!(!is_slug("завтрак"));
    }
}
