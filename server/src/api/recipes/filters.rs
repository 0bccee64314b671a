use crate::error::ValidationErrors;
use utoipa::IntoParams;

/// Parsed recipe list filter. Also documents the query parameters; the
/// handler reads raw pairs so that `tags` may repeat.
#[derive(Debug, Default, Clone, PartialEq, Eq, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecipeFilter {
    /// Only recipes the caller has favorited (`1`/`true`) or not (`0`/`false`)
    pub is_favorited: Option<bool>,
    /// Only recipes in the caller's shopping cart (`1`/`true`) or not (`0`/`false`)
    pub is_in_shopping_cart: Option<bool>,
    /// Author user ID
    pub author: Option<i32>,
    /// Tag slug; repeat to match recipes having any of several tags
    #[param(required = false, explode)]
    pub tags: Vec<String>,
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// Build a filter from raw query pairs. Unknown keys are ignored; empty
/// values mean "no filter".
pub fn parse_filter(pairs: &[(String, String)]) -> Result<RecipeFilter, ValidationErrors> {
    let mut filter = RecipeFilter::default();
    let mut errors = ValidationErrors::new();

    for (key, value) in pairs {
        let value = value.trim();
        match key.as_str() {
            "tags" => {
                if !value.is_empty() && !filter.tags.iter().any(|t| t == value) {
                    filter.tags.push(value.to_string());
                }
            }
            "is_favorited" | "is_in_shopping_cart" if !value.is_empty() => match parse_bool(value) {
                Some(flag) if key == "is_favorited" => filter.is_favorited = Some(flag),
                Some(flag) => filter.is_in_shopping_cart = Some(flag),
                None => errors.add(key, "Select a valid choice."),
            },
            "author" if !value.is_empty() => match value.parse::<i32>() {
                Ok(id) => filter.author = Some(id),
                Err(_) => errors.add(key, "Enter a number."),
            },
            _ => {}
        }
    }

    if errors.is_empty() {
        Ok(filter)
    } else {
        Err(errors)
    }
}
