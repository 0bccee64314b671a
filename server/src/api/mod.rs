pub mod auth;
pub mod ingredients;
pub mod json;
pub mod recipes;
pub mod tags;
pub mod users;

use crate::error::{DetailResponse, ErrorsResponse, ValidationErrors};
use crate::AppState;
use axum::Router;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::OpenApi;

/// All `/api` routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(users::router())
        .merge(tags::router())
        .merge(ingredients::router())
        .merge(recipes::router())
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    #[derive(OpenApi)]
    #[openapi(
        info(title = "Foodgram API", description = "Recipes, favorites, shopping carts and subscriptions"),
        components(schemas(ErrorsResponse, DetailResponse, ValidationErrors))
    )]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    if let Some(components) = spec.components.as_mut() {
        components.add_security_scheme(
            "token_auth",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "Authorization",
                "Token <key>",
            ))),
        );
    }

    let modules: Vec<utoipa::openapi::OpenApi> = vec![
        auth::ApiDoc::openapi(),
        users::ApiDoc::openapi(),
        tags::ApiDoc::openapi(),
        ingredients::ApiDoc::openapi(),
        recipes::ApiDoc::openapi(),
    ];

    for module_spec in modules {
        spec.paths.paths.extend(module_spec.paths.paths);

        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_endpoint() {
        let spec = openapi();
        for path in [
            "/api/recipes/",
            "/api/recipes/{id}/",
            "/api/recipes/{id}/favorite/",
            "/api/recipes/{id}/shopping_cart/",
            "/api/recipes/download_shopping_cart/",
            "/api/users/",
            "/api/users/me/",
            "/api/users/{id}/",
            "/api/users/subscriptions/",
            "/api/users/{id}/subscribe/",
            "/api/tags/",
            "/api/tags/{id}/",
            "/api/ingredients/",
            "/api/ingredients/{id}/",
            "/api/auth/token/login/",
            "/api/auth/token/logout/",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_openapi_has_token_scheme() {
        let spec = openapi();
        let components = spec.components.expect("components");
        assert!(components.security_schemes.contains_key("token_auth"));
        assert!(components.schemas.contains_key("RecipeResponse"));
    }

    #[test]
    fn test_recipe_list_documents_filters() {
        let spec = openapi();
        let list = spec.paths.paths["/api/recipes/"].get.as_ref().expect("GET /api/recipes/");
        let mut names: Vec<&str> = list
            .parameters
            .iter()
            .flatten()
            .map(|p| p.name.as_str())
            .collect();
        names.sort_unstable();
        assert_eq!(names, ["author", "is_favorited", "is_in_shopping_cart", "tags"]);
    }
}
