pub mod get;
pub mod list;

use crate::AppState;
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

/// Read-only tag endpoints, open to anonymous users
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tags/", get(list::list_tags))
        .route("/api/tags/{id}/", get(get::get_tag))
}

#[derive(OpenApi)]
#[openapi(
    paths(list::list_tags, get::get_tag),
    components(schemas(list::TagResponse))
)]
pub struct ApiDoc;
