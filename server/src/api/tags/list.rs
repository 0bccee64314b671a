use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::Tag;
use crate::schema::tags;
use axum::{extract::State, Json};
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TagResponse {
    pub id: i32,
    pub name: String,
    /// Hex color, e.g. `#FF0000`
    pub color: String,
    pub slug: String,
}

impl From<Tag> for TagResponse {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
            color: tag.color,
            slug: tag.slug,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/tags/",
    tag = "tags",
    responses(
        (status = 200, description = "All tags", body = Vec<TagResponse>)
    )
)]
pub async fn list_tags(State(pool): State<Arc<DbPool>>) -> Result<Json<Vec<TagResponse>>, ApiError> {
    let mut conn = pool.get()?;

    let tags: Vec<Tag> = tags::table
        .order(tags::id.asc())
        .select(Tag::as_select())
        .load(&mut conn)?;

    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}
