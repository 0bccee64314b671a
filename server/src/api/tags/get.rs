use super::list::TagResponse;
use crate::db::DbPool;
use crate::error::{ApiError, DetailResponse};
use crate::models::Tag;
use crate::schema::tags;
use axum::{
    extract::{Path, State},
    Json,
};
use diesel::prelude::*;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/tags/{id}/",
    tag = "tags",
    params(
        ("id" = i32, Path, description = "Tag ID")
    ),
    responses(
        (status = 200, description = "Tag details", body = TagResponse),
        (status = 404, description = "Tag not found", body = DetailResponse)
    )
)]
pub async fn get_tag(
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<i32>,
) -> Result<Json<TagResponse>, ApiError> {
    let mut conn = pool.get()?;

    let tag: Tag = tags::table
        .find(id)
        .select(Tag::as_select())
        .first(&mut conn)?;

    Ok(Json(tag.into()))
}
