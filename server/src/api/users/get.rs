use super::repr::{followed_authors, UserResponse};
use crate::auth::MaybeUser;
use crate::db::DbPool;
use crate::error::{ApiError, DetailResponse};
use crate::models::User;
use crate::schema::users;
use axum::{
    extract::{Path, State},
    Json,
};
use diesel::prelude::*;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/users/{id}/",
    tag = "users",
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 404, description = "User not found", body = DetailResponse)
    )
)]
pub async fn get_user(
    MaybeUser(viewer): MaybeUser,
    State(pool): State<Arc<DbPool>>,
    Path(id): Path<i32>,
) -> Result<Json<UserResponse>, ApiError> {
    let mut conn = pool.get()?;

    let user: User = users::table
        .find(id)
        .select(User::as_select())
        .first(&mut conn)?;

    let followed = followed_authors(&mut conn, viewer.map(|v| v.id), &[user.id])?;
    Ok(Json(UserResponse::new(&user, followed.contains(&user.id))))
}
