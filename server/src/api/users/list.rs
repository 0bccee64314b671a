use super::repr::{user_responses, UserResponse};
use crate::auth::MaybeUser;
use crate::db::DbPool;
use crate::error::ApiError;
use crate::models::User;
use crate::schema::users;
use axum::{extract::State, Json};
use diesel::prelude::*;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/users/",
    tag = "users",
    responses(
        (status = 200, description = "All users", body = Vec<UserResponse>)
    )
)]
pub async fn list_users(
    MaybeUser(viewer): MaybeUser,
    State(pool): State<Arc<DbPool>>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let mut conn = pool.get()?;

    let all: Vec<User> = users::table
        .order(users::id.asc())
        .select(User::as_select())
        .load(&mut conn)?;

    let viewer_id = viewer.map(|v| v.id);
    Ok(Json(user_responses(&mut conn, viewer_id, &all)?))
}
