use super::repr::{subscription_responses, SubscriptionResponse};
use crate::auth::AuthUser;
use crate::error::{ApiError, DetailResponse, ErrorsResponse};
use crate::membership::{self, Follows};
use crate::models::User;
use crate::schema::users;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use diesel::prelude::*;

#[utoipa::path(
    post,
    path = "/api/users/{id}/subscribe/",
    tag = "users",
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 201, description = "Subscribed", body = SubscriptionResponse),
        (status = 400, description = "Already subscribed or subscribing to self", body = ErrorsResponse),
        (status = 401, description = "Unauthorized", body = DetailResponse),
        (status = 404, description = "Author not found", body = DetailResponse)
    ),
    security(("token_auth" = []))
)]
pub async fn subscribe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<(StatusCode, Json<SubscriptionResponse>), ApiError> {
    let mut conn = state.pool.get()?;

    let author: User = users::table
        .find(id)
        .select(User::as_select())
        .first(&mut conn)?;

    membership::follow(&mut Follows(&mut conn), user.id, author.id)?;
    tracing::info!(user_id = user.id, author_id = author.id, "subscribed");

    let entry = subscription_responses(&mut conn, &state.media, user.id, &[author], None)?
        .into_iter()
        .next()
        .ok_or(ApiError::NotFound)?;

    Ok((StatusCode::CREATED, Json(entry)))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}/subscribe/",
    tag = "users",
    params(
        ("id" = i32, Path, description = "Author ID")
    ),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 400, description = "Not subscribed", body = ErrorsResponse),
        (status = 401, description = "Unauthorized", body = DetailResponse),
        (status = 404, description = "Author not found", body = DetailResponse)
    ),
    security(("token_auth" = []))
)]
pub async fn unsubscribe(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let mut conn = state.pool.get()?;

    let author_id: i32 = users::table
        .find(id)
        .select(users::id)
        .first(&mut conn)?;

    membership::remove(&mut Follows(&mut conn), user.id, author_id)?;
    tracing::info!(user_id = user.id, author_id, "unsubscribed");

    Ok(StatusCode::NO_CONTENT)
}
