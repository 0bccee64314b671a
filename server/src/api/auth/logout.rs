use crate::auth::{delete_session, AuthUser, SessionToken};
use crate::db::DbPool;
use crate::error::{ApiError, DetailResponse};
use axum::{extract::State, http::StatusCode};
use std::sync::Arc;

#[utoipa::path(
    post,
    path = "/api/auth/token/logout/",
    tag = "auth",
    responses(
        (status = 204, description = "Token revoked"),
        (status = 401, description = "Unauthorized", body = DetailResponse)
    ),
    security(("token_auth" = []))
)]
pub async fn logout(
    AuthUser(user): AuthUser,
    SessionToken(token): SessionToken,
    State(pool): State<Arc<DbPool>>,
) -> Result<StatusCode, ApiError> {
    let mut conn = pool.get()?;
    delete_session(&mut conn, &token)?;
    tracing::info!(user_id = user.id, "revoked auth token");
    Ok(StatusCode::NO_CONTENT)
}
