use crate::api::json::{JsonBody, NON_FIELD_ERRORS};
use crate::auth::{create_session, verify_password};
use crate::error::{ApiError, ValidationErrors};
use crate::models::User;
use crate::schema::users;
use crate::AppState;
use axum::{extract::State, Json};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const BAD_CREDENTIALS: &str = "Unable to log in with provided credentials.";

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub auth_token: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/token/login/",
    tag = "auth",
    request_body(content = LoginRequest, example = json!({"email": "cook@example.com", "password": "password"})),
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Invalid credentials", body = ValidationErrors)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let mut conn = state.pool.get()?;

    let user: Option<User> = users::table
        .filter(
            diesel::dsl::sql::<diesel::sql_types::Bool>("LOWER(email) = LOWER(")
                .bind::<diesel::sql_types::Text, _>(&req.email)
                .sql(")"),
        )
        .select(User::as_select())
        .first(&mut conn)
        .optional()?;

    let Some(user) = user.filter(|u| verify_password(&req.password, &u.password_hash)) else {
        return Err(ValidationErrors::field(NON_FIELD_ERRORS, BAD_CREDENTIALS).into());
    };

    let auth_token = create_session(&mut conn, user.id, state.session_ttl_days)?;
    tracing::info!(user_id = user.id, "issued auth token");

    Ok(Json(LoginResponse { auth_token }))
}
