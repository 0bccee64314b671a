use crate::db::DbPool;
use crate::error::DetailResponse;
use crate::models::User;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::db::get_user_from_token;

/// Extractor that validates the Authorization header and provides the authenticated user.
///
/// Accepts `Token <key>` as well as `Bearer <key>`:
/// ```ignore
/// async fn my_handler(AuthUser(user): AuthUser) -> impl IntoResponse {
///     // user is the authenticated User
/// }
/// ```
pub struct AuthUser(pub User);

/// Like [`AuthUser`], but anonymous requests resolve to `None` instead of 401.
/// A header that is present but invalid is still rejected.
pub struct MaybeUser(pub Option<User>);

/// The raw token from the Authorization header of an authenticated request.
pub struct SessionToken(pub String);

#[derive(Debug)]
pub enum AuthError {
    MissingHeader,
    InvalidHeader,
    InvalidFormat,
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingHeader => "Authentication credentials were not provided.",
            AuthError::InvalidHeader => "Invalid Authorization header",
            AuthError::InvalidFormat => "Invalid Authorization header format",
            AuthError::InvalidToken => "Invalid or expired token",
        };

        (
            StatusCode::UNAUTHORIZED,
            Json(DetailResponse {
                detail: message.to_string(),
            }),
        )
            .into_response()
    }
}

/// Pull the token out of the Authorization header, if there is one.
fn token_from_parts(parts: &Parts) -> Result<Option<&str>, AuthError> {
    let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header.to_str().map_err(|_| AuthError::InvalidHeader)?;

    parse_authorization(auth_str)
        .map(Some)
        .ok_or(AuthError::InvalidFormat)
}

fn parse_authorization(value: &str) -> Option<&str> {
    let token = value
        .strip_prefix("Token ")
        .or_else(|| value.strip_prefix("Bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<DbPool>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pool = Arc::<DbPool>::from_ref(state);

        let token = token_from_parts(parts)?.ok_or(AuthError::MissingHeader)?;

        let user = get_user_from_token(&pool, token).ok_or(AuthError::InvalidToken)?;

        Ok(AuthUser(user))
    }
}

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
    Arc<DbPool>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = token_from_parts(parts)? else {
            return Ok(MaybeUser(None));
        };

        let pool = Arc::<DbPool>::from_ref(state);
        let user = get_user_from_token(&pool, token).ok_or(AuthError::InvalidToken)?;

        Ok(MaybeUser(Some(user)))
    }
}

impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = token_from_parts(parts)?.ok_or(AuthError::MissingHeader)?;
        Ok(SessionToken(token.to_string()))
    }
}
