use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use utoipa::ToSchema;

/// Body for conflicts on relation toggles and other request-level refusals.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorsResponse {
    pub errors: String,
}

/// Body for 401/403/404/500 responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DetailResponse {
    pub detail: String,
}

/// Field-keyed validation messages, rendered as `{"field": ["message", ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when nothing was recorded, otherwise the collected errors.
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self))
        }
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("validation failed: {0:?}")]
    Validation(ValidationErrors),

    #[error("{0}")]
    Conflict(String),

    #[error("Not found.")]
    NotFound,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl ApiError {
    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            ApiError::Conflict(errors) => {
                (StatusCode::BAD_REQUEST, Json(ErrorsResponse { errors })).into_response()
            }
            ApiError::NotFound | ApiError::Database(diesel::result::Error::NotFound) => (
                StatusCode::NOT_FOUND,
                Json(DetailResponse {
                    detail: "Not found.".to_string(),
                }),
            )
                .into_response(),
            ApiError::Forbidden(detail) => (
                StatusCode::FORBIDDEN,
                Json(DetailResponse {
                    detail: detail.to_string(),
                }),
            )
                .into_response(),
            ApiError::Database(_) | ApiError::Pool(_) | ApiError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(DetailResponse {
                        detail: "Internal server error".to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_collect_per_field() {
        let mut errors = ValidationErrors::new();
        errors.add("name", "first");
        errors.add("name", "second");
        errors.add("tags", "missing");

        assert_eq!(errors.get("name").unwrap(), ["first", "second"]);
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            serde_json::json!({"name": ["first", "second"], "tags": ["missing"]})
        );
    }

    #[test]
    fn test_empty_validation_errors_are_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
        assert!(ValidationErrors::field("name", "bad").into_result().is_err());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::conflict("dup").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Database(diesel::result::Error::NotFound)
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Forbidden("no").into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::Internal("boom".to_string())
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
