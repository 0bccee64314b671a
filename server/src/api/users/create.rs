use crate::api::json::JsonBody;
use crate::auth::hash_password;
use crate::db::DbPool;
use crate::error::{ApiError, ValidationErrors};
use crate::models::{NewUser, User};
use crate::schema::users;
use axum::{extract::State, http::StatusCode, Json};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

const MAX_NAME_LEN: usize = 150;
const MAX_EMAIL_LEN: usize = 254;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CreateUserResponse {
    pub id: i32,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<User> for CreateUserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

/// Letters, digits and `.@+-_`.
fn is_valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '.' | '@' | '+' | '-' | '_'))
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Check every field, collecting all problems at once.
fn check_fields(req: &CreateUserRequest) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    let fields = [
        ("email", &req.email, MAX_EMAIL_LEN),
        ("username", &req.username, MAX_NAME_LEN),
        ("first_name", &req.first_name, MAX_NAME_LEN),
        ("last_name", &req.last_name, MAX_NAME_LEN),
    ];
    for (field, value, max_len) in fields {
        match value.as_deref().map(str::trim) {
            None => errors.add(field, "This field is required."),
            Some("") => errors.add(field, "This field may not be blank."),
            Some(v) if v.chars().count() > max_len => errors.add(
                field,
                format!("Ensure this field has no more than {max_len} characters."),
            ),
            Some(_) => {}
        }
    }

    if let Some(email) = req.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        if !is_plausible_email(email) {
            errors.add("email", "Enter a valid email address.");
        }
    }

    if let Some(username) = req.username.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        if !is_valid_username(username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }
    }

    match req.password.as_deref() {
        None => errors.add("password", "This field is required."),
        Some("") => errors.add("password", "This field may not be blank."),
        Some(_) => {}
    }

    errors
}

/// Translate a unique violation on `users` into a field error. Emails are
/// unique ignoring case through the `LOWER(email)` index.
fn duplicate_field(error: &DieselError) -> Option<ValidationErrors> {
    let DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) = error else {
        return None;
    };
    match info.constraint_name() {
        Some("users_email_lower_key") => Some(ValidationErrors::field(
            "email",
            "A user with that email already exists.",
        )),
        Some("users_username_key") => Some(ValidationErrors::field(
            "username",
            "A user with that username already exists.",
        )),
        _ => None,
    }
}

#[utoipa::path(
    post,
    path = "/api/users/",
    tag = "users",
    request_body(content = CreateUserRequest, example = json!({
        "email": "cook@example.com",
        "username": "cook",
        "first_name": "Julia",
        "last_name": "Child",
        "password": "password"
    })),
    responses(
        (status = 201, description = "User created", body = CreateUserResponse),
        (status = 400, description = "Invalid fields", body = ValidationErrors)
    )
)]
pub async fn create_user(
    State(pool): State<Arc<DbPool>>,
    JsonBody(req): JsonBody<CreateUserRequest>,
) -> Result<(StatusCode, Json<CreateUserResponse>), ApiError> {
    check_fields(&req).into_result()?;

    // all present after check_fields
    let email = req.email.as_deref().unwrap_or_default().trim();
    let username = req.username.as_deref().unwrap_or_default().trim();
    let first_name = req.first_name.as_deref().unwrap_or_default().trim();
    let last_name = req.last_name.as_deref().unwrap_or_default().trim();
    let password = req.password.as_deref().unwrap_or_default();

    let password_hash = hash_password(password)
        .map_err(|e| ApiError::Internal(format!("failed to hash password: {e}")))?;

    let mut conn = pool.get()?;

    let new_user = NewUser {
        email,
        username,
        first_name,
        last_name,
        password_hash: &password_hash,
    };

    let user: User = diesel::insert_into(users::table)
        .values(&new_user)
        .returning(User::as_returning())
        .get_result(&mut conn)
        .map_err(|e| match duplicate_field(&e) {
            Some(errors) => ApiError::Validation(errors),
            None => e.into(),
        })?;

    tracing::info!(user_id = user.id, "registered user");

    Ok((StatusCode::CREATED, Json(user.into())))
}
