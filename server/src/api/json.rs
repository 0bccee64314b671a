use crate::error::{ApiError, ValidationErrors};
use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;

pub const NON_FIELD_ERRORS: &str = "non_field_errors";

const DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

/// `axum::Json` for request bodies, rejecting with 400 field errors instead of
/// axum's plain-text 4xx.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let errors = match &rejection {
            JsonRejection::JsonDataError(_) => {
                let text = rejection.body_text();
                data_errors(text.strip_prefix(DATA_ERROR_PREFIX).unwrap_or(&text))
            }
            _ => ValidationErrors::field(NON_FIELD_ERRORS, rejection.body_text()),
        };
        tracing::debug!(?errors, "rejected request body");
        ApiError::Validation(errors)
    }
}

/// Key a serde error like `ingredients[0].amount: invalid type ... at line 1 column 9`
/// by its top-level field.
fn data_errors(detail: &str) -> ValidationErrors {
    let detail = strip_location(detail);

    if let Some(field) = missing_field(detail) {
        return ValidationErrors::field(field, "This field is required.");
    }

    match detail.split_once(": ") {
        Some((path, message)) if is_field_path(path) => {
            let end = path.find(['.', '[']).unwrap_or(path.len());
            ValidationErrors::field(&path[..end], message)
        }
        _ => ValidationErrors::field(NON_FIELD_ERRORS, detail),
    }
}

fn strip_location(message: &str) -> &str {
    match message.rfind(" at line ") {
        Some(i) => &message[..i],
        None => message,
    }
}

/// `missing field `email`` -> `email`, for top-level fields only.
fn missing_field(message: &str) -> Option<&str> {
    message.strip_prefix("missing field `")?.strip_suffix('`')
}

fn is_field_path(path: &str) -> bool {
    !path.is_empty()
        && !path.starts_with(['.', '['])
        && path
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'))
}
