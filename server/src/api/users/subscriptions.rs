use super::repr::{subscription_responses, SubscriptionResponse};
use crate::auth::AuthUser;
use crate::error::{ApiError, DetailResponse, ValidationErrors};
use crate::models::User;
use crate::schema::{follows, users};
use crate::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use diesel::prelude::*;
use serde::Deserialize;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct SubscriptionsParams {
    /// Maximum number of recipes shown per author
    pub recipes_limit: Option<String>,
}

/// `recipes_limit` must be a non-negative integer when present.
pub fn parse_recipes_limit(raw: Option<&str>) -> Result<Option<usize>, ValidationErrors> {
    match raw {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<usize>()
            .map(Some)
            .map_err(|_| ValidationErrors::field("recipes_limit", "A valid integer is required.")),
    }
}

#[utoipa::path(
    get,
    path = "/api/users/subscriptions/",
    tag = "users",
    params(SubscriptionsParams),
    responses(
        (status = 200, description = "Authors the caller follows, most recent subscription first", body = Vec<SubscriptionResponse>),
        (status = 400, description = "Invalid recipes_limit", body = ValidationErrors),
        (status = 401, description = "Unauthorized", body = DetailResponse)
    ),
    security(("token_auth" = []))
)]
pub async fn list_subscriptions(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(params): Query<SubscriptionsParams>,
) -> Result<Json<Vec<SubscriptionResponse>>, ApiError> {
    let recipes_limit = parse_recipes_limit(params.recipes_limit.as_deref())?;
    let mut conn = state.pool.get()?;

    let authors: Vec<User> = follows::table
        .inner_join(users::table.on(users::id.eq(follows::author_id)))
        .filter(follows::user_id.eq(user.id))
        .order(follows::id.desc())
        .select(User::as_select())
        .load(&mut conn)?;

    let entries = subscription_responses(&mut conn, &state.media, user.id, &authors, recipes_limit)?;
    Ok(Json(entries))
}
