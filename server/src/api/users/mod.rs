pub mod create;
pub mod get;
pub mod list;
pub mod me;
pub mod repr;
pub mod subscribe;
pub mod subscriptions;

use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

/// Accounts, profiles and author subscriptions
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users/", get(list::list_users).post(create::create_user))
        .route("/api/users/me/", get(me::get_me))
        .route(
            "/api/users/subscriptions/",
            get(subscriptions::list_subscriptions),
        )
        .route("/api/users/{id}/", get(get::get_user))
        .route(
            "/api/users/{id}/subscribe/",
            post(subscribe::subscribe).delete(subscribe::unsubscribe),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create::create_user,
        list::list_users,
        get::get_user,
        me::get_me,
        subscriptions::list_subscriptions,
        subscribe::subscribe,
        subscribe::unsubscribe,
    ),
    components(schemas(
        create::CreateUserRequest,
        create::CreateUserResponse,
        repr::UserResponse,
        repr::SubscriptionResponse,
    ))
)]
pub struct ApiDoc;
