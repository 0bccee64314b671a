use super::repr::UserResponse;
use crate::auth::AuthUser;
use crate::error::DetailResponse;
use axum::Json;

#[utoipa::path(
    get,
    path = "/api/users/me/",
    tag = "users",
    responses(
        (status = 200, description = "The caller's profile", body = UserResponse),
        (status = 401, description = "Unauthorized", body = DetailResponse)
    ),
    security(("token_auth" = []))
)]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    // nobody can follow themselves
    Json(UserResponse::new(&user, false))
}
