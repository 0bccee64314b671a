use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::error::{ApiError, DetailResponse, ErrorsResponse};
use crate::shopping_list::export_cart;
use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

pub const CART_FILENAME: &str = "cart.csv";

#[utoipa::path(
    get,
    path = "/api/recipes/download_shopping_cart/",
    tag = "recipes",
    responses(
        (status = 200, description = "Ingredient totals for every recipe in the cart", content_type = "text/csv", body = String),
        (status = 400, description = "Shopping cart is empty", body = ErrorsResponse),
        (status = 401, description = "Unauthorized", body = DetailResponse)
    ),
    security(("token_auth" = []))
)]
pub async fn download_shopping_cart(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
) -> Result<Response, ApiError> {
    let mut conn = pool.get()?;
    let body = export_cart(&mut *conn, user.id)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment;filename={CART_FILENAME}"),
            ),
        ],
        body,
    )
        .into_response())
}
