use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::common::{created_response, message_response, success_response},
    services::catalog::ProductView,
    services::wishlist::{AddToWishlistInput, WishlistStatus},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Router,
};
use uuid::Uuid;

pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/wishlist", get(list_wishlist).post(add_to_wishlist))
        .route("/wishlist/:product_id", delete(remove_from_wishlist))
        .route("/wishlist/toggle/:product_id", post(toggle_wishlist))
}

#[utoipa::path(
    get,
    path = "/api/v1/wishlist",
    summary = "List wishlist",
    responses(
        (status = 200, description = "Wishlisted products", body = ApiResponse<Vec<ProductView>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "wishlist"
)]
pub async fn list_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<ProductView>> {
    let products = state.services.wishlist.list(user.user_id).await?;
    Ok(success_response(products))
}

#[utoipa::path(
    post,
    path = "/api/v1/wishlist",
    summary = "Add to wishlist",
    description = "Idempotent: adding a product twice keeps a single entry",
    request_body = AddToWishlistInput,
    responses(
        (status = 201, description = "Product is in the wishlist", body = ApiResponse<WishlistStatus>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "wishlist"
)]
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToWishlistInput>,
) -> Result<(StatusCode, Json<ApiResponse<WishlistStatus>>), ServiceError> {
    let status = state
        .services
        .wishlist
        .add(user.user_id, payload.product_id)
        .await?;
    Ok(created_response(status))
}

#[utoipa::path(
    delete,
    path = "/api/v1/wishlist/{product_id}",
    summary = "Remove from wishlist",
    params(("product_id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Removed"),
        (status = 404, description = "Product is not in the wishlist", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "wishlist"
)]
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> ApiResult<()> {
    state
        .services
        .wishlist
        .remove(user.user_id, product_id)
        .await?;
    Ok(message_response("Removed from wishlist"))
}

#[utoipa::path(
    post,
    path = "/api/v1/wishlist/toggle/{product_id}",
    summary = "Toggle wishlist entry",
    params(("product_id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 201, description = "Added", body = ApiResponse<WishlistStatus>),
        (status = 200, description = "Removed", body = ApiResponse<WishlistStatus>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "wishlist"
)]
pub async fn toggle_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<WishlistStatus>>), ServiceError> {
    let status = state
        .services
        .wishlist
        .toggle(user.user_id, product_id)
        .await?;

    let code = if status.in_wishlist {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((code, Json(ApiResponse::success(status))))
}
