use crate::{
    auth::AuthUser,
    errors::ServiceError,
    handlers::common::{created_response, message_response, success_response},
    services::cart::{AddToCartInput, CartLine, CartView, UpdateCartItemInput},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    routing::{get, put},
    Router,
};
use uuid::Uuid;

/// Creates the router for cart endpoints
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(get_cart).post(add_to_cart).delete(clear_cart))
        .route("/cart/:id", put(update_cart_item).delete(remove_cart_item))
}

#[utoipa::path(
    get,
    path = "/api/v1/cart",
    summary = "Get cart",
    responses(
        (status = 200, description = "Cart lines with line totals and subtotal", body = ApiResponse<CartView>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "cart"
)]
pub async fn get_cart(State(state): State<AppState>, user: AuthUser) -> ApiResult<CartView> {
    let cart = state.services.cart.get_cart(user.user_id).await?;
    Ok(success_response(cart))
}

#[utoipa::path(
    post,
    path = "/api/v1/cart",
    summary = "Add to cart",
    description = "Adds a product or overwrites its quantity. Rejected when the quantity exceeds stock.",
    request_body = AddToCartInput,
    responses(
        (status = 201, description = "Cart line saved", body = ApiResponse<CartLine>),
        (status = 400, description = "Invalid quantity or insufficient stock", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToCartInput>,
) -> Result<(StatusCode, Json<ApiResponse<CartLine>>), ServiceError> {
    let line = state.services.cart.upsert_item(user.user_id, payload).await?;
    Ok(created_response(line))
}

#[utoipa::path(
    put,
    path = "/api/v1/cart/{id}",
    summary = "Update cart line",
    params(("id" = Uuid, Path, description = "Cart line id")),
    request_body = UpdateCartItemInput,
    responses(
        (status = 200, description = "Cart line updated", body = ApiResponse<CartLine>),
        (status = 400, description = "Invalid quantity or insufficient stock", body = crate::errors::ErrorResponse),
        (status = 404, description = "Cart line not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "cart"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCartItemInput>,
) -> ApiResult<CartLine> {
    let line = state
        .services
        .cart
        .update_item(user.user_id, id, payload)
        .await?;
    Ok(success_response(line))
}

#[utoipa::path(
    delete,
    path = "/api/v1/cart/{id}",
    summary = "Remove cart line",
    params(("id" = Uuid, Path, description = "Cart line id")),
    responses(
        (status = 200, description = "Cart line removed"),
        (status = 404, description = "Cart line not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "cart"
)]
pub async fn remove_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    state.services.cart.remove_item(user.user_id, id).await?;
    Ok(message_response("Item removed from cart"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/cart",
    summary = "Clear cart",
    responses(
        (status = 200, description = "All cart lines removed"),
    ),
    security(("Bearer" = [])),
    tag = "cart"
)]
pub async fn clear_cart(State(state): State<AppState>, user: AuthUser) -> ApiResult<()> {
    state.services.cart.clear(user.user_id).await?;
    Ok(message_response("Cart cleared"))
}
