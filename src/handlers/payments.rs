use crate::{
    auth::AuthUser,
    handlers::common::success_response,
    services::orders::OrderView,
    services::payments::{CreateGatewayOrderInput, GatewayOrder, VerifyPaymentInput},
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Json, State},
    routing::post,
    Router,
};

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/payments/create-order", post(create_gateway_order))
        .route("/payments/verify", post(verify_payment))
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/create-order",
    summary = "Create gateway order",
    description = "Returns a mock gateway order; amounts are converted to minor units",
    request_body = CreateGatewayOrderInput,
    responses(
        (status = 200, description = "Gateway order", body = ApiResponse<GatewayOrder>),
        (status = 400, description = "Amount below 1", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "payments"
)]
pub async fn create_gateway_order(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(payload): Json<CreateGatewayOrderInput>,
) -> ApiResult<GatewayOrder> {
    let order = state.services.payments.create_gateway_order(payload)?;
    Ok(success_response(order))
}

#[utoipa::path(
    post,
    path = "/api/v1/payments/verify",
    summary = "Verify payment",
    description = "Records gateway references and marks the order paid and confirmed",
    request_body = VerifyPaymentInput,
    responses(
        (status = 200, description = "Payment recorded", body = ApiResponse<OrderView>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Order already paid", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "payments"
)]
pub async fn verify_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<VerifyPaymentInput>,
) -> ApiResult<OrderView> {
    let order = state
        .services
        .payments
        .verify_payment(user.user_id, payload)
        .await?;
    Ok(success_response(order))
}
