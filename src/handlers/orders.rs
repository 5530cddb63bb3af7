use crate::{
    auth::AuthUser,
    entities::PaymentMethod,
    errors::ServiceError,
    handlers::common::{created_response, success_response, PaginationParams},
    services::orders::{OrderView, PlaceOrderCommand, ShippingDetails},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub fn orders_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/:id", get(get_order))
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Checkout payload
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    /// `online` or `cash-on-delivery` (`razorpay` and `cod` are accepted too)
    pub payment_method: PaymentMethod,
    #[validate(length(max = 255), custom = "not_blank")]
    pub shipping_name: String,
    #[validate(email(message = "must be a valid email address"))]
    pub shipping_email: String,
    #[validate(length(max = 15), custom = "not_blank")]
    pub shipping_mobile: String,
    #[validate(custom = "not_blank")]
    pub shipping_address: String,
    #[validate(length(max = 255), custom = "not_blank")]
    pub shipping_city: String,
    #[validate(length(max = 255), custom = "not_blank")]
    pub shipping_state: String,
    #[serde(alias = "shipping_pincode")]
    #[validate(length(max = 10), custom = "not_blank")]
    pub shipping_postal_code: String,
    #[validate(length(max = 255))]
    pub shipping_country: Option<String>,
    pub notes: Option<String>,
}

impl CreateOrderRequest {
    /// Validates the payload and binds it to the caller.
    pub fn into_command(
        self,
        user_id: Uuid,
        default_country: &str,
    ) -> Result<PlaceOrderCommand, ServiceError> {
        self.validate()?;

        let country = self
            .shipping_country
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| default_country.to_string());

        Ok(PlaceOrderCommand {
            user_id,
            payment_method: self.payment_method,
            shipping: ShippingDetails {
                name: self.shipping_name.trim().to_string(),
                email: self.shipping_email.trim().to_string(),
                mobile: self.shipping_mobile.trim().to_string(),
                address: self.shipping_address.trim().to_string(),
                city: self.shipping_city.trim().to_string(),
                state: self.shipping_state.trim().to_string(),
                postal_code: self.shipping_postal_code.trim().to_string(),
                country,
            },
            notes: self.notes.filter(|n| !n.trim().is_empty()),
        })
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/orders",
    summary = "Place order",
    description = "Converts the caller's cart into an order, decrementing stock and clearing the cart atomically",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = ApiResponse<OrderView>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid shipping details, empty cart or insufficient stock", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 500, description = "Order could not be placed", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderView>>), ServiceError> {
    let command = request.into_command(user.user_id, &state.config.default_shipping_country)?;
    let order = state.services.orders.place_order(command).await?;
    Ok(created_response(order))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders",
    summary = "List orders",
    description = "The caller's orders, newest first",
    params(PaginationParams),
    responses(
        (status = 200, description = "Orders retrieved", body = ApiResponse<PaginatedResponse<OrderView>>),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<PaginationParams>,
) -> ApiResult<PaginatedResponse<OrderView>> {
    let orders = state
        .services
        .orders
        .list_orders(user.user_id, params.page, params.per_page)
        .await?;
    Ok(success_response(orders))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    summary = "Get order",
    params(("id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<OrderView>),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<OrderView> {
    let order = state.services.orders.get_order(user.user_id, id).await?;
    Ok(success_response(order))
}
