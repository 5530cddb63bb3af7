use crate::{
    auth::OptionalAuthUser,
    errors::ServiceError,
    handlers::common::success_response,
    services::catalog::{ProductFilter, ProductView},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Router,
};
use uuid::Uuid;

/// Public catalog routes
pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/featured", get(featured_products))
        .route("/products/:id", get(get_product))
        .route("/products/:id/related", get(related_products))
}

#[utoipa::path(
    get,
    path = "/api/v1/products",
    summary = "List products",
    description = "Active products with optional filters, sorting and pagination",
    params(ProductFilter),
    responses(
        (status = 200, description = "Products retrieved", body = ApiResponse<PaginatedResponse<ProductView>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid query", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    Query(filter): Query<ProductFilter>,
) -> ApiResult<PaginatedResponse<ProductView>> {
    let page = state
        .services
        .catalog
        .list_products(filter, viewer.user_id())
        .await?;
    Ok(success_response(page))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/featured",
    summary = "Featured products",
    responses(
        (status = 200, description = "Featured products", body = ApiResponse<Vec<ProductView>>),
    ),
    tag = "products"
)]
pub async fn featured_products(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
) -> ApiResult<Vec<ProductView>> {
    let products = state
        .services
        .catalog
        .featured_products(viewer.user_id())
        .await?;
    Ok(success_response(products))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}",
    summary = "Get product",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product with category and images", body = ApiResponse<ProductView>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<ProductView> {
    let product = state
        .services
        .catalog
        .get_product(id, viewer.user_id())
        .await?;
    Ok(success_response(product))
}

#[utoipa::path(
    get,
    path = "/api/v1/products/{id}/related",
    summary = "Related products",
    description = "Other active products from the same category",
    params(("id" = Uuid, Path, description = "Product id")),
    responses(
        (status = 200, description = "Related products", body = ApiResponse<Vec<ProductView>>),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
    ),
    tag = "products"
)]
pub async fn related_products(
    State(state): State<AppState>,
    viewer: OptionalAuthUser,
    Path(id): Path<Uuid>,
) -> Result<axum::Json<ApiResponse<Vec<ProductView>>>, ServiceError> {
    let products = state
        .services
        .catalog
        .related_products(id, viewer.user_id())
        .await?;
    Ok(success_response(products))
}
