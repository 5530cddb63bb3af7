use crate::{
    handlers::common::success_response,
    services::catalog::CategoryView,
    ApiResponse, ApiResult, AppState,
};
use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use uuid::Uuid;

pub fn categories_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/:id", get(get_category))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    summary = "List categories",
    description = "Active categories ordered by sort order, then name",
    responses(
        (status = 200, description = "Categories", body = ApiResponse<Vec<CategoryView>>),
    ),
    tag = "catalog"
)]
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<CategoryView>> {
    let categories = state.services.catalog.list_categories().await?;
    Ok(success_response(categories))
}

#[utoipa::path(
    get,
    path = "/api/v1/categories/{id}",
    summary = "Get category",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category with its active product count", body = ApiResponse<CategoryView>),
        (status = 404, description = "Category not found", body = crate::errors::ErrorResponse),
    ),
    tag = "catalog"
)]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<CategoryView> {
    let category = state.services.catalog.get_category(id).await?;
    Ok(success_response(category))
}
