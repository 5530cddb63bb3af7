use crate::{
    entities::BannerModel, handlers::common::success_response, ApiResponse, ApiResult, AppState,
};
use axum::{extract::State, routing::get, Router};

pub fn banners_routes() -> Router<AppState> {
    Router::new().route("/banners", get(list_banners))
}

#[utoipa::path(
    get,
    path = "/api/v1/banners",
    summary = "List banners",
    responses(
        (status = 200, description = "Active banners in display order", body = ApiResponse<Vec<crate::entities::banner::Model>>),
    ),
    tag = "catalog"
)]
pub async fn list_banners(State(state): State<AppState>) -> ApiResult<Vec<BannerModel>> {
    let banners = state.services.catalog.list_banners().await?;
    Ok(success_response(banners))
}
