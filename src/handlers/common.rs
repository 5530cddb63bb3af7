use crate::ApiResponse;
use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::success(data))
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, Json(ApiResponse::success(data)))
}

/// Success envelope carrying only a message
pub fn message_response(message: impl Into<String>) -> Json<ApiResponse<()>> {
    Json(ApiResponse::message(message.into()))
}

/// Pagination parameters for list operations.
///
/// Both fields are optional; each endpoint applies its own default page size.
#[derive(Debug, Default, Clone, Copy, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// 1-based page number
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_params_are_optional() {
        let params: PaginationParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.page, None);
        assert_eq!(params.per_page, None);
    }

    #[test]
    fn created_response_uses_201() {
        let (status, Json(body)) = created_response("ok");
        assert_eq!(status, StatusCode::CREATED);
        assert!(body.success);
    }
}
