use crate::application::lending::LendingApplicationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub struct ApiError(LendingApplicationError);

impl From<LendingApplicationError> for ApiError {
    fn from(err: LendingApplicationError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self.0 {
            // 400 Bad Request - 容器が貸出中
            LendingApplicationError::AlreadyBorrowed { ref container_id } => {
                tracing::debug!(%container_id, "Rejected borrow of borrowed container");
                (
                    StatusCode::BAD_REQUEST,
                    "ALREADY_BORROWED",
                    "This container has been borrowed".to_string(),
                )
            }

            // 409 Conflict - 記録の状態遷移が不正
            LendingApplicationError::InvalidTransactionState(ref msg) => (
                StatusCode::CONFLICT,
                "INVALID_TRANSACTION_STATE",
                msg.clone(),
            ),

            // 500 Internal Server Error - システム障害
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            LendingApplicationError::StoreError(ref e) => {
                tracing::error!(error = ?e, "Transaction store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "Failed to access transaction store".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}
