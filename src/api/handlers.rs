use crate::application::lending::{
    ReturnOutcome, ServiceDependencies, borrow_container as execute_borrow_container,
    container_history, container_status, return_container as execute_return_container,
};
use crate::domain::ContainerId;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::Html,
};
use std::sync::Arc;

use super::{
    error::ApiError,
    liff::render_liff_page,
    types::{
        BorrowRequest, BorrowResponse, ContainerStatusResponse, ErrorResponse, ResetRequest,
        ResetResponse, TransactionResponse,
    },
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
///
/// 起動時の設定から構築し、以降は変更しない。
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
    /// /liff ページに埋め込むLIFF ID（未設定ならページは返さない）
    pub liff_id: Option<String>,
}

// ============================================================================
// Command handlers (POST)
// ============================================================================

/// POST /api/borrow - 容器を貸し出す
///
/// 強制されるビジネスルール:
/// - 容器に貸出中の記録がないこと（あれば400）
pub async fn borrow(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BorrowRequest>,
) -> Result<Json<BorrowResponse>, ApiError> {
    let cmd = req.to_command(chrono::Utc::now());

    let borrowed = execute_borrow_container(&state.service_deps, cmd).await?;

    Ok(Json(BorrowResponse::from(&borrowed)))
}

/// POST /api/reset - 容器を返却する
///
/// デモ用に "reset" という名前で公開しているが、機能としては返却。
/// 貸出中でない容器の場合も200で `status: "info"` を返す。
pub async fn reset(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetRequest>,
) -> Result<Json<ResetResponse>, ApiError> {
    let cmd = req.to_command(chrono::Utc::now());
    let container_id = cmd.container_id.clone();

    let response = match execute_return_container(&state.service_deps, cmd).await? {
        ReturnOutcome::Returned(_) => ResetResponse::returned(&container_id),
        ReturnOutcome::NotBorrowed => ResetResponse::not_borrowed(),
    };

    Ok(Json(response))
}

// ============================================================================
// Query handlers (GET)
// ============================================================================

/// GET /api/containers/:container_id - 容器の現在の貸出状態
pub async fn get_container_status(
    State(state): State<Arc<AppState>>,
    Path(container_id): Path<String>,
) -> Result<Json<ContainerStatusResponse>, ApiError> {
    let container_id = ContainerId::new(container_id);

    let active = container_status(&state.service_deps, &container_id).await?;

    Ok(Json(ContainerStatusResponse::new(&container_id, active)))
}

/// GET /api/containers/:container_id/transactions - 容器の貸出履歴（新しい順）
pub async fn list_container_transactions(
    State(state): State<Arc<AppState>>,
    Path(container_id): Path<String>,
) -> Result<Json<Vec<TransactionResponse>>, ApiError> {
    let container_id = ContainerId::new(container_id);

    let transactions = container_history(&state.service_deps, &container_id).await?;

    Ok(Json(
        transactions
            .into_iter()
            .map(TransactionResponse::from)
            .collect(),
    ))
}

/// GET /liff - LIFFエントリーページ
pub async fn liff_page(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, (StatusCode, Json<ErrorResponse>)> {
    match state.liff_id.as_deref() {
        Some(liff_id) => Ok(Html(render_liff_page(liff_id))),
        None => {
            tracing::warn!("GET /liff requested but LIFF_ID is not configured");
            Err((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse::new(
                    "LIFF_NOT_CONFIGURED",
                    "LIFF_ID is not configured",
                )),
            ))
        }
    }
}
