use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, borrow, get_container_status, liff_page, list_container_transactions, reset,
};

/// Creates the API router
///
/// Command endpoints (Write operations):
/// - POST /api/borrow - Borrow a container
/// - POST /api/reset - Return a container
///
/// Query endpoints (Read operations):
/// - GET /api/containers/:container_id - Current borrow state
/// - GET /api/containers/:container_id/transactions - Borrow history
///
/// Front-end:
/// - GET /liff - LIFF entry page
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // LIFF entry page
        .route("/liff", get(liff_page))
        // Command endpoints (Write operations)
        .route("/api/borrow", post(borrow))
        .route("/api/reset", post(reset))
        // Query endpoints (Read operations)
        .route("/api/containers/:container_id", get(get_container_status))
        .route(
            "/api/containers/:container_id/transactions",
            get(list_container_transactions),
        )
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
