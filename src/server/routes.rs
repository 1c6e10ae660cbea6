//! Router configuration for the web server.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check for container orchestration
        .route("/health", get(handlers::health))
        // Receipt analysis: image upload in, receipt JSON out
        .route("/api/receipts/analyze", post(handlers::analyze_receipt))
        // Receipt CRUD
        .route("/api/receipts", get(handlers::list_receipts))
        .route(
            "/api/receipts/:id",
            get(handlers::get_receipt)
                .put(handlers::update_receipt)
                .delete(handlers::delete_receipt),
        )
        // Aggregate spend analysis
        .route("/api/analysis", get(handlers::receipt_analysis))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
