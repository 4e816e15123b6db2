pub mod analyze;
pub mod categories;
pub mod export;
pub mod import;
pub mod read;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/import", post(import::stream_import))
        .route("/api/analyze", post(analyze::analyze))
        .route("/api/categories/bulk", post(categories::bulk_create))
        .route("/api/categories/merge", post(categories::merge))
        .route("/api/export", get(export::export))
        .route("/api/bookmarks", get(read::list_bookmarks))
        .route("/api/categories", get(read::list_categories))
        .route("/api/health", get(read::health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Classical `{success: false, error}` envelope
pub fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({ "success": false, "error": message })),
    )
        .into_response()
}

pub fn internal_error(message: &str) -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
}
