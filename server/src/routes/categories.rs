//! Category mutation endpoints: bulk creation from a discovered tree, and
//! merging one category into another.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use fury::error::FuryError;
use fury::models::DiscoveredCategory;

use super::{error_response, internal_error};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BulkRequest {
    categories: Vec<DiscoveredCategory>,
    #[serde(default)]
    replace_existing: bool,
}

pub async fn bulk_create(State(state): State<AppState>, body: Bytes) -> Response {
    let mut owned = body.to_vec();
    let request: BulkRequest = match simd_json::serde::from_slice(&mut owned) {
        Ok(request) => request,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, &format!("invalid JSON body: {}", e))
        }
    };

    if request.categories.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "no categories supplied");
    }

    let result = tokio::task::spawn_blocking(move || {
        let db = state.db.lock().expect("db mutex poisoned");
        db.create_categories_bulk(&request.categories, request.replace_existing)
    })
    .await;

    match result {
        Ok(Ok(outcome)) => (
            StatusCode::OK,
            Json(json!({
                "created": outcome.created,
                "updated": outcome.updated,
                "categoryMap": outcome.category_map,
            })),
        )
            .into_response(),
        Ok(Err(FuryError::InvalidInput(message))) => {
            error_response(StatusCode::BAD_REQUEST, &message)
        }
        Ok(Err(e)) => internal_error(&e.to_string()),
        Err(e) => internal_error(&format!("bulk create task failed: {}", e)),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MergeRequest {
    source_id: Option<i64>,
    target_id: Option<i64>,
}

pub async fn merge(State(state): State<AppState>, Json(request): Json<MergeRequest>) -> Response {
    let (Some(source_id), Some(target_id)) = (request.source_id, request.target_id) else {
        return error_response(StatusCode::BAD_REQUEST, "sourceId and targetId are required");
    };

    let result = tokio::task::spawn_blocking(move || {
        let db = state.db.lock().expect("db mutex poisoned");
        db.merge_categories(source_id, target_id)
    })
    .await;

    match result {
        Ok(Ok(outcome)) => (
            StatusCode::OK,
            Json(json!({
                "mergedBookmarks": outcome.merged_bookmarks,
                "mergedKeywords": outcome.merged_keywords,
            })),
        )
            .into_response(),
        Ok(Err(FuryError::InvalidInput(message))) => {
            error_response(StatusCode::BAD_REQUEST, &message)
        }
        Ok(Err(e)) => internal_error(&e.to_string()),
        Err(e) => internal_error(&format!("merge task failed: {}", e)),
    }
}
