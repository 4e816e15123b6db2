//! Synchronous taxonomy analysis: take bookmarks (raw archive HTML or an
//! already-parsed list), run discovery, and return the proposed hierarchy
//! with validation and stats in a success/error envelope.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use fury::llm::{discover_taxonomy, hierarchy_stats, validate_hierarchy, LlmClient};
use fury::models::ParsedBookmark;
use fury::netscape::parse_netscape;

use super::{error_response, internal_error};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest {
    #[serde(default)]
    bookmarks_html: Option<String>,
    #[serde(default)]
    bookmarks: Option<Vec<ParsedBookmark>>,
}

pub async fn analyze(State(state): State<AppState>, body: Bytes) -> Response {
    let mut owned = body.to_vec();
    let request: AnalyzeRequest = match simd_json::serde::from_slice(&mut owned) {
        Ok(request) => request,
        Err(e) => {
            return error_response(StatusCode::BAD_REQUEST, &format!("invalid JSON body: {}", e))
        }
    };

    let bookmarks: Vec<ParsedBookmark> = if let Some(html) = request.bookmarks_html {
        match parse_netscape(&html) {
            Ok(parsed) => parsed,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, &e.to_string()),
        }
    } else {
        request.bookmarks.unwrap_or_default()
    };

    if bookmarks.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "no bookmarks to analyze");
    }

    let bookmark_count = bookmarks.len();
    let config = state.config.clone();

    let result = tokio::task::spawn_blocking(move || {
        let llm = LlmClient::from_config(&config);
        discover_taxonomy(&bookmarks, llm.as_ref(), &config)
    })
    .await;

    match result {
        Ok(Ok(discovery)) => {
            let validation = validate_hierarchy(&discovery.categories);
            let stats = hierarchy_stats(&discovery.categories);
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "result": {
                        "discoveryResult": discovery,
                        "validation": validation,
                        "stats": stats,
                        "bookmarkCount": bookmark_count,
                    }
                })),
            )
                .into_response()
        }
        Ok(Err(e)) => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
        Err(e) => internal_error(&format!("analysis task failed: {}", e)),
    }
}
