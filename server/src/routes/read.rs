//! Read API over the persisted store: bookmark listing with substring
//! filtering, the category list with bookmark counts, and a health probe.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::internal_error;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkQuery {
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    category_id: Option<i64>,
}

pub async fn list_bookmarks(
    State(state): State<AppState>,
    Query(query): Query<BookmarkQuery>,
) -> Response {
    let result = tokio::task::spawn_blocking(move || {
        let db = state.db.lock().expect("db mutex poisoned");
        db.search_bookmarks(query.q.as_deref(), query.category_id)
    })
    .await;

    match result {
        Ok(Ok(bookmarks)) => {
            let total = bookmarks.len();
            (
                StatusCode::OK,
                Json(json!({ "bookmarks": bookmarks, "total": total })),
            )
                .into_response()
        }
        Ok(Err(e)) => internal_error(&e.to_string()),
        Err(e) => internal_error(&format!("bookmark query failed: {}", e)),
    }
}

pub async fn list_categories(State(state): State<AppState>) -> Response {
    let result = tokio::task::spawn_blocking(move || {
        let db = state.db.lock().expect("db mutex poisoned");
        let categories = db.get_all_categories()?;
        let counts = db.category_bookmark_counts()?;
        Ok::<_, fury::FuryError>((categories, counts))
    })
    .await;

    match result {
        Ok(Ok((categories, counts))) => {
            let payload: Vec<_> = categories
                .iter()
                .map(|c| {
                    json!({
                        "id": c.id,
                        "name": c.name,
                        "slug": c.slug,
                        "description": c.description,
                        "parentId": c.parent_id,
                        "keywords": c.keywords,
                        "bookmarkCount": counts.get(&c.id).copied().unwrap_or(0),
                    })
                })
                .collect();
            (StatusCode::OK, Json(json!({ "categories": payload }))).into_response()
        }
        Ok(Err(e)) => internal_error(&e.to_string()),
        Err(e) => internal_error(&format!("category query failed: {}", e)),
    }
}

pub async fn health(State(state): State<AppState>) -> Response {
    let result = tokio::task::spawn_blocking(move || {
        let db = state.db.lock().expect("db mutex poisoned");
        Ok::<_, fury::FuryError>((db.get_path().to_path_buf(), db.count_bookmarks()?))
    })
    .await;

    match result {
        Ok(Ok((path, count))) => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "database": path.display().to_string(),
                "bookmarks": count,
            })),
        )
            .into_response(),
        Ok(Err(e)) => internal_error(&e.to_string()),
        Err(e) => internal_error(&format!("health check failed: {}", e)),
    }
}
