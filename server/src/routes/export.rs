//! Export endpoint: stream the corpus back out as a browser-importable
//! attachment.

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use fury::export::{export_corpus, ExportFormat};

use super::{error_response, internal_error};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    format: String,
    #[serde(default)]
    category_id: Option<i64>,
}

pub async fn export(State(state): State<AppState>, Query(query): Query<ExportQuery>) -> Response {
    let Some(format) = ExportFormat::parse(&query.format) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            &format!("unknown export format: {}", query.format),
        );
    };

    let category_id = query.category_id;
    let result = tokio::task::spawn_blocking(move || {
        let db = state.db.lock().expect("db mutex poisoned");
        export_corpus(&db, format, category_id)
    })
    .await;

    match result {
        Ok(Ok(doc)) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, doc.content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", doc.file_name),
                ),
            ],
            doc.body,
        )
            .into_response(),
        Ok(Err(e)) => error_response(StatusCode::BAD_REQUEST, &e.to_string()),
        Err(e) => internal_error(&format!("export task failed: {}", e)),
    }
}
