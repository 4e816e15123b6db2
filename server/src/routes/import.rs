//! Streaming import endpoint: multipart upload in, Server-Sent Events
//! out. The blocking pipeline runs on a spawn_blocking thread; events
//! cross to the response stream over a bounded channel, and the channel
//! closing (client gone) trips the pipeline's cancellation flag.

use std::convert::Infallible;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use fury::models::DiscoveredCategory;
use fury::pipeline::{CancelFlag, EventSink, ImportEvent, ImportOptions, ImportPipeline};

use super::error_response;
use crate::state::AppState;

/// Buffered events between the pipeline and the SSE writer
const EVENT_CHANNEL_CAPACITY: usize = 64;

struct ChannelSink {
    tx: mpsc::Sender<ImportEvent>,
}

impl EventSink for ChannelSink {
    fn emit(&self, event: ImportEvent) -> bool {
        // A closed channel means the consumer disconnected; the pipeline
        // reads the false return as a cancellation signal
        self.tx.blocking_send(event).is_ok()
    }
}

pub async fn stream_import(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let mut file: Option<(String, String)> = None;
    let mut custom_categories: Option<Vec<DiscoveredCategory>> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    &format!("invalid multipart body: {}", e),
                )
            }
        };

        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" => {
                let name = field
                    .file_name()
                    .unwrap_or("bookmarks.html")
                    .to_string();
                match field.text().await {
                    Ok(text) => file = Some((name, text)),
                    Err(e) => {
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            &format!("unreadable file field: {}", e),
                        )
                    }
                }
            }
            "customCategories" => {
                let bytes = match field.bytes().await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        return error_response(
                            StatusCode::BAD_REQUEST,
                            &format!("unreadable customCategories field: {}", e),
                        )
                    }
                };
                match parse_custom_categories(&bytes) {
                    Ok(categories) => custom_categories = Some(categories),
                    Err(message) => return error_response(StatusCode::BAD_REQUEST, &message),
                }
            }
            _ => {}
        }
    }

    let Some((file_name, html)) = file else {
        return error_response(StatusCode::BAD_REQUEST, "missing required field: file");
    };

    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let cancel = CancelFlag::new();
    let opts = ImportOptions {
        file_name,
        custom_categories,
    };

    // Blocking HTTP clients must be built and driven off the async
    // runtime, so the whole pipeline lives on a blocking thread
    tokio::task::spawn_blocking(move || {
        let pipeline = ImportPipeline::new(&state.db_path, state.config.clone());
        let sink = ChannelSink { tx };
        if let Err(e) = pipeline.run(&html, &opts, &sink, &cancel) {
            log::warn!("import run ended with error: {}", e);
        }
    });

    let stream = ReceiverStream::new(rx).map(|event| {
        let data = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
        Ok::<Event, Infallible>(Event::default().event(event.name()).data(data))
    });

    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}

/// Accept either a bare array of discovered categories or the analyze
/// result wrapper around one
fn parse_custom_categories(bytes: &[u8]) -> Result<Vec<DiscoveredCategory>, String> {
    #[derive(serde::Deserialize)]
    struct Wrapper {
        categories: Vec<DiscoveredCategory>,
    }

    let mut owned = bytes.to_vec();
    if let Ok(categories) = simd_json::serde::from_slice::<Vec<DiscoveredCategory>>(&mut owned) {
        return Ok(categories);
    }
    let mut owned = bytes.to_vec();
    simd_json::serde::from_slice::<Wrapper>(&mut owned)
        .map(|w| w.categories)
        .map_err(|e| format!("invalid customCategories JSON: {}", e))
}
