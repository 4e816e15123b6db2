//! Progress events streamed to the caller during an import, and the sink
//! abstraction the orchestrator emits them through.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// One named event in the import stream. The variant name maps to the SSE
/// `event:` field, the payload to its `data:` JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum ImportEvent {
    /// Lifecycle tick
    Status { phase: String, message: String },
    /// Emitted once, after parse and dedupe
    Init {
        total_in_file: usize,
        unique_bookmarks: usize,
        duplicates_in_file: usize,
    },
    /// Per-item (default path) or every few items (custom path)
    Progress {
        processed: usize,
        total: usize,
        percent: u8,
        current_bookmark: String,
        new_bookmarks: usize,
        updated_bookmarks: usize,
        skipped: usize,
        failed: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        phase: Option<String>,
    },
    /// A bookmark was dropped, with the reason
    Skipped { url: String, reason: String },
    /// Terminal success
    Complete {
        import_session_id: i64,
        total_in_file: usize,
        unique_bookmarks: usize,
        duplicates_in_file: usize,
        new_bookmarks: usize,
        updated_bookmarks: usize,
        successful_bookmarks: usize,
        failed_bookmarks: usize,
        skipped_bookmarks: usize,
        custom_categories_created: usize,
        ai_assignments: usize,
    },
    /// Terminal failure (including cancellation)
    Error { message: String },
}

impl ImportEvent {
    /// SSE event name
    pub fn name(&self) -> &'static str {
        match self {
            ImportEvent::Status { .. } => "status",
            ImportEvent::Init { .. } => "init",
            ImportEvent::Progress { .. } => "progress",
            ImportEvent::Skipped { .. } => "skipped",
            ImportEvent::Complete { .. } => "complete",
            ImportEvent::Error { .. } => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ImportEvent::Complete { .. } | ImportEvent::Error { .. })
    }
}

/// Caller-owned event sink. `emit` returns false once the consumer is
/// gone; the orchestrator treats that as a cancellation signal and the
/// sink becomes a no-op.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ImportEvent) -> bool;
}

/// Sink that drops everything; useful for fire-and-forget imports
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: ImportEvent) -> bool {
        true
    }
}

/// Sink that collects events in memory, for tests and synchronous callers
#[derive(Default)]
pub struct VecSink {
    events: Mutex<Vec<ImportEvent>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ImportEvent> {
        self.events.lock().expect("event sink poisoned").clone()
    }
}

impl EventSink for VecSink {
    fn emit(&self, event: ImportEvent) -> bool {
        self.events.lock().expect("event sink poisoned").push(event);
        true
    }
}

/// Cooperative cancellation flag, polled by the orchestrator between
/// items and between batches
#[derive(Clone, Default)]
pub struct CancelFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let event = ImportEvent::Init {
            total_in_file: 3,
            unique_bookmarks: 2,
            duplicates_in_file: 1,
        };
        assert_eq!(event.name(), "init");
        assert!(!event.is_terminal());
        assert!(ImportEvent::Error {
            message: "x".into()
        }
        .is_terminal());
    }

    #[test]
    fn test_payload_serializes_camel_case_without_tag() {
        let event = ImportEvent::Init {
            total_in_file: 3,
            unique_bookmarks: 2,
            duplicates_in_file: 1,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["totalInFile"], 3);
        assert_eq!(json["uniqueBookmarks"], 2);
        assert_eq!(json["duplicatesInFile"], 1);
        assert!(json.get("type").is_none());
    }

    #[test]
    fn test_progress_phase_omitted_when_none() {
        let event = ImportEvent::Progress {
            processed: 1,
            total: 2,
            percent: 50,
            current_bookmark: "x".into(),
            new_bookmarks: 1,
            updated_bookmarks: 0,
            skipped: 0,
            failed: 0,
            phase: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("phase").is_none());
        assert_eq!(json["currentBookmark"], "x");
    }

    #[test]
    fn test_cancel_flag_shared_across_clones() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        assert!(!clone.is_cancelled());
        flag.cancel();
        assert!(clone.is_cancelled());
    }
}
