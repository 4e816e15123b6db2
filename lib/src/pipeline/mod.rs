//! Import orchestrator: drives parse -> dedupe -> classify -> persist,
//! with a bounded worker pool on the default-taxonomy path and an
//! LLM-assisted fast path for custom taxonomies. Emits progress events
//! throughout and writes the session record exactly once, at the very
//! end, even for cancelled and partially failed runs.

pub mod events;

pub use events::{CancelFlag, EventSink, ImportEvent, NullSink, VecSink};

use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use crate::classify::{classify, match_by_keywords, ClassifyInput, OTHER_LABEL};
use crate::config::Config;
use crate::db::FuryDb;
use crate::error::{FuryError, Result};
use crate::fetch::{is_internal_address, Fetcher, PageFetcher, PageMetadata};
use crate::llm::{assign_in_batches, LlmClient};
use crate::models::{BookmarkFields, Category, DiscoveredCategory, ParsedBookmark};
use crate::netscape::parse_netscape;
use crate::text::{extract_semantic_keywords, KeywordConfig};
use crate::urlnorm::{host_of, normalize_url};
use crate::utils::slugify;

/// Progress is emitted every this many items on the custom fast path
const CUSTOM_PATH_PROGRESS_EVERY: usize = 10;

/// Options for one import run
#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub file_name: String,
    /// Custom taxonomy to persist and assign against; None selects the
    /// default-taxonomy path
    pub custom_categories: Option<Vec<DiscoveredCategory>>,
}

/// Final counters of a run, mirrored into the `complete` event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub import_session_id: i64,
    pub total_in_file: usize,
    pub unique_bookmarks: usize,
    pub duplicates_in_file: usize,
    pub new_bookmarks: usize,
    pub updated_bookmarks: usize,
    pub successful_bookmarks: usize,
    pub failed_bookmarks: usize,
    pub skipped_bookmarks: usize,
    pub custom_categories_created: usize,
    pub ai_assignments: usize,
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    new: usize,
    updated: usize,
    skipped: usize,
    failed: usize,
}

/// Builds one fetcher per worker slot
pub type FetcherFactory = dyn Fn(&Config) -> Result<Box<dyn Fetcher>> + Send + Sync;

/// One import pipeline instance. Workers open their own database
/// connections from the path; the LLM client is shared and single-flight.
pub struct ImportPipeline {
    db_path: PathBuf,
    config: Config,
    llm: Option<LlmClient>,
    fetcher_factory: Box<FetcherFactory>,
}

impl ImportPipeline {
    pub fn new(db_path: &Path, config: Config) -> Self {
        let llm = LlmClient::from_config(&config);
        Self {
            db_path: db_path.to_path_buf(),
            config,
            llm,
            fetcher_factory: Box::new(default_fetcher_factory),
        }
    }

    /// Pipeline without an LLM client regardless of the environment;
    /// forces the deterministic paths
    pub fn without_llm(db_path: &Path, config: Config) -> Self {
        Self {
            db_path: db_path.to_path_buf(),
            config,
            llm: None,
            fetcher_factory: Box::new(default_fetcher_factory),
        }
    }

    /// Substitute the fetcher implementation behind the worker pool;
    /// tests use this to run the default path without network traffic
    pub fn with_fetcher_factory(
        mut self,
        factory: impl Fn(&Config) -> Result<Box<dyn Fetcher>> + Send + Sync + 'static,
    ) -> Self {
        self.fetcher_factory = Box::new(factory);
        self
    }

    /// Run one import. All events, including the terminal one, go through
    /// the sink; the returned summary duplicates the `complete` payload
    /// for synchronous callers.
    pub fn run(
        &self,
        html: &str,
        opts: &ImportOptions,
        sink: &dyn EventSink,
        cancel: &CancelFlag,
    ) -> Result<ImportSummary> {
        match self.run_inner(html, opts, sink, cancel) {
            Ok(summary) => {
                sink.emit(ImportEvent::Complete {
                    import_session_id: summary.import_session_id,
                    total_in_file: summary.total_in_file,
                    unique_bookmarks: summary.unique_bookmarks,
                    duplicates_in_file: summary.duplicates_in_file,
                    new_bookmarks: summary.new_bookmarks,
                    updated_bookmarks: summary.updated_bookmarks,
                    successful_bookmarks: summary.successful_bookmarks,
                    failed_bookmarks: summary.failed_bookmarks,
                    skipped_bookmarks: summary.skipped_bookmarks,
                    custom_categories_created: summary.custom_categories_created,
                    ai_assignments: summary.ai_assignments,
                });
                Ok(summary)
            }
            Err(e) => {
                sink.emit(ImportEvent::Error {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    fn run_inner(
        &self,
        html: &str,
        opts: &ImportOptions,
        sink: &dyn EventSink,
        cancel: &CancelFlag,
    ) -> Result<ImportSummary> {
        let db = FuryDb::open(&self.db_path)
            .map_err(|e| FuryError::StorageUnavailable(e.to_string()))?;

        emit(sink, cancel, ImportEvent::Status {
            phase: "parsing".to_string(),
            message: "Parsing bookmark file".to_string(),
        });

        let parsed = parse_netscape(html)?;
        let total_in_file = parsed.len();

        // Dedupe on the canonical URL, first occurrence wins
        let mut seen: HashSet<String> = HashSet::new();
        let mut unique: Vec<(String, ParsedBookmark)> = Vec::new();
        for bookmark in parsed {
            let normalized = normalize_url(&bookmark.url);
            if seen.insert(normalized.clone()) {
                unique.push((normalized, bookmark));
            }
        }
        let duplicates_in_file = total_in_file - unique.len();

        emit(sink, cancel, ImportEvent::Init {
            total_in_file,
            unique_bookmarks: unique.len(),
            duplicates_in_file,
        });

        // In-file duplicates count as skipped from the start
        let counters = Mutex::new(Counters {
            skipped: duplicates_in_file,
            ..Counters::default()
        });

        let mut custom_categories_created = 0;
        let mut ai_assignments = 0;

        if let Some(roots) = &opts.custom_categories {
            let (created, assigned) =
                self.run_custom_path(&db, &unique, roots, sink, cancel, &counters)?;
            custom_categories_created = created;
            ai_assignments = assigned;
        } else {
            self.run_default_path(&unique, sink, cancel, &counters)?;
        }

        // Session record: exactly once, after all bookmark writes
        let totals = *counters.lock().expect("counters poisoned");
        let successful = totals.new + totals.updated;
        let session = db.insert_session(
            &opts.file_name,
            total_in_file as i64,
            successful as i64,
            totals.failed as i64,
            totals.skipped as i64,
        )?;

        if cancel.is_cancelled() {
            return Err(FuryError::Cancelled);
        }

        Ok(ImportSummary {
            import_session_id: session.id,
            total_in_file,
            unique_bookmarks: unique.len(),
            duplicates_in_file,
            new_bookmarks: totals.new,
            updated_bookmarks: totals.updated,
            successful_bookmarks: successful,
            failed_bookmarks: totals.failed,
            skipped_bookmarks: totals.skipped,
            custom_categories_created,
            ai_assignments,
        })
    }

    /* --------------------- path A: default taxonomy --------------------- */

    fn run_default_path(
        &self,
        unique: &[(String, ParsedBookmark)],
        sink: &dyn EventSink,
        cancel: &CancelFlag,
        counters: &Mutex<Counters>,
    ) -> Result<()> {
        let pool_size = self.config.worker_threads.max(1);
        // A connection is Send but not Sync, so each worker slot is handed
        // to exactly one thread per batch via iter_mut
        let mut workers: Vec<Worker> = (0..pool_size)
            .map(|_| Worker::new(&self.db_path, &self.config, &self.fetcher_factory))
            .collect::<Result<Vec<_>>>()?;

        let total = unique.len();
        let processed = AtomicUsize::new(0);
        let chunk_count = unique.chunks(pool_size).count();

        for (chunk_no, chunk) in unique.chunks(pool_size).enumerate() {
            if cancel.is_cancelled() {
                break;
            }

            let processed = &processed;
            thread::scope(|scope| {
                for (worker, (url, bookmark)) in workers.iter_mut().zip(chunk.iter()) {
                    scope.spawn(move || {
                        self.process_default_item(
                            worker, url, bookmark, sink, cancel, counters, processed, total,
                        );
                    });
                }
            });

            // Polite crawling: pause between batches, not after the last
            if chunk_no + 1 < chunk_count && !cancel.is_cancelled() {
                let pause = rand::rng().random_range(
                    self.config.batch_pause_min_ms..=self.config.batch_pause_max_ms.max(self.config.batch_pause_min_ms),
                );
                thread::sleep(Duration::from_millis(pause));
            }
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn process_default_item(
        &self,
        worker: &mut Worker,
        url: &str,
        bookmark: &ParsedBookmark,
        sink: &dyn EventSink,
        cancel: &CancelFlag,
        counters: &Mutex<Counters>,
        processed: &AtomicUsize,
        total: usize,
    ) {
        if cancel.is_cancelled() {
            return;
        }

        let outcome = self.import_one(worker, url, bookmark);

        {
            let mut totals = counters.lock().expect("counters poisoned");
            match &outcome {
                Ok(true) => totals.new += 1,
                Ok(false) => totals.updated += 1,
                Err(FuryError::InvalidTarget(_)) => totals.skipped += 1,
                Err(e) => {
                    log::warn!("import of {} failed: {}", url, e);
                    totals.failed += 1;
                }
            }
        }

        if let Err(FuryError::InvalidTarget(_)) = &outcome {
            emit(sink, cancel, ImportEvent::Skipped {
                url: url.to_string(),
                reason: "Invalid URL".to_string(),
            });
        }

        let done = processed.fetch_add(1, Ordering::SeqCst) + 1;
        let totals = *counters.lock().expect("counters poisoned");
        emit(sink, cancel, progress_event(done, total, &bookmark.title, &totals, None));
    }

    /// Validate, enrich, classify and upsert one bookmark. Returns whether
    /// a new row was created.
    fn import_one(&self, worker: &Worker, url: &str, bookmark: &ParsedBookmark) -> Result<bool> {
        if !worker.fetcher.validate(url) {
            return Err(FuryError::InvalidTarget(url.to_string()));
        }

        let metadata = if is_internal_address(url) {
            None
        } else {
            worker.fetcher.fetch_metadata(url)
        };

        let meta = metadata.unwrap_or_default();
        let combined = combined_text(bookmark, &meta);
        let keywords = extract_semantic_keywords(&combined, &KeywordConfig::default());

        let classification = classify(
            &ClassifyInput {
                url,
                title: &bookmark.title,
                description: bookmark.description.as_deref(),
                keywords: &keywords,
            },
            self.config.min_score,
        );

        let category = if classification.category == OTHER_LABEL {
            fallback_category(&worker.db)?
        } else {
            worker.db.ensure_category(&classification.category)?
        };

        let joined_keywords = if keywords.is_empty() {
            None
        } else {
            Some(
                keywords
                    .iter()
                    .map(|k| k.text.as_str())
                    .collect::<Vec<_>>()
                    .join(","),
            )
        };

        let fields = BookmarkFields {
            title: bookmark.title.clone(),
            description: bookmark.description.clone(),
            source_folder: bookmark.source_folder.clone(),
            category_id: Some(category.id),
            meta_title: meta.title,
            meta_description: meta.description,
            og_title: meta.og_title,
            og_description: meta.og_description,
            og_image: meta.og_image,
            keywords: joined_keywords,
            summary: meta.body_text,
            suggested_category: None,
            confidence: Some(classification.confidence),
        };

        Ok(worker.db.upsert_bookmark(url, &fields)?.created)
    }

    /* --------------------- path B: custom taxonomy --------------------- */

    fn run_custom_path(
        &self,
        db: &FuryDb,
        unique: &[(String, ParsedBookmark)],
        roots: &[DiscoveredCategory],
        sink: &dyn EventSink,
        cancel: &CancelFlag,
        counters: &Mutex<Counters>,
    ) -> Result<(usize, usize)> {
        emit(sink, cancel, ImportEvent::Status {
            phase: "categories".to_string(),
            message: "Creating custom categories".to_string(),
        });

        let bulk = db.create_categories_bulk(roots, false)?;
        let flat = DiscoveredCategory::flatten(roots);

        // LLM pass over the whole set, in batches
        let mut assigned: HashMap<usize, String> = HashMap::new();
        if let Some(llm) = &self.llm {
            let indexed: Vec<(usize, String)> = flat
                .iter()
                .enumerate()
                .map(|(i, c)| (i, c.name.clone()))
                .collect();
            let bookmarks_indexed: Vec<(usize, String, String)> = unique
                .iter()
                .enumerate()
                .map(|(j, (url, bm))| (j, bm.title.clone(), host_of(url)))
                .collect();

            let mut report = |done: usize, total: usize| {
                emit(sink, cancel, ImportEvent::Status {
                    phase: "assigning".to_string(),
                    message: format!("Assigned {} of {} bookmarks", done, total),
                });
            };
            let outcome = assign_in_batches(
                llm,
                &indexed,
                &bookmarks_indexed,
                self.config.llm.assign_batch_size,
                &mut report,
            );
            assigned = outcome.assigned;
        }

        let keyword_table: Vec<(String, Vec<String>)> = flat
            .iter()
            .map(|c| (c.name.clone(), c.keywords.clone()))
            .collect();

        let total = unique.len();
        let mut ai_assignments = 0;

        // Fast inner loop: no metadata fetch, LLM choice first, keyword
        // fallback second, configured fallback category last
        for (j, (url, bookmark)) in unique.iter().enumerate() {
            if cancel.is_cancelled() {
                break;
            }

            let from_llm = assigned.get(&j).cloned();
            let chosen = from_llm.clone().or_else(|| {
                match_by_keywords(
                    &format!("{} {}", bookmark.title, url),
                    &keyword_table,
                )
            });

            let result = (|| -> Result<bool> {
                let category_id = match &chosen {
                    Some(name) => match db.get_category_by_slug(&slugify(name))? {
                        Some(category) => Some(category.id),
                        None => Some(fallback_category(db)?.id),
                    },
                    None => Some(fallback_category(db)?.id),
                };

                let fields = BookmarkFields {
                    title: bookmark.title.clone(),
                    description: bookmark.description.clone(),
                    source_folder: bookmark.source_folder.clone(),
                    category_id,
                    suggested_category: from_llm.clone(),
                    ..BookmarkFields::default()
                };
                Ok(db.upsert_bookmark(url, &fields)?.created)
            })();

            {
                let mut totals = counters.lock().expect("counters poisoned");
                match result {
                    Ok(true) => totals.new += 1,
                    Ok(false) => totals.updated += 1,
                    Err(e) => {
                        log::warn!("import of {} failed: {}", url, e);
                        totals.failed += 1;
                    }
                }
            }
            if from_llm.is_some() {
                ai_assignments += 1;
            }

            if (j + 1) % CUSTOM_PATH_PROGRESS_EVERY == 0 || j + 1 == total {
                let totals = *counters.lock().expect("counters poisoned");
                emit(
                    sink,
                    cancel,
                    progress_event(j + 1, total, &bookmark.title, &totals, Some("assigning")),
                );
            }
        }

        Ok((bulk.created, ai_assignments))
    }
}

/// Worker slot of the default-path pool: its own database connection and
/// fetcher
struct Worker {
    db: FuryDb,
    fetcher: Box<dyn Fetcher>,
}

impl Worker {
    fn new(db_path: &Path, config: &Config, factory: &FetcherFactory) -> Result<Self> {
        Ok(Self {
            db: FuryDb::open(db_path)?,
            fetcher: factory(config)?,
        })
    }
}

fn default_fetcher_factory(config: &Config) -> Result<Box<dyn Fetcher>> {
    Ok(Box::new(PageFetcher::new(config)?))
}

/// The category behind the `"Other"` sentinel: `uncategorized` if present,
/// then `other`, created on demand
fn fallback_category(db: &FuryDb) -> Result<Category> {
    if let Some(cat) = db.get_category_by_slug("uncategorized")? {
        return Ok(cat);
    }
    if let Some(cat) = db.get_category_by_slug("other")? {
        return Ok(cat);
    }
    db.ensure_category("Other")
}

fn combined_text(bookmark: &ParsedBookmark, meta: &PageMetadata) -> String {
    let mut combined = bookmark.title.clone();
    for part in [
        bookmark.description.as_deref(),
        meta.title.as_deref(),
        meta.description.as_deref(),
        meta.og_title.as_deref(),
        meta.og_description.as_deref(),
        meta.body_text.as_deref(),
    ]
    .into_iter()
    .flatten()
    {
        combined.push(' ');
        combined.push_str(part);
    }
    combined
}

fn progress_event(
    processed: usize,
    total: usize,
    current: &str,
    totals: &Counters,
    phase: Option<&str>,
) -> ImportEvent {
    ImportEvent::Progress {
        processed,
        total,
        percent: if total == 0 {
            100
        } else {
            ((processed * 100) / total) as u8
        },
        current_bookmark: current.to_string(),
        new_bookmarks: totals.new,
        updated_bookmarks: totals.updated,
        skipped: totals.skipped,
        failed: totals.failed,
        phase: phase.map(str::to_string),
    }
}

/// Emit through the sink; a refused event flips the cancellation flag so
/// the run winds down after the consumer disconnects
fn emit(sink: &dyn EventSink, cancel: &CancelFlag, event: ImportEvent) {
    if !sink.emit(event) {
        cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Stub fetcher so default-path tests never touch the network:
    /// rejects listed hosts, counts fetch calls, returns no metadata
    struct StubFetcher {
        reject: &'static [&'static str],
        fetches: Arc<AtomicUsize>,
    }

    impl Fetcher for StubFetcher {
        fn validate(&self, url: &str) -> bool {
            is_internal_address(url) || !self.reject.iter().any(|host| url.contains(host))
        }

        fn fetch_metadata(&self, _url: &str) -> Option<PageMetadata> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            None
        }
    }

    fn stub_pipeline(
        db_path: &std::path::Path,
        reject: &'static [&'static str],
        fetches: Arc<AtomicUsize>,
    ) -> ImportPipeline {
        ImportPipeline::without_llm(db_path, Config::default()).with_fetcher_factory(
            move |_| -> Result<Box<dyn Fetcher>> {
                Ok(Box::new(StubFetcher {
                    reject,
                    fetches: Arc::clone(&fetches),
                }))
            },
        )
    }

    /// Archive with one entry per URL given
    fn archive(urls: &[(&str, &str)]) -> String {
        let mut html = String::from("<DL><p>\n");
        for (url, title) in urls {
            html.push_str(&format!("    <DT><A HREF=\"{}\">{}</A>\n", url, title));
        }
        html.push_str("</DL><p>\n");
        html
    }

    fn pipeline_at(dir: &TempDir) -> (ImportPipeline, std::path::PathBuf) {
        let db_path = dir.path().join("fury.db");
        FuryDb::init(&db_path).unwrap();
        (
            ImportPipeline::without_llm(&db_path, Config::default()),
            db_path,
        )
    }

    fn run(
        pipeline: &ImportPipeline,
        html: &str,
        custom: Option<Vec<DiscoveredCategory>>,
    ) -> (Result<ImportSummary>, Vec<ImportEvent>) {
        let sink = VecSink::new();
        let cancel = CancelFlag::new();
        let opts = ImportOptions {
            file_name: "bookmarks.html".to_string(),
            custom_categories: custom,
        };
        let result = pipeline.run(html, &opts, &sink, &cancel);
        (result, sink.events())
    }

    fn custom_tree() -> Vec<DiscoveredCategory> {
        vec![
            DiscoveredCategory {
                id: "t1".into(),
                name: "Code".into(),
                slug: "code".into(),
                description: None,
                keywords: vec!["github".into(), "rust".into()],
                parent_id: None,
                level: 1,
                estimated_count: None,
                children: vec![],
            },
            DiscoveredCategory {
                id: "t2".into(),
                name: "Reading".into(),
                slug: "reading".into(),
                description: None,
                keywords: vec!["article".into()],
                parent_id: None,
                level: 1,
                estimated_count: None,
                children: vec![],
            },
        ]
    }

    #[test]
    fn test_malformed_input_is_terminal_before_writes() {
        let dir = TempDir::new().unwrap();
        let (pipeline, db_path) = pipeline_at(&dir);

        let (result, events) = run(&pipeline, "<html><p>not bookmarks</p></html>", None);
        assert!(matches!(result, Err(FuryError::MalformedInput(_))));

        let last = events.last().unwrap();
        assert_eq!(last.name(), "error");

        // No session, no bookmarks
        let db = FuryDb::open(&db_path).unwrap();
        assert_eq!(db.count_bookmarks().unwrap(), 0);
        assert!(db.get_session_by_id(1).unwrap().is_none());
    }

    #[test]
    fn test_empty_archive_records_zeroed_session() {
        let dir = TempDir::new().unwrap();
        let (pipeline, db_path) = pipeline_at(&dir);

        let (result, events) = run(&pipeline, "<DL><p></DL><p>", None);
        let summary = result.unwrap();
        assert_eq!(summary.total_in_file, 0);
        assert_eq!(summary.successful_bookmarks, 0);
        assert_eq!(summary.skipped_bookmarks, 0);

        let db = FuryDb::open(&db_path).unwrap();
        let session = db.get_session_by_id(summary.import_session_id).unwrap().unwrap();
        assert_eq!(session.total_bookmarks, 0);
        assert_eq!(session.successful, 0);
        assert_eq!(db.count_bookmarks().unwrap(), 0);
        assert!(db.get_all_categories().unwrap().is_empty());

        assert_eq!(events.last().unwrap().name(), "complete");
    }

    #[test]
    fn test_duplicate_folding_in_init_event() {
        let dir = TempDir::new().unwrap();
        let (pipeline, db_path) = pipeline_at(&dir);

        // Three spellings of the same URL; custom path avoids the network
        let html = archive(&[
            ("https://x.com/", "One"),
            ("https://x.com", "Two"),
            ("HTTPS://X.COM/", "Three"),
        ]);
        let (result, events) = run(&pipeline, &html, Some(custom_tree()));
        let summary = result.unwrap();

        assert_eq!(summary.total_in_file, 3);
        assert_eq!(summary.unique_bookmarks, 1);
        assert_eq!(summary.duplicates_in_file, 2);
        assert_eq!(summary.skipped_bookmarks, 2);
        assert_eq!(summary.new_bookmarks, 1);

        let init = events.iter().find(|e| e.name() == "init").unwrap();
        if let ImportEvent::Init {
            total_in_file,
            unique_bookmarks,
            duplicates_in_file,
        } = init
        {
            assert_eq!((*total_in_file, *unique_bookmarks, *duplicates_in_file), (3, 1, 2));
        }

        let db = FuryDb::open(&db_path).unwrap();
        let stored = db.get_all_bookmarks().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].url, "https://x.com");
        // First occurrence wins
        assert_eq!(stored[0].title, "One");
    }

    #[test]
    fn test_custom_path_counters_sum_invariant() {
        let dir = TempDir::new().unwrap();
        let (pipeline, _) = pipeline_at(&dir);

        let html = archive(&[
            ("https://github.com/a/b", "Repo"),
            ("https://github.com/a/b/", "Repo again"),
            ("https://example.com/article", "An article"),
            ("https://nothing.example/", "Mystery"),
        ]);
        let (result, _) = run(&pipeline, &html, Some(custom_tree()));
        let summary = result.unwrap();

        assert_eq!(
            summary.successful_bookmarks + summary.failed_bookmarks + summary.skipped_bookmarks,
            summary.unique_bookmarks + summary.duplicates_in_file
        );
        assert!(summary.skipped_bookmarks >= summary.duplicates_in_file);
    }

    #[test]
    fn test_custom_path_assigns_by_keyword_and_fallback() {
        let dir = TempDir::new().unwrap();
        let (pipeline, db_path) = pipeline_at(&dir);

        let html = archive(&[
            ("https://github.com/rust-lang/rust", "rust on github"),
            ("https://blog.example/post", "a long article about tea"),
            ("https://opaque.example/x1y2", "zzz"),
        ]);
        let (result, _) = run(&pipeline, &html, Some(custom_tree()));
        let summary = result.unwrap();
        assert_eq!(summary.custom_categories_created, 2);
        // No LLM configured
        assert_eq!(summary.ai_assignments, 0);

        let db = FuryDb::open(&db_path).unwrap();

        let code = db.get_category_by_slug("code").unwrap().unwrap();
        let reading = db.get_category_by_slug("reading").unwrap().unwrap();
        let repo = db
            .get_bookmark_by_url("https://github.com/rust-lang/rust")
            .unwrap()
            .unwrap();
        assert_eq!(repo.category_id, Some(code.id));

        let article = db
            .get_bookmark_by_url("https://blog.example/post")
            .unwrap()
            .unwrap();
        assert_eq!(article.category_id, Some(reading.id));

        // Nothing matched: lands in the created-on-demand fallback
        let mystery = db
            .get_bookmark_by_url("https://opaque.example/x1y2")
            .unwrap()
            .unwrap();
        let fallback = db.get_category_by_slug("other").unwrap().unwrap();
        assert_eq!(mystery.category_id, Some(fallback.id));
        // Every bookmark has a category on the custom path
        assert!(db.get_all_bookmarks().unwrap().iter().all(|b| b.category_id.is_some()));
    }

    #[test]
    fn test_reimport_updates_instead_of_duplicating() {
        let dir = TempDir::new().unwrap();
        let (pipeline, db_path) = pipeline_at(&dir);

        let html = archive(&[
            ("https://github.com/a/b", "Repo"),
            ("https://blog.example/post", "article time"),
        ]);
        let first = run(&pipeline, &html, Some(custom_tree())).0.unwrap();
        assert_eq!(first.new_bookmarks, 2);
        assert_eq!(first.updated_bookmarks, 0);

        let second = run(&pipeline, &html, Some(custom_tree())).0.unwrap();
        assert_eq!(second.new_bookmarks, 0);
        assert_eq!(second.updated_bookmarks, 2);

        let db = FuryDb::open(&db_path).unwrap();
        assert_eq!(db.count_bookmarks().unwrap(), 2);
    }

    #[test]
    fn test_cancelled_run_writes_partial_session_and_error_event() {
        let dir = TempDir::new().unwrap();
        let (pipeline, db_path) = pipeline_at(&dir);

        let html = archive(&[
            ("https://github.com/a/b", "Repo"),
            ("https://blog.example/post", "article"),
        ]);
        let sink = VecSink::new();
        let cancel = CancelFlag::new();
        cancel.cancel();

        let opts = ImportOptions {
            file_name: "cancelled.html".to_string(),
            custom_categories: Some(custom_tree()),
        };
        let result = pipeline.run(html.as_str(), &opts, &sink, &cancel);
        assert!(matches!(result, Err(FuryError::Cancelled)));

        let events = sink.events();
        let last = events.last().unwrap();
        assert_eq!(last.name(), "error");
        if let ImportEvent::Error { message } = last {
            assert_eq!(message, "cancelled");
        }

        // The partial session exists even though nothing was processed
        let db = FuryDb::open(&db_path).unwrap();
        let session = db.get_session_by_id(1).unwrap().unwrap();
        assert_eq!(session.file_name, "cancelled.html");
        assert_eq!(session.successful, 0);
    }

    #[test]
    fn test_default_path_internal_scheme_skips_probe_and_fetch() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("fury.db");
        FuryDb::init(&db_path).unwrap();

        let fetches = Arc::new(AtomicUsize::new(0));
        let pipeline = stub_pipeline(&db_path, &[], Arc::clone(&fetches));

        // Extension URLs bypass validation and are never fetched
        let html = archive(&[("chrome-extension://abcdef/options.html", "Extension options")]);
        let (result, events) = run(&pipeline, &html, None);
        let summary = result.unwrap();

        assert_eq!(summary.new_bookmarks, 1);
        assert_eq!(summary.successful_bookmarks, 1);
        assert_eq!(summary.skipped_bookmarks, 0);
        assert_eq!(summary.failed_bookmarks, 0);
        assert_eq!(fetches.load(Ordering::SeqCst), 0);

        let db = FuryDb::open(&db_path).unwrap();
        let stored = db
            .get_bookmark_by_url("chrome-extension://abcdef/options.html")
            .unwrap()
            .unwrap();
        // Nothing to classify on: lands in the on-demand fallback
        assert!(stored.category_id.is_some());
        assert!(stored.meta_title.is_none());

        assert!(events.iter().any(|e| e.name() == "progress"));
        assert_eq!(events.last().unwrap().name(), "complete");
    }

    #[test]
    fn test_default_path_invalid_target_is_skipped() {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("fury.db");
        FuryDb::init(&db_path).unwrap();

        let fetches = Arc::new(AtomicUsize::new(0));
        let pipeline = stub_pipeline(&db_path, &["unreachable.example"], Arc::clone(&fetches));

        let html = archive(&[("https://unreachable.example/", "Nowhere")]);
        let (result, events) = run(&pipeline, &html, None);
        let summary = result.unwrap();

        assert_eq!(summary.new_bookmarks, 0);
        assert!(summary.skipped_bookmarks >= 1);
        // Failed validation short-circuits before any fetch
        assert_eq!(fetches.load(Ordering::SeqCst), 0);

        let skipped = events.iter().find(|e| e.name() == "skipped").unwrap();
        if let ImportEvent::Skipped { url, reason } = skipped {
            assert!(url.contains("unreachable.example"));
            assert_eq!(reason, "Invalid URL");
        }

        let db = FuryDb::open(&db_path).unwrap();
        assert_eq!(db.count_bookmarks().unwrap(), 0);
    }

    #[test]
    fn test_terminal_event_is_last() {
        let dir = TempDir::new().unwrap();
        let (pipeline, _) = pipeline_at(&dir);

        let html = archive(&[("https://github.com/a/b", "Repo")]);
        let (_, events) = run(&pipeline, &html, Some(custom_tree()));

        let terminal_pos = events.iter().position(|e| e.is_terminal()).unwrap();
        assert_eq!(terminal_pos, events.len() - 1);
    }
}
