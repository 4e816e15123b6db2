//! SQLite persistence for bookmarks, categories and import sessions.
//!
//! Identity keys: `bookmarks.url` (normalized form) and `categories.slug`.
//! The category forest is parent-pointer rows with `ON DELETE SET NULL`
//! edges; multi-step operations (bulk replace, merge) run in a single
//! transaction so callers observe either the before- or the after-state.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::classify::taxonomy::{rule_for, PRESET_PARENTS, ROOT_CATEGORIES};
use crate::error::{FuryError, Result};
use crate::models::{Bookmark, BookmarkFields, Category, DiscoveredCategory, ImportSession};
use crate::utils::slugify;

/// Hard cap on parent hops; kept in lockstep with discovery's depth cap
const MAX_CATEGORY_DEPTH: u32 = 4;

pub struct FuryDb {
    conn: Connection,
    db_path: PathBuf,
}

/// Outcome of a bookmark upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub id: i64,
    pub created: bool,
}

/// Outcome of a bulk category creation
#[derive(Debug, Default)]
pub struct BulkOutcome {
    pub created: usize,
    pub updated: usize,
    /// temp id -> real row id
    pub category_map: HashMap<String, i64>,
}

/// Outcome of a category merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub merged_bookmarks: usize,
    pub merged_keywords: Vec<String>,
}

impl FuryDb {
    pub fn init_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn,
            db_path: PathBuf::from(":memory:"),
        };
        db.setup()?;
        Ok(db)
    }

    pub fn init(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        let db = Self {
            conn,
            db_path: db_path.to_path_buf(),
        };
        db.setup()?;
        Ok(db)
    }

    /// Open an existing database without running setup (for worker threads)
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            conn,
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_path(&self) -> &Path {
        &self.db_path
    }

    fn setup(&self) -> Result<()> {
        self.conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS categories (
                id integer PRIMARY KEY,
                name text NOT NULL,
                slug text NOT NULL UNIQUE,
                description text,
                parent_id integer REFERENCES categories(id) ON DELETE SET NULL,
                keywords text NOT NULL DEFAULT '[]'
            );

            CREATE TABLE IF NOT EXISTS bookmarks (
                id integer PRIMARY KEY,
                url text NOT NULL UNIQUE,
                title text NOT NULL DEFAULT '',
                description text,
                source_folder text,
                category_id integer REFERENCES categories(id) ON DELETE SET NULL,
                meta_title text,
                meta_description text,
                og_title text,
                og_description text,
                og_image text,
                keywords text,
                summary text,
                suggested_category text,
                confidence integer,
                created_at integer NOT NULL,
                updated_at integer NOT NULL
            );

            CREATE TABLE IF NOT EXISTS import_sessions (
                id integer PRIMARY KEY,
                file_name text NOT NULL,
                total_bookmarks integer NOT NULL DEFAULT 0,
                successful integer NOT NULL DEFAULT 0,
                failed integer NOT NULL DEFAULT 0,
                skipped integer NOT NULL DEFAULT 0,
                created_at integer NOT NULL
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_bookmarks_url ON bookmarks(url);
            CREATE INDEX IF NOT EXISTS idx_bookmarks_category ON bookmarks(category_id);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_categories_slug ON categories(slug);",
        )?;
        Ok(())
    }

    /* ------------------------------ categories ------------------------------ */

    /// Fetch-or-create a category by display name. Built-in presets with a
    /// parent get their parent ensured first; parent linkage set on first
    /// creation is preserved by later calls.
    pub fn ensure_category(&self, name: &str) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FuryError::InvalidInput("empty category name".to_string()));
        }
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(FuryError::InvalidInput(format!(
                "category name {:?} yields an empty slug",
                name
            )));
        }

        if let Some(existing) = self.get_category_by_slug(&slug)? {
            return Ok(existing);
        }

        let parent_id = match PRESET_PARENTS.get(name) {
            Some(parent) => Some(self.ensure_category(parent)?.id),
            None => None,
        };

        let keywords: Vec<String> = rule_for(name)
            .map(|rule| rule.keywords.iter().map(|s| s.to_string()).collect())
            .unwrap_or_default();
        let keywords_json = serde_json::to_string(&keywords)?;

        let inserted = self.conn.execute(
            "INSERT INTO categories (name, slug, description, parent_id, keywords)
             VALUES (?1, ?2, NULL, ?3, ?4)",
            params![name, slug, parent_id, keywords_json],
        );

        match inserted {
            Ok(_) => {}
            // Another worker created the same slug between our read and
            // write; re-read and use that row
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation => {}
            Err(e) => return Err(e.into()),
        }

        self.get_category_by_slug(&slug)?.ok_or_else(|| {
            FuryError::StorageConflict(format!("category {:?} vanished after insert", slug))
        })
    }

    pub fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, slug, description, parent_id, keywords
             FROM categories WHERE slug = ?1",
        )?;
        Ok(stmt.query_row([slug], category_from_row).optional()?)
    }

    pub fn get_category_by_id(&self, id: i64) -> Result<Option<Category>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, slug, description, parent_id, keywords
             FROM categories WHERE id = ?1",
        )?;
        Ok(stmt.query_row([id], category_from_row).optional()?)
    }

    pub fn get_all_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, slug, description, parent_id, keywords
             FROM categories ORDER BY id",
        )?;
        let rows = stmt.query_map([], category_from_row)?;
        let mut categories = Vec::new();
        for row in rows {
            categories.push(row?);
        }
        Ok(categories)
    }

    /// Bookmark count per category id
    pub fn category_bookmark_counts(&self) -> Result<HashMap<i64, i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT category_id, COUNT(*) FROM bookmarks
             WHERE category_id IS NOT NULL GROUP BY category_id",
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))?;
        let mut counts = HashMap::new();
        for row in rows {
            let (id, count) = row?;
            counts.insert(id, count);
        }
        Ok(counts)
    }

    /// Parent hops from the category to its root (a root is depth 1)
    pub fn category_depth(&self, id: i64) -> Result<u32> {
        let mut depth = 1;
        let mut cursor = id;
        loop {
            let parent: Option<i64> = self
                .conn
                .query_row(
                    "SELECT parent_id FROM categories WHERE id = ?1",
                    [cursor],
                    |row| row.get(0),
                )
                .optional()?
                .flatten();
            match parent {
                Some(p) if depth <= MAX_CATEGORY_DEPTH + 1 => {
                    depth += 1;
                    cursor = p;
                }
                _ => return Ok(depth),
            }
        }
    }

    /// Idempotent seed of the built-in root taxonomy. A no-op whenever any
    /// category already exists.
    pub fn ensure_defaults(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(0);
        }

        for name in ROOT_CATEGORIES {
            let keywords: Vec<String> = rule_for(name)
                .map(|rule| rule.keywords.iter().map(|s| s.to_string()).collect())
                .unwrap_or_default();
            self.conn.execute(
                "INSERT INTO categories (name, slug, description, parent_id, keywords)
                 VALUES (?1, ?2, NULL, NULL, ?3)",
                params![name, slugify(name), serde_json::to_string(&keywords)?],
            )?;
        }
        Ok(ROOT_CATEGORIES.len())
    }

    /// Persist a discovered category forest in one transaction, mapping
    /// temp ids to real row ids via a parent-first traversal. With
    /// `replace_existing`, bookmarks are detached and the whole category
    /// table is rebuilt; the orphans stay until a later import reassigns
    /// them.
    pub fn create_categories_bulk(
        &self,
        roots: &[DiscoveredCategory],
        replace_existing: bool,
    ) -> Result<BulkOutcome> {
        let tx = self.conn.unchecked_transaction()?;
        let mut outcome = BulkOutcome::default();

        if replace_existing {
            tx.execute("UPDATE bookmarks SET category_id = NULL", [])?;
            tx.execute("DELETE FROM categories", [])?;
        }

        for cat in DiscoveredCategory::flatten(roots) {
            let slug = if cat.slug.is_empty() {
                slugify(&cat.name)
            } else {
                cat.slug.clone()
            };
            if slug.is_empty() {
                return Err(FuryError::InvalidInput(format!(
                    "category {:?} yields an empty slug",
                    cat.name
                )));
            }

            let parent_db_id = cat
                .parent_id
                .as_ref()
                .and_then(|tmp| outcome.category_map.get(tmp))
                .copied();
            let keywords_json = serde_json::to_string(&cat.keywords)?;

            let existing: Option<i64> = tx
                .query_row("SELECT id FROM categories WHERE slug = ?1", [&slug], |row| {
                    row.get(0)
                })
                .optional()?;

            let id = match existing {
                Some(id) => {
                    tx.execute(
                        "UPDATE categories
                         SET name = ?1, description = ?2, parent_id = ?3, keywords = ?4
                         WHERE id = ?5",
                        params![cat.name, cat.description, parent_db_id, keywords_json, id],
                    )?;
                    outcome.updated += 1;
                    id
                }
                None => {
                    tx.execute(
                        "INSERT INTO categories (name, slug, description, parent_id, keywords)
                         VALUES (?1, ?2, ?3, ?4, ?5)",
                        params![cat.name, slug, cat.description, parent_db_id, keywords_json],
                    )?;
                    outcome.created += 1;
                    tx.last_insert_rowid()
                }
            };
            outcome.category_map.insert(cat.id.clone(), id);
        }

        tx.commit()?;
        Ok(outcome)
    }

    /// Merge one category into another: keyword union, children
    /// reparented, bookmarks reassigned, source deleted. Atomic; on any
    /// failure the store is unchanged.
    pub fn merge_categories(&self, source_id: i64, target_id: i64) -> Result<MergeOutcome> {
        if source_id == target_id {
            return Err(FuryError::InvalidInput(
                "source and target categories are the same".to_string(),
            ));
        }
        let source = self
            .get_category_by_id(source_id)?
            .ok_or_else(|| FuryError::InvalidInput(format!("no category with id {}", source_id)))?;
        let target = self
            .get_category_by_id(target_id)?
            .ok_or_else(|| FuryError::InvalidInput(format!("no category with id {}", target_id)))?;

        let mut merged_keywords = target.keywords.clone();
        for keyword in source.keywords {
            if !merged_keywords.contains(&keyword) {
                merged_keywords.push(keyword);
            }
        }

        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "UPDATE categories SET keywords = ?1 WHERE id = ?2",
            params![serde_json::to_string(&merged_keywords)?, target_id],
        )?;

        let merged_bookmarks = tx.execute(
            "UPDATE bookmarks SET category_id = ?1 WHERE category_id = ?2",
            params![target_id, source_id],
        )?;

        // Reparent the source's children; the target itself may be one of
        // them, so exclude it to avoid a self-loop (deleting the source
        // then promotes the target to a root via ON DELETE SET NULL)
        tx.execute(
            "UPDATE categories SET parent_id = ?1 WHERE parent_id = ?2 AND id != ?1",
            params![target_id, source_id],
        )?;

        tx.execute("DELETE FROM categories WHERE id = ?1", params![source_id])?;

        // Reparenting can push a subtree past the depth cap; promote
        // over-deep nodes to their grandparent until the invariant holds
        loop {
            let mut stmt = tx.prepare("SELECT id, parent_id FROM categories")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, Option<i64>>(1)?))
            })?;
            let mut parents: HashMap<i64, Option<i64>> = HashMap::new();
            for row in rows {
                let (id, parent) = row?;
                parents.insert(id, parent);
            }
            drop(stmt);

            let mut fixed_any = false;
            for (&id, _) in &parents {
                if depth_in(&parents, id) > MAX_CATEGORY_DEPTH {
                    let parent = parents.get(&id).copied().flatten();
                    let grandparent =
                        parent.and_then(|p| parents.get(&p).copied().flatten());
                    tx.execute(
                        "UPDATE categories SET parent_id = ?1 WHERE id = ?2",
                        params![grandparent, id],
                    )?;
                    fixed_any = true;
                    break;
                }
            }
            if !fixed_any {
                break;
            }
        }

        tx.commit()?;
        Ok(MergeOutcome {
            merged_bookmarks,
            merged_keywords,
        })
    }

    /* ------------------------------ bookmarks ------------------------------ */

    /// Insert or update a bookmark by its normalized URL. Enrichment
    /// fields only overwrite when a new value is present, so a fast-path
    /// re-import does not erase earlier enrichment.
    pub fn upsert_bookmark(&self, url: &str, fields: &BookmarkFields) -> Result<UpsertOutcome> {
        if url.trim().is_empty() {
            return Err(FuryError::InvalidInput("empty bookmark url".to_string()));
        }
        let now = Utc::now().timestamp();

        let existing: Option<i64> = self
            .conn
            .query_row("SELECT id FROM bookmarks WHERE url = ?1", [url], |row| {
                row.get(0)
            })
            .optional()?;

        if let Some(id) = existing {
            self.update_bookmark_fields(id, fields, now)?;
            return Ok(UpsertOutcome { id, created: false });
        }

        let inserted = self.conn.execute(
            "INSERT INTO bookmarks (
                url, title, description, source_folder, category_id,
                meta_title, meta_description, og_title, og_description, og_image,
                keywords, summary, suggested_category, confidence,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                url,
                fields.title,
                fields.description,
                fields.source_folder,
                fields.category_id,
                fields.meta_title,
                fields.meta_description,
                fields.og_title,
                fields.og_description,
                fields.og_image,
                fields.keywords,
                fields.summary,
                fields.suggested_category,
                fields.confidence,
                now,
                now
            ],
        );

        match inserted {
            Ok(_) => Ok(UpsertOutcome {
                id: self.conn.last_insert_rowid(),
                created: true,
            }),
            // Unique-key clash: a concurrent worker inserted the same URL
            // first; re-read and switch to update
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                let id: i64 = self.conn.query_row(
                    "SELECT id FROM bookmarks WHERE url = ?1",
                    [url],
                    |row| row.get(0),
                )?;
                self.update_bookmark_fields(id, fields, now)?;
                Ok(UpsertOutcome { id, created: false })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn update_bookmark_fields(&self, id: i64, fields: &BookmarkFields, now: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE bookmarks SET
                title = ?1,
                description = COALESCE(?2, description),
                source_folder = COALESCE(?3, source_folder),
                category_id = COALESCE(?4, category_id),
                meta_title = COALESCE(?5, meta_title),
                meta_description = COALESCE(?6, meta_description),
                og_title = COALESCE(?7, og_title),
                og_description = COALESCE(?8, og_description),
                og_image = COALESCE(?9, og_image),
                keywords = COALESCE(?10, keywords),
                summary = COALESCE(?11, summary),
                suggested_category = COALESCE(?12, suggested_category),
                confidence = COALESCE(?13, confidence),
                updated_at = ?14
             WHERE id = ?15",
            params![
                fields.title,
                fields.description,
                fields.source_folder,
                fields.category_id,
                fields.meta_title,
                fields.meta_description,
                fields.og_title,
                fields.og_description,
                fields.og_image,
                fields.keywords,
                fields.summary,
                fields.suggested_category,
                fields.confidence,
                now,
                id
            ],
        )?;
        Ok(())
    }

    pub fn get_bookmark_by_url(&self, url: &str) -> Result<Option<Bookmark>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM bookmarks WHERE url = ?1",
            BOOKMARK_COLUMNS
        ))?;
        Ok(stmt.query_row([url], bookmark_from_row).optional()?)
    }

    pub fn get_bookmark_by_id(&self, id: i64) -> Result<Option<Bookmark>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM bookmarks WHERE id = ?1",
            BOOKMARK_COLUMNS
        ))?;
        Ok(stmt.query_row([id], bookmark_from_row).optional()?)
    }

    pub fn get_all_bookmarks(&self) -> Result<Vec<Bookmark>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM bookmarks ORDER BY id",
            BOOKMARK_COLUMNS
        ))?;
        let rows = stmt.query_map([], bookmark_from_row)?;
        let mut bookmarks = Vec::new();
        for row in rows {
            bookmarks.push(row?);
        }
        Ok(bookmarks)
    }

    /// Substring search over title, url and description, optionally
    /// restricted to one category. LIKE wildcards in the query are
    /// escaped so they match literally.
    pub fn search_bookmarks(
        &self,
        query: Option<&str>,
        category_id: Option<i64>,
    ) -> Result<Vec<Bookmark>> {
        let pattern = query.map(|q| {
            let escaped = q
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{}%", escaped)
        });

        let mut sql = format!("SELECT {} FROM bookmarks WHERE 1=1", BOOKMARK_COLUMNS);
        if pattern.is_some() {
            sql.push_str(
                " AND (title LIKE ?1 ESCAPE '\\' OR url LIKE ?1 ESCAPE '\\' \
                 OR COALESCE(description, '') LIKE ?1 ESCAPE '\\')",
            );
        }
        if category_id.is_some() {
            sql.push_str(&format!(
                " AND category_id = ?{}",
                if pattern.is_some() { 2 } else { 1 }
            ));
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = match (&pattern, category_id) {
            (Some(p), Some(c)) => stmt.query_map(params![p, c], bookmark_from_row)?,
            (Some(p), None) => stmt.query_map(params![p], bookmark_from_row)?,
            (None, Some(c)) => stmt.query_map(params![c], bookmark_from_row)?,
            (None, None) => stmt.query_map([], bookmark_from_row)?,
        };

        let mut bookmarks = Vec::new();
        for row in rows {
            bookmarks.push(row?);
        }
        Ok(bookmarks)
    }

    pub fn count_bookmarks(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM bookmarks", [], |row| row.get(0))?)
    }

    /// Read the full category forest and bookmark set in one transaction,
    /// so exporters see a consistent snapshot
    pub fn snapshot(&self) -> Result<(Vec<Category>, Vec<Bookmark>)> {
        let tx = self.conn.unchecked_transaction()?;
        let categories = self.get_all_categories()?;
        let bookmarks = self.get_all_bookmarks()?;
        tx.commit()?;
        Ok((categories, bookmarks))
    }

    /* ------------------------------ sessions ------------------------------ */

    pub fn insert_session(
        &self,
        file_name: &str,
        total_bookmarks: i64,
        successful: i64,
        failed: i64,
        skipped: i64,
    ) -> Result<ImportSession> {
        let created_at = Utc::now().timestamp();
        self.conn.execute(
            "INSERT INTO import_sessions
                (file_name, total_bookmarks, successful, failed, skipped, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![file_name, total_bookmarks, successful, failed, skipped, created_at],
        )?;
        Ok(ImportSession {
            id: self.conn.last_insert_rowid(),
            file_name: file_name.to_string(),
            total_bookmarks,
            successful,
            failed,
            skipped,
            created_at,
        })
    }

    pub fn get_session_by_id(&self, id: i64) -> Result<Option<ImportSession>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, file_name, total_bookmarks, successful, failed, skipped, created_at
             FROM import_sessions WHERE id = ?1",
        )?;
        Ok(stmt
            .query_row([id], |row| {
                Ok(ImportSession {
                    id: row.get(0)?,
                    file_name: row.get(1)?,
                    total_bookmarks: row.get(2)?,
                    successful: row.get(3)?,
                    failed: row.get(4)?,
                    skipped: row.get(5)?,
                    created_at: row.get(6)?,
                })
            })
            .optional()?)
    }
}

const BOOKMARK_COLUMNS: &str = "id, url, title, description, source_folder, category_id, \
     meta_title, meta_description, og_title, og_description, og_image, \
     keywords, summary, suggested_category, confidence, created_at, updated_at";

fn bookmark_from_row(row: &rusqlite::Row) -> rusqlite::Result<Bookmark> {
    Ok(Bookmark {
        id: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        source_folder: row.get(4)?,
        category_id: row.get(5)?,
        meta_title: row.get(6)?,
        meta_description: row.get(7)?,
        og_title: row.get(8)?,
        og_description: row.get(9)?,
        og_image: row.get(10)?,
        keywords: row.get(11)?,
        summary: row.get(12)?,
        suggested_category: row.get(13)?,
        confidence: row.get(14)?,
        created_at: row.get(15)?,
        updated_at: row.get(16)?,
    })
}

fn category_from_row(row: &rusqlite::Row) -> rusqlite::Result<Category> {
    let keywords_json: String = row.get(5)?;
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
        parent_id: row.get(4)?,
        keywords: serde_json::from_str(&keywords_json).unwrap_or_default(),
    })
}

fn depth_in(parents: &HashMap<i64, Option<i64>>, id: i64) -> u32 {
    let mut depth = 1;
    let mut cursor = id;
    let mut hops = 0;
    while let Some(Some(parent)) = parents.get(&cursor) {
        depth += 1;
        cursor = *parent;
        hops += 1;
        if hops > parents.len() {
            break;
        }
    }
    depth
}
