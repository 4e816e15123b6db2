//! Export the persisted corpus as a Chrome-style nested JSON tree or a
//! Netscape bookmark file, preserving the category hierarchy. Only
//! categories holding at least one in-scope bookmark (plus their
//! ancestors) are emitted.

use chrono::Utc;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::db::FuryDb;
use crate::error::{FuryError, Result};
use crate::models::{Bookmark, Category};
use crate::utils::escape_html;

/// Target browser dialect. Chrome gets the JSON tree; Firefox and Safari
/// both read Netscape HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Chrome,
    Firefox,
    Safari,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "chrome" => Some(ExportFormat::Chrome),
            "firefox" => Some(ExportFormat::Firefox),
            "safari" => Some(ExportFormat::Safari),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Chrome => "chrome",
            ExportFormat::Firefox => "firefox",
            ExportFormat::Safari => "safari",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Chrome => "json",
            ExportFormat::Firefox | ExportFormat::Safari => "html",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Chrome => "application/json",
            ExportFormat::Firefox | ExportFormat::Safari => "text/html",
        }
    }
}

/// A rendered export ready to ship as an attachment
#[derive(Debug, Clone)]
pub struct ExportDocument {
    pub body: String,
    pub content_type: &'static str,
    pub file_name: String,
}

/// Chrome bookmark-file node
#[derive(Debug, Serialize)]
struct ChromeNode {
    #[serde(rename = "type")]
    node_type: &'static str,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_added: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    children: Option<Vec<ChromeNode>>,
}

#[derive(Debug, Serialize)]
struct ChromeRoots {
    bookmark_bar: ChromeNode,
    other: ChromeNode,
}

#[derive(Debug, Serialize)]
struct ChromeFile {
    roots: ChromeRoots,
    version: u32,
}

/// Export the store in the requested format, optionally restricted to one
/// category's subtree (ancestor folders are kept for context).
pub fn export_corpus(
    db: &FuryDb,
    format: ExportFormat,
    category_id: Option<i64>,
) -> Result<ExportDocument> {
    let (categories, bookmarks) = db.snapshot()?;
    let view = CorpusView::build(categories, bookmarks, category_id)?;

    let body = match format {
        ExportFormat::Chrome => render_chrome(&view)?,
        ExportFormat::Firefox | ExportFormat::Safari => render_netscape(&view),
    };

    Ok(ExportDocument {
        body,
        content_type: format.content_type(),
        file_name: format!(
            "fury_bookmarks_{}_{}.{}",
            format.as_str(),
            Utc::now().format("%Y-%m-%d"),
            format.extension()
        ),
    })
}

/// Pre-joined snapshot: category forest, bookmark grouping, and the
/// in-scope sets derived from the optional filter
struct CorpusView {
    categories: HashMap<i64, Category>,
    /// Child category ids per parent, None = roots; ordered by id
    children: HashMap<Option<i64>, Vec<i64>>,
    /// Bookmarks per category id
    by_category: HashMap<i64, Vec<Bookmark>>,
    /// Bookmarks with no category; empty when a filter is active
    uncategorized: Vec<Bookmark>,
    /// Categories to render: holders of in-scope bookmarks plus ancestors
    visible: HashSet<i64>,
}

impl CorpusView {
    fn build(
        categories: Vec<Category>,
        bookmarks: Vec<Bookmark>,
        filter: Option<i64>,
    ) -> Result<Self> {
        let category_map: HashMap<i64, Category> =
            categories.into_iter().map(|c| (c.id, c)).collect();

        if let Some(id) = filter {
            if !category_map.contains_key(&id) {
                return Err(FuryError::InvalidInput(format!(
                    "no category with id {}",
                    id
                )));
            }
        }

        let mut children: HashMap<Option<i64>, Vec<i64>> = HashMap::new();
        let mut ids: Vec<i64> = category_map.keys().copied().collect();
        ids.sort_unstable();
        for id in &ids {
            let parent = category_map[id].parent_id;
            children.entry(parent).or_default().push(*id);
        }

        // Subtree of the filter, or everything
        let in_scope: HashSet<i64> = match filter {
            Some(root) => {
                let mut set = HashSet::from([root]);
                let mut queue = vec![root];
                while let Some(id) = queue.pop() {
                    for child in children.get(&Some(id)).into_iter().flatten() {
                        if set.insert(*child) {
                            queue.push(*child);
                        }
                    }
                }
                set
            }
            None => ids.iter().copied().collect(),
        };

        let mut by_category: HashMap<i64, Vec<Bookmark>> = HashMap::new();
        let mut uncategorized = Vec::new();
        for bookmark in bookmarks {
            match bookmark.category_id {
                Some(id) if in_scope.contains(&id) => {
                    by_category.entry(id).or_default().push(bookmark)
                }
                None if filter.is_none() => uncategorized.push(bookmark),
                _ => {}
            }
        }

        // Visible folders: any category whose subtree holds a bookmark,
        // plus every ancestor of a visible category
        let mut visible: HashSet<i64> = HashSet::new();
        for id in by_category.keys() {
            let mut cursor = Some(*id);
            while let Some(current) = cursor {
                if !visible.insert(current) {
                    break;
                }
                cursor = category_map.get(&current).and_then(|c| c.parent_id);
            }
        }

        Ok(Self {
            categories: category_map,
            children,
            by_category,
            uncategorized,
            visible,
        })
    }

    fn visible_children(&self, parent: Option<i64>) -> Vec<i64> {
        self.children
            .get(&parent)
            .map(|ids| {
                ids.iter()
                    .copied()
                    .filter(|id| self.visible.contains(id))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/* ------------------------------- chrome ------------------------------- */

fn render_chrome(view: &CorpusView) -> Result<String> {
    let bookmark_bar = ChromeNode {
        node_type: "folder",
        name: "Bookmarks bar".to_string(),
        url: None,
        date_added: None,
        children: Some(
            view.uncategorized
                .iter()
                .map(chrome_url_node)
                .collect(),
        ),
    };

    let other = ChromeNode {
        node_type: "folder",
        name: "Other bookmarks".to_string(),
        url: None,
        date_added: None,
        children: Some(
            view.visible_children(None)
                .into_iter()
                .map(|id| chrome_folder_node(view, id))
                .collect(),
        ),
    };

    let file = ChromeFile {
        roots: ChromeRoots {
            bookmark_bar,
            other,
        },
        version: 1,
    };
    Ok(serde_json::to_string_pretty(&file)?)
}

fn chrome_url_node(bookmark: &Bookmark) -> ChromeNode {
    ChromeNode {
        node_type: "url",
        name: bookmark.title.clone(),
        url: Some(bookmark.url.clone()),
        date_added: Some(bookmark.created_at.to_string()),
        children: None,
    }
}

fn chrome_folder_node(view: &CorpusView, id: i64) -> ChromeNode {
    let mut children: Vec<ChromeNode> = view
        .by_category
        .get(&id)
        .into_iter()
        .flatten()
        .map(chrome_url_node)
        .collect();
    for child_id in view.visible_children(Some(id)) {
        children.push(chrome_folder_node(view, child_id));
    }

    ChromeNode {
        node_type: "folder",
        name: view.categories[&id].name.clone(),
        url: None,
        date_added: None,
        children: Some(children),
    }
}

/* ------------------------------ netscape ------------------------------ */

fn render_netscape(view: &CorpusView) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str("<!DOCTYPE NETSCAPE-Bookmark-file-1>\n");
    out.push_str("<!-- This is an automatically generated file.\n");
    out.push_str("     It will be read and overwritten.\n");
    out.push_str("     DO NOT EDIT! -->\n");
    out.push_str("<META HTTP-EQUIV=\"Content-Type\" CONTENT=\"text/html; charset=UTF-8\">\n");
    out.push_str("<TITLE>Bookmarks</TITLE>\n");
    out.push_str("<H1>Bookmarks</H1>\n");
    out.push_str("<DL><p>\n");

    for bookmark in &view.uncategorized {
        write_netscape_bookmark(&mut out, bookmark, 1);
    }
    for id in view.visible_children(None) {
        write_netscape_folder(&mut out, view, id, 1);
    }

    out.push_str("</DL><p>\n");
    out
}

fn write_netscape_folder(out: &mut String, view: &CorpusView, id: i64, depth: usize) {
    let indent = "    ".repeat(depth);
    let category = &view.categories[&id];
    out.push_str(&format!(
        "{}<DT><H3 ADD_DATE=\"{}\">{}</H3>\n",
        indent,
        Utc::now().timestamp(),
        escape_html(&category.name)
    ));
    out.push_str(&format!("{}<DL><p>\n", indent));

    for bookmark in view.by_category.get(&id).into_iter().flatten() {
        write_netscape_bookmark(out, bookmark, depth + 1);
    }
    for child_id in view.visible_children(Some(id)) {
        write_netscape_folder(out, view, child_id, depth + 1);
    }

    out.push_str(&format!("{}</DL><p>\n", indent));
}

fn write_netscape_bookmark(out: &mut String, bookmark: &Bookmark, depth: usize) {
    let indent = "    ".repeat(depth);
    out.push_str(&format!(
        "{}<DT><A HREF=\"{}\" ADD_DATE=\"{}\">{}</A>\n",
        indent,
        escape_html(&bookmark.url),
        bookmark.created_at,
        escape_html(&bookmark.title)
    ));
    if let Some(desc) = bookmark.description.as_deref().filter(|d| !d.is_empty()) {
        out.push_str(&format!("{}<DD>{}\n", indent, escape_html(desc)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookmarkFields;
    use crate::netscape::parse_netscape;

    fn seeded_db() -> (FuryDb, i64, i64, i64) {
        let db = FuryDb::init_in_memory().unwrap();
        let tech = db.ensure_category("Technology").unwrap();
        let dev = db.ensure_category("Web Development").unwrap();
        let travel = db.ensure_category("Travel").unwrap();

        let mut f = BookmarkFields {
            title: "Rust repo".to_string(),
            category_id: Some(dev.id),
            ..BookmarkFields::default()
        };
        db.upsert_bookmark("https://github.com/rust-lang/rust", &f)
            .unwrap();

        f = BookmarkFields {
            title: "Pack light".to_string(),
            description: Some("One bag travel".to_string()),
            category_id: Some(travel.id),
            ..BookmarkFields::default()
        };
        db.upsert_bookmark("https://onebag.example", &f).unwrap();

        f = BookmarkFields {
            title: "Loose end".to_string(),
            category_id: None,
            ..BookmarkFields::default()
        };
        db.upsert_bookmark("https://loose.example", &f).unwrap();

        (db, tech.id, dev.id, travel.id)
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(ExportFormat::parse("Chrome"), Some(ExportFormat::Chrome));
        assert_eq!(ExportFormat::parse("FIREFOX"), Some(ExportFormat::Firefox));
        assert_eq!(ExportFormat::parse("safari"), Some(ExportFormat::Safari));
        assert_eq!(ExportFormat::parse("opera"), None);
    }

    #[test]
    fn test_chrome_export_structure() {
        let (db, _, _, _) = seeded_db();
        let doc = export_corpus(&db, ExportFormat::Chrome, None).unwrap();
        assert_eq!(doc.content_type, "application/json");
        assert!(doc.file_name.starts_with("fury_bookmarks_chrome_"));
        assert!(doc.file_name.ends_with(".json"));

        let parsed: serde_json::Value = serde_json::from_str(&doc.body).unwrap();
        // Uncategorized bookmarks live in the bookmark bar
        let bar = &parsed["roots"]["bookmark_bar"]["children"];
        assert_eq!(bar.as_array().unwrap().len(), 1);
        assert_eq!(bar[0]["url"], "https://loose.example");

        // Web Development nests under Technology; Travel is a sibling root
        let other = parsed["roots"]["other"]["children"].as_array().unwrap();
        let names: Vec<&str> = other.iter().map(|n| n["name"].as_str().unwrap()).collect();
        assert!(names.contains(&"Technology"));
        assert!(names.contains(&"Travel"));

        let tech = other.iter().find(|n| n["name"] == "Technology").unwrap();
        let dev = &tech["children"][0];
        assert_eq!(dev["name"], "Web Development");
        assert_eq!(dev["children"][0]["url"], "https://github.com/rust-lang/rust");
    }

    #[test]
    fn test_empty_categories_are_omitted() {
        let (db, _, _, _) = seeded_db();
        db.ensure_category("Ghost Town").unwrap();
        let doc = export_corpus(&db, ExportFormat::Chrome, None).unwrap();
        assert!(!doc.body.contains("Ghost Town"));
    }

    #[test]
    fn test_netscape_export_and_reimport_round_trip() {
        let (db, _, _, _) = seeded_db();
        let doc = export_corpus(&db, ExportFormat::Firefox, None).unwrap();
        assert_eq!(doc.content_type, "text/html");
        assert!(doc.body.starts_with("<!DOCTYPE NETSCAPE-Bookmark-file-1>"));
        assert!(doc.body.contains("<DD>One bag travel"));

        let reparsed = parse_netscape(&doc.body).unwrap();
        let mut urls: Vec<&str> = reparsed.iter().map(|b| b.url.as_str()).collect();
        urls.sort_unstable();
        assert_eq!(
            urls,
            vec![
                "https://github.com/rust-lang/rust",
                "https://loose.example",
                "https://onebag.example",
            ]
        );

        // Category names come back as folder breadcrumbs
        let repo = reparsed
            .iter()
            .find(|b| b.url == "https://github.com/rust-lang/rust")
            .unwrap();
        assert_eq!(
            repo.source_folder.as_deref(),
            Some("Technology / Web Development")
        );
    }

    #[test]
    fn test_category_filter_keeps_subtree_and_ancestors() {
        let (db, _tech_id, dev_id, _travel_id) = seeded_db();
        let doc = export_corpus(&db, ExportFormat::Chrome, Some(dev_id)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&doc.body).unwrap();

        // The ancestor folder is kept, the unrelated branch is not
        assert!(doc.body.contains("Technology"));
        assert!(doc.body.contains("Web Development"));
        assert!(!doc.body.contains("Travel"));
        assert!(!doc.body.contains("loose.example"));

        let bar = parsed["roots"]["bookmark_bar"]["children"].as_array().unwrap();
        assert!(bar.is_empty());
    }

    #[test]
    fn test_unknown_filter_category_is_an_error() {
        let (db, _, _, _) = seeded_db();
        assert!(export_corpus(&db, ExportFormat::Chrome, Some(12345)).is_err());
    }

    #[test]
    fn test_safari_uses_netscape_too() {
        let (db, _, _, _) = seeded_db();
        let doc = export_corpus(&db, ExportFormat::Safari, None).unwrap();
        assert!(doc.file_name.starts_with("fury_bookmarks_safari_"));
        assert!(doc.file_name.ends_with(".html"));
    }
}
