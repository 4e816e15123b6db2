use serde::{Deserialize, Serialize};

/// A bookmark as parsed out of a browser archive, before normalization
/// and persistence. Also the shape accepted by the analyze endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedBookmark {
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_folder: Option<String>,
}

/// A persisted bookmark row. Identity is the normalized URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: i64,
    /// Canonical form per the URL normalizer; unique across the store
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    /// Folder breadcrumb from the source archive, "A / B / C"
    pub source_folder: Option<String>,
    pub category_id: Option<i64>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
    /// Comma-joined extracted keywords
    pub keywords: Option<String>,
    pub summary: Option<String>,
    /// Category label suggested by the LLM, if any
    pub suggested_category: Option<String>,
    /// Advisory classifier confidence, 0-100
    pub confidence: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Mutable fields written by an upsert. `None` leaves the stored value
/// untouched on update and empty on insert.
#[derive(Debug, Clone, Default)]
pub struct BookmarkFields {
    pub title: String,
    pub description: Option<String>,
    pub source_folder: Option<String>,
    pub category_id: Option<i64>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
    pub keywords: Option<String>,
    pub summary: Option<String>,
    pub suggested_category: Option<String>,
    pub confidence: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsed_bookmark_deserializes_camel_case() {
        let json = r#"{"url":"https://example.com","title":"Example","sourceFolder":"Dev / Rust"}"#;
        let parsed: ParsedBookmark = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.url, "https://example.com");
        assert_eq!(parsed.source_folder.as_deref(), Some("Dev / Rust"));
        assert!(parsed.description.is_none());
    }

    #[test]
    fn test_bookmark_serialization_round_trip() {
        let bookmark = Bookmark {
            id: 1,
            url: "https://example.com".to_string(),
            title: "Example".to_string(),
            description: None,
            source_folder: None,
            category_id: Some(3),
            meta_title: Some("Example Domain".to_string()),
            meta_description: None,
            og_title: None,
            og_description: None,
            og_image: None,
            keywords: Some("example,domain".to_string()),
            summary: None,
            suggested_category: None,
            confidence: Some(40),
            created_at: 1700000000,
            updated_at: 1700000000,
        };

        let json = serde_json::to_string(&bookmark).unwrap();
        assert!(json.contains("\"categoryId\":3"));
        let back: Bookmark = serde_json::from_str(&json).unwrap();
        assert_eq!(bookmark, back);
    }
}
