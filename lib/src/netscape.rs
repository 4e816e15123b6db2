//! Parser for the Netscape bookmark file format exported by browsers.
//!
//! The format is a loosely nested definition list: `<DT><H3>` headings open
//! folders, `<DT><A HREF>` entries are bookmarks, `<DD>` lines carry an
//! optional description for the preceding entry, and `</DL>` closes a
//! folder level. Browsers emit unclosed tags freely, so the walk is a
//! linear scan over the node list rather than a strict tree traversal.

use crate::error::{FuryError, Result};
use crate::models::ParsedBookmark;
use crate::utils;

/// Parse a Netscape bookmark archive into a flat, ordered bookmark list
/// with folder-path breadcrumbs ("A / B / C").
///
/// Best-effort: individual malformed entries are dropped. Fails with
/// `MalformedInput` only when the document contains no definition list at
/// all.
pub fn parse_netscape(html: &str) -> Result<Vec<ParsedBookmark>> {
    let dom = tl::parse(html, tl::ParserOptions::default())?;
    let parser = dom.parser();

    let mut bookmarks: Vec<ParsedBookmark> = Vec::new();
    let mut folder_stack: Vec<String> = Vec::new();
    let mut saw_root_list = false;
    let mut expect_description = false;

    for node in dom.nodes() {
        match node {
            tl::Node::Tag(tag) => {
                let tag_name = tag.name().as_utf8_str();

                match tag_name.as_ref() {
                    "DL" | "dl" => {
                        saw_root_list = true;
                        expect_description = false;
                    }
                    // H3 tags open a folder level
                    "H3" | "h3" => {
                        let folder_name =
                            utils::collapse_whitespace(tag.inner_text(parser).as_ref());
                        // Push even when empty to keep pushes balanced with /DL pops
                        folder_stack.push(folder_name);
                        expect_description = false;
                    }
                    // A tags are bookmarks
                    "A" | "a" => {
                        expect_description = false;
                        if let Some(href) = tag
                            .attributes()
                            .get("HREF")
                            .or_else(|| tag.attributes().get("href"))
                        {
                            let url = href
                                .map(|h| h.as_utf8_str().trim().to_string())
                                .unwrap_or_default();

                            // Skip empty URLs or browser-internal pseudo URLs
                            if url.is_empty()
                                || url.starts_with("place:")
                                || url.starts_with("javascript:")
                            {
                                continue;
                            }

                            let mut title =
                                utils::collapse_whitespace(tag.inner_text(parser).as_ref());
                            if title.is_empty() {
                                title = url.clone();
                            }

                            let source_folder = {
                                let parts: Vec<&str> = folder_stack
                                    .iter()
                                    .map(|s| s.as_str())
                                    .filter(|s| !s.is_empty())
                                    .collect();
                                if parts.is_empty() {
                                    None
                                } else {
                                    Some(parts.join(" / "))
                                }
                            };

                            bookmarks.push(ParsedBookmark {
                                url,
                                title,
                                description: None,
                                source_folder,
                            });
                        }
                    }
                    // A DD element carries the description of the entry
                    // immediately before it; its text arrives as the next
                    // raw node in the linear scan
                    "DD" | "dd" => {
                        expect_description = true;
                    }
                    // /DL closes a folder level
                    "/DL" | "/dl" => {
                        folder_stack.pop();
                        expect_description = false;
                    }
                    "DT" | "dt" => {}
                    _ => {
                        expect_description = false;
                    }
                }
            }
            tl::Node::Raw(bytes) => {
                if expect_description {
                    let text = utils::collapse_whitespace(bytes.as_utf8_str().as_ref());
                    if !text.is_empty() {
                        if let Some(last) = bookmarks.last_mut() {
                            if last.description.is_none() {
                                last.description = Some(text);
                            }
                        }
                        expect_description = false;
                    }
                }
            }
            tl::Node::Comment(_) => {}
        }
    }

    if !saw_root_list {
        return Err(FuryError::MalformedInput(
            "no bookmark list found in document".to_string(),
        ));
    }

    Ok(bookmarks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SAMPLE: &str = r#"<!DOCTYPE NETSCAPE-Bookmark-file-1>
<META HTTP-EQUIV="Content-Type" CONTENT="text/html; charset=UTF-8">
<TITLE>Bookmarks</TITLE>
<H1>Bookmarks</H1>
<DL><p>
    <DT><H3 ADD_DATE="1700000000">Dev</H3>
    <DL><p>
        <DT><A HREF="https://github.com/rust-lang/rust" ADD_DATE="1700000000">Rust</A>
        <DD>The Rust repository
        <DT><H3>Docs</H3>
        <DL><p>
            <DT><A HREF="https://doc.rust-lang.org/book/">The Book</A>
        </DL><p>
    </DL><p>
    <DT><A HREF="https://news.ycombinator.com/">Hacker News</A>
</DL><p>
"#;

    #[test]
    fn test_parse_folders_and_descriptions() {
        let bookmarks = parse_netscape(SAMPLE).unwrap();
        assert_eq!(bookmarks.len(), 3);

        assert_eq!(bookmarks[0].url, "https://github.com/rust-lang/rust");
        assert_eq!(bookmarks[0].title, "Rust");
        assert_eq!(
            bookmarks[0].description.as_deref(),
            Some("The Rust repository")
        );
        assert_eq!(bookmarks[0].source_folder.as_deref(), Some("Dev"));

        assert_eq!(bookmarks[1].title, "The Book");
        assert_eq!(bookmarks[1].source_folder.as_deref(), Some("Dev / Docs"));

        // Folder stack unwinds back to the top level
        assert_eq!(bookmarks[2].title, "Hacker News");
        assert_eq!(bookmarks[2].source_folder, None);
    }

    #[test]
    fn test_no_root_list_is_malformed() {
        let err = parse_netscape("<html><body><p>hello</p></body></html>").unwrap_err();
        assert!(matches!(err, FuryError::MalformedInput(_)));
    }

    #[test]
    fn test_empty_list_parses_to_nothing() {
        let bookmarks = parse_netscape("<DL><p></DL><p>").unwrap();
        assert!(bookmarks.is_empty());
    }

    #[rstest]
    #[case(r#"<DL><DT><A HREF="">Empty</A></DL>"#)]
    #[case(r#"<DL><DT><A HREF="place:sort=8">Places query</A></DL>"#)]
    #[case(r#"<DL><DT><A HREF="javascript:void(0)">Bookmarklet</A></DL>"#)]
    #[case(r#"<DL><DT><A>No href</A></DL>"#)]
    fn test_dropped_entries(#[case] html: &str) {
        let bookmarks = parse_netscape(html).unwrap();
        assert!(bookmarks.is_empty());
    }

    #[test]
    fn test_title_defaults_to_url() {
        let bookmarks =
            parse_netscape(r#"<DL><DT><A HREF="https://example.com/x"></A></DL>"#).unwrap();
        assert_eq!(bookmarks.len(), 1);
        assert_eq!(bookmarks[0].title, "https://example.com/x");
    }

    #[test]
    fn test_description_not_stolen_by_next_entry() {
        let html = r#"<DL>
            <DT><A HREF="https://a.example/">A</A>
            <DT><A HREF="https://b.example/">B</A>
            <DD>Belongs to B
        </DL>"#;
        let bookmarks = parse_netscape(html).unwrap();
        assert_eq!(bookmarks[0].description, None);
        assert_eq!(bookmarks[1].description.as_deref(), Some("Belongs to B"));
    }

    #[test]
    fn test_whitespace_collapsed_in_titles() {
        let bookmarks = parse_netscape(
            "<DL><DT><A HREF=\"https://example.com\">  Spread \n  Out  </A></DL>",
        )
        .unwrap();
        assert_eq!(bookmarks[0].title, "Spread Out");
    }
}
