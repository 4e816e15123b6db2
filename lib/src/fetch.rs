//! Reachability probing and page-metadata extraction.
//!
//! The fetcher never surfaces errors to the pipeline: `validate` answers
//! with a bool and `fetch_metadata` with an Option, so a dead link costs a
//! skip counter, not a failed run.

use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use std::time::Duration;
use url::Url;

use crate::config::Config;
use crate::error::Result;
use crate::utils;

/// Maximum length of the whitespace-normalized body snippet
const BODY_SNIPPET_LIMIT: usize = 5_000;

/// Subtrees stripped before body-text extraction
const STRIPPED_TAGS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "aside", "noscript", "iframe", "svg",
];

/// URL schemes accepted without a network probe
const INTERNAL_SCHEMES: &[&str] = &[
    "chrome-extension",
    "moz-extension",
    "edge-extension",
    "chrome",
    "about",
    "file",
];

/// Metadata extracted from a fetched page. All fields optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
    pub body_text: Option<String>,
}

/// Reachability probing and metadata fetching as seen by the import
/// pipeline. `PageFetcher` is the production implementation; tests
/// substitute stubs so no network traffic happens there.
pub trait Fetcher: Send {
    /// Check that a URL is worth storing
    fn validate(&self, url: &str) -> bool;

    /// Fetch a page and extract its metadata; None on transport failure
    fn fetch_metadata(&self, url: &str) -> Option<PageMetadata>;
}

/// HTTP client pair used for probing and fetching bookmark targets
pub struct PageFetcher {
    client: Client,
    head_timeout: Duration,
    probe_timeout: Duration,
    get_timeout: Duration,
}

impl PageFetcher {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(Policy::limited(config.fetch.max_redirects))
            .build()?;

        Ok(Self {
            client,
            head_timeout: Duration::from_secs(config.fetch.head_timeout_secs),
            probe_timeout: Duration::from_secs(config.fetch.probe_timeout_secs),
            get_timeout: Duration::from_secs(config.fetch.get_timeout_secs),
        })
    }
}

impl Fetcher for PageFetcher {
    /// Internal addresses pass without a probe; everything else gets a
    /// HEAD, then one GET retry that stops at the response headers.
    /// Server errors (>= 500) are invalid.
    fn validate(&self, url: &str) -> bool {
        if is_internal_address(url) {
            return true;
        }

        if Url::parse(url).is_err() {
            return false;
        }

        match self
            .client
            .head(url)
            .timeout(self.head_timeout)
            .send()
        {
            Ok(resp) if resp.status().as_u16() < 400 => return true,
            Ok(resp) => {
                log::debug!("HEAD {} -> {}, retrying with GET", url, resp.status());
            }
            Err(e) => {
                log::debug!("HEAD {} failed ({}), retrying with GET", url, e);
            }
        }

        // Some hosts reject HEAD outright; a GET that is dropped after the
        // headers settles it. Status >= 500 stays invalid.
        match self.client.get(url).timeout(self.probe_timeout).send() {
            Ok(resp) => resp.status().as_u16() < 500,
            Err(e) => {
                log::debug!("GET probe {} failed: {}", url, e);
                false
            }
        }
    }

    /// Returns None on transport failure or a non-success status; parse
    /// oddities degrade to empty fields.
    fn fetch_metadata(&self, url: &str) -> Option<PageMetadata> {
        let resp = match self.client.get(url).timeout(self.get_timeout).send() {
            Ok(resp) => resp,
            Err(e) => {
                log::debug!("GET {} failed: {}", url, e);
                return None;
            }
        };

        if !resp.status().is_success() {
            log::debug!("GET {} -> {}", url, resp.status());
            return None;
        }

        let body = match resp.text() {
            Ok(body) => body,
            Err(e) => {
                log::debug!("reading body of {} failed: {}", url, e);
                return None;
            }
        };

        Some(extract_metadata(&body))
    }
}

/// Loopback, RFC-1918, mDNS/.internal hosts and browser-internal schemes
/// are accepted without probing; they are unreachable from here anyway.
pub fn is_internal_address(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    if let Some((scheme, _)) = lower.split_once(':') {
        if INTERNAL_SCHEMES.contains(&scheme) {
            return true;
        }
    }

    let Ok(parsed) = Url::parse(&lower) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };

    if host == "localhost" || host.ends_with(".local") || host.ends_with(".internal") {
        return true;
    }

    if host == "127.0.0.1" || host == "::1" || host.starts_with("127.") {
        return true;
    }

    // RFC-1918 ranges
    if host.starts_with("10.") || host.starts_with("192.168.") {
        return true;
    }
    if let Some(rest) = host.strip_prefix("172.") {
        if let Some(second) = rest.split('.').next() {
            if let Ok(octet) = second.parse::<u8>() {
                return (16..=31).contains(&octet);
            }
        }
    }

    false
}

/// Parse HTML and extract title, meta description, OpenGraph tags, and a
/// bounded body-text snippet with chrome subtrees stripped.
pub fn extract_metadata(html: &str) -> PageMetadata {
    let dom = match tl::parse(html, tl::ParserOptions::default()) {
        Ok(dom) => dom,
        Err(_) => return PageMetadata::default(),
    };
    let parser = dom.parser();

    let title = dom
        .query_selector("title")
        .and_then(|mut iter| iter.next())
        .and_then(|handle| handle.get(parser))
        .map(|node| utils::collapse_whitespace(node.inner_text(parser).as_ref()))
        .filter(|s| !s.is_empty());

    let description = meta_content(&dom, parser, "meta[name='description']");
    let og_title = meta_content(&dom, parser, "meta[property='og:title']");
    let og_description = meta_content(&dom, parser, "meta[property='og:description']");
    let og_image = meta_content(&dom, parser, "meta[property='og:image']");

    let body_text = collect_body_text(&dom, parser);

    PageMetadata {
        title,
        description,
        og_title,
        og_description,
        og_image,
        body_text,
    }
}

fn meta_content(dom: &tl::VDom, parser: &tl::Parser, selector: &str) -> Option<String> {
    dom.query_selector(selector)
        .and_then(|mut iter| iter.next())
        .and_then(|handle| handle.get(parser))
        .and_then(|node| {
            node.as_tag().and_then(|tag| {
                tag.attributes()
                    .get("content")
                    .flatten()
                    .map(|v| utils::collapse_whitespace(v.as_utf8_str().as_ref()))
            })
        })
        .filter(|s| !s.is_empty())
}

/// Walk the node list linearly, collecting raw text outside the stripped
/// subtrees, up to the snippet limit. Browsers close these tags reliably,
/// so a depth counter over open/close tag names is sufficient.
fn collect_body_text(dom: &tl::VDom, parser: &tl::Parser) -> Option<String> {
    let has_body = dom.query_selector("body").is_some_and(|mut it| it.next().is_some());

    let mut collecting = !has_body;
    let mut strip_depth: usize = 0;
    let mut in_title = false;
    let mut text = String::new();

    for node in dom.nodes() {
        match node {
            tl::Node::Tag(tag) => {
                let name = tag.name().as_utf8_str().to_lowercase();
                if name == "body" {
                    collecting = true;
                } else if name == "title" {
                    in_title = true;
                } else if name == "/title" {
                    in_title = false;
                } else if STRIPPED_TAGS.contains(&name.as_str()) {
                    strip_depth += 1;
                } else if let Some(open) = name.strip_prefix('/') {
                    if STRIPPED_TAGS.contains(&open) {
                        strip_depth = strip_depth.saturating_sub(1);
                    }
                }
            }
            tl::Node::Raw(bytes) => {
                if collecting && strip_depth == 0 && !in_title {
                    let chunk = bytes.as_utf8_str();
                    if !chunk.trim().is_empty() {
                        if !text.is_empty() {
                            text.push(' ');
                        }
                        text.push_str(chunk.as_ref());
                        if text.len() > BODY_SNIPPET_LIMIT * 2 {
                            break;
                        }
                    }
                }
            }
            tl::Node::Comment(_) => {}
        }
    }

    let mut normalized = utils::collapse_whitespace(&text);
    if normalized.is_empty() {
        return None;
    }
    if normalized.len() > BODY_SNIPPET_LIMIT {
        let mut cut = BODY_SNIPPET_LIMIT;
        while !normalized.is_char_boundary(cut) {
            cut -= 1;
        }
        normalized.truncate(cut);
    }
    Some(normalized)
}
