//! Text processing: cleaning, tokenization, and keyword extraction used by
//! the classifier, the metadata enricher, and the clustering fallback.

pub mod stopwords;
pub mod terms;

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use url::Url;

use crate::utils;
use stopwords::is_stopword;
use terms::{COMPOUND_TERMS, DOMAIN_HINTS, DOMAIN_TERMS};

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:https?://|www\.)[^\s]+").expect("url regex"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("email regex"));
static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(?:[a-zA-Z]{2,8}|#x?[0-9a-fA-F]{1,6});").expect("entity regex"));
static CAMEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("camel regex"));

/// A keyword with its extraction score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredKeyword {
    pub text: String,
    pub score: i64,
}

/// Knobs for `extract_semantic_keywords`
#[derive(Debug, Clone)]
pub struct KeywordConfig {
    pub min_word_length: usize,
    pub max_keywords: usize,
    /// Keep curated two-word phrases whole (scored 100) instead of
    /// emitting matching bigrams (scored 50)
    pub keep_compound_terms: bool,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            min_word_length: 2,
            max_keywords: 15,
            keep_compound_terms: true,
        }
    }
}

/// Normalize free text for tokenization: decode common HTML entities,
/// drop URLs and email addresses, split CamelCase and snake/kebab-case,
/// lowercase, collapse whitespace.
pub fn clean(text: &str) -> String {
    let text = ENTITY_RE.replace_all(text, |caps: &regex::Captures| {
        decode_entity(caps.get(0).map(|m| m.as_str()).unwrap_or(""))
    });
    let text = URL_RE.replace_all(&text, " ");
    let text = EMAIL_RE.replace_all(&text, " ");
    let text = CAMEL_RE.replace_all(&text, "$1 $2");

    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_alphanumeric() || ch == '\'' {
            for lower in ch.to_lowercase() {
                out.push(lower);
            }
        } else {
            out.push(' ');
        }
    }
    utils::collapse_whitespace(&out)
}

fn decode_entity(entity: &str) -> String {
    match entity {
        "&amp;" => "&".to_string(),
        "&lt;" => "<".to_string(),
        "&gt;" => ">".to_string(),
        "&quot;" => "\"".to_string(),
        "&apos;" | "&#39;" | "&#x27;" => "'".to_string(),
        "&nbsp;" => " ".to_string(),
        "&mdash;" | "&ndash;" => " ".to_string(),
        _ => {
            let inner = &entity[1..entity.len() - 1];
            if let Some(num) = inner.strip_prefix('#') {
                let code = if let Some(hex) = num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
                    u32::from_str_radix(hex, 16).ok()
                } else {
                    num.parse::<u32>().ok()
                };
                if let Some(ch) = code.and_then(char::from_u32) {
                    return ch.to_string();
                }
            }
            " ".to_string()
        }
    }
}

fn is_numeric(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

fn keep_token(token: &str, min_len: usize) -> bool {
    token.len() >= min_len && !is_numeric(token) && !is_stopword(token)
}

/// Extract scored keywords from free text.
///
/// Curated compound terms found in the text score 100; bigrams matching
/// the same list score 50; single words score by frequency, doubled when
/// the word appears in the domain-term table. Returns the top
/// `max_keywords` by score.
pub fn extract_semantic_keywords(text: &str, config: &KeywordConfig) -> Vec<ScoredKeyword> {
    let cleaned = clean(text);
    if cleaned.is_empty() {
        return Vec::new();
    }

    let mut keywords: Vec<ScoredKeyword> = Vec::new();
    let mut consumed: Vec<&str> = Vec::new();

    if config.keep_compound_terms {
        for term in COMPOUND_TERMS.iter() {
            if contains_phrase(&cleaned, term) {
                keywords.push(ScoredKeyword {
                    text: term.to_string(),
                    score: 100,
                });
                consumed.push(term);
            }
        }
    }

    let tokens: Vec<&str> = cleaned.split(' ').collect();

    if !config.keep_compound_terms {
        for pair in tokens.windows(2) {
            let bigram = format!("{} {}", pair[0], pair[1]);
            if COMPOUND_TERMS.contains(bigram.as_str())
                && !keywords.iter().any(|k| k.text == bigram)
            {
                keywords.push(ScoredKeyword {
                    text: bigram,
                    score: 50,
                });
            }
        }
    }

    let mut freq: HashMap<&str, i64> = HashMap::new();
    for token in &tokens {
        if keep_token(token, config.min_word_length)
            && !consumed.iter().any(|term| term.split(' ').any(|w| w == *token))
        {
            *freq.entry(token).or_insert(0) += 1;
        }
    }

    for (token, count) in freq {
        let score = if DOMAIN_TERMS.contains(token) {
            count * 2
        } else {
            count
        };
        keywords.push(ScoredKeyword {
            text: token.to_string(),
            score,
        });
    }

    keywords.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.text.cmp(&b.text)));
    keywords.truncate(config.max_keywords);
    keywords
}

fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    haystack
        .match_indices(phrase)
        .any(|(idx, _)| {
            let before_ok = idx == 0 || haystack.as_bytes()[idx - 1] == b' ';
            let end = idx + phrase.len();
            let after_ok = end == haystack.len() || haystack.as_bytes()[end] == b' ';
            before_ok && after_ok
        })
}

/// Tokens derived from a URL's host and path, stop-words and numerics
/// removed. "https://github.com/rust-lang/rust" yields
/// ["github", "rust", "lang", "rust"] minus duplicates.
pub fn extract_url_tokens(raw_url: &str) -> Vec<String> {
    let Ok(parsed) = Url::parse(raw_url.trim()) else {
        return Vec::new();
    };

    let mut tokens: Vec<String> = Vec::new();
    let mut push = |token: &str| {
        let token = token.to_lowercase();
        if keep_token(&token, 2) && !tokens.contains(&token) {
            tokens.push(token);
        }
    };

    if let Some(host) = parsed.host_str() {
        let labels: Vec<&str> = host.split('.').collect();
        // Drop the TLD and any www prefix
        let significant = if labels.len() > 1 {
            &labels[..labels.len() - 1]
        } else {
            &labels[..]
        };
        for label in significant {
            if *label != "www" {
                push(label);
            }
        }
    }

    for segment in parsed.path().split('/') {
        for part in segment.split(|c: char| c == '-' || c == '_' || c == '.') {
            push(part);
        }
    }

    tokens
}

/// Topical tags matched from the fixed host/path hint table
pub fn domain_hints(raw_url: &str) -> Vec<String> {
    let subject = match Url::parse(raw_url.trim()) {
        Ok(u) => {
            let host = u.host_str().unwrap_or("").to_ascii_lowercase();
            let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
            format!("{}{}", host, u.path().to_lowercase())
        }
        Err(_) => raw_url.trim().to_lowercase(),
    };

    let mut tags: Vec<String> = Vec::new();
    for (regex, tag) in DOMAIN_HINTS.iter() {
        if regex.is_match(&subject) && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Hello   World", "hello world")]
    #[case("CamelCaseWord", "camel case word")]
    #[case("snake_case and kebab-case", "snake case kebab case")]
    #[case("Read https://example.com/page now", "read now")]
    #[case("mail me at a.b@example.com today", "mail me at today")]
    #[case("Ben &amp; Jerry", "ben jerry")]
    #[case("", "")]
    fn test_clean(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(clean(input), expected);
    }

    #[test]
    fn test_clean_decodes_numeric_entities() {
        assert_eq!(clean("caf&#233;"), "café");
    }

    #[test]
    fn test_extract_keywords_filters_stopwords_and_numbers() {
        let keywords =
            extract_semantic_keywords("the 2024 guide to rust programming", &KeywordConfig::default());
        let texts: Vec<&str> = keywords.iter().map(|k| k.text.as_str()).collect();
        assert!(texts.contains(&"rust"));
        assert!(texts.contains(&"programming"));
        assert!(!texts.contains(&"the"));
        assert!(!texts.contains(&"2024"));
        assert!(!texts.contains(&"to"));
    }

    #[test]
    fn test_compound_term_kept_whole_at_100() {
        let keywords = extract_semantic_keywords(
            "an introduction to machine learning for beginners",
            &KeywordConfig::default(),
        );
        let top = &keywords[0];
        assert_eq!(top.text, "machine learning");
        assert_eq!(top.score, 100);
    }

    #[test]
    fn test_bigram_scores_50_when_compounds_not_kept() {
        let config = KeywordConfig {
            keep_compound_terms: false,
            ..KeywordConfig::default()
        };
        let keywords = extract_semantic_keywords("open source projects i admire", &config);
        let bigram = keywords.iter().find(|k| k.text == "open source").unwrap();
        assert_eq!(bigram.score, 50);
    }

    #[test]
    fn test_domain_term_score_doubled() {
        let keywords = extract_semantic_keywords(
            "rust rust window window",
            &KeywordConfig::default(),
        );
        let rust = keywords.iter().find(|k| k.text == "rust").unwrap();
        let window = keywords.iter().find(|k| k.text == "window").unwrap();
        assert_eq!(rust.score, 4);
        assert_eq!(window.score, 2);
    }

    #[test]
    fn test_max_keywords_respected() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa \
                    lambda mu nu xi omicron pi rho sigma tau upsilon";
        let config = KeywordConfig {
            max_keywords: 5,
            ..KeywordConfig::default()
        };
        assert_eq!(extract_semantic_keywords(text, &config).len(), 5);
    }

    #[test]
    fn test_extract_url_tokens() {
        let tokens = extract_url_tokens("https://github.com/rust-lang/rust-book");
        assert!(tokens.contains(&"github".to_string()));
        assert!(tokens.contains(&"rust".to_string()));
        assert!(tokens.contains(&"lang".to_string()));
        assert!(tokens.contains(&"book".to_string()));
        assert!(!tokens.contains(&"com".to_string()));
    }

    #[rstest]
    #[case("https://github.com/a/b", "development")]
    #[case("https://www.allrecipes.com/recipe/123", "food")]
    #[case("https://en.wikipedia.org/wiki/Rust", "reference")]
    #[case("https://booking.com/hotel", "travel")]
    fn test_domain_hints(#[case] url: &str, #[case] tag: &str) {
        let tags = domain_hints(url);
        assert!(tags.iter().any(|t| t == tag), "{:?} missing {}", tags, tag);
    }

    #[test]
    fn test_domain_hints_no_match() {
        assert!(domain_hints("https://example.org/").is_empty());
    }
}
