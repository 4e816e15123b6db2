//! Deterministic rule classifier: scores a bookmark against the weighted
//! taxonomy and picks the highest-scoring category above a threshold.

pub mod taxonomy;

use crate::text::ScoredKeyword;
use crate::urlnorm::host_of;
use taxonomy::{CategoryRule, COMPILED_URL_PATTERNS, DEFAULT_TAXONOMY, DOMAIN_TABLE};

/// Sentinel label returned when no category clears the minimum score. The
/// caller maps it to a real `other` / `uncategorized` category.
pub const OTHER_LABEL: &str = "Other";

/// Flat 15-point bonus for an exact known-domain hit
const DOMAIN_HIT_POINTS: i64 = 15;

/// Bookmark signals fed to the classifier
#[derive(Debug, Clone, Default)]
pub struct ClassifyInput<'a> {
    pub url: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    /// Pre-extracted semantic keywords, if any
    pub keywords: &'a [ScoredKeyword],
}

/// Winning category with its raw score and the advisory 0-100 confidence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub category: String,
    pub score: i64,
    pub confidence: i64,
}

/// Score the input against the built-in taxonomy. Ties resolve in
/// declaration order; a winner below `min_score` yields the `"Other"`
/// sentinel.
pub fn classify(input: &ClassifyInput, min_score: i64) -> Classification {
    let combined = combined_text(input);
    let host = host_of(input.url);
    let url_lower = input.url.to_lowercase();

    let mut best: Option<(usize, i64)> = None;
    for (idx, rule) in DEFAULT_TAXONOMY.iter().enumerate() {
        let score = score_rule(rule, idx, &combined, &host, &url_lower, input.keywords);
        match best {
            Some((_, top)) if score <= top => {}
            _ if score > 0 => best = Some((idx, score)),
            _ => {}
        }
    }

    match best {
        Some((idx, score)) if score >= min_score => Classification {
            category: DEFAULT_TAXONOMY[idx].name.to_string(),
            score,
            confidence: (score * 4).min(100),
        },
        _ => Classification {
            category: OTHER_LABEL.to_string(),
            score: best.map(|(_, s)| s).unwrap_or(0),
            confidence: 0,
        },
    }
}

fn score_rule(
    rule: &CategoryRule,
    rule_idx: usize,
    combined: &str,
    host: &str,
    url_lower: &str,
    keywords: &[ScoredKeyword],
) -> i64 {
    // Hard exclusion wins over every other signal
    if rule.exclusions.iter().any(|ex| combined.contains(ex)) {
        return 0;
    }

    let mut score = 0;

    if COMPILED_URL_PATTERNS[rule_idx]
        .iter()
        .any(|re| re.is_match(url_lower))
    {
        score += 10 * rule.weight;
    }

    if !host.is_empty() && DOMAIN_TABLE.get(host) == Some(&rule.name) {
        score += DOMAIN_HIT_POINTS;
    }

    for keyword in rule.keywords {
        let hit = if rule.require_word_boundary {
            contains_word(combined, keyword)
        } else {
            combined.contains(keyword)
        };
        if hit {
            score += rule.weight;
        }
    }

    for phrase in rule.content_indicators {
        if combined.contains(phrase) {
            score += 2 * rule.weight;
        }
    }

    for semantic in keywords {
        let text = semantic.text.to_lowercase();
        if rule
            .keywords
            .iter()
            .any(|kw| text.contains(kw) || kw.contains(text.as_str()))
        {
            score += 3 * rule.weight;
        }
        if rule
            .content_indicators
            .iter()
            .any(|ci| text.contains(ci) || ci.contains(text.as_str()))
        {
            score += 2 * rule.weight;
        }
    }

    score
}

fn combined_text(input: &ClassifyInput) -> String {
    let mut combined = String::new();
    combined.push_str(&input.url.to_lowercase());
    combined.push(' ');
    combined.push_str(&input.title.to_lowercase());
    if let Some(desc) = input.description {
        combined.push(' ');
        combined.push_str(&desc.to_lowercase());
    }
    for keyword in input.keywords {
        combined.push(' ');
        combined.push_str(&keyword.text.to_lowercase());
    }
    combined
}

/// Whole-word containment: the match may not touch an adjacent
/// alphanumeric character on either side
fn contains_word(haystack: &str, word: &str) -> bool {
    let bytes = haystack.as_bytes();
    haystack.match_indices(word).any(|(idx, _)| {
        let before_ok = idx == 0 || !bytes[idx - 1].is_ascii_alphanumeric();
        let end = idx + word.len();
        let after_ok = end == haystack.len() || !bytes[end].is_ascii_alphanumeric();
        before_ok && after_ok
    })
}

/// Keyword-only matching against an ad-hoc category list, used by the
/// custom-taxonomy fast path when the LLM left a bookmark unassigned.
/// Two points per keyword hit; any positive score wins, ties resolve in
/// list order.
pub fn match_by_keywords(text: &str, categories: &[(String, Vec<String>)]) -> Option<String> {
    let lower = text.to_lowercase();

    let mut best: Option<(usize, i64)> = None;
    for (idx, (_, keywords)) in categories.iter().enumerate() {
        let score = keywords
            .iter()
            .filter(|kw| !kw.is_empty() && lower.contains(&kw.to_lowercase()))
            .count() as i64
            * 2;
        if score > 0 && best.map_or(true, |(_, top)| score > top) {
            best = Some((idx, score));
        }
    }

    best.map(|(idx, _)| categories[idx].0.clone())
}
