//! Batch assignment: map bookmark indices to categories of a known
//! taxonomy via the LLM, 50 bookmarks at a time, tolerating truncated
//! responses.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use super::client::{strip_code_fences, LlmClient};

/// Pause between consecutive LLM calls to respect provider rate limits
const INTER_CALL_GAP: Duration = Duration::from_millis(100);

/// Result of a batch-assignment run. Indices absent from `assigned` are
/// listed in `unassigned` for the keyword fallback.
#[derive(Debug, Default)]
pub struct AssignmentOutcome {
    /// bookmark index -> category name
    pub assigned: HashMap<usize, String>,
    pub unassigned: Vec<usize>,
}

/// Ask the LLM to map each bookmark `(index, title, host)` to one of the
/// indexed categories, in batches. The progress callback receives
/// `(assigned_so_far, total)` after every batch. LLM failures leave the
/// batch unassigned; they never abort the run.
pub fn assign_in_batches(
    llm: &LlmClient,
    categories: &[(usize, String)],
    bookmarks: &[(usize, String, String)],
    batch_size: usize,
    progress: &mut dyn FnMut(usize, usize),
) -> AssignmentOutcome {
    let batch_size = batch_size.max(1);
    let total = bookmarks.len();
    let mut outcome = AssignmentOutcome::default();

    for (batch_no, batch) in bookmarks.chunks(batch_size).enumerate() {
        if batch_no > 0 {
            thread::sleep(INTER_CALL_GAP);
        }

        let prompt = build_assignment_prompt(categories, batch);
        match llm.generate(&prompt) {
            Ok(raw) => {
                for (bookmark_idx, category_idx) in parse_index_pairs(&raw) {
                    let in_batch = batch.iter().any(|(j, _, _)| *j == bookmark_idx);
                    let category = categories
                        .iter()
                        .find(|(i, _)| *i == category_idx)
                        .map(|(_, name)| name.clone());
                    if let (true, Some(name)) = (in_batch, category) {
                        outcome.assigned.insert(bookmark_idx, name);
                    }
                }
            }
            Err(e) => {
                log::warn!(
                    "batch assignment call {} failed ({}); {} bookmarks fall back to keywords",
                    batch_no + 1,
                    e,
                    batch.len()
                );
            }
        }

        progress(outcome.assigned.len(), total);
    }

    outcome.unassigned = bookmarks
        .iter()
        .map(|(j, _, _)| *j)
        .filter(|j| !outcome.assigned.contains_key(j))
        .collect();

    outcome
}

fn build_assignment_prompt(
    categories: &[(usize, String)],
    batch: &[(usize, String, String)],
) -> String {
    let mut prompt = String::with_capacity(batch.len() * 48 + 1024);
    prompt.push_str("Assign each bookmark to the best-fitting category.\n\nCategories:\n");
    for (idx, name) in categories {
        prompt.push_str(&format!("{}: {}\n", idx, name));
    }
    prompt.push_str("\nBookmarks:\n");
    for (idx, title, host) in batch {
        prompt.push_str(&format!("{}: {} ({})\n", idx, title, host));
    }
    prompt.push_str(
        "\nRespond with ONLY a compact JSON array of [bookmarkIndex, categoryIndex] \
         pairs, like [[0,2],[1,0]]. No prose, no markdown fence.\n",
    );
    prompt
}

/// Parse `[[j,i],...]` tolerantly. A truncated array (the stream ran out
/// before the closing brackets) is recovered by cutting at the last
/// complete pair; anything after it is discarded.
pub fn parse_index_pairs(raw: &str) -> Vec<(usize, usize)> {
    let cleaned = strip_code_fences(raw);

    if let Some(pairs) = try_parse(cleaned) {
        return pairs;
    }

    // Truncated: keep everything up to the last closed pair and seal the
    // outer array
    if let Some(pos) = cleaned.rfind(']') {
        let mut candidate = cleaned[..=pos].trim_end().to_string();
        while candidate.ends_with(',') {
            candidate.pop();
        }
        candidate.push(']');
        if let Some(pairs) = try_parse(&candidate) {
            return pairs;
        }
    }

    Vec::new()
}

fn try_parse(text: &str) -> Option<Vec<(usize, usize)>> {
    let parsed: Vec<[i64; 2]> = serde_json::from_str(text).ok()?;
    Some(
        parsed
            .into_iter()
            .filter(|[j, i]| *j >= 0 && *i >= 0)
            .map(|[j, i]| (j as usize, i as usize))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_complete_array() {
        assert_eq!(
            parse_index_pairs("[[0,2],[1,0],[2,1]]"),
            vec![(0, 2), (1, 0), (2, 1)]
        );
    }

    #[test]
    fn test_parse_fenced_array() {
        assert_eq!(parse_index_pairs("```json\n[[0,1]]\n```"), vec![(0, 1)]);
    }

    #[rstest]
    // Stream cut mid-pair: the open pair is discarded
    #[case("[[0,2],[1,0],[2,", vec![(0, 2), (1, 0)])]
    // Stream cut right after a pair
    #[case("[[0,2],[1,0]", vec![(0, 2), (1, 0)])]
    // Stream cut after the comma
    #[case("[[0,2],", vec![(0, 2)])]
    // Missing only the outer bracket
    #[case("[[5,1],[6,3]", vec![(5, 1), (6, 3)])]
    fn test_parse_truncated(#[case] input: &str, #[case] expected: Vec<(usize, usize)>) {
        assert_eq!(parse_index_pairs(input), expected);
    }

    #[rstest]
    #[case("")]
    #[case("no json at all")]
    #[case("[[")]
    #[case("{\"not\":\"an array\"}")]
    fn test_parse_unusable(#[case] input: &str) {
        assert!(parse_index_pairs(input).is_empty());
    }

    #[test]
    fn test_parse_drops_negative_indices() {
        assert_eq!(parse_index_pairs("[[0,1],[-1,2]]"), vec![(0, 1)]);
    }

    #[test]
    fn test_assignment_prompt_shape() {
        let categories = vec![(0, "Dev".to_string()), (1, "News".to_string())];
        let batch = vec![(0, "Repo".to_string(), "github.com".to_string())];
        let prompt = build_assignment_prompt(&categories, &batch);
        assert!(prompt.contains("0: Dev"));
        assert!(prompt.contains("1: News"));
        assert!(prompt.contains("0: Repo (github.com)"));
        assert!(prompt.contains("[bookmarkIndex, categoryIndex]"));
    }
}
