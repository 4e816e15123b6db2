//! Taxonomy discovery: ask the LLM for a category hierarchy fitted to the
//! bookmark sample, or fall back to deterministic clustering when no
//! provider is available or the response is unusable.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use super::client::{strip_code_fences, LlmClient};
use crate::classify::taxonomy::DOMAIN_TABLE;
use crate::config::Config;
use crate::error::{FuryError, Result};
use crate::models::{DiscoveredCategory, ParsedBookmark};
use crate::text::{extract_semantic_keywords, extract_url_tokens, KeywordConfig};
use crate::urlnorm::host_of;
use crate::utils::slugify;

/// Hierarchy depth cap, enforced by flattening over-deep branches
pub const MAX_DEPTH: u32 = 4;

const MIN_ROOTS: usize = 6;
const MAX_ROOTS: usize = 10;

const FOLDER_CLUSTER_MIN: usize = 3;
const DOMAIN_CLUSTER_MIN: usize = 5;
const KEYWORD_CLUSTER_MIN: usize = 5;
const CLUSTER_KEYWORD_LIMIT: usize = 15;
const MAX_FALLBACK_CLUSTERS: usize = 9;

/// How a taxonomy was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoverySource {
    Llm,
    Clustering,
}

/// A discovered category forest plus provenance
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryResult {
    pub categories: Vec<DiscoveredCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    pub source: DiscoverySource,
}

/// Validation outcome for a discovered hierarchy
#[derive(Debug, Clone, Serialize)]
pub struct HierarchyValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Aggregate numbers over a discovered hierarchy
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyStats {
    pub total_categories: usize,
    pub max_depth: u32,
    /// Category count per level, index 0 = level 1
    pub categories_per_level: Vec<usize>,
    pub total_keywords: usize,
    pub total_estimated_bookmarks: u64,
}

/// Discover a custom taxonomy for the given bookmarks. The LLM path is
/// tried first when a client is supplied; any failure there degrades to
/// the clustering fallback, which is deterministic in its input.
pub fn discover_taxonomy(
    bookmarks: &[ParsedBookmark],
    llm: Option<&LlmClient>,
    config: &Config,
) -> Result<DiscoveryResult> {
    if bookmarks.is_empty() {
        return Err(FuryError::InvalidInput(
            "no bookmarks to analyze".to_string(),
        ));
    }

    if let Some(client) = llm {
        match llm_discovery(client, bookmarks, config) {
            Ok(result) => return Ok(result),
            Err(e) => {
                log::info!("LLM discovery unavailable ({}), using clustering fallback", e);
            }
        }
    }

    Ok(cluster_taxonomy(bookmarks))
}

/* ---------------------------- LLM path ---------------------------- */

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlmTaxonomyResponse {
    #[serde(default)]
    categories: Vec<LlmCategory>,
    #[serde(default)]
    reasoning: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlmCategory {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    parent_name: Option<String>,
    #[serde(default)]
    estimated_count: Option<u32>,
}

fn llm_discovery(
    client: &LlmClient,
    bookmarks: &[ParsedBookmark],
    config: &Config,
) -> Result<DiscoveryResult> {
    let sample_size = bookmarks.len().min(config.llm.discovery_sample_size);
    let prompt = build_discovery_prompt(&bookmarks[..sample_size], bookmarks);

    let raw = client.generate(&prompt)?;
    let response = parse_taxonomy_response(&raw)?;
    let categories = build_forest(response.categories)?;

    if categories.is_empty() {
        return Err(FuryError::LlmUnavailable(
            "response contained no categories".to_string(),
        ));
    }

    Ok(DiscoveryResult {
        categories,
        reasoning: response.reasoning,
        source: DiscoverySource::Llm,
    })
}

fn build_discovery_prompt(sample: &[ParsedBookmark], all: &[ParsedBookmark]) -> String {
    let mut hosts: BTreeMap<String, usize> = BTreeMap::new();
    let mut folders: BTreeMap<String, usize> = BTreeMap::new();
    for bookmark in all {
        let host = host_of(&bookmark.url);
        if !host.is_empty() {
            *hosts.entry(host).or_insert(0) += 1;
        }
        if let Some(folder) = top_folder(bookmark) {
            *folders.entry(folder).or_insert(0) += 1;
        }
    }

    let mut prompt = String::with_capacity(sample.len() * 64 + 2048);
    prompt.push_str(
        "You are organizing a personal bookmark collection into a category hierarchy.\n\n",
    );
    prompt.push_str("Bookmarks (title | host | folder):\n");
    for bookmark in sample {
        let host = host_of(&bookmark.url);
        let folder = bookmark.source_folder.as_deref().unwrap_or("-");
        prompt.push_str(&format!("- {} | {} | {}\n", bookmark.title, host, folder));
    }

    prompt.push_str("\nMost frequent hosts:\n");
    for (host, count) in top_n(&hosts, 15) {
        prompt.push_str(&format!("- {} ({})\n", host, count));
    }

    prompt.push_str("\nSource folders:\n");
    for (folder, count) in top_n(&folders, 15) {
        prompt.push_str(&format!("- {} ({})\n", folder, count));
    }

    prompt.push_str(&format!(
        "\nDesign a category hierarchy with {} to {} top-level categories \
         and at most {} levels of nesting. Every category needs 3-5 keywords.\n\
         Respond with ONLY a JSON object of this exact shape, no prose and no \
         markdown fence:\n\
         {{\"categories\":[{{\"name\":\"...\",\"description\":\"...\",\
         \"keywords\":[\"...\"],\"parentName\":null,\"estimatedCount\":0}}],\
         \"reasoning\":\"...\"}}\n\
         Use parentName:null for top-level categories and the exact name of \
         another category otherwise.\n",
        MIN_ROOTS, MAX_ROOTS, MAX_DEPTH
    ));

    prompt
}

fn top_n(counts: &BTreeMap<String, usize>, n: usize) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> =
        counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(n);
    entries
}

fn parse_taxonomy_response(raw: &str) -> Result<LlmTaxonomyResponse> {
    let mut bytes = strip_code_fences(raw).as_bytes().to_vec();
    simd_json::serde::from_slice(&mut bytes)
        .map_err(|e| FuryError::LlmUnavailable(format!("unparseable JSON: {}", e)))
}

/// Turn the flat LLM category list into a validated forest: resolve
/// parents by name, assign temp ids and slugs, flatten branches deeper
/// than `MAX_DEPTH`, and reject duplicate slugs.
fn build_forest(raw: Vec<LlmCategory>) -> Result<Vec<DiscoveredCategory>> {
    let cats: Vec<LlmCategory> = raw
        .into_iter()
        .filter(|c| !c.name.trim().is_empty())
        .collect();

    let name_to_idx: HashMap<String, usize> = cats
        .iter()
        .enumerate()
        .map(|(idx, c)| (c.name.trim().to_lowercase(), idx))
        .collect();

    let mut slugs = HashSet::new();
    for cat in &cats {
        let slug = slugify(&cat.name);
        if slug.is_empty() || !slugs.insert(slug.clone()) {
            return Err(FuryError::InvalidInput(format!(
                "duplicate or empty category slug: {:?}",
                slug
            )));
        }
    }

    // Parent index per node; self-parents and unknown names become roots
    let mut parents: Vec<Option<usize>> = cats
        .iter()
        .enumerate()
        .map(|(idx, c)| {
            c.parent_name
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .and_then(|p| name_to_idx.get(&p.to_lowercase()).copied())
                .filter(|p| *p != idx)
        })
        .collect();

    // Break cycles by promoting the node where the walk repeats
    for start in 0..parents.len() {
        let mut seen = HashSet::from([start]);
        let mut cursor = start;
        while let Some(parent) = parents[cursor] {
            if !seen.insert(parent) {
                parents[cursor] = None;
                break;
            }
            cursor = parent;
        }
    }

    // Flatten branches beyond MAX_DEPTH: reparent over-deep nodes to
    // their grandparent until every node fits
    loop {
        let levels = compute_levels(&parents);
        let Some(deep) = levels.iter().position(|l| *l > MAX_DEPTH) else {
            break;
        };
        let parent = parents[deep].expect("over-deep node must have a parent");
        parents[deep] = parents[parent];
    }

    let levels = compute_levels(&parents);

    // Assemble the tree, children in declaration order
    let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); cats.len()];
    let mut roots: Vec<usize> = Vec::new();
    for (idx, parent) in parents.iter().enumerate() {
        match parent {
            Some(p) => children_of[*p].push(idx),
            None => roots.push(idx),
        }
    }

    fn assemble(
        idx: usize,
        cats: &[LlmCategory],
        parents: &[Option<usize>],
        levels: &[u32],
        children_of: &[Vec<usize>],
    ) -> DiscoveredCategory {
        DiscoveredCategory {
            id: format!("cat-{}", idx + 1),
            name: cats[idx].name.trim().to_string(),
            slug: slugify(&cats[idx].name),
            description: cats[idx].description.clone(),
            keywords: cats[idx].keywords.clone(),
            parent_id: parents[idx].map(|p| format!("cat-{}", p + 1)),
            level: levels[idx],
            estimated_count: cats[idx].estimated_count,
            children: children_of[idx]
                .iter()
                .map(|c| assemble(*c, cats, parents, levels, children_of))
                .collect(),
        }
    }

    Ok(roots
        .iter()
        .map(|r| assemble(*r, &cats, &parents, &levels, &children_of))
        .collect())
}

fn compute_levels(parents: &[Option<usize>]) -> Vec<u32> {
    let mut levels = vec![0u32; parents.len()];
    fn level_of(idx: usize, parents: &[Option<usize>], levels: &mut Vec<u32>) -> u32 {
        if levels[idx] != 0 {
            return levels[idx];
        }
        let level = match parents[idx] {
            Some(p) => level_of(p, parents, levels) + 1,
            None => 1,
        };
        levels[idx] = level;
        level
    }
    for idx in 0..parents.len() {
        level_of(idx, parents, &mut levels);
    }
    levels
}

/* ------------------------ Clustering fallback ------------------------ */

/// Deterministic taxonomy synthesis: cluster by source folder, then by
/// known-domain category, then by frequent keywords; residue lands in an
/// `Uncategorized` bucket.
pub fn cluster_taxonomy(bookmarks: &[ParsedBookmark]) -> DiscoveryResult {
    let mut taken: HashSet<usize> = HashSet::new();
    let mut clusters: Vec<(String, Vec<usize>)> = Vec::new();

    // Pass 1: source folders
    let mut by_folder: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (idx, bookmark) in bookmarks.iter().enumerate() {
        if let Some(folder) = top_folder(bookmark) {
            by_folder.entry(folder).or_default().push(idx);
        }
    }
    for (folder, members) in by_folder {
        if members.len() >= FOLDER_CLUSTER_MIN {
            taken.extend(&members);
            clusters.push((folder, members));
        }
    }

    // Pass 2: known-domain categories
    let mut by_domain: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, bookmark) in bookmarks.iter().enumerate() {
        if taken.contains(&idx) {
            continue;
        }
        let host = host_of(&bookmark.url);
        if let Some(name) = DOMAIN_TABLE.get(host.as_str()) {
            by_domain.entry(name).or_default().push(idx);
        }
    }
    for (name, members) in by_domain {
        if members.len() >= DOMAIN_CLUSTER_MIN {
            taken.extend(&members);
            clusters.push((name.to_string(), members));
        }
    }

    // Pass 3: frequent keywords over whatever is left
    loop {
        let mut by_keyword: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, bookmark) in bookmarks.iter().enumerate() {
            if taken.contains(&idx) {
                continue;
            }
            for token in bookmark_tokens(bookmark) {
                let entry = by_keyword.entry(token).or_default();
                if entry.last() != Some(&idx) {
                    entry.push(idx);
                }
            }
        }
        let best = by_keyword
            .into_iter()
            .max_by(|a, b| a.1.len().cmp(&b.1.len()).then_with(|| b.0.cmp(&a.0)));
        match best {
            Some((token, members)) if members.len() >= KEYWORD_CLUSTER_MIN => {
                taken.extend(&members);
                clusters.push((title_case(&token), members));
            }
            _ => break,
        }
    }

    // Largest clusters first; everything beyond the cap joins the residue
    clusters.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(&b.0)));
    let overflow: Vec<usize> = clusters
        .drain(MAX_FALLBACK_CLUSTERS.min(clusters.len())..)
        .flat_map(|(_, members)| members)
        .collect();

    let residue: Vec<usize> = (0..bookmarks.len())
        .filter(|idx| !taken.contains(idx))
        .chain(overflow.into_iter())
        .collect();

    let mut used_slugs = HashSet::new();
    let mut categories: Vec<DiscoveredCategory> = Vec::new();
    for (pos, (label, members)) in clusters.iter().enumerate() {
        let slug = unique_slug(&slugify(label), &mut used_slugs);
        categories.push(DiscoveredCategory {
            id: format!("cluster-{}", pos + 1),
            name: label.clone(),
            slug,
            description: Some(format!(
                "Grouped from {} bookmarks sharing \"{}\"",
                members.len(),
                label
            )),
            keywords: cluster_keywords(bookmarks, members),
            parent_id: None,
            level: 1,
            estimated_count: Some(members.len() as u32),
            children: Vec::new(),
        });
    }

    if !residue.is_empty() {
        let slug = unique_slug("uncategorized", &mut used_slugs);
        categories.push(DiscoveredCategory {
            id: format!("cluster-{}", categories.len() + 1),
            name: "Uncategorized".to_string(),
            slug,
            description: Some("Bookmarks that did not fit another group".to_string()),
            keywords: Vec::new(),
            parent_id: None,
            level: 1,
            estimated_count: Some(residue.len() as u32),
            children: Vec::new(),
        });
    }

    DiscoveryResult {
        categories,
        reasoning: None,
        source: DiscoverySource::Clustering,
    }
}

fn top_folder(bookmark: &ParsedBookmark) -> Option<String> {
    bookmark
        .source_folder
        .as_deref()
        .and_then(|path| path.split(" / ").next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn bookmark_tokens(bookmark: &ParsedBookmark) -> Vec<String> {
    let config = KeywordConfig {
        max_keywords: 10,
        ..KeywordConfig::default()
    };
    let mut tokens: Vec<String> = extract_semantic_keywords(&bookmark.title, &config)
        .into_iter()
        .map(|k| k.text)
        .collect();
    for token in extract_url_tokens(&bookmark.url) {
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }
    tokens
}

fn cluster_keywords(bookmarks: &[ParsedBookmark], members: &[usize]) -> Vec<String> {
    let mut freq: BTreeMap<String, usize> = BTreeMap::new();
    for idx in members {
        for token in bookmark_tokens(&bookmarks[*idx]) {
            *freq.entry(token).or_insert(0) += 1;
        }
    }
    let mut entries: Vec<(String, usize)> = freq.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries.truncate(CLUSTER_KEYWORD_LIMIT);
    entries.into_iter().map(|(token, _)| token).collect()
}

fn unique_slug(base: &str, used: &mut HashSet<String>) -> String {
    let base = if base.is_empty() { "group" } else { base };
    let mut candidate = base.to_string();
    let mut counter = 2;
    while !used.insert(candidate.clone()) {
        candidate = format!("{}-{}", base, counter);
        counter += 1;
    }
    candidate
}

fn title_case(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/* ------------------------- Validation & stats ------------------------- */

/// Check a discovered forest against the structural rules: unique slugs,
/// depth cap, consistent parent links. Soft expectations (root count,
/// keyword counts) come back as warnings.
pub fn validate_hierarchy(roots: &[DiscoveredCategory]) -> HierarchyValidation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let flat = DiscoveredCategory::flatten(roots);

    let mut slugs = HashSet::new();
    for cat in &flat {
        if cat.name.trim().is_empty() {
            errors.push(format!("category {} has an empty name", cat.id));
        }
        if cat.slug.is_empty() {
            errors.push(format!("category {:?} has an empty slug", cat.name));
        } else if !slugs.insert(cat.slug.clone()) {
            errors.push(format!("duplicate slug: {}", cat.slug));
        }
    }

    let depth = DiscoveredCategory::max_depth(roots);
    if depth > MAX_DEPTH {
        errors.push(format!("hierarchy depth {} exceeds {}", depth, MAX_DEPTH));
    }

    if roots.is_empty() {
        errors.push("no categories".to_string());
    } else if roots.len() < MIN_ROOTS || roots.len() > MAX_ROOTS {
        warnings.push(format!(
            "{} top-level categories (expected {}-{})",
            roots.len(),
            MIN_ROOTS,
            MAX_ROOTS
        ));
    }

    for cat in &flat {
        if cat.keywords.len() < 3 || cat.keywords.len() > 5 {
            warnings.push(format!(
                "category \"{}\" has {} keywords (expected 3-5)",
                cat.name,
                cat.keywords.len()
            ));
        }
    }

    HierarchyValidation {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

/// Aggregate counts over a discovered forest
pub fn hierarchy_stats(roots: &[DiscoveredCategory]) -> TaxonomyStats {
    let flat = DiscoveredCategory::flatten(roots);
    let max_depth = DiscoveredCategory::max_depth(roots);

    let mut per_level = vec![0usize; max_depth as usize];
    fn walk(node: &DiscoveredCategory, depth: usize, per_level: &mut [usize]) {
        per_level[depth - 1] += 1;
        for child in &node.children {
            walk(child, depth + 1, per_level);
        }
    }
    for root in roots {
        walk(root, 1, &mut per_level);
    }

    TaxonomyStats {
        total_categories: flat.len(),
        max_depth,
        categories_per_level: per_level,
        total_keywords: flat.iter().map(|c| c.keywords.len()).sum(),
        total_estimated_bookmarks: flat
            .iter()
            .map(|c| c.estimated_count.unwrap_or(0) as u64)
            .sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bookmark(url: &str, title: &str, folder: Option<&str>) -> ParsedBookmark {
        ParsedBookmark {
            url: url.to_string(),
            title: title.to_string(),
            description: None,
            source_folder: folder.map(str::to_string),
        }
    }

    #[test]
    fn test_discover_empty_input_is_an_error() {
        let config = Config::default();
        assert!(discover_taxonomy(&[], None, &config).is_err());
    }

    #[test]
    fn test_clustering_by_folder() {
        let bookmarks = vec![
            bookmark("https://a.example/1", "One", Some("Work")),
            bookmark("https://a.example/2", "Two", Some("Work / Sub")),
            bookmark("https://a.example/3", "Three", Some("Work")),
            bookmark("https://b.example/1", "Solo", Some("Lonely")),
        ];
        let result = cluster_taxonomy(&bookmarks);
        assert_eq!(result.source, DiscoverySource::Clustering);

        let work = result.categories.iter().find(|c| c.name == "Work").unwrap();
        assert_eq!(work.estimated_count, Some(3));
        // The singleton folder falls into the residue bucket
        let uncategorized = result
            .categories
            .iter()
            .find(|c| c.name == "Uncategorized")
            .unwrap();
        assert_eq!(uncategorized.estimated_count, Some(1));
    }

    #[test]
    fn test_clustering_by_domain_table() {
        let bookmarks: Vec<ParsedBookmark> = (0..5)
            .map(|i| bookmark(&format!("https://github.com/org/repo{}", i), "Repo", None))
            .collect();
        let result = cluster_taxonomy(&bookmarks);
        let dev = result
            .categories
            .iter()
            .find(|c| c.name == "Web Development")
            .unwrap();
        assert_eq!(dev.estimated_count, Some(5));
    }

    #[test]
    fn test_clustering_by_keyword() {
        let bookmarks: Vec<ParsedBookmark> = (0..5)
            .map(|i| {
                bookmark(
                    &format!("https://site{}.example/post", i),
                    &format!("Sourdough baking log {}", i),
                    None,
                )
            })
            .collect();
        let result = cluster_taxonomy(&bookmarks);
        assert!(
            result
                .categories
                .iter()
                .any(|c| c.name == "Baking" || c.name == "Sourdough"),
            "got {:?}",
            result.categories.iter().map(|c| &c.name).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_clustering_is_deterministic() {
        let bookmarks: Vec<ParsedBookmark> = (0..12)
            .map(|i| {
                bookmark(
                    &format!("https://github.com/org/repo{}", i),
                    "Repo",
                    Some(if i % 2 == 0 { "Code" } else { "Misc" }),
                )
            })
            .collect();
        let a = cluster_taxonomy(&bookmarks);
        let b = cluster_taxonomy(&bookmarks);
        assert_eq!(a.categories, b.categories);
    }

    #[test]
    fn test_build_forest_resolves_parents() {
        let raw = vec![
            LlmCategory {
                name: "Development".to_string(),
                description: None,
                keywords: vec!["code".to_string()],
                parent_name: None,
                estimated_count: Some(10),
            },
            LlmCategory {
                name: "Rust".to_string(),
                description: None,
                keywords: vec!["rust".to_string()],
                parent_name: Some("development".to_string()),
                estimated_count: Some(4),
            },
        ];
        let forest = build_forest(raw).unwrap();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].slug, "development");
        assert_eq!(forest[0].level, 1);
        assert_eq!(forest[0].children.len(), 1);
        assert_eq!(forest[0].children[0].slug, "rust");
        assert_eq!(forest[0].children[0].level, 2);
        assert_eq!(forest[0].children[0].parent_id.as_deref(), Some("cat-1"));
    }

    #[test]
    fn test_build_forest_rejects_duplicate_slugs() {
        let raw = vec![
            LlmCategory {
                name: "News Media".to_string(),
                description: None,
                keywords: vec![],
                parent_name: None,
                estimated_count: None,
            },
            LlmCategory {
                name: "News & Media".to_string(),
                description: None,
                keywords: vec![],
                parent_name: None,
                estimated_count: None,
            },
        ];
        assert!(build_forest(raw).is_err());
    }

    #[test]
    fn test_build_forest_flattens_overdeep_chain() {
        let raw: Vec<LlmCategory> = (0..6)
            .map(|i| LlmCategory {
                name: format!("Level{}", i),
                description: None,
                keywords: vec![],
                parent_name: if i == 0 {
                    None
                } else {
                    Some(format!("Level{}", i - 1))
                },
                estimated_count: None,
            })
            .collect();
        let forest = build_forest(raw).unwrap();
        assert!(DiscoveredCategory::max_depth(&forest) <= MAX_DEPTH);
        assert_eq!(DiscoveredCategory::count(&forest), 6);
    }

    #[test]
    fn test_build_forest_breaks_cycles() {
        let raw = vec![
            LlmCategory {
                name: "A".to_string(),
                description: None,
                keywords: vec![],
                parent_name: Some("B".to_string()),
                estimated_count: None,
            },
            LlmCategory {
                name: "B".to_string(),
                description: None,
                keywords: vec![],
                parent_name: Some("A".to_string()),
                estimated_count: None,
            },
        ];
        let forest = build_forest(raw).unwrap();
        assert_eq!(DiscoveredCategory::count(&forest), 2);
        assert!(DiscoveredCategory::max_depth(&forest) <= 2);
    }

    #[test]
    fn test_parse_taxonomy_response_with_fences() {
        let raw = "```json\n{\"categories\":[{\"name\":\"Dev\",\"keywords\":[\"code\"],\"parentName\":null,\"estimatedCount\":3}],\"reasoning\":\"folders\"}\n```";
        let parsed = parse_taxonomy_response(raw).unwrap();
        assert_eq!(parsed.categories.len(), 1);
        assert_eq!(parsed.categories[0].name, "Dev");
        assert_eq!(parsed.reasoning.as_deref(), Some("folders"));
    }

    #[test]
    fn test_parse_taxonomy_response_garbage_is_soft_failure() {
        let err = parse_taxonomy_response("here is your taxonomy!").unwrap_err();
        assert!(matches!(err, FuryError::LlmUnavailable(_)));
    }

    #[test]
    fn test_validate_hierarchy_reports_duplicates_and_depth() {
        let mut roots = vec![
            DiscoveredCategory {
                id: "1".into(),
                name: "A".into(),
                slug: "a".into(),
                description: None,
                keywords: vec!["x".into(), "y".into(), "z".into()],
                parent_id: None,
                level: 1,
                estimated_count: Some(1),
                children: vec![],
            };
            2
        ];
        roots[1].id = "2".into();
        let report = validate_hierarchy(&roots);
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e.contains("duplicate slug")));
        // Fewer than 6 roots is only a warning
        assert!(!report.warnings.is_empty());
    }

    #[test]
    fn test_hierarchy_stats() {
        let roots = vec![DiscoveredCategory {
            id: "1".into(),
            name: "A".into(),
            slug: "a".into(),
            description: None,
            keywords: vec!["k1".into(), "k2".into()],
            parent_id: None,
            level: 1,
            estimated_count: Some(7),
            children: vec![DiscoveredCategory {
                id: "2".into(),
                name: "B".into(),
                slug: "b".into(),
                description: None,
                keywords: vec!["k3".into()],
                parent_id: Some("1".into()),
                level: 2,
                estimated_count: Some(3),
                children: vec![],
            }],
        }];
        let stats = hierarchy_stats(&roots);
        assert_eq!(stats.total_categories, 2);
        assert_eq!(stats.max_depth, 2);
        assert_eq!(stats.categories_per_level, vec![1, 1]);
        assert_eq!(stats.total_keywords, 3);
        assert_eq!(stats.total_estimated_bookmarks, 10);
    }
}
