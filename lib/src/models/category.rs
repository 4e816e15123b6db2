use serde::{Deserialize, Serialize};

/// A persisted category. Identity is the slug; the parent pointer forms a
/// forest of depth <= 4.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<i64>,
    pub keywords: Vec<String>,
}

/// Transient category tree produced by taxonomy discovery, consumed by
/// bulk persistence. Temp ids are mapped to real rows by a parent-first
/// traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredCategory {
    /// Temporary id, unique within one discovery result
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Temp id of the parent, if not a root
    #[serde(default)]
    pub parent_id: Option<String>,
    /// 1-based depth; roots are level 1
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub estimated_count: Option<u32>,
    #[serde(default)]
    pub children: Vec<DiscoveredCategory>,
}

fn default_level() -> u32 {
    1
}

impl DiscoveredCategory {
    /// Flatten a tree into parent-first order (each node precedes its
    /// children)
    pub fn flatten(roots: &[DiscoveredCategory]) -> Vec<DiscoveredCategory> {
        let mut out = Vec::new();
        fn walk(node: &DiscoveredCategory, out: &mut Vec<DiscoveredCategory>) {
            let mut flat = node.clone();
            flat.children = Vec::new();
            out.push(flat);
            for child in &node.children {
                walk(child, out);
            }
        }
        for root in roots {
            walk(root, &mut out);
        }
        out
    }

    /// Total node count across a forest
    pub fn count(roots: &[DiscoveredCategory]) -> usize {
        roots
            .iter()
            .map(|r| 1 + DiscoveredCategory::count(&r.children))
            .sum()
    }

    /// Maximum depth across a forest (empty forest is depth 0)
    pub fn max_depth(roots: &[DiscoveredCategory]) -> u32 {
        roots
            .iter()
            .map(|r| 1 + DiscoveredCategory::max_depth(&r.children))
            .max()
            .unwrap_or(0)
    }
}
