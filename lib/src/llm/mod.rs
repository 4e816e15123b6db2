//! LLM-backed taxonomy discovery and batch category assignment, with
//! deterministic fallbacks for when no provider is configured.

pub mod assign;
pub mod client;
pub mod discover;

pub use assign::{assign_in_batches, AssignmentOutcome};
pub use client::LlmClient;
pub use discover::{
    discover_taxonomy, hierarchy_stats, validate_hierarchy, DiscoveryResult, DiscoverySource,
    HierarchyValidation, TaxonomyStats,
};
