//! The ranked result shape shared by all three query paths (`Hit`).

use leindex_storage::SymbolKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ScoreComponents {
    pub semantic: f32,
    pub structural: f32,
    pub text: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    pub symbol_id: u64,
    pub project_id: String,
    pub file_path: String,
    pub symbol_name: String,
    pub kind: SymbolKind,
    pub line_range: (u32, u32),
    pub score_overall: f32,
    pub score_components: ScoreComponents,
    pub snippet: Option<String>,
    /// Set when semantic scoring was attempted for this hit but no real
    /// vector score was available, so `score_components.semantic` is a
    /// stand-in zero rather than a measured similarity ("Failure
    /// semantics").
    #[serde(default)]
    pub degraded_to_lexical: bool,
}

/// Deterministic order for a fixed index snapshot ("Ranking
/// invariants"): higher score first, then lower complexity as a mild
/// simplicity bias, then lower symbol_id.
pub fn cmp_hits(a: &Hit, b: &Hit, complexity: impl Fn(u64) -> u32) -> std::cmp::Ordering {
    b.score_overall
        .partial_cmp(&a.score_overall)
        .unwrap_or(std::cmp::Ordering::Equal)
        .then_with(|| complexity(a.symbol_id).cmp(&complexity(b.symbol_id)))
        .then_with(|| a.symbol_id.cmp(&b.symbol_id))
}
