//! PDG node: the in-memory, arena-resident counterpart of a stored symbol
//! (`PDG node`).

use leindex_storage::SymbolKind;

/// Stable for the lifetime of the graph regardless of insertion/removal
/// order. Never reused after `remove_node`.
pub type NodeId = u32;

#[derive(Debug, Clone, PartialEq)]
pub struct PdgNode {
    pub node_id: NodeId,
    pub symbol_id: u64,
    pub project_id: String,
    pub file_path: String,
    pub symbol_name: String,
    pub node_type: SymbolKind,
    pub complexity: u32,
    /// In `[0, 1]`; feeds the gravity-expansion relevance formula.
    pub semantic_score: f32,
    pub embedding: Option<Vec<f32>>,
}

impl PdgNode {
    pub fn clamped_semantic_score(&self) -> f32 {
        self.semantic_score.clamp(0.0, 1.0)
    }
}
