//! The `AnalysisBundle` shape returned by `nl_query` and the orchestrator's
//! `analyze` operation.

use leindex_storage::EdgeType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisEntry {
    pub symbol_id: u64,
    pub excerpt: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRelation {
    pub from: u64,
    pub to: u64,
    pub edge_type: EdgeType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisBundle {
    pub entries: Vec<AnalysisEntry>,
    pub relations: Vec<AnalysisRelation>,
    pub formatted_output: String,
    pub tokens_used: u32,
    /// Not part of the literal spec shape but carried alongside it so a
    /// caller can show "vector backend unavailable, results are
    /// lexical-only" the way `hybrid` does ("Failure semantics").
    #[serde(default)]
    pub degraded_to_lexical: bool,
}
