//! Durable domain records for symbols, edges, analysis cache rows and the
//! project registry.
//!
//! These are the buffer-independent, owned counterparts of the parser's
//! zero-copy AST views: once a `SymbolRecord` exists, nothing in it borrows
//! from a source buffer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Symbol kind: `kind ∈ {function, method, class, module}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Module,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Class => "class",
            SymbolKind::Module => "module",
        }
    }
}

impl std::str::FromStr for SymbolKind {
    type Err = crate::error::StorageError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "function" => Ok(SymbolKind::Function),
            "method" => Ok(SymbolKind::Method),
            "class" => Ok(SymbolKind::Class),
            "module" => Ok(SymbolKind::Module),
            other => Err(crate::error::StorageError::database(format!(
                "unknown symbol kind: {other}"
            ))),
        }
    }
}

/// Cyclomatic complexity and related size metrics for one symbol body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ComplexityMetrics {
    pub cyclomatic: u32,
    pub nesting_depth: u32,
    pub line_count: u32,
    pub token_count: u32,
}

/// The durable, buffer-independent summary for one function/class/method/module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolRecord {
    pub id: u64,
    pub project_id: String,
    pub file_path: String,
    pub symbol_name: String,
    pub kind: SymbolKind,
    pub signature_text: String,
    pub parameters: Vec<String>,
    pub return_type: Option<String>,
    pub docstring: Option<String>,
    pub is_async: bool,
    pub start_line: u32,
    pub end_line: u32,
    pub complexity: ComplexityMetrics,
    /// BLAKE3 of the normalized body, lower-hex encoded.
    pub content_hash: String,
    pub embedding: Option<Vec<f32>>,
    pub updated_at: DateTime<Utc>,
}

/// Multiset-keyed edge between two symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    Call,
    DataFlow,
    Inheritance,
    ControlFlow,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Call => "call",
            EdgeType::DataFlow => "data_flow",
            EdgeType::Inheritance => "inheritance",
            EdgeType::ControlFlow => "control_flow",
        }
    }
}

impl std::str::FromStr for EdgeType {
    type Err = crate::error::StorageError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "call" => Ok(EdgeType::Call),
            "data_flow" => Ok(EdgeType::DataFlow),
            "inheritance" => Ok(EdgeType::Inheritance),
            "control_flow" => Ok(EdgeType::ControlFlow),
            other => Err(crate::error::StorageError::database(format!(
                "unknown edge type: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub caller_id: u64,
    pub callee_id: u64,
    pub edge_type: EdgeType,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// A reusable per-symbol analysis result, keyed by content hash only so it
/// amortizes across files and across projects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisCacheRow {
    pub content_hash: String,
    pub cfg_blob: Vec<u8>,
    pub complexity_blob: Vec<u8>,
    pub timestamp: DateTime<Utc>,
}

/// Project registry entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub project_id: String,
    pub root_path: String,
    pub last_indexed: Option<DateTime<Utc>>,
    pub generation: u64,
    pub file_count: u64,
}

/// A snapshot of PDG nodes and edges as loaded from storage, used to
/// reconstruct the in-memory graph.
#[derive(Debug, Clone, Default)]
pub struct PdgSnapshot {
    pub symbols: Vec<SymbolRecord>,
    pub edges: Vec<EdgeRecord>,
}

/// The single-writer, many-reader persistence port.
///
/// Implementations must uphold: a full re-index of a file executes as one
/// transaction, so readers never observe a partially-ingested file.
#[async_trait]
pub trait Store: Send + Sync {
    // --- symbols -----------------------------------------------------
    async fn upsert_symbol(&self, record: SymbolRecord) -> Result<()>;
    async fn batch_upsert_symbols(&self, records: Vec<SymbolRecord>) -> Result<()>;
    async fn find_by_hash(&self, content_hash: &str) -> Result<Option<SymbolRecord>>;
    async fn get_symbols_by_file(
        &self,
        project_id: &str,
        file_path: &str,
    ) -> Result<Vec<SymbolRecord>>;
    async fn delete_symbols_by_file(&self, project_id: &str, file_path: &str) -> Result<u64>;
    async fn get_symbol(&self, project_id: &str, symbol_id: u64) -> Result<Option<SymbolRecord>>;

    // --- edges ---------------------------------------------------------
    async fn batch_upsert_edges(&self, edges: Vec<EdgeRecord>) -> Result<()>;
    async fn get_edges_for_project(&self, project_id: &str) -> Result<Vec<EdgeRecord>>;

    // --- analysis cache --------------------------------------------------
    async fn get_analysis_cache(&self, content_hash: &str) -> Result<Option<AnalysisCacheRow>>;
    async fn put_analysis_cache(&self, row: AnalysisCacheRow) -> Result<()>;
    /// Evict the least-recently-touched rows beyond `capacity`, if configured.
    async fn evict_analysis_cache_lru(&self, capacity: usize) -> Result<u64>;

    // --- project registry -------------------------------------------------
    async fn upsert_project(&self, record: ProjectRecord) -> Result<()>;
    async fn get_project(&self, project_id: &str) -> Result<Option<ProjectRecord>>;
    async fn bump_generation(&self, project_id: &str) -> Result<u64>;
    async fn list_projects(&self) -> Result<Vec<ProjectRecord>>;

    // --- PDG snapshot composition ---------------
    async fn save_pdg_snapshot(&self, project_id: &str) -> Result<()>;
    async fn load_pdg(&self, project_id: &str) -> Result<PdgSnapshot>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_kind_round_trips_through_str() {
        for kind in [
            SymbolKind::Function,
            SymbolKind::Method,
            SymbolKind::Class,
            SymbolKind::Module,
        ] {
            let s = kind.as_str();
            let parsed: SymbolKind = s.parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn edge_type_rejects_unknown_strings() {
        let result: Result<EdgeType> = "frobnicate".parse();
        assert!(result.is_err());
    }
}
