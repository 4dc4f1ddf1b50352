//! The owned record a single parse produces for one symbol, minus the
//! identity and storage fields `id`/`project_id`/`updated_at` that only
//! exist once a symbol has been assigned into a project by the ingestion
//! pipeline.

use leindex_storage::{ComplexityMetrics, SymbolKind};

use crate::diagnostics::Diag;
use crate::hints::ParseHints;

#[derive(Debug, Clone, PartialEq)]
pub struct SignatureInfo {
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
    pub content_hash: String,
}

/// The result of parsing a single file.
#[derive(Debug, Clone, Default)]
pub struct ParseOutput {
    pub symbols: Vec<SignatureInfo>,
    pub hints: ParseHints,
    pub diagnostics: Vec<Diag>,
}
