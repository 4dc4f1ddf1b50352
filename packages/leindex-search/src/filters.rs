//! Metadata sidecar filters applied after a lexical/vector lookup (spec
//! §4.3 "Metadata sidecar").

use globset::{Glob, GlobSet, GlobSetBuilder};
use leindex_storage::{SymbolKind, SymbolRecord};

#[derive(Debug, Clone, Default)]
pub struct MetadataFilters {
    pub project_id: Option<String>,
    pub file_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub language: Option<String>,
    pub kind: Option<SymbolKind>,
}

impl MetadataFilters {
    fn build_set(patterns: &[String]) -> Option<GlobSet> {
        if patterns.is_empty() {
            return None;
        }
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            if let Ok(glob) = Glob::new(pattern) {
                builder.add(glob);
            }
        }
        builder.build().ok()
    }

    /// Filter mismatches return empty results, not errors (Failure
    /// semantics) — this predicate is meant to be used as a plain
    /// boolean post-filter, never to raise.
    pub fn matches(&self, symbol: &SymbolRecord, language: Option<&str>) -> bool {
        if let Some(project_id) = &self.project_id {
            if &symbol.project_id != project_id {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if symbol.kind != kind {
                return false;
            }
        }
        if let (Some(want), Some(have)) = (&self.language, language) {
            if want != have {
                return false;
            }
        }
        if let Some(include) = Self::build_set(&self.file_patterns) {
            if !include.is_match(&symbol.file_path) {
                return false;
            }
        }
        if let Some(exclude) = Self::build_set(&self.exclude_patterns) {
            if exclude.is_match(&symbol.file_path) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use leindex_storage::ComplexityMetrics;

    fn symbol(file_path: &str) -> SymbolRecord {
        SymbolRecord {
            id: 1,
            project_id: "p1".to_string(),
            file_path: file_path.to_string(),
            symbol_name: "f".to_string(),
            kind: SymbolKind::Function,
            signature_text: "def f".to_string(),
            parameters: vec![],
            return_type: None,
            docstring: None,
            is_async: false,
            start_line: 1,
            end_line: 1,
            complexity: ComplexityMetrics::default(),
            content_hash: "h".to_string(),
            embedding: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn include_pattern_narrows_matches() {
        let filters = MetadataFilters {
            file_patterns: vec!["src/**/*.py".to_string()],
            ..Default::default()
        };
        assert!(filters.matches(&symbol("src/a/b.py"), None));
        assert!(!filters.matches(&symbol("tests/a.py"), None));
    }

    #[test]
    fn exclude_pattern_drops_matches() {
        let filters = MetadataFilters {
            exclude_patterns: vec!["**/test_*.py".to_string()],
            ..Default::default()
        };
        assert!(!filters.matches(&symbol("src/test_a.py"), None));
        assert!(filters.matches(&symbol("src/a.py"), None));
    }

    #[test]
    fn project_mismatch_is_a_no_match_not_an_error() {
        let filters = MetadataFilters {
            project_id: Some("other".to_string()),
            ..Default::default()
        };
        assert!(!filters.matches(&symbol("src/a.py"), None));
    }
}
