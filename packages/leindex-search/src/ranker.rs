//! Hybrid ranker: combines lexical, vector, and structural (PDG-derived)
//! scores into the single `score_overall` carried on a `Hit`, via a weighted
//! sum rather than the teacher's RRF.

use std::collections::HashMap;

use leindex_storage::{SymbolKind, SymbolRecord};

use crate::hit::{Hit, ScoreComponents};
use crate::intent::Intent;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankerWeights {
    pub semantic: f32,
    pub structural: f32,
    pub text: f32,
}

impl Default for RankerWeights {
    fn default() -> Self {
        Self {
            semantic: 0.5,
            structural: 0.3,
            text: 0.2,
        }
    }
}

impl RankerWeights {
    /// Per-intent weight adjustment. `Bottlenecks` is handled separately by
    /// [`crate::ranker::rank_by_structural_component`] rather than through
    /// these weights: it is a direct structural ranking with text only as a
    /// tiebreaker, not a weighted-sum member.
    pub fn for_intent(intent: Intent) -> Self {
        match intent {
            Intent::Semantic => Self {
                semantic: 0.7,
                structural: 0.2,
                text: 0.1,
            },
            Intent::WhereHandled => Self {
                semantic: 0.15,
                structural: 0.2,
                text: 0.65,
            },
            Intent::HowWorks => Self::default(),
            Intent::Text => Self {
                semantic: 0.0,
                structural: 0.0,
                text: 1.0,
            },
            Intent::Bottlenecks => Self::default(),
        }
    }

    fn normalized(&self) -> Self {
        let total = self.semantic + self.structural + self.text;
        if total <= f32::EPSILON {
            return Self::default();
        }
        Self {
            semantic: self.semantic / total,
            structural: self.structural / total,
            text: self.text / total,
        }
    }
}

/// Per-symbol raw scores collected from the two indices and the PDG before
/// fusion; any index that did not participate in a given query leaves its
/// field at `0.0`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawScores {
    pub semantic: f32,
    pub structural: f32,
    pub text: f32,
}

pub fn fuse(
    symbol: &SymbolRecord,
    raw: RawScores,
    weights: &RankerWeights,
    snippet: Option<String>,
    degraded_to_lexical: bool,
) -> Hit {
    let weights = weights.normalized();
    let components = ScoreComponents {
        semantic: raw.semantic.clamp(0.0, 1.0),
        structural: raw.structural.clamp(0.0, 1.0),
        text: raw.text.clamp(0.0, 1.0),
    };
    let overall = weights.semantic * components.semantic
        + weights.structural * components.structural
        + weights.text * components.text;

    Hit {
        symbol_id: symbol.id,
        project_id: symbol.project_id.clone(),
        file_path: symbol.file_path.clone(),
        symbol_name: symbol.symbol_name.clone(),
        kind: symbol.kind,
        line_range: (symbol.start_line, symbol.end_line),
        score_overall: overall.clamp(0.0, 1.0),
        score_components: components,
        snippet,
        degraded_to_lexical,
    }
}

/// Normalizes tantivy BM25-ish scores (unbounded) into `[0, 1]` via
/// min-max over the candidate set, so they can be weighted alongside
/// cosine similarity without one dimension dominating by scale alone.
pub fn normalize_text_scores(raw_by_symbol: &HashMap<u64, f32>) -> HashMap<u64, f32> {
    if raw_by_symbol.is_empty() {
        return HashMap::new();
    }
    let max = raw_by_symbol
        .values()
        .cloned()
        .fold(f32::MIN, f32::max)
        .max(0.0);
    if max <= f32::EPSILON {
        return raw_by_symbol.keys().map(|k| (*k, 0.0)).collect();
    }
    raw_by_symbol
        .iter()
        .map(|(k, v)| (*k, (v / max).clamp(0.0, 1.0)))
        .collect()
}

pub fn kind_matches(kind: SymbolKind, filter: Option<SymbolKind>) -> bool {
    filter.map(|f| f == kind).unwrap_or(true)
}

/// `Bottlenecks` intent ranking: sorts by `structural_component` (complexity
/// folded together with fan-in/fan-out centrality, the same component the
/// gravity expansion formula uses) descending, falling back to the text
/// score as a tiebreaker, then symbol id for determinism.
pub fn rank_by_structural_component(mut hits: Vec<(Hit, f32)>) -> Vec<Hit> {
    hits.sort_by(|(a, a_struct), (b, b_struct)| {
        b_struct
            .partial_cmp(a_struct)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                b.score_components
                    .text
                    .partial_cmp(&a.score_components.text)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.symbol_id.cmp(&b.symbol_id))
    });
    hits.into_iter().map(|(hit, _)| hit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use leindex_storage::ComplexityMetrics;

    fn symbol() -> SymbolRecord {
        SymbolRecord {
            id: 1,
            project_id: "p1".to_string(),
            file_path: "src/a.py".to_string(),
            symbol_name: "f".to_string(),
            kind: SymbolKind::Function,
            signature_text: "def f".to_string(),
            parameters: vec![],
            return_type: None,
            docstring: None,
            is_async: false,
            start_line: 1,
            end_line: 2,
            complexity: ComplexityMetrics::default(),
            content_hash: "h".to_string(),
            embedding: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn default_weights_sum_to_spec_defaults() {
        let weights = RankerWeights::default();
        assert_eq!(weights.semantic, 0.5);
        assert_eq!(weights.structural, 0.3);
        assert_eq!(weights.text, 0.2);
    }

    #[test]
    fn fuse_clamps_and_weights_components() {
        let hit = fuse(
            &symbol(),
            RawScores {
                semantic: 1.0,
                structural: 1.0,
                text: 1.0,
            },
            &RankerWeights::default(),
            None,
            false,
        );
        assert!((hit.score_overall - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_text_scores_scales_into_unit_range() {
        let mut raw = HashMap::new();
        raw.insert(1u64, 4.0);
        raw.insert(2u64, 2.0);
        let normalized = normalize_text_scores(&raw);
        assert!((normalized[&1] - 1.0).abs() < 1e-6);
        assert!((normalized[&2] - 0.5).abs() < 1e-6);
    }
}
