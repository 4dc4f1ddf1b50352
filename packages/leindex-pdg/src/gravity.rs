//! Gravity expansion: a priority-weighted traversal that selects the most
//! relevant neighborhood of a set of entry nodes under a token budget.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use crate::edge::{EdgeType, EdgeWeights};
use crate::graph::ProgramDependenceGraph;
use crate::node::{NodeId, PdgNode};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityConfig {
    pub semantic_weight: f32,
    pub structural_weight: f32,
    /// `decay >= 1`: larger values bias harder towards locality.
    pub decay: f32,
    pub edge_weights: EdgeWeights,
    /// Lower bound on any candidate's token cost, used for the
    /// "remaining budget below the minimum cost of any candidate"
    /// termination condition.
    pub min_token_cost: u32,
}

impl Default for GravityConfig {
    fn default() -> Self {
        Self {
            semantic_weight: 0.6,
            structural_weight: 0.4,
            decay: 2.0,
            edge_weights: EdgeWeights::default(),
            min_token_cost: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpansionEntry {
    pub node_id: NodeId,
    pub symbol_id: u64,
    pub distance: usize,
    pub relevance: f32,
    /// The edge and originating node this entry was reached through, absent
    /// for the seed entries themselves.
    pub reached_via: Option<(NodeId, EdgeType)>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpansionResult {
    pub entries: Vec<ExpansionEntry>,
    pub tokens_used: u32,
}

struct Candidate {
    node_id: NodeId,
    distance: usize,
    relevance: f32,
    reached_via: Option<(NodeId, EdgeType)>,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    /// Higher relevance sorts greater (popped first by `BinaryHeap`'s
    /// max-heap). Ties broken by smaller distance, then smaller node id,
    /// both deterministic across runs.
    fn cmp(&self, other: &Self) -> Ordering {
        match self.relevance.partial_cmp(&other.relevance) {
            Some(Ordering::Equal) | None => match other.distance.cmp(&self.distance) {
                Ordering::Equal => other.node_id.cmp(&self.node_id),
                ord => ord,
            },
            Some(ord) => ord,
        }
    }
}

fn normalize(x: f32) -> f32 {
    x / (x + 1.0)
}

fn structural_component(graph: &ProgramDependenceGraph, node: &PdgNode) -> f32 {
    let complexity = normalize(node.complexity as f32);
    let fan_in = graph.edges_to(node.node_id).count() as f32;
    let fan_out = graph.edges_from(node.node_id).count() as f32;
    let fan = normalize(fan_in + fan_out);
    0.5 * complexity + 0.5 * fan
}

fn relevance_of(
    graph: &ProgramDependenceGraph,
    node: &PdgNode,
    distance: usize,
    edge_weight: f32,
    config: &GravityConfig,
) -> f32 {
    let base = config.semantic_weight * node.clamped_semantic_score()
        + config.structural_weight * structural_component(graph, node);
    let divisor = (distance.max(1) as f32).powf(config.decay);
    edge_weight * base / divisor
}

/// Pops the best candidate, appends it to the bundle, subtracts its
/// estimated token cost from the budget, and pushes its unvisited
/// neighbors. Terminates when the heap empties or the remaining budget
/// drops below the minimum token cost of any candidate.
pub fn expand_context(
    graph: &ProgramDependenceGraph,
    entry_ids: &[NodeId],
    budget_tokens: u32,
    config: &GravityConfig,
    token_cost: impl Fn(&PdgNode) -> u32,
) -> ExpansionResult {
    let mut heap = BinaryHeap::new();
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut result = ExpansionResult::default();
    let mut remaining = budget_tokens;

    for &entry in entry_ids {
        if let Some(node) = graph.get_node(entry) {
            let relevance = relevance_of(graph, node, 0, 1.0, config);
            heap.push(Candidate {
                node_id: entry,
                distance: 0,
                relevance,
                reached_via: None,
            });
        }
    }

    while remaining >= config.min_token_cost {
        let Some(candidate) = heap.pop() else {
            break;
        };
        if !visited.insert(candidate.node_id) {
            continue;
        }
        let Some(node) = graph.get_node(candidate.node_id) else {
            continue;
        };
        let cost = token_cost(node);
        if cost > remaining {
            continue;
        }
        remaining -= cost;
        result.tokens_used += cost;
        result.entries.push(ExpansionEntry {
            node_id: node.node_id,
            symbol_id: node.symbol_id,
            distance: candidate.distance,
            relevance: candidate.relevance,
            reached_via: candidate.reached_via,
        });

        for edge in graph.edges_from(candidate.node_id) {
            if visited.contains(&edge.callee_id) {
                continue;
            }
            if let Some(next) = graph.get_node(edge.callee_id) {
                let weight = config.edge_weights.weight_for(edge.edge_type);
                let relevance = relevance_of(graph, next, candidate.distance + 1, weight, config);
                heap.push(Candidate {
                    node_id: next.node_id,
                    distance: candidate.distance + 1,
                    relevance,
                    reached_via: Some((candidate.node_id, edge.edge_type)),
                });
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::PdgEdge;
    use chrono::Utc;
    use leindex_storage::{ComplexityMetrics, SymbolKind, SymbolRecord};

    fn symbol(id: u64, name: &str) -> SymbolRecord {
        SymbolRecord {
            id,
            project_id: "p1".to_string(),
            file_path: "a.py".to_string(),
            symbol_name: name.to_string(),
            kind: SymbolKind::Function,
            signature_text: format!("def {name}"),
            parameters: vec![],
            return_type: None,
            docstring: None,
            is_async: false,
            start_line: 1,
            end_line: 2,
            complexity: ComplexityMetrics::default(),
            content_hash: "hash".to_string(),
            embedding: None,
            updated_at: Utc::now(),
        }
    }

    fn chain_graph() -> (ProgramDependenceGraph, NodeId, NodeId, NodeId, NodeId) {
        let mut graph = ProgramDependenceGraph::new();
        let a = graph.upsert_node(&symbol(1, "a")).unwrap();
        let b = graph.upsert_node(&symbol(2, "b")).unwrap();
        let c = graph.upsert_node(&symbol(3, "c")).unwrap();
        let d = graph.upsert_node(&symbol(4, "d")).unwrap();
        graph.add_edges(vec![
            PdgEdge {
                caller_id: a,
                callee_id: b,
                edge_type: EdgeType::Call,
                metadata: serde_json::Value::Null,
            },
            PdgEdge {
                caller_id: b,
                callee_id: c,
                edge_type: EdgeType::Call,
                metadata: serde_json::Value::Null,
            },
            PdgEdge {
                caller_id: c,
                callee_id: d,
                edge_type: EdgeType::Call,
                metadata: serde_json::Value::Null,
            },
        ]);
        (graph, a, b, c, d)
    }

    #[test]
    fn expand_context_stops_at_budget_boundary() {
        let (graph, a, b, _c, _d) = chain_graph();
        let config = GravityConfig {
            decay: 2.0,
            min_token_cost: 10,
            ..GravityConfig::default()
        };
        // Budget covers exactly two entries at 10 tokens each.
        let result = expand_context(&graph, &[a], 20, &config, |_| 10);
        let ids: Vec<NodeId> = result.entries.iter().map(|e| e.node_id).collect();
        assert_eq!(ids, vec![a, b]);
        assert_eq!(result.tokens_used, 20);
    }

    #[test]
    fn expand_context_is_deterministic_across_runs() {
        let (graph, a, _b, _c, _d) = chain_graph();
        let config = GravityConfig::default();
        let r1 = expand_context(&graph, &[a], 1000, &config, |_| 5);
        let r2 = expand_context(&graph, &[a], 1000, &config, |_| 5);
        assert_eq!(r1.entries, r2.entries);
    }

    #[test]
    fn expand_context_empty_when_budget_too_small() {
        let (graph, a, _b, _c, _d) = chain_graph();
        let config = GravityConfig {
            min_token_cost: 50,
            ..GravityConfig::default()
        };
        let result = expand_context(&graph, &[a], 10, &config, |_| 100);
        assert!(result.entries.is_empty());
    }
}
