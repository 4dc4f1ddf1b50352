//! The in-memory Program Dependence Graph.
//!
//! Cycles are legitimate (mutual recursion, inheritance diamonds), so nodes
//! live in a flat arena keyed by integer id and edges are stored separately
//! in an adjacency index — nothing here threads an owning pointer between
//! nodes.

use std::collections::{HashMap, HashSet};

use leindex_storage::{PdgSnapshot, SymbolRecord};
use tracing::warn;

use crate::edge::{EdgeKey, EdgeType, PdgEdge};
use crate::error::{PdgError, Result};
use crate::node::{NodeId, PdgNode};

#[derive(Debug, Default)]
pub struct ProgramDependenceGraph {
    nodes: HashMap<NodeId, PdgNode>,
    symbol_index: HashMap<u64, NodeId>,
    edges: HashMap<EdgeKey, PdgEdge>,
    outgoing: HashMap<NodeId, Vec<EdgeKey>>,
    incoming: HashMap<NodeId, Vec<EdgeKey>>,
    next_node_id: NodeId,
}

/// Count of edges dropped because an endpoint was unknown: edge references
/// to unknown endpoints are dropped with a count reported, not an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddEdgesReport {
    pub inserted: usize,
    pub duplicates: usize,
    pub dropped_unknown_endpoint: usize,
}

impl ProgramDependenceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn get_node(&self, node_id: NodeId) -> Option<&PdgNode> {
        self.nodes.get(&node_id)
    }

    pub fn node_for_symbol(&self, symbol_id: u64) -> Option<NodeId> {
        self.symbol_index.get(&symbol_id).copied()
    }

    /// Idempotent by `symbol_id`: replaces the prior revision in place (same
    /// `node_id`) and drops its stale outgoing edges, since the symbol's
    /// body — and therefore what it calls — may have changed.
    pub fn upsert_node(&mut self, symbol: &SymbolRecord) -> Result<NodeId> {
        if let Some(&existing_id) = self.symbol_index.get(&symbol.id) {
            let existing = self
                .nodes
                .get(&existing_id)
                .expect("symbol_index entries always point at a live node");
            if existing.project_id != symbol.project_id {
                return Err(PdgError::project_collision(format!(
                    "symbol_id {} already belongs to project {}, not {}",
                    symbol.id, existing.project_id, symbol.project_id
                )));
            }
            self.clear_outgoing(existing_id);
            let node = self.nodes.get_mut(&existing_id).expect("checked above");
            *node = node_from_symbol(existing_id, symbol);
            return Ok(existing_id);
        }

        let node_id = self.next_node_id;
        self.next_node_id += 1;
        self.nodes.insert(node_id, node_from_symbol(node_id, symbol));
        self.symbol_index.insert(symbol.id, node_id);
        Ok(node_id)
    }

    fn clear_outgoing(&mut self, node_id: NodeId) {
        if let Some(keys) = self.outgoing.remove(&node_id) {
            for key in keys {
                self.edges.remove(&key);
                if let Some(incoming) = self.incoming.get_mut(&key.callee_id) {
                    incoming.retain(|k| k != &key);
                }
            }
        }
    }

    /// Bulk insert, ignoring duplicates; drops (and counts, rather than
    /// aborting) edges whose endpoints are not live nodes — the durable
    /// rejection of such edges is storage's job, this layer is
    /// the best-effort in-memory mirror used for traversal.
    pub fn add_edges(&mut self, edges: Vec<PdgEdge>) -> AddEdgesReport {
        let mut report = AddEdgesReport::default();
        for edge in edges {
            if !self.nodes.contains_key(&edge.caller_id) || !self.nodes.contains_key(&edge.callee_id)
            {
                warn!(
                    caller = edge.caller_id,
                    callee = edge.callee_id,
                    "dropping PDG edge with unknown endpoint"
                );
                report.dropped_unknown_endpoint += 1;
                continue;
            }
            let key = edge.key;
            if self.edges.contains_key(&key) {
                report.duplicates += 1;
                continue;
            }
            self.outgoing.entry(key.caller_id).or_default().push(key.clone());
            self.incoming.entry(key.callee_id).or_default().push(key.clone());
            self.edges.insert(key, edge);
            report.inserted += 1;
        }
        report
    }

    /// Cascades: deletes incident edges along with the node.
    pub fn remove_node(&mut self, symbol_id: u64) -> bool {
        let Some(node_id) = self.symbol_index.remove(&symbol_id) else {
            return false;
        };
        self.nodes.remove(&node_id);
        self.clear_outgoing(node_id);
        if let Some(keys) = self.incoming.remove(&node_id) {
            for key in keys {
                self.edges.remove(&key);
                if let Some(out) = self.outgoing.get_mut(&key.caller_id) {
                    out.retain(|k| k != &key);
                }
            }
        }
        true
    }

    fn neighbors(&self, node_id: NodeId, index: &HashMap<NodeId, Vec<EdgeKey>>) -> Vec<NodeId> {
        index
            .get(&node_id)
            .map(|keys| {
                keys.iter()
                    .map(|k| {
                        if k.caller_id == node_id {
                            k.callee_id
                        } else {
                            k.caller_id
                        }
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// DFS following outgoing edges (`forward_impact`).
    pub fn forward_impact(&self, node_id: NodeId, max_depth: Option<usize>) -> HashSet<NodeId> {
        self.impact(node_id, max_depth, &self.outgoing)
    }

    /// DFS on the reversed graph (`backward_impact`).
    pub fn backward_impact(&self, node_id: NodeId, max_depth: Option<usize>) -> HashSet<NodeId> {
        self.impact(node_id, max_depth, &self.incoming)
    }

    fn impact(
        &self,
        node_id: NodeId,
        max_depth: Option<usize>,
        index: &HashMap<NodeId, Vec<EdgeKey>>,
    ) -> HashSet<NodeId> {
        let mut visited = HashSet::new();
        if !self.nodes.contains_key(&node_id) {
            return visited;
        }
        let mut stack = vec![(node_id, 0usize)];
        while let Some((current, depth)) = stack.pop() {
            for next in self.neighbors(current, index) {
                let next_depth = depth + 1;
                if let Some(limit) = max_depth {
                    if next_depth > limit {
                        continue;
                    }
                }
                if visited.insert(next) {
                    stack.push((next, next_depth));
                }
            }
        }
        visited
    }

    pub fn edges_from(&self, node_id: NodeId) -> impl Iterator<Item = &PdgEdge> {
        self.outgoing
            .get(&node_id)
            .into_iter()
            .flatten()
            .filter_map(move |k| self.edges.get(k))
    }

    pub fn edges_to(&self, node_id: NodeId) -> impl Iterator<Item = &PdgEdge> {
        self.incoming
            .get(&node_id)
            .into_iter()
            .flatten()
            .filter_map(move |k| self.edges.get(k))
    }

    pub fn iter_nodes(&self) -> impl Iterator<Item = &PdgNode> {
        self.nodes.values()
    }

    /// Reconstructs the graph from a storage-layer snapshot: nodes first,
    /// then edges, dropping dangling edges with a warning.
    pub fn load_from_snapshot(snapshot: PdgSnapshot) -> Self {
        let mut graph = Self::new();
        for symbol in &snapshot.symbols {
            if let Err(err) = graph.upsert_node(symbol) {
                warn!(symbol_id = symbol.id, error = %err, "skipping symbol while loading PDG");
            }
        }
        let edges = snapshot
            .edges
            .into_iter()
            .filter_map(|record| {
                let caller_id = graph.node_for_symbol(record.caller_id)?;
                let callee_id = graph.node_for_symbol(record.callee_id)?;
                Some(PdgEdge {
                    caller_id,
                    callee_id,
                    edge_type: record.edge_type,
                    metadata: record.metadata,
                })
            })
            .collect::<Vec<_>>();
        let before = edges.len();
        let report = graph.add_edges(edges);
        if report.inserted < before {
            warn!(
                dropped = before - report.inserted,
                "dangling edges dropped while loading PDG"
            );
        }
        graph
    }
}

fn node_from_symbol(node_id: NodeId, symbol: &SymbolRecord) -> PdgNode {
    PdgNode {
        node_id,
        symbol_id: symbol.id,
        project_id: symbol.project_id.clone(),
        file_path: symbol.file_path.clone(),
        symbol_name: symbol.symbol_name.clone(),
        node_type: symbol.kind,
        complexity: symbol.complexity.cyclomatic,
        semantic_score: 0.0,
        embedding: symbol.embedding.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use leindex_storage::{ComplexityMetrics, SymbolKind};

    fn symbol(id: u64, project: &str, name: &str) -> SymbolRecord {
        SymbolRecord {
            id,
            project_id: project.to_string(),
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

    fn edge(caller: NodeId, callee: NodeId, edge_type: EdgeType) -> PdgEdge {
        PdgEdge {
            caller_id: caller,
            callee_id: callee,
            edge_type,
            metadata: serde_json::Value::Null,
        }
    }

    #[test]
    fn upsert_node_is_idempotent_by_symbol_id() {
        let mut graph = ProgramDependenceGraph::new();
        let a = symbol(1, "p1", "a");
        let id1 = graph.upsert_node(&a).unwrap();
        let id2 = graph.upsert_node(&a).unwrap();
        assert_eq!(id1, id2);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn upsert_node_rejects_project_collision() {
        let mut graph = ProgramDependenceGraph::new();
        graph.upsert_node(&symbol(1, "p1", "a")).unwrap();
        let err = graph.upsert_node(&symbol(1, "p2", "a")).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::ProjectCollision);
    }

    #[test]
    fn add_edges_rejects_unknown_endpoints_and_is_idempotent() {
        let mut graph = ProgramDependenceGraph::new();
        let a = graph.upsert_node(&symbol(1, "p1", "a")).unwrap();
        let b = graph.upsert_node(&symbol(2, "p1", "b")).unwrap();

        let report = graph.add_edges(vec![edge(a, b, EdgeType::Call), edge(a, 99, EdgeType::Call)]);
        assert_eq!(report.inserted, 1);
        assert_eq!(report.dropped_unknown_endpoint, 1);
        assert_eq!(graph.edge_count(), 1);

        let report2 = graph.add_edges(vec![edge(a, b, EdgeType::Call)]);
        assert_eq!(report2.inserted, 0);
        assert_eq!(report2.duplicates, 1);
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn remove_node_cascades_to_incident_edges() {
        let mut graph = ProgramDependenceGraph::new();
        let a = graph.upsert_node(&symbol(1, "p1", "a")).unwrap();
        let b = graph.upsert_node(&symbol(2, "p1", "b")).unwrap();
        graph.add_edges(vec![edge(a, b, EdgeType::Call)]);

        assert!(graph.remove_node(1));
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.edges_to(b).next().is_none());
    }

    #[test]
    fn upsert_clears_stale_outgoing_edges_only() {
        let mut graph = ProgramDependenceGraph::new();
        let a = graph.upsert_node(&symbol(1, "p1", "a")).unwrap();
        let b = graph.upsert_node(&symbol(2, "p1", "b")).unwrap();
        graph.add_edges(vec![edge(a, b, EdgeType::Call), edge(b, a, EdgeType::Call)]);

        // Re-upserting `a` (content changed) drops a's outgoing edge (a->b)
        // but must not touch b's outgoing edge (b->a), which is incoming to a.
        graph.upsert_node(&symbol(1, "p1", "a")).unwrap();
        assert_eq!(graph.edges_from(a).count(), 0);
        assert_eq!(graph.edges_from(b).count(), 1);
    }

    #[test]
    fn forward_and_backward_impact_respect_direction_and_depth() {
        let mut graph = ProgramDependenceGraph::new();
        let a = graph.upsert_node(&symbol(1, "p1", "a")).unwrap();
        let b = graph.upsert_node(&symbol(2, "p1", "b")).unwrap();
        let c = graph.upsert_node(&symbol(3, "p1", "c")).unwrap();
        graph.add_edges(vec![edge(a, b, EdgeType::Call), edge(b, c, EdgeType::Call)]);

        let forward = graph.forward_impact(a, None);
        assert_eq!(forward, HashSet::from([b, c]));

        let forward_shallow = graph.forward_impact(a, Some(1));
        assert_eq!(forward_shallow, HashSet::from([b]));

        let backward = graph.backward_impact(c, None);
        assert_eq!(backward, HashSet::from([a, b]));
    }
}
