//! PDG edges: a multiset keyed by `(caller, callee, edge_type)`.
//! Re-ingesting the same edge is idempotent.

pub use leindex_storage::EdgeType;

use super::node::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    pub caller_id: NodeId,
    pub callee_id: NodeId,
    pub edge_type: EdgeType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PdgEdge {
    pub caller_id: NodeId,
    pub callee_id: NodeId,
    pub edge_type: EdgeType,
    pub metadata: serde_json::Value,
}

impl PdgEdge {
    pub fn key(&self) -> EdgeKey {
        EdgeKey {
            caller_id: self.caller_id,
            callee_id: self.callee_id,
            edge_type: self.edge_type,
        }
    }
}

/// Relative contribution of each edge kind to gravity-expansion relevance:
/// call edges contribute more than data_flow, which contribute more than
/// inheritance, per a configurable weight table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeWeights {
    pub call: f32,
    pub data_flow: f32,
    pub inheritance: f32,
    pub control_flow: f32,
}

impl Default for EdgeWeights {
    fn default() -> Self {
        Self {
            call: 1.0,
            data_flow: 0.6,
            inheritance: 0.4,
            control_flow: 0.5,
        }
    }
}

impl EdgeWeights {
    pub fn weight_for(&self, edge_type: EdgeType) -> f32 {
        match edge_type {
            EdgeType::Call => self.call,
            EdgeType::DataFlow => self.data_flow,
            EdgeType::Inheritance => self.inheritance,
            EdgeType::ControlFlow => self.control_flow,
        }
    }
}
