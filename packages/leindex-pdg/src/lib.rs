//! The unified call/data-flow/inheritance graph over symbols.
//!
//! [`ProgramDependenceGraph`] is an in-memory arena; it is reconstructed
//! from [`leindex_storage`] rather than serialized directly. Callers own
//! whatever concurrency wrapper (e.g. an `RwLock` per project) suits their
//! access pattern — this crate is not itself `Sync`-enforcing.

pub mod edge;
pub mod error;
mod graph;
mod gravity;
pub mod node;

pub use edge::{EdgeKey, EdgeType, EdgeWeights, PdgEdge};
pub use error::{ErrorKind, PdgError, Result};
pub use graph::{AddEdgesReport, ProgramDependenceGraph};
pub use gravity::{expand_context, ExpansionEntry, ExpansionResult, GravityConfig};
pub use node::{NodeId, PdgNode};
