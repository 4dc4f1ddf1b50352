//! Durable storage and content addressing for LeIndex.
//!
//! Schema: `symbols`, `edges`, `analysis_cache`, `projects`, each matching
//! the logical schema in exactly. The SQLite backend is the only
//! implementation today; [`domain::Store`] is the seam a future backend
//! (e.g. a remote store) would implement.

pub mod domain;
pub mod error;
pub mod hashing;
pub mod infrastructure;

pub use domain::{
    AnalysisCacheRow, ComplexityMetrics, EdgeRecord, EdgeType, PdgSnapshot, ProjectRecord, Store,
    SymbolKind, SymbolRecord,
};
pub use error::{ErrorKind, Result, StorageError};
pub use infrastructure::SqliteStore;
