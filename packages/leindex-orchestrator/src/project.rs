//! Per-project in-memory working set: the PDG, the lexical and vector
//! indices, and the symbol-id allocator, all behind the `registry → project
//! → index` lock order.
//!
//! A [`ProjectState`] is the unit the memory governor spills and reloads:
//! spilling drops the PDG and/or vector index (`None`); the durable
//! `SqliteStore` row is never touched by a spill.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use leindex_pdg::ProgramDependenceGraph;
use leindex_search::{LexicalIndex, VectorIndex};
use leindex_storage::{SqliteStore, Store};
use parking_lot::RwLock;
use tokio::sync::Mutex as AsyncMutex;

use crate::config::LeIndexConfig;
use crate::error::{LeIndexError, Result};

/// One project's working set. Cheap to construct, expensive to populate —
/// `pdg`/`vector` start empty (equivalent to "spilled") and are filled in
/// lazily by [`ProjectState::ensure_pdg`]/[`ProjectState::ensure_vector`].
pub struct ProjectState {
    pub project_id: String,
    pub root_path: PathBuf,
    pub store: Arc<SqliteStore>,
    pub dimension: usize,

    pdg: RwLock<Option<ProgramDependenceGraph>>,
    vector: RwLock<Option<Arc<VectorIndex>>>,
    lexical: RwLock<Option<Arc<LexicalIndex>>>,

    /// A single writer per project; all mutating pipeline operations for
    /// this project serialize through this lock, independent of the
    /// finer-grained locks on each index.
    pub write_lock: AsyncMutex<()>,

    next_symbol_id: AtomicU64,
    pub last_access: RwLock<DateTime<Utc>>,
    last_cache_hit_rate: RwLock<f32>,
}

impl ProjectState {
    pub async fn open(
        project_id: String,
        root_path: PathBuf,
        config: &LeIndexConfig,
    ) -> Result<Arc<Self>> {
        let project_dir = config.project_dir(&project_id);
        std::fs::create_dir_all(&project_dir).map_err(|e| {
            LeIndexError::internal("project.open", format!("could not create {project_dir:?}: {e}"))
        })?;
        let store = Arc::new(SqliteStore::open(config.store_path(&project_id))?);

        let snapshot = store.load_pdg(&project_id).await?;
        let next_id = snapshot.symbols.iter().map(|s| s.id).max().map(|m| m + 1).unwrap_or(1);

        Ok(Arc::new(Self {
            project_id,
            root_path,
            store,
            dimension: config.vector.dimension,
            pdg: RwLock::new(None),
            vector: RwLock::new(None),
            lexical: RwLock::new(None),
            write_lock: AsyncMutex::new(()),
            next_symbol_id: AtomicU64::new(next_id),
            last_access: RwLock::new(Utc::now()),
            last_cache_hit_rate: RwLock::new(0.0),
        }))
    }

    pub fn touch(&self) {
        *self.last_access.write() = Utc::now();
    }

    pub fn allocate_symbol_id(&self) -> u64 {
        self.next_symbol_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Content-hash cache hit rate from the most recent `index_project` run
    /// against this project; `0.0` until the first run.
    pub fn cache_hit_rate(&self) -> f32 {
        *self.last_cache_hit_rate.read()
    }

    pub fn set_cache_hit_rate(&self, rate: f32) {
        *self.last_cache_hit_rate.write() = rate;
    }

    pub fn pdg_resident(&self) -> bool {
        self.pdg.read().is_some()
    }

    pub fn vector_resident(&self) -> bool {
        self.vector.read().is_some()
    }

    /// Loads the graph from storage if it is not already resident.
    pub async fn ensure_pdg(&self) -> Result<()> {
        if self.pdg_resident() {
            return Ok(());
        }
        let snapshot = self.store.load_pdg(&self.project_id).await?;
        let graph = ProgramDependenceGraph::load_from_snapshot(snapshot);
        *self.pdg.write() = Some(graph);
        Ok(())
    }

    pub fn with_pdg<T>(&self, f: impl FnOnce(&ProgramDependenceGraph) -> T) -> Option<T> {
        self.pdg.read().as_ref().map(f)
    }

    pub fn with_pdg_mut<T>(&self, f: impl FnOnce(&mut ProgramDependenceGraph) -> T) -> Option<T> {
        self.pdg.write().as_mut().map(f)
    }

    /// Replaces the resident graph outright (used after a batch of upserts
    /// that must land in both storage and the in-memory mirror).
    pub fn set_pdg(&self, graph: ProgramDependenceGraph) {
        *self.pdg.write() = Some(graph);
    }

    /// Drops the in-memory graph. Safe to interrupt: a partially-spilled
    /// cache behaves identically to an absent one.
    pub fn spill_pdg(&self) {
        *self.pdg.write() = None;
    }

    pub async fn ensure_vector(&self) -> Result<()> {
        if self.vector_resident() {
            return Ok(());
        }
        let snapshot = self.store.load_pdg(&self.project_id).await?;
        let index = VectorIndex::new(self.dimension, snapshot.symbols.len().max(16));
        for symbol in &snapshot.symbols {
            if let Some(embedding) = &symbol.embedding {
                if embedding.len() == self.dimension {
                    let _ = index.upsert(symbol.id, embedding);
                }
            }
        }
        *self.vector.write() = Some(Arc::new(index));
        Ok(())
    }

    pub fn vector(&self) -> Option<Arc<VectorIndex>> {
        self.vector.read().clone()
    }

    pub fn spill_vector(&self) {
        *self.vector.write() = None;
    }

    /// Current lexical index handle without creating one, for read-only
    /// callers like diagnostics that must not pay to open an index just to
    /// report that it is absent.
    pub fn lexical(&self) -> Option<Arc<LexicalIndex>> {
        self.lexical.read().clone()
    }

    pub fn ensure_lexical(&self, config: &LeIndexConfig) -> Result<Arc<LexicalIndex>> {
        if let Some(existing) = self.lexical.read().as_ref() {
            return Ok(existing.clone());
        }
        let mut guard = self.lexical.write();
        if let Some(existing) = guard.as_ref() {
            return Ok(existing.clone());
        }
        let dir = config.cache_dir(&self.project_id).join("lexical");
        let index = Arc::new(LexicalIndex::open_or_create(&dir)?);
        *guard = Some(index.clone());
        Ok(index)
    }
}

/// The process-wide set of resident projects, keyed by `project_id`. Lock
/// acquisition order is `registry → project → index` — callers take a
/// single `dashmap` shard lock to fetch a project handle, then the
/// project's own locks for its indices; never the reverse.
#[derive(Clone)]
pub struct ProjectRegistry {
    config: Arc<LeIndexConfig>,
    registry_store: Arc<SqliteStore>,
    resident: Arc<dashmap::DashMap<String, Arc<ProjectState>>>,
}

impl ProjectRegistry {
    pub fn new(config: Arc<LeIndexConfig>) -> Result<Self> {
        std::fs::create_dir_all(&config.storage.data_dir).map_err(|e| {
            LeIndexError::internal("registry.open", format!("could not create data dir: {e}"))
        })?;
        let registry_store = Arc::new(SqliteStore::open(config.registry_path())?);
        Ok(Self {
            config,
            registry_store,
            resident: Arc::new(dashmap::DashMap::new()),
        })
    }

    pub fn config(&self) -> &LeIndexConfig {
        &self.config
    }

    pub fn registry_store(&self) -> &Arc<SqliteStore> {
        &self.registry_store
    }

    /// Returns the resident handle for `project_id`, loading it from disk
    /// if it was spilled/evicted. The project itself must already be known
    /// to the registry (via a prior `index` call) — this is not project
    /// discovery.
    pub async fn get_or_load(
        &self,
        project_id: &str,
        root_path: PathBuf,
    ) -> Result<Arc<ProjectState>> {
        if let Some(existing) = self.resident.get(project_id) {
            existing.touch();
            return Ok(existing.clone());
        }
        let state = ProjectState::open(project_id.to_string(), root_path, &self.config).await?;
        self.resident.insert(project_id.to_string(), state.clone());
        Ok(state)
    }

    pub fn peek(&self, project_id: &str) -> Option<Arc<ProjectState>> {
        self.resident.get(project_id).map(|r| r.clone())
    }

    /// Drops the PDG and vector index for the least-recently-used resident
    /// projects until at most `keep` remain fully warm. The row in
    /// `store.db` is untouched.
    pub fn spill_lru_except(&self, keep: usize) {
        let mut by_access: Vec<(String, DateTime<Utc>)> = self
            .resident
            .iter()
            .map(|e| (e.key().clone(), *e.value().last_access.read()))
            .collect();
        by_access.sort_by_key(|(_, t)| *t);
        let spill_count = by_access.len().saturating_sub(keep);
        for (project_id, _) in by_access.into_iter().take(spill_count) {
            if let Some(state) = self.resident.get(&project_id) {
                state.spill_pdg();
                state.spill_vector();
                tracing::info!(project_id, "spilled PDG and vector caches for project");
            }
        }
    }

    /// Evicts whole projects: removes them from the resident set entirely,
    /// not just their heavy caches. `active` names projects currently
    /// serving a request, which must not be evicted.
    pub fn evict_all_except(&self, active: &std::collections::HashSet<String>) -> usize {
        let victims: Vec<String> = self
            .resident
            .iter()
            .map(|e| e.key().clone())
            .filter(|id| !active.contains(id))
            .collect();
        for id in &victims {
            self.resident.remove(id);
            tracing::info!(project_id = %id, "evicted project working set under memory pressure");
        }
        victims.len()
    }

    pub fn resident_project_ids(&self) -> Vec<String> {
        self.resident.iter().map(|e| e.key().clone()).collect()
    }
}
