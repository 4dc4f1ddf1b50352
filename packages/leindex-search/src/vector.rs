//! Vector index over symbol embeddings. There is no teacher module for HNSW
//! search; grounded instead on the corpus's own prior attempt at this
//! project, which settled on `hnsw_rs` for exactly this purpose (see
//! DESIGN.md).

use std::collections::HashMap;
use std::sync::RwLock;

use hnsw_rs::hnsw::{Hnsw, Neighbour};
use hnsw_rs::dist::DistCosine;

use crate::error::{Result, SearchError};
use crate::validation::validate_embedding_dimension;

const DEFAULT_MAX_NB_CONNECTION: usize = 24;
const DEFAULT_EF_CONSTRUCTION: usize = 200;
const DEFAULT_MAX_LAYER: usize = 16;

#[derive(Debug, Clone, Copy)]
pub struct VectorHit {
    pub symbol_id: u64,
    /// Cosine similarity folded into `[0, 1]` — a similarity, not a
    /// distance.
    pub similarity: f32,
}

/// One HNSW graph per embedding dimension, since `hnsw_rs` is fixed-width.
/// A project using a single embedding model only ever populates one of
/// these lazily.
pub struct VectorIndex {
    dimension: usize,
    inner: RwLock<Hnsw<'static, f32, DistCosine>>,
    /// hnsw_rs identifies points by a `usize` id; this maps that id back to
    /// the symbol id it represents, and lets deletions mark tombstones
    /// without needing to rebuild the graph on every call.
    id_map: RwLock<HashMap<usize, u64>>,
    tombstones: RwLock<std::collections::HashSet<usize>>,
    next_internal_id: RwLock<usize>,
    symbol_to_internal: RwLock<HashMap<u64, usize>>,
}

impl VectorIndex {
    pub fn new(dimension: usize, expected_capacity: usize) -> Self {
        let hnsw = Hnsw::new(
            DEFAULT_MAX_NB_CONNECTION,
            expected_capacity.max(16),
            DEFAULT_MAX_LAYER,
            DEFAULT_EF_CONSTRUCTION,
            DistCosine {},
        );
        Self {
            dimension,
            inner: RwLock::new(hnsw),
            id_map: RwLock::new(HashMap::new()),
            tombstones: RwLock::new(std::collections::HashSet::new()),
            next_internal_id: RwLock::new(0),
            symbol_to_internal: RwLock::new(HashMap::new()),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Live (non-tombstoned) entry count, for diagnostics.
    pub fn len(&self) -> usize {
        let tombstoned = self.tombstones.read().unwrap().len();
        self.id_map.read().unwrap().len().saturating_sub(tombstoned)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Upserts by symbol id. `hnsw_rs` has no in-place update; an existing
    /// point for this symbol is tombstoned and a fresh point inserted, with
    /// lazy compaction reclaiming tombstoned slots on `compact`.
    pub fn upsert(&self, symbol_id: u64, embedding: &[f32]) -> Result<()> {
        validate_embedding_dimension(embedding, self.dimension)?;

        if let Some(&old_internal) = self.symbol_to_internal.read().unwrap().get(&symbol_id) {
            self.tombstones.write().unwrap().insert(old_internal);
        }

        let internal_id = {
            let mut next = self.next_internal_id.write().unwrap();
            let id = *next;
            *next += 1;
            id
        };

        self.inner
            .write()
            .unwrap()
            .insert((embedding, internal_id));
        self.id_map.write().unwrap().insert(internal_id, symbol_id);
        self.symbol_to_internal
            .write()
            .unwrap()
            .insert(symbol_id, internal_id);
        Ok(())
    }

    pub fn delete(&self, symbol_id: u64) {
        if let Some(internal_id) = self.symbol_to_internal.write().unwrap().remove(&symbol_id) {
            self.tombstones.write().unwrap().insert(internal_id);
        }
    }

    /// Fraction of inserted points that are tombstoned, exposed so the
    /// orchestrator's cache-compaction routine can decide when to rebuild.
    pub fn tombstone_ratio(&self) -> f32 {
        let total = self.id_map.read().unwrap().len();
        if total == 0 {
            return 0.0;
        }
        self.tombstones.read().unwrap().len() as f32 / total as f32
    }

    /// Rebuilds the graph dropping tombstoned points. The caller must
    /// re-supply the surviving `(symbol_id, embedding)` pairs, since
    /// `hnsw_rs` does not expose stored vectors for readback.
    pub fn compact(&self, surviving: &[(u64, Vec<f32>)]) -> Result<()> {
        let fresh = Self::new(self.dimension, surviving.len());
        for (symbol_id, embedding) in surviving {
            fresh.upsert(*symbol_id, embedding)?;
        }
        *self.inner.write().unwrap() = fresh.inner.into_inner().unwrap();
        *self.id_map.write().unwrap() = fresh.id_map.into_inner().unwrap();
        *self.symbol_to_internal.write().unwrap() = fresh.symbol_to_internal.into_inner().unwrap();
        *self.tombstones.write().unwrap() = std::collections::HashSet::new();
        *self.next_internal_id.write().unwrap() = fresh.next_internal_id.into_inner().unwrap();
        Ok(())
    }

    pub fn search(&self, query: &[f32], k: usize, ef_search: usize) -> Result<Vec<VectorHit>> {
        validate_embedding_dimension(query, self.dimension)?;
        if k == 0 {
            return Ok(Vec::new());
        }
        let tombstones = self.tombstones.read().unwrap();
        let id_map = self.id_map.read().unwrap();
        // Over-fetch to compensate for tombstoned results getting filtered.
        let fetch_k = (k + tombstones.len()).max(k);
        let neighbours: Vec<Neighbour> =
            self.inner.read().unwrap().search(query, fetch_k, ef_search);

        let mut hits = Vec::with_capacity(k);
        for neighbour in neighbours {
            if tombstones.contains(&neighbour.d_id) {
                continue;
            }
            let Some(&symbol_id) = id_map.get(&neighbour.d_id) else {
                continue;
            };
            // DistCosine returns a distance in [0, 2]; fold to a similarity
            // in [0, 1].
            let similarity = (1.0 - (neighbour.distance / 2.0)).clamp(0.0, 1.0);
            hits.push(VectorHit {
                symbol_id,
                similarity,
            });
            if hits.len() >= k {
                break;
            }
        }
        Ok(hits)
    }
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("dimension", &self.dimension)
            .field("entries", &self.id_map.read().unwrap().len())
            .finish()
    }
}

pub fn backend_unavailable(dimension: usize, requested: usize) -> SearchError {
    SearchError::backend_unavailable(format!(
        "vector index configured for dimension {dimension} cannot serve a query of dimension {requested}"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(i: usize, dim: usize) -> Vec<f32> {
        let mut v = vec![0.0_f32; dim];
        v[i % dim] = 1.0;
        v
    }

    #[test]
    fn upsert_then_search_returns_the_nearest_point() {
        let index = VectorIndex::new(4, 16);
        index.upsert(1, &unit(0, 4)).unwrap();
        index.upsert(2, &unit(1, 4)).unwrap();
        let hits = index.search(&unit(0, 4), 1, 50).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].symbol_id, 1);
        assert!(hits[0].similarity > 0.9);
    }

    #[test]
    fn deleted_points_are_excluded_from_search() {
        let index = VectorIndex::new(4, 16);
        index.upsert(1, &unit(0, 4)).unwrap();
        index.delete(1);
        let hits = index.search(&unit(0, 4), 5, 50).unwrap();
        assert!(hits.iter().all(|h| h.symbol_id != 1));
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let index = VectorIndex::new(4, 16);
        assert!(index.upsert(1, &[0.0, 1.0]).is_err());
        assert!(index.search(&[0.0, 1.0], 1, 50).is_err());
    }
}
