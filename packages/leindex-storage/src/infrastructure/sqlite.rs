//! SQLite adapter implementing the [`Store`] port.
//!
//! One write-ahead-logged connection serializes writers; a small pool of
//! read-only connections lets queries run concurrently with indexing,
//! matching the "single-writer-per-project, many-reader" invariant.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OpenFlags};

use crate::domain::{
    AnalysisCacheRow, EdgeRecord, EdgeType, PdgSnapshot, ProjectRecord, Store, SymbolKind,
    SymbolRecord,
};
use crate::error::{Result, StorageError};

const READER_POOL_CAPACITY: usize = 4;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    root_path TEXT NOT NULL,
    last_indexed TEXT,
    generation INTEGER NOT NULL DEFAULT 0,
    file_count INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS symbols (
    id INTEGER PRIMARY KEY,
    project_id TEXT NOT NULL,
    file_path TEXT NOT NULL,
    symbol_name TEXT NOT NULL,
    kind TEXT NOT NULL,
    signature_text TEXT NOT NULL,
    parameters TEXT NOT NULL,
    return_type TEXT,
    docstring TEXT,
    is_async INTEGER NOT NULL,
    start_line INTEGER NOT NULL,
    end_line INTEGER NOT NULL,
    cyclomatic INTEGER NOT NULL,
    nesting_depth INTEGER NOT NULL,
    line_count INTEGER NOT NULL,
    token_count INTEGER NOT NULL,
    content_hash TEXT NOT NULL,
    embedding BLOB,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_symbols_file ON symbols(project_id, file_path);
CREATE INDEX IF NOT EXISTS idx_symbols_name ON symbols(symbol_name);
CREATE INDEX IF NOT EXISTS idx_symbols_hash ON symbols(content_hash);

CREATE TABLE IF NOT EXISTS edges (
    caller_id INTEGER NOT NULL,
    callee_id INTEGER NOT NULL,
    edge_type TEXT NOT NULL,
    metadata TEXT NOT NULL DEFAULT '{}',
    PRIMARY KEY (caller_id, callee_id, edge_type),
    FOREIGN KEY (caller_id) REFERENCES symbols(id) ON DELETE CASCADE,
    FOREIGN KEY (callee_id) REFERENCES symbols(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS analysis_cache (
    content_hash TEXT PRIMARY KEY,
    cfg_blob BLOB NOT NULL,
    complexity_blob BLOB NOT NULL,
    timestamp TEXT NOT NULL
);
"#;

fn connect(path: &Path, flags: OpenFlags) -> Result<Connection> {
    let conn = Connection::open_with_flags(path, flags)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(conn)
}

/// SQLite-backed implementation of [`Store`].
pub struct SqliteStore {
    db_path: PathBuf,
    writer: Arc<Mutex<Connection>>,
    readers: Arc<Mutex<Vec<Connection>>>,
}

impl SqliteStore {
    /// Open (creating if absent) the store at `path`, applying the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                StorageError::database(format!("failed to create data dir: {e}"))
            })?;
        }
        let writer = connect(
            &db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        )?;
        writer.execute_batch(SCHEMA)?;
        Ok(Self {
            db_path,
            writer: Arc::new(Mutex::new(writer)),
            readers: Arc::new(Mutex::new(Vec::with_capacity(READER_POOL_CAPACITY))),
        })
    }

    /// In-memory store, for tests.
    pub fn open_in_memory() -> Result<Self> {
        let writer = Connection::open_in_memory()?;
        writer.execute_batch(SCHEMA)?;
        Ok(Self {
            db_path: PathBuf::from(":memory:"),
            writer: Arc::new(Mutex::new(writer)),
            readers: Arc::new(Mutex::new(Vec::new())),
        })
    }

    fn checkout_reader(&self) -> Result<Connection> {
        if self.db_path == Path::new(":memory:") {
            // A fresh in-memory connection would be a *different* database;
            // tests exercise the writer connection directly instead.
            return Err(StorageError::database(
                "in-memory store has no reader pool; use the writer path",
            ));
        }
        if let Some(conn) = self.readers.lock().unwrap().pop() {
            return Ok(conn);
        }
        connect(&self.db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
    }

    fn checkin_reader(&self, conn: Connection) {
        let mut pool = self.readers.lock().unwrap();
        if pool.len() < READER_POOL_CAPACITY {
            pool.push(conn);
        }
    }

    fn with_reader<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        if self.db_path == Path::new(":memory:") {
            let conn = self.writer.lock().unwrap();
            return f(&conn);
        }
        let conn = self.checkout_reader()?;
        let result = f(&conn);
        self.checkin_reader(conn);
        result
    }

    fn with_writer<T>(&self, f: impl FnOnce(&mut Connection) -> Result<T>) -> Result<T> {
        let mut conn = self.writer.lock().unwrap();
        f(&mut conn)
    }
}

fn row_to_symbol(row: &rusqlite::Row<'_>) -> rusqlite::Result<SymbolRecord> {
    let kind_str: String = row.get("kind")?;
    let kind: SymbolKind = kind_str.parse().map_err(|_| {
        rusqlite::Error::InvalidColumnType(0, "kind".into(), rusqlite::types::Type::Text)
    })?;
    let parameters_json: String = row.get("parameters")?;
    let parameters: Vec<String> = serde_json::from_str(&parameters_json).unwrap_or_default();
    let embedding: Option<Vec<u8>> = row.get("embedding")?;
    let embedding = embedding.map(|bytes| {
        bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    });
    let updated_at_str: String = row.get("updated_at")?;

    Ok(SymbolRecord {
        id: row.get::<_, i64>("id")? as u64,
        project_id: row.get("project_id")?,
        file_path: row.get("file_path")?,
        symbol_name: row.get("symbol_name")?,
        kind,
        signature_text: row.get("signature_text")?,
        parameters,
        return_type: row.get("return_type")?,
        docstring: row.get("docstring")?,
        is_async: row.get::<_, i64>("is_async")? != 0,
        start_line: row.get::<_, i64>("start_line")? as u32,
        end_line: row.get::<_, i64>("end_line")? as u32,
        complexity: crate::domain::ComplexityMetrics {
            cyclomatic: row.get::<_, i64>("cyclomatic")? as u32,
            nesting_depth: row.get::<_, i64>("nesting_depth")? as u32,
            line_count: row.get::<_, i64>("line_count")? as u32,
            token_count: row.get::<_, i64>("token_count")? as u32,
        },
        content_hash: row.get("content_hash")?,
        embedding,
        updated_at: updated_at_str
            .parse()
            .unwrap_or_else(|_| Utc::now()),
    })
}

fn embedding_to_blob(embedding: &Option<Vec<f32>>) -> Option<Vec<u8>> {
    embedding.as_ref().map(|v| {
        let mut bytes = Vec::with_capacity(v.len() * 4);
        for f in v {
            bytes.extend_from_slice(&f.to_le_bytes());
        }
        bytes
    })
}

fn insert_symbol(conn: &Connection, record: &SymbolRecord) -> Result<()> {
    let parameters_json = serde_json::to_string(&record.parameters)?;
    let embedding_blob = embedding_to_blob(&record.embedding);
    conn.execute(
        "INSERT INTO symbols (
            id, project_id, file_path, symbol_name, kind, signature_text, parameters,
            return_type, docstring, is_async, start_line, end_line,
            cyclomatic, nesting_depth, line_count, token_count,
            content_hash, embedding, updated_at
        ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19)
        ON CONFLICT(id) DO UPDATE SET
            project_id=excluded.project_id, file_path=excluded.file_path,
            symbol_name=excluded.symbol_name, kind=excluded.kind,
            signature_text=excluded.signature_text, parameters=excluded.parameters,
            return_type=excluded.return_type, docstring=excluded.docstring,
            is_async=excluded.is_async, start_line=excluded.start_line,
            end_line=excluded.end_line, cyclomatic=excluded.cyclomatic,
            nesting_depth=excluded.nesting_depth, line_count=excluded.line_count,
            token_count=excluded.token_count, content_hash=excluded.content_hash,
            embedding=excluded.embedding, updated_at=excluded.updated_at",
        params![
            record.id as i64,
            record.project_id,
            record.file_path,
            record.symbol_name,
            record.kind.as_str(),
            record.signature_text,
            parameters_json,
            record.return_type,
            record.docstring,
            record.is_async as i64,
            record.start_line as i64,
            record.end_line as i64,
            record.complexity.cyclomatic as i64,
            record.complexity.nesting_depth as i64,
            record.complexity.line_count as i64,
            record.complexity.token_count as i64,
            record.content_hash,
            embedding_blob,
            record.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

#[async_trait]
impl Store for SqliteStore {
    async fn upsert_symbol(&self, record: SymbolRecord) -> Result<()> {
        self.with_writer(|conn| {
            let tx = conn.transaction().map_err(StorageError::from)?;
            insert_symbol(&tx, &record)?;
            tx.commit().map_err(StorageError::from)?;
            Ok(())
        })
    }

    async fn batch_upsert_symbols(&self, records: Vec<SymbolRecord>) -> Result<()> {
        self.with_writer(|conn| {
            let tx = conn.transaction().map_err(StorageError::from)?;
            for record in &records {
                insert_symbol(&tx, record)?;
            }
            tx.commit().map_err(StorageError::from)?;
            Ok(())
        })
    }

    async fn find_by_hash(&self, content_hash: &str) -> Result<Option<SymbolRecord>> {
        self.with_reader(|conn| {
            let mut stmt =
                conn.prepare("SELECT * FROM symbols WHERE content_hash = ?1 LIMIT 1")?;
            let mut rows = stmt.query(params![content_hash])?;
            if let Some(row) = rows.next()? {
                Ok(Some(row_to_symbol(row)?))
            } else {
                Ok(None)
            }
        })
    }

    async fn get_symbols_by_file(
        &self,
        project_id: &str,
        file_path: &str,
    ) -> Result<Vec<SymbolRecord>> {
        self.with_reader(|conn| {
            let mut stmt = conn.prepare(
                "SELECT * FROM symbols WHERE project_id = ?1 AND file_path = ?2 ORDER BY start_line",
            )?;
            let rows = stmt.query_map(params![project_id, file_path], row_to_symbol)?;
            let mut out = Vec::new();
            for r in rows {
                out.push(r?);
            }
            Ok(out)
        })
    }

    async fn delete_symbols_by_file(&self, project_id: &str, file_path: &str) -> Result<u64> {
        self.with_writer(|conn| {
            let tx = conn.transaction().map_err(StorageError::from)?;
            let n = tx.execute(
                "DELETE FROM symbols WHERE project_id = ?1 AND file_path = ?2",
                params![project_id, file_path],
            )?;
            tx.commit().map_err(StorageError::from)?;
            Ok(n as u64)
        })
    }

    async fn get_symbol(&self, project_id: &str, symbol_id: u64) -> Result<Option<SymbolRecord>> {
        self.with_reader(|conn| {
            let mut stmt =
                conn.prepare("SELECT * FROM symbols WHERE project_id = ?1 AND id = ?2")?;
            let mut rows = stmt.query(params![project_id, symbol_id as i64])?;
            if let Some(row) = rows.next()? {
                Ok(Some(row_to_symbol(row)?))
            } else {
                Ok(None)
            }
        })
    }

    async fn batch_upsert_edges(&self, edges: Vec<EdgeRecord>) -> Result<()> {
        self.with_writer(|conn| {
            let tx = conn.transaction().map_err(StorageError::from)?;
            for edge in &edges {
                let caller_exists: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM symbols WHERE id = ?1)",
                    params![edge.caller_id as i64],
                    |r| r.get(0),
                )?;
                let callee_exists: bool = tx.query_row(
                    "SELECT EXISTS(SELECT 1 FROM symbols WHERE id = ?1)",
                    params![edge.callee_id as i64],
                    |r| r.get(0),
                )?;
                if !caller_exists || !callee_exists {
                    return Err(StorageError::integrity(format!(
                        "edge ({}, {}, {}) references an unknown symbol",
                        edge.caller_id,
                        edge.callee_id,
                        edge.edge_type.as_str()
                    )));
                }
                tx.execute(
                    "INSERT INTO edges (caller_id, callee_id, edge_type, metadata)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(caller_id, callee_id, edge_type) DO NOTHING",
                    params![
                        edge.caller_id as i64,
                        edge.callee_id as i64,
                        edge.edge_type.as_str(),
                        edge.metadata.to_string(),
                    ],
                )?;
            }
            tx.commit().map_err(StorageError::from)?;
            Ok(())
        })
    }

    async fn get_edges_for_project(&self, project_id: &str) -> Result<Vec<EdgeRecord>> {
        self.with_reader(|conn| {
            let mut stmt = conn.prepare(
                "SELECT e.caller_id, e.callee_id, e.edge_type, e.metadata
                 FROM edges e
                 JOIN symbols s ON s.id = e.caller_id
                 WHERE s.project_id = ?1",
            )?;
            let rows = stmt.query_map(params![project_id], |row| {
                let edge_type_str: String = row.get(2)?;
                let metadata_str: String = row.get(3)?;
                Ok((
                    row.get::<_, i64>(0)? as u64,
                    row.get::<_, i64>(1)? as u64,
                    edge_type_str,
                    metadata_str,
                ))
            })?;
            let mut out = Vec::new();
            for r in rows {
                let (caller_id, callee_id, edge_type_str, metadata_str) = r?;
                let edge_type: EdgeType = edge_type_str.parse()?;
                let metadata =
                    serde_json::from_str(&metadata_str).unwrap_or(serde_json::Value::Null);
                out.push(EdgeRecord {
                    caller_id,
                    callee_id,
                    edge_type,
                    metadata,
                });
            }
            Ok(out)
        })
    }

    async fn get_analysis_cache(&self, content_hash: &str) -> Result<Option<AnalysisCacheRow>> {
        self.with_reader(|conn| {
            let mut stmt = conn.prepare(
                "SELECT content_hash, cfg_blob, complexity_blob, timestamp
                 FROM analysis_cache WHERE content_hash = ?1",
            )?;
            let mut rows = stmt.query(params![content_hash])?;
            if let Some(row) = rows.next()? {
                let ts: String = row.get(3)?;
                Ok(Some(AnalysisCacheRow {
                    content_hash: row.get(0)?,
                    cfg_blob: row.get(1)?,
                    complexity_blob: row.get(2)?,
                    timestamp: ts.parse().unwrap_or_else(|_| Utc::now()),
                }))
            } else {
                Ok(None)
            }
        })
    }

    async fn put_analysis_cache(&self, row: AnalysisCacheRow) -> Result<()> {
        self.with_writer(|conn| {
            conn.execute(
                "INSERT INTO analysis_cache (content_hash, cfg_blob, complexity_blob, timestamp)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(content_hash) DO UPDATE SET
                    cfg_blob=excluded.cfg_blob, complexity_blob=excluded.complexity_blob,
                    timestamp=excluded.timestamp",
                params![
                    row.content_hash,
                    row.cfg_blob,
                    row.complexity_blob,
                    row.timestamp.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    async fn evict_analysis_cache_lru(&self, capacity: usize) -> Result<u64> {
        self.with_writer(|conn| {
            let total: i64 =
                conn.query_row("SELECT COUNT(*) FROM analysis_cache", [], |r| r.get(0))?;
            let overflow = (total as i64 - capacity as i64).max(0);
            if overflow == 0 {
                return Ok(0);
            }
            let deleted = conn.execute(
                "DELETE FROM analysis_cache WHERE content_hash IN (
                    SELECT content_hash FROM analysis_cache
                    ORDER BY timestamp ASC LIMIT ?1
                )",
                params![overflow],
            )?;
            Ok(deleted as u64)
        })
    }

    async fn upsert_project(&self, record: ProjectRecord) -> Result<()> {
        self.with_writer(|conn| {
            conn.execute(
                "INSERT INTO projects (id, root_path, last_indexed, generation, file_count)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET
                    root_path=excluded.root_path, last_indexed=excluded.last_indexed,
                    generation=excluded.generation, file_count=excluded.file_count",
                params![
                    record.project_id,
                    record.root_path,
                    record.last_indexed.map(|t| t.to_rfc3339()),
                    record.generation as i64,
                    record.file_count as i64,
                ],
            )?;
            Ok(())
        })
    }

    async fn get_project(&self, project_id: &str) -> Result<Option<ProjectRecord>> {
        self.with_reader(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, root_path, last_indexed, generation, file_count
                 FROM projects WHERE id = ?1",
            )?;
            let mut rows = stmt.query(params![project_id])?;
            if let Some(row) = rows.next()? {
                let last_indexed: Option<String> = row.get(2)?;
                Ok(Some(ProjectRecord {
                    project_id: row.get(0)?,
                    root_path: row.get(1)?,
                    last_indexed: last_indexed.and_then(|s| s.parse().ok()),
                    generation: row.get::<_, i64>(3)? as u64,
                    file_count: row.get::<_, i64>(4)? as u64,
                }))
            } else {
                Ok(None)
            }
        })
    }

    async fn bump_generation(&self, project_id: &str) -> Result<u64> {
        self.with_writer(|conn| {
            let tx = conn.transaction().map_err(StorageError::from)?;
            tx.execute(
                "UPDATE projects SET generation = generation + 1, last_indexed = ?2 WHERE id = ?1",
                params![project_id, Utc::now().to_rfc3339()],
            )?;
            let generation: i64 = tx.query_row(
                "SELECT generation FROM projects WHERE id = ?1",
                params![project_id],
                |r| r.get(0),
            )?;
            tx.commit().map_err(StorageError::from)?;
            Ok(generation as u64)
        })
    }

    async fn list_projects(&self) -> Result<Vec<ProjectRecord>> {
        self.with_reader(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, root_path, last_indexed, generation, file_count FROM projects")?;
            let rows = stmt.query_map([], |row| {
                let last_indexed: Option<String> = row.get(2)?;
                Ok(ProjectRecord {
                    project_id: row.get(0)?,
                    root_path: row.get(1)?,
                    last_indexed: last_indexed.and_then(|s| s.parse().ok()),
                    generation: row.get::<_, i64>(3)? as u64,
                    file_count: row.get::<_, i64>(4)? as u64,
                })
            })?;
            let mut out = Vec::new();
            for r in rows {
                out.push(r?);
            }
            Ok(out)
        })
    }

    async fn save_pdg_snapshot(&self, _project_id: &str) -> Result<()> {
        // The graph has no separate serialized form: it is reconstructed
        // from the symbols/edges tables, which are already durable by the
        // time this is called.
        Ok(())
    }

    async fn load_pdg(&self, project_id: &str) -> Result<PdgSnapshot> {
        let symbols = self.with_reader(|conn| {
            let mut stmt =
                conn.prepare("SELECT * FROM symbols WHERE project_id = ?1")?;
            let rows = stmt.query_map(params![project_id], row_to_symbol)?;
            let mut out = Vec::new();
            for r in rows {
                out.push(r?);
            }
            Ok(out)
        })?;
        let edges = self.get_edges_for_project(project_id).await?;
        Ok(PdgSnapshot { symbols, edges })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ComplexityMetrics;

    fn sample_symbol(id: u64, project: &str, hash: &str) -> SymbolRecord {
        SymbolRecord {
            id,
            project_id: project.to_string(),
            file_path: "a.py".to_string(),
            symbol_name: "add".to_string(),
            kind: SymbolKind::Function,
            signature_text: "def add(x, y):".to_string(),
            parameters: vec!["x".to_string(), "y".to_string()],
            return_type: None,
            docstring: None,
            is_async: false,
            start_line: 1,
            end_line: 2,
            complexity: ComplexityMetrics {
                cyclomatic: 1,
                nesting_depth: 0,
                line_count: 2,
                token_count: 10,
            },
            content_hash: hash.to_string(),
            embedding: Some(vec![0.1, 0.2, 0.3]),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn upsert_then_find_by_hash_round_trips() {
        let store = SqliteStore::open_in_memory().unwrap();
        let record = sample_symbol(1, "proj", "hash1");
        store.upsert_symbol(record.clone()).await.unwrap();

        let found = store.find_by_hash("hash1").await.unwrap().unwrap();
        assert_eq!(found.symbol_name, "add");
        assert_eq!(found.embedding, record.embedding);
    }

    #[tokio::test]
    async fn upsert_is_idempotent_by_id() {
        let store = SqliteStore::open_in_memory().unwrap();
        let record = sample_symbol(1, "proj", "hash1");
        store.upsert_symbol(record.clone()).await.unwrap();
        store.upsert_symbol(record.clone()).await.unwrap();

        let all = store.get_symbols_by_file("proj", "a.py").await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn edges_to_unknown_symbol_are_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .upsert_symbol(sample_symbol(1, "proj", "hash1"))
            .await
            .unwrap();

        let bad_edge = EdgeRecord {
            caller_id: 1,
            callee_id: 999,
            edge_type: EdgeType::Call,
            metadata: serde_json::Value::Null,
        };
        let result = store.batch_upsert_edges(vec![bad_edge]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn add_edges_twice_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .upsert_symbol(sample_symbol(1, "proj", "hash1"))
            .await
            .unwrap();
        store
            .upsert_symbol(sample_symbol(2, "proj", "hash2"))
            .await
            .unwrap();

        let edge = EdgeRecord {
            caller_id: 1,
            callee_id: 2,
            edge_type: EdgeType::Call,
            metadata: serde_json::Value::Null,
        };
        store.batch_upsert_edges(vec![edge.clone()]).await.unwrap();
        store.batch_upsert_edges(vec![edge]).await.unwrap();

        let edges = store.get_edges_for_project("proj").await.unwrap();
        assert_eq!(edges.len(), 1);
    }

    #[tokio::test]
    async fn delete_symbols_by_file_cascades_to_edges() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .upsert_symbol(sample_symbol(1, "proj", "hash1"))
            .await
            .unwrap();
        store
            .upsert_symbol(sample_symbol(2, "proj", "hash2"))
            .await
            .unwrap();
        store
            .batch_upsert_edges(vec![EdgeRecord {
                caller_id: 1,
                callee_id: 2,
                edge_type: EdgeType::Call,
                metadata: serde_json::Value::Null,
            }])
            .await
            .unwrap();

        store.delete_symbols_by_file("proj", "a.py").await.unwrap();

        let edges = store.get_edges_for_project("proj").await.unwrap();
        assert!(edges.is_empty());
    }

    #[tokio::test]
    async fn project_generation_is_monotonic() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .upsert_project(ProjectRecord {
                project_id: "proj".into(),
                root_path: "/tmp/proj".into(),
                last_indexed: None,
                generation: 0,
                file_count: 0,
            })
            .await
            .unwrap();

        let g1 = store.bump_generation("proj").await.unwrap();
        let g2 = store.bump_generation("proj").await.unwrap();
        assert_eq!(g1, 1);
        assert_eq!(g2, 2);
    }

    #[tokio::test]
    async fn analysis_cache_lru_eviction_respects_capacity() {
        let store = SqliteStore::open_in_memory().unwrap();
        for i in 0..5 {
            store
                .put_analysis_cache(AnalysisCacheRow {
                    content_hash: format!("hash{i}"),
                    cfg_blob: vec![],
                    complexity_blob: vec![],
                    timestamp: Utc::now(),
                })
                .await
                .unwrap();
        }
        let evicted = store.evict_analysis_cache_lru(3).await.unwrap();
        assert_eq!(evicted, 2);
    }

    #[tokio::test]
    async fn load_pdg_round_trips_nodes_and_edges() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .upsert_symbol(sample_symbol(1, "proj", "hash1"))
            .await
            .unwrap();
        store
            .upsert_symbol(sample_symbol(2, "proj", "hash2"))
            .await
            .unwrap();
        store
            .batch_upsert_edges(vec![EdgeRecord {
                caller_id: 1,
                callee_id: 2,
                edge_type: EdgeType::Call,
                metadata: serde_json::Value::Null,
            }])
            .await
            .unwrap();

        let snapshot = store.load_pdg("proj").await.unwrap();
        assert_eq!(snapshot.symbols.len(), 2);
        assert_eq!(snapshot.edges.len(), 1);
    }
}
