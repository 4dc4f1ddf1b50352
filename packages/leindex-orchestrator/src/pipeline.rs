//! The indexing pipeline: enumerate → hash → parse → diff → upsert → feed
//! PDG + search indices → bump generation.
//!
//! Parsing and hashing run across a bounded worker pool (rayon); the write
//! phase — storage, PDG, lexical, vector — is serialized per project
//! through [`crate::project::ProjectState::write_lock`], matching the
//! single-writer-many-reader invariant.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use leindex_parser::{detect_language, parse, LanguageTag, ParseHints, ParseOutput};
use leindex_pdg::PdgEdge;
use leindex_storage::{hashing, EdgeRecord, ProjectRecord, Store, SymbolKind, SymbolRecord};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::project::{ProjectRegistry, ProjectState};
use crate::walker::{enumerate_files, IgnoreTree};

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct IndexReport {
    pub project_id: String,
    pub files_processed: usize,
    pub files_failed: usize,
    pub generation: u64,
    pub duration_ms: u64,
    /// Additive detail beyond the literal shape, surfaced so the
    /// incremental no-op and rename-propagation scenarios have something
    /// concrete to assert against.
    pub symbols_inserted: usize,
    pub symbols_updated: usize,
    pub symbols_deleted: usize,
    pub analysis_cache_hit_rate: f32,
}

struct FileParse {
    language: LanguageTag,
    output: ParseOutput,
}

/// Full or incremental re-index of one project root.
pub async fn index_project(
    registry: &ProjectRegistry,
    project_path: &Path,
    force: bool,
) -> Result<IndexReport> {
    let start = Instant::now();
    let canonical = std::fs::canonicalize(project_path).map_err(|e| {
        crate::error::LeIndexError::invalid_input(
            "index.bad_path",
            format!("{} does not exist: {e}", project_path.display()),
        )
    })?;
    let project_id = hashing::project_id_for_path(&canonical.to_string_lossy());

    let project = registry.get_or_load(&project_id, canonical.clone()).await?;
    let _write_guard = project.write_lock.lock().await;

    let ignore = IgnoreTree::default();
    let current_files = enumerate_files(&canonical, &ignore).map_err(|e| {
        crate::error::LeIndexError::internal("index.walk_failed", format!("{e}"))
    })?;

    let prior_snapshot = project.store.load_pdg(&project_id).await?;
    let mut prior_by_file: HashMap<String, Vec<SymbolRecord>> = HashMap::new();
    for symbol in prior_snapshot.symbols {
        prior_by_file
            .entry(symbol.file_path.clone())
            .or_default()
            .push(symbol);
    }
    let current_file_set: HashSet<String> = current_files
        .iter()
        .map(|p| to_posix(p))
        .collect();

    let mut report = IndexReport {
        project_id: project_id.clone(),
        ..Default::default()
    };

    // --- parse phase: parallel, pure, no shared mutable state -----------
    let parsed: Vec<Option<(PathBuf, FileParse)>> = current_files
        .par_iter()
        .map(|relative| read_and_parse(&canonical, relative))
        .collect();

    let lexical = project.ensure_lexical(registry.config())?;
    project.ensure_pdg().await?;
    if force {
        project.spill_vector();
    }
    project.ensure_vector().await?;

    let mut cache_hits = 0usize;
    let mut cache_total = 0usize;
    let mut file_hints: HashMap<String, ParseHints> = HashMap::new();

    for item in parsed {
        match item {
            None => report.files_failed += 1,
            Some((relative, file)) => {
                report.files_processed += 1;
                let file_key = to_posix(&relative);
                let existing = prior_by_file.remove(&file_key).unwrap_or_default();

                let diff =
                    diff_file(&project, &project_id, &file_key, &file, existing, force).await?;

                report.symbols_inserted += diff.inserted.len();
                report.symbols_updated += diff.updated.len();
                report.symbols_deleted += diff.deleted_ids.len();
                cache_hits += diff.cache_hits;
                cache_total += diff.cache_checked;

                apply_diff(&project, &lexical, &file_key, file.language.as_str(), diff).await?;
                file_hints.insert(file_key, file.output.hints.clone());
            }
        }
    }

    // Files that existed before but vanished from this walk: deletes,
    // applied here too for a full re-index.
    for (file_key, removed) in prior_by_file {
        if current_file_set.contains(&file_key) {
            continue;
        }
        report.symbols_deleted += removed.len();
        let diff = FileDiff {
            inserted: Vec::new(),
            updated: Vec::new(),
            deleted_ids: removed.iter().map(|s| s.id).collect(),
            cache_hits: 0,
            cache_checked: 0,
        };
        project.store.delete_symbols_by_file(&project_id, &file_key).await?;
        apply_diff(&project, &lexical, &file_key, "", diff).await?;
    }

    report.analysis_cache_hit_rate = if cache_total == 0 {
        1.0
    } else {
        cache_hits as f32 / cache_total as f32
    };
    project.set_cache_hit_rate(report.analysis_cache_hit_rate);

    // Name-based call/inheritance hints resolve against the full
    // post-upsert symbol table, not just the file that produced them — a
    // callee defined in another file is the common case.
    let post_write = project.store.load_pdg(&project_id).await?;
    let name_to_id: HashMap<String, u64> = post_write
        .symbols
        .iter()
        .map(|s| (s.symbol_name.clone(), s.id))
        .collect();
    resolve_and_apply_hints(&project, &name_to_id, &file_hints).await?;

    let generation = project.store.bump_generation(&project_id).await?;
    project
        .store
        .upsert_project(ProjectRecord {
            project_id: project_id.clone(),
            root_path: canonical.to_string_lossy().to_string(),
            last_indexed: Some(Utc::now()),
            generation,
            file_count: current_files.len() as u64,
        })
        .await?;
    registry
        .registry_store()
        .upsert_project(ProjectRecord {
            project_id: project_id.clone(),
            root_path: canonical.to_string_lossy().to_string(),
            last_indexed: Some(Utc::now()),
            generation,
            file_count: current_files.len() as u64,
        })
        .await?;
    report.generation = generation;
    report.duration_ms = start.elapsed().as_millis() as u64;

    info!(
        project_id = %project_id,
        files_processed = report.files_processed,
        files_failed = report.files_failed,
        generation,
        "index run complete"
    );
    Ok(report)
}

fn to_posix(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn read_and_parse(root: &Path, relative: &Path) -> Option<(PathBuf, FileParse)> {
    let language = detect_language(relative)?;
    let bytes = match std::fs::read(root.join(relative)) {
        Ok(b) => b,
        Err(err) => {
            warn!(path = %relative.display(), error = %err, "failed to read file during indexing");
            return None;
        }
    };
    let output = parse(language, &bytes);
    if output
        .diagnostics
        .iter()
        .any(|d| matches!(d, leindex_parser::Diag::InvalidEncoding))
    {
        warn!(path = %relative.display(), "file aborted: invalid encoding");
        return None;
    }
    Some((relative.to_path_buf(), FileParse { language, output }))
}

struct FileDiff {
    inserted: Vec<SymbolRecord>,
    updated: Vec<SymbolRecord>,
    deleted_ids: Vec<u64>,
    cache_hits: usize,
    cache_checked: usize,
}

async fn diff_file(
    project: &Arc<ProjectState>,
    project_id: &str,
    file_key: &str,
    file: &FileParse,
    existing: Vec<SymbolRecord>,
    force: bool,
) -> Result<FileDiff> {
    let mut by_name: HashMap<(String, SymbolKind), SymbolRecord> = existing
        .into_iter()
        .map(|s| ((s.symbol_name.clone(), s.kind), s))
        .collect();

    let mut inserted = Vec::new();
    let mut updated = Vec::new();
    let mut cache_hits = 0usize;
    let mut cache_checked = 0usize;

    for sig in &file.output.symbols {
        let key = (sig.symbol_name.clone(), sig.kind);
        cache_checked += 1;
        let cache_hit = project
            .store
            .get_analysis_cache(&sig.content_hash)
            .await?
            .is_some();
        if cache_hit {
            cache_hits += 1;
        } else {
            project
                .store
                .put_analysis_cache(leindex_storage::AnalysisCacheRow {
                    content_hash: sig.content_hash.clone(),
                    cfg_blob: Vec::new(),
                    complexity_blob: serde_json::to_vec(&sig.complexity).unwrap_or_default(),
                    timestamp: Utc::now(),
                })
                .await?;
        }

        match by_name.remove(&key) {
            Some(prior) if prior.content_hash == sig.content_hash && !force => {
                // Unchanged: re-insert untouched so it is not treated as deleted below.
                by_name.insert(key, prior);
            }
            Some(prior) => {
                updated.push(SymbolRecord {
                    id: prior.id,
                    project_id: project_id.to_string(),
                    file_path: file_key.to_string(),
                    symbol_name: sig.symbol_name.clone(),
                    kind: sig.kind,
                    signature_text: sig.signature_text.clone(),
                    parameters: sig.parameters.clone(),
                    return_type: sig.return_type.clone(),
                    docstring: sig.docstring.clone(),
                    is_async: sig.is_async,
                    start_line: sig.start_line,
                    end_line: sig.end_line,
                    complexity: sig.complexity,
                    content_hash: sig.content_hash.clone(),
                    embedding: None,
                    updated_at: Utc::now(),
                });
            }
            None => {
                inserted.push(SymbolRecord {
                    id: project.allocate_symbol_id(),
                    project_id: project_id.to_string(),
                    file_path: file_key.to_string(),
                    symbol_name: sig.symbol_name.clone(),
                    kind: sig.kind,
                    signature_text: sig.signature_text.clone(),
                    parameters: sig.parameters.clone(),
                    return_type: sig.return_type.clone(),
                    docstring: sig.docstring.clone(),
                    is_async: sig.is_async,
                    start_line: sig.start_line,
                    end_line: sig.end_line,
                    complexity: sig.complexity,
                    content_hash: sig.content_hash.clone(),
                    embedding: None,
                    updated_at: Utc::now(),
                });
            }
        }
    }

    // Whatever remains in `by_name` (minus the untouched ones re-inserted
    // above, which are filtered out by hash equality) no longer appears in
    // this file's parse output: deleted.
    let unchanged_keys: HashSet<(String, SymbolKind)> = file
        .output
        .symbols
        .iter()
        .map(|s| (s.symbol_name.clone(), s.kind))
        .collect();
    let deleted_ids = by_name
        .into_iter()
        .filter(|(key, _)| !unchanged_keys.contains(key))
        .map(|(_, record)| record.id)
        .collect();

    Ok(FileDiff {
        inserted,
        updated,
        deleted_ids,
        cache_hits,
        cache_checked,
    })
}

async fn apply_diff(
    project: &Arc<ProjectState>,
    lexical: &leindex_search::LexicalIndex,
    file_key: &str,
    language: &str,
    diff: FileDiff,
) -> Result<()> {
    let mut upserts = diff.inserted;
    upserts.extend(diff.updated);

    if !upserts.is_empty() {
        project.store.batch_upsert_symbols(upserts.clone()).await?;
        lexical.upsert_symbols(&upserts, language)?;
        project.with_pdg_mut(|graph| {
            for record in &upserts {
                if let Err(err) = graph.upsert_node(record) {
                    warn!(symbol_id = record.id, error = %err, "failed to upsert PDG node");
                }
            }
        });
        if let Some(vector) = project.vector() {
            for record in &upserts {
                if let Some(embedding) = &record.embedding {
                    let _ = vector.upsert(record.id, embedding);
                }
            }
        }
    }

    if !diff.deleted_ids.is_empty() {
        for id in &diff.deleted_ids {
            project.with_pdg_mut(|graph| graph.remove_node(*id));
            if let Some(vector) = project.vector() {
                vector.delete(*id);
            }
        }
        debug!(file = file_key, count = diff.deleted_ids.len(), "symbols removed from file");
    }
    Ok(())
}

/// Resolves the parser's name-based intra-file call/inheritance hints into
/// PDG edges against the full symbol_name → id map for the project, and
/// feeds them into both storage and the in-memory graph. Unresolved callee
/// names (stdlib calls, cross-language calls) are silently dropped,
/// matching "rejects edges with unknown endpoints" at the storage layer.
async fn resolve_and_apply_hints(
    project: &Arc<ProjectState>,
    name_to_id: &HashMap<String, u64>,
    caller_file_hints: &HashMap<String, ParseHints>,
) -> Result<()> {
    let mut edge_records = Vec::new();
    let mut pdg_edges = Vec::new();

    for (_, hints) in caller_file_hints {
        for call in &hints.calls {
            let (Some(&caller_id), Some(&callee_id)) = (
                name_to_id.get(&call.caller_name),
                name_to_id.get(&call.callee_text),
            ) else {
                continue;
            };
            edge_records.push(EdgeRecord {
                caller_id,
                callee_id,
                edge_type: leindex_storage::EdgeType::Call,
                metadata: serde_json::Value::Null,
            });
        }
        for inheritance in &hints.inheritance {
            let (Some(&sub_id), Some(&super_id)) = (
                name_to_id.get(&inheritance.subtype_name),
                name_to_id.get(&inheritance.supertype_text),
            ) else {
                continue;
            };
            edge_records.push(EdgeRecord {
                caller_id: sub_id,
                callee_id: super_id,
                edge_type: leindex_storage::EdgeType::Inheritance,
                metadata: serde_json::Value::Null,
            });
        }
    }

    if edge_records.is_empty() {
        return Ok(());
    }

    project.store.batch_upsert_edges(edge_records.clone()).await?;
    project.with_pdg_mut(|graph| {
        for record in &edge_records {
            let Some(caller) = graph.node_for_symbol(record.caller_id) else {
                continue;
            };
            let Some(callee) = graph.node_for_symbol(record.callee_id) else {
                continue;
            };
            pdg_edges.push(PdgEdge {
                caller_id: caller,
                callee_id: callee,
                edge_type: record.edge_type,
                metadata: record.metadata.clone(),
            });
        }
        graph.add_edges(std::mem::take(&mut pdg_edges));
    });
    Ok(())
}
