//! End-to-end scenarios driven through the same `index_project`/
//! `handle_request` entry points the CLI and RPC transports use.

use std::path::Path;
use std::sync::Arc;

use leindex_orchestrator::dispatch::{Request, Response, SearchFilters, SearchMode};
use leindex_orchestrator::{handle_request, index_project, LeIndexConfig, ProjectRegistry};

fn test_config(data_dir: &Path) -> LeIndexConfig {
    let mut config = LeIndexConfig::default();
    config.storage.data_dir = data_dir.to_path_buf();
    config
}

async fn search(
    registry: &ProjectRegistry,
    project_id: &str,
    query: &str,
    limit: usize,
) -> Vec<leindex_search::Hit> {
    let req = Request::Search {
        project_id: project_id.to_string(),
        query: query.to_string(),
        filters: SearchFilters::default(),
        limit,
        mode: SearchMode::Hybrid,
        embedding: None,
    };
    match handle_request(registry, req, None).await.expect("search request") {
        Response::Search(hits) => hits,
        other => panic!("expected Response::Search, got {other:?}"),
    }
}

#[tokio::test]
async fn scenario_1_fresh_index_finds_the_new_symbol() {
    let project_dir = tempfile::tempdir().unwrap();
    let data_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        project_dir.path().join("a.py"),
        "def add(x, y):\n    return x + y\n",
    )
    .unwrap();

    let config = Arc::new(test_config(data_dir.path()));
    let registry = ProjectRegistry::new(config).unwrap();

    let report = index_project(&registry, project_dir.path(), false).await.unwrap();
    assert_eq!(report.generation, 1);
    assert_eq!(report.files_processed, 1);
    assert_eq!(report.files_failed, 0);

    let hits = search(&registry, &report.project_id, "add", 1).await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].symbol_name, "add");
    assert_eq!(hits[0].kind, leindex_storage::SymbolKind::Function);
    assert!(hits[0].score_components.text > 0.0);
}

#[tokio::test]
async fn scenario_2_incremental_reindex_is_a_no_op() {
    let project_dir = tempfile::tempdir().unwrap();
    let data_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        project_dir.path().join("a.py"),
        "def add(x, y):\n    return x + y\n",
    )
    .unwrap();

    let config = Arc::new(test_config(data_dir.path()));
    let registry = ProjectRegistry::new(config).unwrap();

    let first = index_project(&registry, project_dir.path(), false).await.unwrap();
    assert_eq!(first.generation, 1);

    let second = index_project(&registry, project_dir.path(), false).await.unwrap();
    assert_eq!(second.generation, 2);
    assert_eq!(second.files_processed, 1);
    assert_eq!(second.symbols_inserted, 0);
    assert_eq!(second.symbols_updated, 0);
    assert_eq!(second.symbols_deleted, 0);
    assert_eq!(second.analysis_cache_hit_rate, 1.0);
}

#[tokio::test]
async fn scenario_3_rename_propagates_as_delete_plus_insert() {
    let project_dir = tempfile::tempdir().unwrap();
    let data_dir = tempfile::tempdir().unwrap();
    let file_path = project_dir.path().join("a.py");
    std::fs::write(&file_path, "def add(x, y):\n    return x + y\n").unwrap();

    let config = Arc::new(test_config(data_dir.path()));
    let registry = ProjectRegistry::new(config).unwrap();

    let first = index_project(&registry, project_dir.path(), false).await.unwrap();
    assert_eq!(first.generation, 1);

    std::fs::write(&file_path, "def sum_two(x, y):\n    return x + y\n").unwrap();
    let second = index_project(&registry, project_dir.path(), false).await.unwrap();

    assert_eq!(second.symbols_inserted, 1);
    assert_eq!(second.symbols_deleted, 1);
    assert_eq!(second.symbols_updated, 0);

    let old_hits = search(&registry, &second.project_id, "add", 10).await;
    assert!(old_hits.is_empty(), "renamed-away symbol must not be findable: {old_hits:?}");

    let new_hits = search(&registry, &second.project_id, "sum_two", 10).await;
    assert_eq!(new_hits.len(), 1);
    assert_eq!(new_hits[0].symbol_name, "sum_two");
}

#[tokio::test]
async fn scenario_4_analyze_expands_along_the_call_chain() {
    let project_dir = tempfile::tempdir().unwrap();
    let data_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        project_dir.path().join("chain.py"),
        "def a():\n    return b()\n\n\ndef b():\n    return c()\n\n\ndef c():\n    return 1\n",
    )
    .unwrap();

    let config = Arc::new(test_config(data_dir.path()));
    let registry = ProjectRegistry::new(config).unwrap();
    let report = index_project(&registry, project_dir.path(), false).await.unwrap();

    let narrow = Request::Analyze {
        project_id: report.project_id.clone(),
        file_path: None,
        symbol_name: Some("a".to_string()),
        query: None,
        budget_tokens: 1,
    };
    let narrow_bundle = match handle_request(&registry, narrow, None).await.unwrap() {
        Response::Analyze(bundle) => bundle,
        other => panic!("expected Response::Analyze, got {other:?}"),
    };

    let wide = Request::Analyze {
        project_id: report.project_id.clone(),
        file_path: None,
        symbol_name: Some("a".to_string()),
        query: None,
        budget_tokens: 2000,
    };
    let wide_bundle = match handle_request(&registry, wide, None).await.unwrap() {
        Response::Analyze(bundle) => bundle,
        other => panic!("expected Response::Analyze, got {other:?}"),
    };

    assert!(
        wide_bundle.entries.len() >= narrow_bundle.entries.len(),
        "a larger token budget must not shrink the expansion"
    );
    assert!(wide_bundle.entries.iter().any(|e| e.excerpt.contains("def a")));
}

#[tokio::test]
async fn scenario_empty_project_indexes_with_zero_symbols_and_generation_one() {
    let project_dir = tempfile::tempdir().unwrap();
    let data_dir = tempfile::tempdir().unwrap();

    let config = Arc::new(test_config(data_dir.path()));
    let registry = ProjectRegistry::new(config).unwrap();
    let report = index_project(&registry, project_dir.path(), false).await.unwrap();

    assert_eq!(report.generation, 1);
    assert_eq!(report.files_processed, 0);
    assert_eq!(report.symbols_inserted, 0);
}

#[tokio::test]
async fn scenario_concurrent_projects_do_not_share_symbol_ids_or_edges() {
    let project_a = tempfile::tempdir().unwrap();
    let project_b = tempfile::tempdir().unwrap();
    let data_dir = tempfile::tempdir().unwrap();
    std::fs::write(project_a.path().join("a.py"), "def only_in_a():\n    pass\n").unwrap();
    std::fs::write(project_b.path().join("b.py"), "def only_in_b():\n    pass\n").unwrap();

    let config = Arc::new(test_config(data_dir.path()));
    let registry = ProjectRegistry::new(config).unwrap();

    let (report_a, report_b) = tokio::join!(
        index_project(&registry, project_a.path(), false),
        index_project(&registry, project_b.path(), false),
    );
    let report_a = report_a.unwrap();
    let report_b = report_b.unwrap();
    assert_ne!(report_a.project_id, report_b.project_id);

    let hits_a = search(&registry, &report_a.project_id, "only_in_b", 10).await;
    assert!(hits_a.is_empty(), "project A must not see project B's symbols");
    let hits_b = search(&registry, &report_b.project_id, "only_in_a", 10).await;
    assert!(hits_b.is_empty(), "project B must not see project A's symbols");
}
