//! Gravity expansion benchmarks.
//!
//! Measures `expand_context`'s heap-driven traversal over graphs shaped like
//! realistic call graphs (a branching tree plus a handful of back-edges to
//! exercise the visited-set check) at a few sizes and budgets.

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use leindex_pdg::{expand_context, EdgeType, GravityConfig, NodeId, PdgEdge, ProgramDependenceGraph};
use leindex_storage::{ComplexityMetrics, SymbolKind, SymbolRecord};

fn symbol(id: u64, name: &str) -> SymbolRecord {
    SymbolRecord {
        id,
        project_id: "bench".to_string(),
        file_path: "bench.py".to_string(),
        symbol_name: name.to_string(),
        kind: SymbolKind::Function,
        signature_text: format!("def {name}"),
        parameters: vec![],
        return_type: None,
        docstring: None,
        is_async: false,
        start_line: 1,
        end_line: 2,
        complexity: ComplexityMetrics {
            cyclomatic: (id % 7) as u32 + 1,
            ..ComplexityMetrics::default()
        },
        content_hash: "hash".to_string(),
        embedding: None,
        updated_at: Utc::now(),
    }
}

/// A branching tree with `fan_out` children per node, `node_count` nodes
/// total, plus one back-edge per 10 nodes so `edges_to`/visited-set lookups
/// aren't trivially empty.
fn build_graph(node_count: u64, fan_out: u64) -> (ProgramDependenceGraph, NodeId) {
    let mut graph = ProgramDependenceGraph::new();
    let ids: Vec<NodeId> = (0..node_count)
        .map(|i| graph.upsert_node(&symbol(i, &format!("n{i}"))).unwrap())
        .collect();

    let mut edges = Vec::new();
    for (i, &caller) in ids.iter().enumerate() {
        for child in 1..=fan_out {
            let child_idx = i as u64 * fan_out + child;
            if child_idx < node_count {
                edges.push(PdgEdge {
                    caller_id: caller,
                    callee_id: ids[child_idx as usize],
                    edge_type: EdgeType::Call,
                    metadata: serde_json::Value::Null,
                });
            }
        }
        if i > 0 && i % 10 == 0 {
            edges.push(PdgEdge {
                caller_id: caller,
                callee_id: ids[i - 10],
                edge_type: EdgeType::DataFlow,
                metadata: serde_json::Value::Null,
            });
        }
    }
    graph.add_edges(edges);
    (graph, ids[0])
}

fn bench_expand_context_by_graph_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("expand_context_graph_size");
    for node_count in [100u64, 1_000, 5_000] {
        let (graph, root) = build_graph(node_count, 3);
        group.bench_with_input(BenchmarkId::from_parameter(node_count), &node_count, |b, _| {
            b.iter(|| {
                let config = GravityConfig::default();
                black_box(expand_context(
                    black_box(&graph),
                    black_box(&[root]),
                    black_box(2_000),
                    &config,
                    |_| 10,
                ))
            });
        });
    }
    group.finish();
}

fn bench_expand_context_by_budget(c: &mut Criterion) {
    let (graph, root) = build_graph(5_000, 4);
    let mut group = c.benchmark_group("expand_context_budget");
    for budget in [100u32, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(budget), &budget, |b, &budget| {
            b.iter(|| {
                let config = GravityConfig::default();
                black_box(expand_context(
                    black_box(&graph),
                    black_box(&[root]),
                    budget,
                    &config,
                    |_| 10,
                ))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_expand_context_by_graph_size, bench_expand_context_by_budget);
criterion_main!(benches);
