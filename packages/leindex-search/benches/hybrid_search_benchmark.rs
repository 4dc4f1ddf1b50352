//! Hybrid search benchmarks: lexical query latency, vector (HNSW) query
//! latency, and the full fuse path over a realistic symbol set.

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use leindex_search::{fuse, LexicalIndex, RankerWeights, RawScores, VectorIndex};
use leindex_storage::{ComplexityMetrics, SymbolKind, SymbolRecord};

const DIMENSION: usize = 32;

fn symbol(id: u64) -> SymbolRecord {
    SymbolRecord {
        id,
        project_id: "bench".to_string(),
        file_path: format!("src/module_{}.py", id % 50),
        symbol_name: format!("handle_request_{id}"),
        kind: SymbolKind::Function,
        signature_text: format!("def handle_request_{id}(payload, context)"),
        parameters: vec!["payload".to_string(), "context".to_string()],
        return_type: None,
        docstring: Some("Processes an inbound request and returns a response.".to_string()),
        is_async: id % 2 == 0,
        start_line: 1,
        end_line: 40,
        complexity: ComplexityMetrics {
            cyclomatic: (id % 11) as u32 + 1,
            ..ComplexityMetrics::default()
        },
        content_hash: format!("hash-{id}"),
        embedding: None,
        updated_at: Utc::now(),
    }
}

fn pseudo_embedding(id: u64) -> Vec<f32> {
    (0..DIMENSION)
        .map(|d| (((id as f32) * 0.618_034 + d as f32).sin() + 1.0) / 2.0)
        .collect()
}

fn build_lexical(symbol_count: u64) -> LexicalIndex {
    let index = LexicalIndex::create_in_ram().expect("in-ram tantivy index");
    let symbols: Vec<SymbolRecord> = (0..symbol_count).map(symbol).collect();
    index.upsert_symbols(&symbols, "python").expect("bulk upsert");
    index
}

fn build_vector(symbol_count: u64) -> VectorIndex {
    let index = VectorIndex::new(DIMENSION, symbol_count as usize);
    for id in 0..symbol_count {
        index.upsert(id, &pseudo_embedding(id)).expect("upsert embedding");
    }
    index
}

fn bench_lexical_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexical_search");
    for symbol_count in [100u64, 1_000, 10_000] {
        let index = build_lexical(symbol_count);
        group.bench_with_input(
            BenchmarkId::from_parameter(symbol_count),
            &symbol_count,
            |b, _| {
                b.iter(|| black_box(index.search(black_box("handle_request"), black_box(20)).unwrap()));
            },
        );
    }
    group.finish();
}

fn bench_vector_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("vector_search");
    for symbol_count in [100u64, 1_000, 10_000] {
        let index = build_vector(symbol_count);
        let query = pseudo_embedding(symbol_count / 2);
        group.bench_with_input(
            BenchmarkId::from_parameter(symbol_count),
            &symbol_count,
            |b, _| {
                b.iter(|| black_box(index.search(black_box(&query), black_box(20), 64).unwrap()));
            },
        );
    }
    group.finish();
}

fn bench_fuse(c: &mut Criterion) {
    let symbols: Vec<SymbolRecord> = (0..1_000).map(symbol).collect();
    let weights = RankerWeights::default();
    c.bench_function("fuse_1000_hits", |b| {
        b.iter(|| {
            let hits: Vec<_> = symbols
                .iter()
                .map(|s| {
                    fuse(
                        black_box(s),
                        RawScores {
                            semantic: 0.7,
                            structural: 0.4,
                            text: 0.9,
                        },
                        &weights,
                        None,
                        false,
                    )
                })
                .collect();
            black_box(hits)
        });
    });
}

criterion_group!(benches, bench_lexical_search, bench_vector_search, bench_fuse);
criterion_main!(benches);
