//! Benchmarks for retrieval latency.
//!
//! Measures `retrieve` over in-memory corpora of different sizes, in both
//! ranking modes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mmrag_core::SearchMode;
use mmrag_embed::HashingEmbedder;
use mmrag_query::{MultiVectorRetriever, RetrieverConfig, TextKind};
use mmrag_store::{MemoryContentStore, MemoryEmbeddingIndex};
use std::sync::Arc;

const TOPICS: &[&str] = &[
    "attention", "revenue", "dataset", "gradient", "accuracy", "latency", "figure", "table",
];

/// Synthetic chunk text; every chunk mentions two topics.
fn chunk_text(i: usize) -> String {
    let a = TOPICS[i % TOPICS.len()];
    let b = TOPICS[(i / TOPICS.len()) % TOPICS.len()];
    format!("Section {i} discusses {a} and its relation to {b} with further detail.")
}

async fn populated_retriever(chunk_count: usize, mode: SearchMode) -> MultiVectorRetriever {
    let retriever = MultiVectorRetriever::new(
        Arc::new(MemoryEmbeddingIndex::new(Arc::new(HashingEmbedder::default()))),
        Arc::new(MemoryContentStore::new()),
        RetrieverConfig { top_k: 3, mode },
    )
    .unwrap();

    let texts: Vec<String> = (0..chunk_count).map(chunk_text).collect();
    // Insert in batches of 100
    for batch in texts.chunks(100) {
        retriever
            .add_texts(batch.to_vec(), batch.to_vec(), TextKind::Prose)
            .await
            .unwrap();
    }
    retriever
}

fn retrieval_benchmark(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let mut group = c.benchmark_group("retrieve");

    for chunk_count in &[100, 1_000, 10_000] {
        // Skip large benchmarks in CI
        if *chunk_count > 1_000 && std::env::var("CI").is_ok() {
            continue;
        }

        for (label, mode) in [("similarity", SearchMode::Similarity), ("diverse", SearchMode::Diverse)] {
            let retriever = Arc::new(rt.block_on(populated_retriever(*chunk_count, mode)));

            group.bench_with_input(
                BenchmarkId::new(label, format!("{chunk_count}_chunks")),
                chunk_count,
                |b, _| {
                    b.to_async(&rt).iter(|| async {
                        let retriever = retriever.clone();
                        black_box(retriever.retrieve("accuracy of the attention model").await)
                    });
                },
            );
        }
    }

    group.finish();
}

fn ingestion_benchmark(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("ingest_100_chunks", |b| {
        b.to_async(&rt)
            .iter(|| async { black_box(populated_retriever(100, SearchMode::Similarity).await) });
    });
}

criterion_group!(benches, retrieval_benchmark, ingestion_benchmark);
criterion_main!(benches);
