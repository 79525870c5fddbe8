//! Criterion benchmarks for tessera.
//!
//! Covers the two reverse index structures and the WQL front end:
//! - Term trie insertion and retrieval
//! - Numeric tree insertion and range retrieval
//! - WQL parsing and end-to-end queries

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use tessera::analysis::{Analyzer, StandardAnalyzer};
use tessera::index::{NumericTree, RetrieveMethod, RetrieveOptions, TermTrie};
use tessera::prelude::*;
use uuid::Uuid;

const WORDS: [&str; 16] = [
    "index", "query", "record", "field", "term", "phrase", "prefix", "fuzzy", "range",
    "trie", "tree", "balance", "culture", "parser", "lexer", "token",
];

/// Generate test texts with a pseudo-random word distribution.
fn generate_texts(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let len = 5 + (i % 20);
            (0..len)
                .map(|j| WORDS[(i * 7 + j * 13) % WORDS.len()])
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

fn bench_term_trie(c: &mut Criterion) {
    let mut group = c.benchmark_group("term_trie");
    let analyzer = StandardAnalyzer::new();
    let culture = Culture::invariant();
    let analyzed: Vec<_> = generate_texts(1000)
        .iter()
        .map(|text| (Uuid::new_v4(), analyzer.analyze(text, &culture).unwrap_or_default()))
        .collect();

    group.throughput(Throughput::Elements(analyzed.len() as u64));
    group.bench_function("add_1000_records", |b| {
        b.iter(|| {
            let mut trie = TermTrie::new();
            for (id, tokens) in &analyzed {
                trie.add(*id, tokens);
            }
            black_box(trie)
        })
    });

    let mut trie = TermTrie::new();
    for (id, tokens) in &analyzed {
        trie.add(*id, tokens);
    }
    let phrase = vec!["query".to_string(), "lexer".to_string()];

    for (name, method) in [
        ("default", RetrieveMethod::Default),
        ("phrase", RetrieveMethod::Phrase),
        ("prefix", RetrieveMethod::Prefix),
    ] {
        let options = RetrieveOptions::method(method);
        group.bench_function(format!("retrieve_{name}"), |b| {
            b.iter(|| black_box(trie.retrieve(black_box(&phrase), &options)))
        });
    }

    let fuzzy = RetrieveOptions::method(RetrieveMethod::Fuzzy).with_similarity(2.0);
    let misspelled = vec!["qeury".to_string()];
    group.bench_function("retrieve_fuzzy", |b| {
        b.iter(|| black_box(trie.retrieve(black_box(&misspelled), &fuzzy)))
    });

    group.finish();
}

fn bench_numeric_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("numeric_tree");
    let values: Vec<(Uuid, f64)> = (0..10_000)
        .map(|i| (Uuid::new_v4(), ((i * 7919) % 10_000) as f64))
        .collect();

    group.throughput(Throughput::Elements(values.len() as u64));
    group.bench_function("add_10000_values", |b| {
        b.iter(|| {
            let mut tree = NumericTree::new();
            for (id, value) in &values {
                tree.add(*id, *value);
            }
            black_box(tree)
        })
    });

    let mut tree = NumericTree::new();
    for (id, value) in &values {
        tree.add(*id, *value);
    }
    let equal = RetrieveOptions::default();
    let greater = RetrieveOptions::method(RetrieveMethod::GreaterThanOrEqual);
    group.bench_function("retrieve_equal", |b| {
        b.iter(|| black_box(tree.retrieve(black_box(4242.0), &equal)))
    });
    group.bench_function("retrieve_range", |b| {
        b.iter(|| black_box(tree.retrieve(black_box(9000.0), &greater)))
    });

    group.finish();
}

fn bench_wql(c: &mut Criterion) {
    let mut group = c.benchmark_group("wql");

    let schema = Schema::new()
        .with_field(FieldDescriptor::path("text", FieldType::Text))
        .and_then(|s| s.with_field(FieldDescriptor::path("rank", FieldType::Integer)))
        .expect("benchmark schema");
    let mut collection = Collection::new(schema).expect("benchmark collection");
    for (rank, text) in generate_texts(2000).into_iter().enumerate() {
        let doc = Document::builder()
            .add_text("text", text)
            .add_integer("rank", rank as i64)
            .build();
        collection.add(doc).expect("add record");
    }

    let wql = "(text = 'query lexer' or text like bal) and rank >= 100 \
               order by rank desc skip 10 take 20";
    group.bench_function("parse", |b| {
        b.iter(|| black_box(collection.parse(black_box(wql))))
    });

    let statement = collection.parse(wql);
    group.bench_function("apply", |b| {
        b.iter(|| black_box(collection.apply(&statement)))
    });

    let candidates: Vec<Document> = collection.store().all().into_iter().take(200).collect();
    group.bench_function("apply_to_200_candidates", |b| {
        b.iter(|| black_box(collection.apply_to(&statement, candidates.clone())))
    });

    group.finish();
}

criterion_group!(benches, bench_term_trie, bench_numeric_tree, bench_wql);

criterion_main!(benches);
