use criterion::{criterion_group, criterion_main, Criterion};
use docsearch_core::{Document, IndexBuilder, QueryEngine, ScoringConfig};

const WORDS: &[&str] = &[
    "napari", "tracking", "particle", "detector", "gaussian", "linking", "filter", "pipeline",
    "feature", "export", "scale", "reader", "spot", "frame", "trajectory", "plugin",
];

fn corpus(n: usize) -> Vec<Document> {
    (0..n)
        .map(|i| {
            let title = format!("{} {}", WORDS[i % WORDS.len()], WORDS[(i / 3) % WORDS.len()]);
            let body: Vec<&str> = (0..40).map(|j| WORDS[(i * 7 + j * 3) % WORDS.len()]).collect();
            Document::new(format!("doc{i}"), format!("/doc{i}.html"), title, body.join(" "))
        })
        .collect()
}

fn bench_search(c: &mut Criterion) {
    let index = IndexBuilder::default().build(corpus(2_000)).expect("corpus builds");
    let exact = QueryEngine::default();
    let prefix = QueryEngine::new(ScoringConfig { prefix_last_term: true, ..Default::default() });
    c.bench_function("search_two_terms", |b| b.iter(|| exact.search(&index, "napari tracking")));
    c.bench_function("search_prefix", |b| b.iter(|| prefix.search(&index, "particle tra")));
}

fn bench_build(c: &mut Criterion) {
    let docs = corpus(500);
    let builder = IndexBuilder::default();
    c.bench_function("build_500_docs", |b| b.iter(|| builder.build(&docs)));
}

criterion_group!(benches, bench_search, bench_build);
criterion_main!(benches);
