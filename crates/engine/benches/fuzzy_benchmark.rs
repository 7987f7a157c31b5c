use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use texdit_engine::tasks::{extract, extract_keywords, ratio};

const PARAGRAPH: &str = "Artificial intelligence has revolutionized many aspects of modern life, \
    from healthcare to transportation. Machine learning algorithms can now diagnose diseases, \
    predict weather patterns, and even drive cars autonomously. However, with these advances \
    come important ethical considerations about privacy, job displacement, and algorithmic bias.";

fn bench_ratio(c: &mut Criterion) {
    c.bench_function("ratio_short", |b| {
        b.iter(|| ratio(black_box("summarise"), black_box("summarize")))
    });
    c.bench_function("ratio_paragraph", |b| {
        b.iter(|| ratio(black_box(PARAGRAPH), black_box(&PARAGRAPH[20..])))
    });
}

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract");
    for size in [10usize, 100, 1000] {
        let choices: Vec<String> = (0..size).map(|i| format!("document title {}", i)).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &choices, |b, choices| {
            b.iter(|| extract(black_box("document title 42"), choices, 10))
        });
    }
    group.finish();
}

fn bench_keywords(c: &mut Criterion) {
    let text = PARAGRAPH.repeat(20);
    c.bench_function("extract_keywords", |b| b.iter(|| extract_keywords(black_box(&text))));
}

criterion_group!(benches, bench_ratio, bench_extract, bench_keywords);
criterion_main!(benches);
