use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use concord::{aggregate_corpus, aggregate_query, AggregationConfig, DistanceMetric};

/// `rankers` top-20 lists over a 60-document universe with partial overlap.
fn query(rankers: usize, shift: usize) -> Vec<Vec<usize>> {
    (0..rankers)
        .map(|r| (0..20).map(|i| (i * 7 + r * 3 + shift) % 60).collect())
        .collect()
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate_query");

    for metric in [DistanceMetric::KendallTau, DistanceMetric::DiscountedKendallTau] {
        let config = AggregationConfig::default().with_metric(metric);
        for rankers in [8usize, 32, 128] {
            let rankings = query(rankers, 0);
            group.bench_with_input(
                BenchmarkId::new(metric.as_str(), rankers),
                &rankings,
                |b, rankings| b.iter(|| aggregate_query(black_box(rankings), &config)),
            );
        }
    }
    group.finish();
}

fn bench_corpus(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate_corpus");
    group.sample_size(20);

    let config = AggregationConfig::default().with_max_iters(5);
    for queries in [10usize, 50] {
        let corpus: Vec<Vec<Vec<usize>>> = (0..queries).map(|q| query(32, q)).collect();
        group.bench_with_input(BenchmarkId::from_parameter(queries), &corpus, |b, corpus| {
            b.iter(|| aggregate_corpus(black_box(corpus), &config))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_query, bench_corpus);
criterion_main!(benches);
