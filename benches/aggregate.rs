use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tokio::runtime::Runtime;

use verity::{Aggregator, Article, Fingerprint, Signal, SignalKind, VerityEngine};

fn signals(per_kind: usize) -> Vec<Signal> {
    let mut out = Vec::with_capacity(per_kind * SignalKind::ALL.len());
    for i in 0..per_kind {
        #[allow(clippy::cast_precision_loss)]
        let jitter = i as f64 / (per_kind as f64 * 10.0);
        for (k, kind) in SignalKind::ALL.into_iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let score = (0.2 + 0.2 * k as f64 + jitter).min(1.0);
            out.push(Signal::present(kind, score, 0.5 + jitter, "bench"));
        }
    }
    out
}

fn bench_aggregate(c: &mut Criterion) {
    let aggregator = Aggregator::default();
    let fingerprint = Fingerprint::compute("bench article", "example.com/bench");

    let mut group = c.benchmark_group("aggregate");
    for per_kind in [1usize, 4, 32] {
        let input = signals(per_kind);
        group.throughput(Throughput::Elements(input.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(input.len()), &input, |b, input| {
            b.iter(|| aggregator.aggregate_for(black_box(fingerprint), black_box(input)).unwrap());
        });
    }
    group.finish();
}

fn bench_analyze(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let engine = VerityEngine::with_defaults().unwrap();
    let article = Article::builder()
        .title("NASA Warns of November Blackout Due to Planetary Alignment")
        .text(
            "NASA confirms that a planetary alignment of Venus and Jupiter in November will cause \
             a nationwide blackout lasting three days. SHOCKING details inside!",
        )
        .source_url("fakenewsmedia.net/nasa-blackout-warning")
        .build()
        .unwrap();

    c.bench_function("analyze/cold", |b| {
        b.iter(|| {
            engine.cache().clear();
            rt.block_on(engine.analyze(black_box(&article))).unwrap()
        });
    });

    rt.block_on(engine.analyze(&article)).unwrap();
    c.bench_function("analyze/cached", |b| {
        b.iter(|| rt.block_on(engine.analyze(black_box(&article))).unwrap());
    });
}

criterion_group!(benches, bench_aggregate, bench_analyze);
criterion_main!(benches);
