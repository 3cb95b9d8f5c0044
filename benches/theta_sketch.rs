use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use theta_sketch::codec::family::Family;
use theta_sketch::theta::{Union, UpdateSketch};

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("update");
    let mut rng = StdRng::seed_from_u64(42);
    let numbers: Vec<u64> = (0..100_000).map(|_| rng.gen()).collect();
    group.throughput(Throughput::Elements(numbers.len() as u64));

    for lg_k in [10u8, 12, 14] {
        group.bench_with_input(
            BenchmarkId::new("quick_select", lg_k),
            &lg_k,
            |b, &lg_k| {
                b.iter(|| {
                    let mut sketch = UpdateSketch::builder().lg_k(lg_k).build();
                    for &num in &numbers {
                        sketch.update_u64(black_box(num));
                    }
                    black_box(sketch.estimate())
                });
            },
        );
        group.bench_with_input(BenchmarkId::new("alpha", lg_k), &lg_k, |b, &lg_k| {
            b.iter(|| {
                let mut sketch = UpdateSketch::builder()
                    .family(Family::ALPHA)
                    .lg_k(lg_k)
                    .build();
                for &num in &numbers {
                    sketch.update_u64(black_box(num));
                }
                black_box(sketch.estimate())
            });
        });
    }
    group.finish();
}

fn bench_estimate(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimate");
    let mut rng = StdRng::seed_from_u64(42);

    for &n in &[1_000u64, 100_000] {
        let mut sketch = UpdateSketch::builder().lg_k(12).build();
        for _ in 0..n {
            sketch.update_u64(rng.gen());
        }
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| black_box(sketch.estimate()));
        });
    }
    group.finish();
}

fn bench_union(c: &mut Criterion) {
    let mut group = c.benchmark_group("union");
    let mut rng = StdRng::seed_from_u64(42);

    let compacts: Vec<_> = (0..8)
        .map(|_| {
            let mut sketch = UpdateSketch::builder().lg_k(12).build();
            for _ in 0..50_000 {
                sketch.update_u64(rng.gen());
            }
            sketch.compact(false)
        })
        .collect();

    group.bench_function("eight_way", |b| {
        b.iter(|| {
            let mut union = Union::builder().lg_k(12).build();
            for compact in &compacts {
                union.update(black_box(compact)).unwrap();
            }
            black_box(union.result(false).estimate())
        });
    });
    group.finish();
}

fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");
    let mut rng = StdRng::seed_from_u64(42);

    let mut sketch = UpdateSketch::builder().lg_k(12).build();
    for _ in 0..100_000u64 {
        sketch.update_u64(rng.gen());
    }
    let compact = sketch.compact(true);
    let bytes = compact.serialize();

    group.bench_function("compact", |b| {
        b.iter(|| black_box(compact.serialize()));
    });
    group.bench_function("deserialize_compact", |b| {
        use theta_sketch::theta::CompactThetaSketch;
        b.iter(|| black_box(CompactThetaSketch::deserialize(&bytes).unwrap()));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_update,
    bench_estimate,
    bench_union,
    bench_serialize
);
criterion_main!(benches);
