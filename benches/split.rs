//! Benchmarks for the seeded split

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use cv_prep::{split, SplitRatio, UnifiedRecord};

fn make_records(n: usize) -> Vec<UnifiedRecord> {
    (0..n)
        .map(|i| UnifiedRecord {
            file_name: format!("common_voice_te_{}.wav", i),
            original_file: format!("common_voice_te_{}.mp3", i),
            sentence_id: i.to_string(),
            text: "ఒక చిన్న వాక్యం".to_string(),
            duration_ms: 4000,
        })
        .collect()
}

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split");
    let ratio = SplitRatio::new(0.9).unwrap();

    for n in [1_000, 10_000, 100_000] {
        let records = make_records(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &records, |b, records| {
            b.iter(|| black_box(split(records, ratio, 42)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_split);
criterion_main!(benches);
