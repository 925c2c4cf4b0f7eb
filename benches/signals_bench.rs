use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use signals::{
    expand_seed, CompressionConfig, CompressionEstimator, MinHashConfig, MinHasher,
    RepetitionComputer, RepetitionConfig,
};

fn synthetic_text(words: usize) -> String {
    (0..words)
        .map(|i| format!("word{}", i % 97))
        .collect::<Vec<_>>()
        .join(" ")
}

fn bench_repetition(c: &mut Criterion) {
    let comp = RepetitionComputer::new(&RepetitionConfig::default()).expect("repetition config");
    let mut group = c.benchmark_group("repetition");

    for words in [64, 512, 4096].iter() {
        let text = synthetic_text(*words);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_function(format!("words_{words}"), |b| {
            b.iter(|| comp.compute(black_box(&text)))
        });
    }

    group.finish();
}

fn bench_minhash(c: &mut Criterion) {
    let cfg = MinHashConfig::new()
        .with_buckets(14)
        .with_bsize(8)
        .with_window(5)
        .with_seed(expand_seed(1, 14 * 8));
    let sequential = MinHasher::new(&cfg.clone().with_parallel(false)).expect("minhash config");
    let parallel = MinHasher::new(&cfg.with_parallel(true)).expect("minhash config");
    let mut group = c.benchmark_group("minhash");

    for words in [64, 512, 4096].iter() {
        let text = synthetic_text(*words);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_function(format!("sequential_{words}"), |b| {
            b.iter(|| sequential.signature(black_box(&text)))
        });
        group.bench_function(format!("parallel_{words}"), |b| {
            b.iter(|| parallel.signature(black_box(&text)))
        });
    }

    group.finish();
}

fn bench_compression(c: &mut Criterion) {
    let est = CompressionEstimator::new(&CompressionConfig::default()).expect("compression config");
    let mut group = c.benchmark_group("compression");

    for words in [64, 512, 4096].iter() {
        let text = synthetic_text(*words);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_function(format!("words_{words}"), |b| {
            b.iter(|| est.compressed_size(black_box(&text)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_repetition, bench_minhash, bench_compression);
criterion_main!(benches);
