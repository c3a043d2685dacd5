use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use modwt::{
    batch::{BatchKernel, Scalar, SoaSlab},
    fft, wavelet, BatchModwt, BoundaryMode, MultiLevelModwt, StreamingModwt,
};

// ======================================================================
// UTIL

fn generate_signal(n: usize, seed: u8) -> Vec<f64> {
    let mut rng = ChaCha8Rng::from_seed([seed; 32]);
    (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect()
}

fn generate_batch(batch: usize, n: usize, seed: u8) -> Vec<Vec<f64>> {
    (0..batch)
        .map(|b| generate_signal(n, seed.wrapping_add(b as u8)))
        .collect()
}

// ======================================================================
// BENCHMARKS - SEQUENTIAL TRANSFORM

fn benchmarks_transform(c: &mut Criterion) {
    let mut group = c.benchmark_group("transform");

    for n in [1024usize, 4096, 16384] {
        let signal = generate_signal(n, 0);
        let transform =
            MultiLevelModwt::new(wavelet::daubechies4(), BoundaryMode::Periodic).unwrap();
        let levels = transform.maximum_levels(n).min(6);
        let decomposition = transform.decompose(&signal, levels).unwrap();

        group.throughput(Throughput::Elements(n as u64));

        group.bench_with_input(BenchmarkId::new("decompose", n), &signal, |b, signal| {
            b.iter(|| transform.decompose(black_box(signal), levels).unwrap());
        });

        group.bench_with_input(
            BenchmarkId::new("reconstruct", n),
            &decomposition,
            |b, decomposition| {
                b.iter(|| transform.reconstruct(black_box(decomposition)).unwrap());
            },
        );
    }

    group.finish();
}

// ======================================================================
// BENCHMARKS - BATCH

fn benchmarks_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");

    let n = 4096;
    for batch in [4usize, 16, 64] {
        let signals = generate_batch(batch, n, 1);
        let transform = BatchModwt::new(wavelet::daubechies4()).unwrap();

        group.throughput(Throughput::Elements((batch * n) as u64));
        group.bench_with_input(
            BenchmarkId::new("multi_level", batch),
            &signals,
            |b, signals| {
                b.iter(|| transform.multi_level(black_box(signals), 4).unwrap());
            },
        );
    }

    // Kernel-only comparison against the scalar reference.
    let signals = generate_batch(16, n, 2);
    let input = SoaSlab::from_rows(&signals).unwrap();
    let taps = [0.23, 0.71, 0.63, -0.03];
    let mut out = SoaSlab::zeroed(n, 16);

    group.throughput(Throughput::Elements((16 * n) as u64));
    group.bench_function("kernel/scalar", |b| {
        b.iter(|| Scalar::new().conv_periodic(black_box(&input), &taps, 8, &mut out));
    });

    #[cfg(all(feature = "avx2", any(target_arch = "x86", target_arch = "x86_64")))]
    {
        use modwt::batch::Avx2;
        if Avx2::is_supported() {
            group.bench_function("kernel/avx2", |b| {
                b.iter(|| Avx2::new().conv_periodic(black_box(&input), &taps, 8, &mut out));
            });
        }
    }

    group.finish();
}

// ======================================================================
// BENCHMARKS - STREAMING

fn benchmarks_streaming(c: &mut Criterion) {
    let mut group = c.benchmark_group("streaming");

    let batch = 8;
    let block_len = 512;
    let blocks: Vec<Vec<Vec<f64>>> = (0..8)
        .map(|i| generate_batch(batch, block_len, i as u8))
        .collect();

    group.throughput(Throughput::Elements((8 * batch * block_len) as u64));
    group.bench_function("multi_level_blocks", |b| {
        b.iter(|| {
            let mut streaming =
                StreamingModwt::new(wavelet::daubechies4(), BoundaryMode::Symmetric, 3).unwrap();
            for block in &blocks {
                black_box(streaming.process_multi_level(block).unwrap());
            }
            streaming.flush_multi_level(streaming.min_flush_tail_length())
        });
    });

    group.finish();
}

// ======================================================================
// BENCHMARKS - FFT

fn benchmarks_fft(c: &mut Criterion) {
    let mut group = c.benchmark_group("fft");

    for n in [1024usize, 8192] {
        let signal = generate_signal(n, 3);

        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("rfft", n), &signal, |b, signal| {
            b.iter(|| fft::rfft(black_box(signal)).unwrap());
        });

        let mut re = signal.clone();
        let mut im = vec![0.0; n];
        group.bench_with_input(BenchmarkId::new("fft_split", n), &n, |b, _| {
            b.iter(|| {
                fft::fft(black_box(&mut re), black_box(&mut im)).unwrap();
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmarks_transform,
    benchmarks_batch,
    benchmarks_streaming,
    benchmarks_fft
);
criterion_main!(benches);
