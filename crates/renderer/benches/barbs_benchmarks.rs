//! Benchmarks for wind barb geometry and quicklook encoding.
//!
//! Run with: cargo bench --package renderer --bench barbs_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use renderer::barbs::{barb_primitives, BarbTails};
use renderer::png;

/// Random winds in knots, up to 120 kt.
fn generate_winds(count: usize) -> Vec<(f64, f64)> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| (rng.gen_range(-85.0..85.0), rng.gen_range(-85.0..85.0)))
        .collect()
}

/// White canvas with colored strokes, quicklook sized.
fn generate_canvas(width: usize, height: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    let mut pixels = vec![255u8; width * height * 3];
    for _ in 0..(width * height / 50) {
        let i = rng.gen_range(0..width * height) * 3;
        let shade = rng.gen_range(0..20u8) * 12;
        pixels[i..i + 3].copy_from_slice(&[shade, 255 - shade, 0]);
    }
    pixels
}

// =============================================================================
// TAIL DECOMPOSITION BENCHMARKS
// =============================================================================

fn bench_tails(c: &mut Criterion) {
    let speeds: Vec<f64> = (0..1000).map(|i| i as f64 * 0.15).collect();

    c.bench_function("barb_tails_1000", |b| {
        b.iter(|| {
            for &s in &speeds {
                black_box(BarbTails::from_knots(s));
            }
        })
    });
}

// =============================================================================
// GLYPH GEOMETRY BENCHMARKS
// =============================================================================

fn bench_primitives(c: &mut Criterion) {
    let mut group = c.benchmark_group("barb_primitives");

    // A day of 5-minute scans, subsampled, is a few hundred barbs
    for count in [63, 500, 2000] {
        let winds = generate_winds(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &winds, |b, winds| {
            b.iter(|| {
                for &(u, v) in winds {
                    black_box(barb_primitives(u, v, 18.0));
                }
            })
        });
    }

    group.finish();
}

// =============================================================================
// PNG ENCODING BENCHMARKS
// =============================================================================

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_quicklook");

    for (width, height) in [(600, 300), (1200, 600)] {
        let pixels = generate_canvas(width, height);
        group.throughput(Throughput::Elements((width * height) as u64));
        group.bench_with_input(
            BenchmarkId::new("auto", format!("{}x{}", width, height)),
            &pixels,
            |b, pixels| b.iter(|| black_box(png::encode_rgb_auto(pixels, width, height).unwrap())),
        );
        group.bench_with_input(
            BenchmarkId::new("rgb", format!("{}x{}", width, height)),
            &pixels,
            |b, pixels| b.iter(|| black_box(png::encode_rgb(pixels, width, height).unwrap())),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_tails, bench_primitives, bench_encode);
criterion_main!(benches);
