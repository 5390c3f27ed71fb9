//! Channel synthesis and eye analysis benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lib_dsp::{ChannelSynthesizer, EyeDiagramAnalyzer};
use num_complex::Complex64;

/// Single-pole low-pass response, 10 MHz to 20 GHz in 50 MHz steps.
fn lowpass(f_3db: f64) -> (Vec<f64>, Vec<Complex64>) {
    let freqs: Vec<f64> = (0..401).map(|i| 10e6 + i as f64 * 50e6).collect();
    let response = freqs
        .iter()
        .map(|&f| Complex64::new(1.0, 0.0) / Complex64::new(1.0, f / f_3db))
        .collect();
    (freqs, response)
}

fn bench_synthesis(c: &mut Criterion) {
    let mut group = c.benchmark_group("channel_synthesis");
    let (freqs, response) = lowpass(5e9);

    for samples_per_bit in [8usize, 16, 32].iter() {
        let synth = ChannelSynthesizer::new(*samples_per_bit as f64 * 10e9, 10e9);
        group.bench_with_input(
            BenchmarkId::new("prbs7_1000_bits", samples_per_bit),
            &synth,
            |b, s| {
                b.iter(|| s.synthesize(black_box(&freqs), black_box(&response)));
            },
        );
    }

    group.finish();
}

fn bench_eye(c: &mut Criterion) {
    let mut group = c.benchmark_group("eye_analysis");
    let (freqs, response) = lowpass(5e9);

    for samples_per_bit in [8usize, 32].iter() {
        let sample_rate = *samples_per_bit as f64 * 10e9;
        let Ok(signal) =
            ChannelSynthesizer::new(sample_rate, 10e9).synthesize(&freqs, &response)
        else {
            continue;
        };
        let analyzer = EyeDiagramAnalyzer::new(sample_rate, 10e9);
        group.bench_with_input(
            BenchmarkId::new("analyze", samples_per_bit),
            &signal,
            |b, s| {
                b.iter(|| analyzer.analyze(black_box(s)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_synthesis, bench_eye);
criterion_main!(benches);
