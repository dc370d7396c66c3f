use asrsweep::vad::{ActivityModel, ActivityTrace, EnergyActivityModel, Hysteresis, merge_chunks};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

/// Deterministic activity trace alternating speech bursts and pauses.
///
/// `minutes` of audio at 50 frames per second (20 ms frames).
fn synthetic_trace(minutes: usize) -> ActivityTrace {
    let frames = minutes * 60 * 50;
    let mut state = 0x2545_f491_u32;
    let scores = (0..frames)
        .map(|i| {
            // xorshift noise around a slow on/off pattern
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let noise = (state % 1000) as f32 / 5000.0;
            let speaking = (i / 150) % 3 != 0;
            if speaking { 0.6 + noise } else { 0.1 + noise }
        })
        .collect();
    ActivityTrace::new(50.0, scores).unwrap_or_else(|e| panic!("invalid trace: {}", e))
}

/// Square-wave audio: one second loud, one second quiet.
fn synthetic_audio(seconds: usize) -> Vec<i16> {
    (0..seconds * 16000)
        .map(|i| if (i / 16000) % 2 == 0 { 6000 } else { 0 })
        .collect()
}

fn bench_binarize(c: &mut Criterion) {
    let hysteresis = Hysteresis::new(0.5, 0.363).unwrap_or_else(|e| panic!("{}", e));
    let mut group = c.benchmark_group("binarize");

    for minutes in [1, 10, 60] {
        let trace = synthetic_trace(minutes);
        group.bench_with_input(BenchmarkId::from_parameter(minutes), &trace, |b, trace| {
            b.iter(|| hysteresis.binarize(black_box(trace)))
        });
    }
    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let hysteresis = Hysteresis::new(0.5, 0.363).unwrap_or_else(|e| panic!("{}", e));
    let intervals = hysteresis.binarize(&synthetic_trace(60));
    let mut group = c.benchmark_group("merge_chunks");

    for max_duration in [10.0, 30.0] {
        group.bench_with_input(
            BenchmarkId::from_parameter(max_duration),
            &max_duration,
            |b, &max_duration| b.iter(|| merge_chunks(black_box(&intervals), max_duration)),
        );
    }
    group.finish();
}

fn bench_energy_activity(c: &mut Criterion) {
    let model = EnergyActivityModel::default();
    let audio = synthetic_audio(60);

    c.bench_function("energy_activity_60s", |b| {
        b.iter(|| model.activity(black_box(&audio), 16000))
    });
}

criterion_group!(benches, bench_binarize, bench_merge, bench_energy_activity);
criterion_main!(benches);
