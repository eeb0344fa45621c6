//! Benchmarks for rendering committed voices.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use step_sequencer::{
    engine::{MasterBus, OfflineEngine, RealtimeEngine, Waveform},
    envelope::EnvelopeScheduler,
};

use crate::BLOCK_SIZES;

const SAMPLE_RATE: f32 = 48_000.0;

pub fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduling/render");
    let scheduler = EnvelopeScheduler::default();

    for &size in BLOCK_SIZES {
        // One sustained voice covering every rendered block
        group.bench_with_input(BenchmarkId::new("realtime_one_voice", size), &size, |b, &size| {
            let (mut engine, mut renderer) =
                RealtimeEngine::new(SAMPLE_RATE, Waveform::Sawtooth, MasterBus::default());
            scheduler.schedule_step(&mut engine, 220.0, 3_600.0, 0.0);
            let mut block = vec![0.0f32; size];

            b.iter(|| {
                renderer.render(black_box(&mut block));
            })
        });

        // Overlapping voices, as with a long release tail
        group.bench_with_input(BenchmarkId::new("realtime_eight_voices", size), &size, |b, &size| {
            let (mut engine, mut renderer) =
                RealtimeEngine::new(SAMPLE_RATE, Waveform::Sine, MasterBus::default());
            for i in 0..8 {
                scheduler.schedule_step(&mut engine, 110.0 * (i + 1) as f32, 3_600.0, 0.0);
            }
            let mut block = vec![0.0f32; size];

            b.iter(|| {
                renderer.render(black_box(&mut block));
            })
        });
    }

    // Offline bounce of a one-second, four-note timeline
    let mut engine = OfflineEngine::new();
    for (i, freq) in [440.0, 660.0, 440.0, 400.0].into_iter().enumerate() {
        scheduler.schedule_step(&mut engine, freq, 0.25, i as f64 * 0.25);
    }
    group.bench_function("offline_bounce_1s", |b| {
        b.iter(|| engine.render(black_box(1.0), SAMPLE_RATE))
    });

    group.finish();
}
