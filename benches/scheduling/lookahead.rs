//! Benchmarks for the lookahead gate.

use std::hint::black_box;

use criterion::Criterion;
use step_sequencer::{
    engine::OfflineEngine,
    scheduler::{decide, LookaheadLoop},
    Pattern, SequencerConfig, SequencerState,
};

pub fn bench_lookahead(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduling/lookahead");

    let config = SequencerConfig::default();
    let pattern = Pattern::default();
    let state = SequencerState::reset(0.0, config.start_offset);

    // Closed gate: the common case between notes
    group.bench_function("decide_wait", |b| {
        b.iter(|| decide(black_box(&state), &pattern, black_box(0.05), &config))
    });

    // Open gate: note request and next state are built
    group.bench_function("decide_fire", |b| {
        b.iter(|| decide(black_box(&state), &pattern, black_box(0.5), &config))
    });

    // Full commit through the engine adapter, including envelope automation
    let lookahead = LookaheadLoop::default();
    group.bench_function("tick_commit", |b| {
        b.iter_batched(
            || (OfflineEngine::new(), state),
            |(mut engine, mut state)| {
                engine.set_time(0.5);
                lookahead.tick(&mut engine, &mut state, &pattern, &config)
            },
            criterion::BatchSize::SmallInput,
        )
    });

    group.finish();
}
