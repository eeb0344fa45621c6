//! Benchmarks for the lookahead scheduler and voice rendering.
//!
//! Run with: cargo bench
//!
//! The gate runs on the control thread once per poll, so it only has to be
//! cheap. Rendering runs inside the audio callback and must finish well within
//! the block deadline.
//!
//! Reference timing at 48kHz sample rate:
//!   - 64 samples  = 1.33ms deadline
//!   - 128 samples = 2.67ms deadline
//!   - 256 samples = 5.33ms deadline
//!   - 512 samples = 10.67ms deadline
//!
//! Benchmark groups:
//!   - scheduling/lookahead  Gate decision and a full tick with note commit
//!   - scheduling/render     Voice mixing through the offline and realtime engines

use criterion::{criterion_group, criterion_main};

mod scheduling;

/// Common buffer sizes used in audio applications.
pub const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512];

criterion_group!(
    benches,
    scheduling::bench_lookahead,
    scheduling::bench_render,
);
criterion_main!(benches);
