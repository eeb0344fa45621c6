//! Benchmarks for the sequencing hot paths.

mod lookahead;
mod render;

pub use lookahead::bench_lookahead;
pub use render::bench_render;
