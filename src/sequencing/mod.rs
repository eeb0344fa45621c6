//! Sequencer state: the step list, its timing knobs and the playback cursor.

pub mod config;
pub mod state;
pub mod step;

pub use config::SequencerConfig;
pub use state::SequencerState;
pub use step::{Pattern, Step};
