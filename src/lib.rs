pub mod clock; // Capability interface to the host audio engine
pub mod engine; // Offline and realtime engines
pub mod envelope; // Per-note amplitude shaping
pub mod error;
pub mod scheduler; // Lookahead loop and transport
pub mod sequencing; // Steps, config and cursor

pub use clock::{AudioEngine, Time};
pub use error::{EngineError, SequencerError};
pub use scheduler::{StepSequencer, Transport, TransportState};
pub use sequencing::{Pattern, SequencerConfig, SequencerState, Step};

pub const MAX_BLOCK_SIZE: usize = 2048;
