//! Concrete [`AudioEngine`](crate::clock::AudioEngine) implementations.
//!
//! The sequencer core only needs the trait; these engines exist so it can be
//! exercised deterministically ([`offline`]) and heard live ([`realtime`]).

/// Hand-driven clock that records and renders committed voices.
pub mod offline;
/// Phase-accumulating oscillators.
pub mod oscillator;
/// Lock-free engine for use inside an audio callback.
#[cfg(feature = "rtrb")]
pub mod realtime;
/// Voice staging, rendering and the shared output bus.
pub mod voice;

pub use offline::OfflineEngine;
pub use oscillator::{Oscillator, Waveform};
#[cfg(feature = "rtrb")]
pub use realtime::{FailureFlag, RealtimeEngine, VoiceRenderer};
pub use voice::{Compressor, EnvelopeId, MasterBus, ScheduledVoice, ToneId, VoiceGraph};
