//! Capability interface between the sequencer and a host audio engine.
//!
//! The sequencer never builds audio itself. It reads the engine's clock and
//! asks it to create, wire and time-stamp primitives. Everything is expressed in
//! absolute engine time (seconds since the engine's own origin).

use crate::error::EngineError;

/// Seconds on the engine clock.
pub type Time = f64;

/// A host audio engine as seen by the sequencer.
///
/// Handles are opaque to the sequencer: it only passes them back into the
/// engine. Every call is a fire-and-forget scheduling request and must not
/// block.
pub trait AudioEngine {
    /// A periodic-waveform generator for one note.
    type ToneSource;
    /// A time-automatable amplitude control for one note.
    type EnvelopeControl;

    /// Monotonic, high-resolution engine time.
    fn current_time(&self) -> Time;

    /// Reports whether the engine can accept work right now.
    fn check_available(&self) -> Result<(), EngineError> {
        Ok(())
    }

    fn create_tone_source(&mut self, frequency: f32) -> Self::ToneSource;

    fn create_envelope_control(&mut self) -> Self::EnvelopeControl;

    /// Jump the envelope to `value` at `time`.
    fn set_value_at(&mut self, envelope: &Self::EnvelopeControl, value: f32, time: Time);

    /// Ramp linearly from the previous automation point to `value`, arriving at `time`.
    fn linear_ramp_to(&mut self, envelope: &Self::EnvelopeControl, value: f32, time: Time);

    /// Feed the tone's output through the envelope.
    fn connect(&mut self, source: &Self::ToneSource, envelope: &Self::EnvelopeControl);

    /// Route the envelope into the engine's shared output sink.
    fn connect_to_output(&mut self, envelope: &Self::EnvelopeControl);

    fn schedule_on(&mut self, source: &Self::ToneSource, time: Time);

    fn schedule_off(&mut self, source: &Self::ToneSource, time: Time);
}
