//! Deterministic engine with a hand-driven clock.
//!
//! Nothing plays in real time: the caller moves the clock with
//! [`OfflineEngine::advance`] or [`OfflineEngine::set_time`], and every
//! committed voice is kept so it can be inspected or rendered afterwards.

use super::{
    oscillator::Waveform,
    voice::{EnvelopeId, MasterBus, ScheduledVoice, ToneId, VoiceGraph},
};
use crate::{
    clock::{AudioEngine, Time},
    error::EngineError,
};

pub struct OfflineEngine {
    now: Time,
    graph: VoiceGraph,
    voices: Vec<ScheduledVoice>,
    master: MasterBus,
    available: bool,
}

impl OfflineEngine {
    pub fn new() -> Self {
        Self::with_waveform(Waveform::Sine)
    }

    pub fn with_waveform(waveform: Waveform) -> Self {
        Self {
            now: 0.0,
            graph: VoiceGraph::new(waveform),
            voices: Vec::new(),
            master: MasterBus::default(),
            available: true,
        }
    }

    pub fn with_master(mut self, master: MasterBus) -> Self {
        self.master = master;
        self
    }

    /// Move the clock forward by `seconds`.
    pub fn advance(&mut self, seconds: f64) {
        self.now += seconds.max(0.0);
    }

    /// Jump the clock to `time`. The clock never runs backwards.
    pub fn set_time(&mut self, time: Time) {
        self.now = self.now.max(time);
    }

    /// Simulate the host engine going away (or coming back).
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// Every voice committed so far, in commit order.
    pub fn voices(&self) -> &[ScheduledVoice] {
        &self.voices
    }

    /// Primitives that were created but never fully committed.
    pub fn pending(&self) -> usize {
        self.graph.pending()
    }

    /// End of the last committed voice, or zero.
    pub fn timeline_end(&self) -> Time {
        self.voices.iter().map(ScheduledVoice::stop).fold(0.0, f64::max)
    }

    /// Render the committed timeline from engine time zero to `until`.
    pub fn render(&self, until: Time, sample_rate: f32) -> Vec<f32> {
        let frames = (until.max(0.0) * sample_rate as f64).ceil() as usize;
        let mut out = vec![0.0f32; frames];

        for voice in &self.voices {
            voice.clone().render_add(&mut out, 0.0, sample_rate);
        }

        self.master.process(&mut out);
        out
    }

    fn flush(&mut self) {
        while let Some(voice) = self.graph.take_ready() {
            log::trace!(
                "offline commit: {:.2} Hz [{:.4}, {:.4})",
                voice.frequency(),
                voice.start(),
                voice.stop()
            );
            self.voices.push(voice);
        }
    }
}

impl Default for OfflineEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioEngine for OfflineEngine {
    type ToneSource = ToneId;
    type EnvelopeControl = EnvelopeId;

    fn current_time(&self) -> Time {
        self.now
    }

    fn check_available(&self) -> Result<(), EngineError> {
        if self.available {
            Ok(())
        } else {
            Err(EngineError::Unavailable("offline engine disabled".into()))
        }
    }

    fn create_tone_source(&mut self, frequency: f32) -> ToneId {
        self.graph.create_tone(frequency)
    }

    fn create_envelope_control(&mut self) -> EnvelopeId {
        self.graph.create_envelope()
    }

    fn set_value_at(&mut self, envelope: &EnvelopeId, value: f32, time: Time) {
        self.graph.set_value_at(*envelope, value, time);
    }

    fn linear_ramp_to(&mut self, envelope: &EnvelopeId, value: f32, time: Time) {
        self.graph.linear_ramp_to(*envelope, value, time);
    }

    fn connect(&mut self, source: &ToneId, envelope: &EnvelopeId) {
        self.graph.connect(*source, *envelope);
        self.flush();
    }

    fn connect_to_output(&mut self, envelope: &EnvelopeId) {
        self.graph.connect_to_output(*envelope);
        self.flush();
    }

    fn schedule_on(&mut self, source: &ToneId, time: Time) {
        self.graph.schedule_on(*source, time);
        self.flush();
    }

    fn schedule_off(&mut self, source: &ToneId, time: Time) {
        self.graph.schedule_off(*source, time);
        self.flush();
    }
}
