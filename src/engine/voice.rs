//! Voice assembly and rendering shared by every concrete engine.
//!
//! Engines hand out lightweight ids for tone sources and envelope controls.
//! [`VoiceGraph`] collects the calls made against those ids and, once a tone
//! is wired through an envelope into the output and has both on and off
//! times, emits a self-contained [`ScheduledVoice`]. Partially wired
//! primitives never make it to the renderer.

use super::oscillator::{Oscillator, Waveform};
use crate::{clock::Time, envelope::AutomationLane};

/// Handle for a tone source created by an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ToneId(u32);

/// Handle for an envelope control created by an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvelopeId(u32);

/// One committed note: oscillator, amplitude automation and its on/off window.
#[derive(Debug, Clone)]
pub struct ScheduledVoice {
    oscillator: Oscillator,
    envelope: AutomationLane,
    start: Time,
    stop: Time,
}

impl ScheduledVoice {
    pub fn frequency(&self) -> f32 {
        self.oscillator.frequency()
    }

    pub fn start(&self) -> Time {
        self.start
    }

    pub fn stop(&self) -> Time {
        self.stop
    }

    pub fn duration(&self) -> f64 {
        self.stop - self.start
    }

    pub fn envelope(&self) -> &AutomationLane {
        &self.envelope
    }

    /// True once nothing more will ever be rendered from `time` on.
    pub fn is_finished(&self, time: Time) -> bool {
        time >= self.stop
    }

    /// Add this voice into `out`, whose first frame sits at `block_start`.
    pub fn render_add(&mut self, out: &mut [f32], block_start: Time, sample_rate: f32) {
        let period = 1.0 / sample_rate as f64;

        for (i, sample) in out.iter_mut().enumerate() {
            let t = block_start + i as f64 * period;
            if t < self.start {
                continue;
            }
            if t >= self.stop {
                break;
            }
            let gain = self.envelope.value_at(t);
            *sample += self.oscillator.next_sample(sample_rate) * gain;
        }
    }
}

#[derive(Debug)]
struct StagedTone {
    id: ToneId,
    frequency: f32,
    envelope: Option<EnvelopeId>,
    start: Option<Time>,
    stop: Option<Time>,
}

#[derive(Debug)]
struct StagedEnvelope {
    id: EnvelopeId,
    lane: AutomationLane,
    routed_to_output: bool,
}

/// Control-side staging area that turns engine calls into finished voices.
#[derive(Debug)]
pub struct VoiceGraph {
    waveform: Waveform,
    next_id: u32,
    tones: Vec<StagedTone>,
    envelopes: Vec<StagedEnvelope>,
}

impl VoiceGraph {
    pub fn new(waveform: Waveform) -> Self {
        Self {
            waveform,
            next_id: 0,
            tones: Vec::new(),
            envelopes: Vec::new(),
        }
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    pub fn create_tone(&mut self, frequency: f32) -> ToneId {
        let id = ToneId(self.next_id());
        self.tones.push(StagedTone {
            id,
            frequency,
            envelope: None,
            start: None,
            stop: None,
        });
        id
    }

    pub fn create_envelope(&mut self) -> EnvelopeId {
        let id = EnvelopeId(self.next_id());
        self.envelopes.push(StagedEnvelope {
            id,
            lane: AutomationLane::new(0.0),
            routed_to_output: false,
        });
        id
    }

    fn tone_mut(&mut self, id: ToneId) -> Option<&mut StagedTone> {
        let tone = self.tones.iter_mut().find(|t| t.id == id);
        if tone.is_none() {
            log::warn!("ignoring call on unknown or already committed tone {id:?}");
        }
        tone
    }

    fn envelope_mut(&mut self, id: EnvelopeId) -> Option<&mut StagedEnvelope> {
        let envelope = self.envelopes.iter_mut().find(|e| e.id == id);
        if envelope.is_none() {
            log::warn!("ignoring call on unknown or already committed envelope {id:?}");
        }
        envelope
    }

    pub fn set_value_at(&mut self, id: EnvelopeId, value: f32, time: Time) {
        if let Some(envelope) = self.envelope_mut(id) {
            envelope.lane.set_value_at(value, time);
        }
    }

    pub fn linear_ramp_to(&mut self, id: EnvelopeId, value: f32, time: Time) {
        if let Some(envelope) = self.envelope_mut(id) {
            envelope.lane.linear_ramp_to(value, time);
        }
    }

    pub fn connect(&mut self, tone: ToneId, envelope: EnvelopeId) {
        if let Some(tone) = self.tone_mut(tone) {
            tone.envelope = Some(envelope);
        }
    }

    pub fn connect_to_output(&mut self, id: EnvelopeId) {
        if let Some(envelope) = self.envelope_mut(id) {
            envelope.routed_to_output = true;
        }
    }

    pub fn schedule_on(&mut self, id: ToneId, time: Time) {
        if let Some(tone) = self.tone_mut(id) {
            tone.start = Some(time);
        }
    }

    pub fn schedule_off(&mut self, id: ToneId, time: Time) {
        if let Some(tone) = self.tone_mut(id) {
            tone.stop = Some(time);
        }
    }

    /// Remove and return the first fully wired voice, if any.
    pub fn take_ready(&mut self) -> Option<ScheduledVoice> {
        let (tone_index, envelope_index) = self.tones.iter().enumerate().find_map(|(ti, tone)| {
            let env_id = tone.envelope?;
            tone.start?;
            tone.stop?;
            let ei = self
                .envelopes
                .iter()
                .position(|e| e.id == env_id && e.routed_to_output)?;
            Some((ti, ei))
        })?;

        let tone = self.tones.swap_remove(tone_index);
        let envelope = self.envelopes.swap_remove(envelope_index);
        let (start, stop) = (tone.start?, tone.stop?);

        Some(ScheduledVoice {
            oscillator: Oscillator::new(self.waveform, tone.frequency),
            envelope: envelope.lane,
            start,
            stop,
        })
    }

    /// Number of primitives created but not yet committed.
    pub fn pending(&self) -> usize {
        self.tones.len() + self.envelopes.len()
    }
}

/// Static peak compressor on the summed voices.
///
/// Samples above the threshold have their excess divided by `ratio`. There
/// is no envelope follower, so it acts instantly and needs no state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Compressor {
    pub threshold_db: f32,
    pub ratio: f32,
}

impl Default for Compressor {
    /// Same threshold and ratio as a browser `DynamicsCompressorNode`.
    fn default() -> Self {
        Self {
            threshold_db: -24.0,
            ratio: 12.0,
        }
    }
}

impl Compressor {
    #[inline]
    pub fn process_sample(&self, sample: f32) -> f32 {
        let threshold = 10.0_f32.powf(self.threshold_db / 20.0);
        let level = sample.abs();
        if level > threshold {
            (threshold + (level - threshold) / self.ratio.max(1.0)) * sample.signum()
        } else {
            sample
        }
    }
}

/// The shared output sink every voice is mixed into: compressor, then master
/// gain, then a hard limit at full scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MasterBus {
    pub gain: f32,
    pub compressor: Option<Compressor>,
}

impl Default for MasterBus {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl MasterBus {
    pub fn new(gain: f32) -> Self {
        Self {
            gain: gain.max(0.0),
            compressor: Some(Compressor::default()),
        }
    }

    pub fn with_compressor(mut self, compressor: Option<Compressor>) -> Self {
        self.compressor = compressor;
        self
    }

    pub fn process(&self, block: &mut [f32]) {
        if let Some(compressor) = &self.compressor {
            for s in block.iter_mut() {
                *s = compressor.process_sample(*s);
            }
        }
        for s in block.iter_mut() {
            *s = (*s * self.gain).clamp(-1.0, 1.0);
        }
    }
}
