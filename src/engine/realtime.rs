//! Lock-free engine split across the control thread and the audio thread.
//!
//! [`RealtimeEngine`] lives with the sequencer. It assembles voices and pushes
//! them through an `rtrb` queue. [`VoiceRenderer`] lives inside the audio
//! callback. It drains the queue, mixes active voices sample-accurately and
//! advances the shared frame clock that `current_time()` reads. Finished
//! voices travel back on a second queue so their memory is freed on the
//! control thread, never inside the callback.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use rtrb::{Consumer, Producer, RingBuffer};

use super::{
    oscillator::Waveform,
    voice::{EnvelopeId, MasterBus, ScheduledVoice, ToneId, VoiceGraph},
};
use crate::{
    clock::{AudioEngine, Time},
    error::EngineError,
    MAX_BLOCK_SIZE,
};

const VOICE_QUEUE_SIZE: usize = 64;
const MAX_ACTIVE_VOICES: usize = 32;
/// Room for every voice that can be queued or active at once.
const RETIRED_QUEUE_SIZE: usize = VOICE_QUEUE_SIZE + MAX_ACTIVE_VOICES;

/// State shared between both halves of the engine.
#[derive(Debug)]
struct SharedClock {
    frames: AtomicU64,
    sample_rate: f32,
    healthy: AtomicBool,
}

/// Flags the engine as failed from outside, e.g. from a stream error callback.
#[derive(Debug, Clone)]
pub struct FailureFlag(Arc<SharedClock>);

impl FailureFlag {
    pub fn fail(&self) {
        self.0.healthy.store(false, Ordering::Release);
    }
}

/// Control-thread half.
pub struct RealtimeEngine {
    shared: Arc<SharedClock>,
    graph: VoiceGraph,
    tx: Producer<ScheduledVoice>,
    retired: Consumer<ScheduledVoice>,
    dropped: u64,
}

/// Audio-thread half.
pub struct VoiceRenderer {
    shared: Arc<SharedClock>,
    rx: Consumer<ScheduledVoice>,
    retired: Producer<ScheduledVoice>,
    voices: Vec<ScheduledVoice>,
    master: MasterBus,
}

impl RealtimeEngine {
    /// Build a connected engine/renderer pair running at `sample_rate`.
    pub fn new(sample_rate: f32, waveform: Waveform, master: MasterBus) -> (Self, VoiceRenderer) {
        let shared = Arc::new(SharedClock {
            frames: AtomicU64::new(0),
            sample_rate,
            healthy: AtomicBool::new(true),
        });
        let (tx, rx) = RingBuffer::<ScheduledVoice>::new(VOICE_QUEUE_SIZE);
        let (retired_tx, retired_rx) = RingBuffer::<ScheduledVoice>::new(RETIRED_QUEUE_SIZE);

        let engine = Self {
            shared: Arc::clone(&shared),
            graph: VoiceGraph::new(waveform),
            tx,
            retired: retired_rx,
            dropped: 0,
        };
        let renderer = VoiceRenderer {
            shared,
            rx,
            retired: retired_tx,
            voices: Vec::with_capacity(MAX_ACTIVE_VOICES),
            master,
        };

        (engine, renderer)
    }

    pub fn failure_flag(&self) -> FailureFlag {
        FailureFlag(Arc::clone(&self.shared))
    }

    pub fn sample_rate(&self) -> f32 {
        self.shared.sample_rate
    }

    /// Voices lost because the queue was full.
    pub fn dropped_voices(&self) -> u64 {
        self.dropped
    }

    /// Free voices the renderer has finished with. Returns how many.
    pub fn reclaim(&mut self) -> usize {
        let mut freed = 0;
        while self.retired.pop().is_ok() {
            freed += 1;
        }
        freed
    }

    fn flush(&mut self) {
        self.reclaim();
        while let Some(voice) = self.graph.take_ready() {
            if let Err(rtrb::PushError::Full(voice)) = self.tx.push(voice) {
                self.dropped += 1;
                log::warn!(
                    "voice queue full; dropping {:.2} Hz note at {:.4}",
                    voice.frequency(),
                    voice.start()
                );
            }
        }
    }
}

impl AudioEngine for RealtimeEngine {
    type ToneSource = ToneId;
    type EnvelopeControl = EnvelopeId;

    fn current_time(&self) -> Time {
        self.shared.frames.load(Ordering::Acquire) as f64 / self.shared.sample_rate as f64
    }

    fn check_available(&self) -> Result<(), EngineError> {
        if !self.shared.healthy.load(Ordering::Acquire) {
            return Err(EngineError::Suspended);
        }
        if self.tx.is_abandoned() {
            return Err(EngineError::Unavailable("voice renderer was dropped".into()));
        }
        Ok(())
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

impl VoiceRenderer {
    pub fn sample_rate(&self) -> f32 {
        self.shared.sample_rate
    }

    /// Engine time of the next frame to be rendered.
    pub fn time(&self) -> Time {
        self.shared.frames.load(Ordering::Acquire) as f64 / self.shared.sample_rate as f64
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Render one mono block and advance the clock by its length.
    ///
    /// Blocks longer than [`MAX_BLOCK_SIZE`] are rendered in chunks.
    pub fn render(&mut self, out: &mut [f32]) {
        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            self.render_chunk(chunk);
        }
    }

    fn render_chunk(&mut self, out: &mut [f32]) {
        while self.voices.len() < MAX_ACTIVE_VOICES {
            match self.rx.pop() {
                Ok(voice) => self.voices.push(voice),
                Err(_) => break,
            }
        }

        let sample_rate = self.shared.sample_rate;
        let block_start = self.time();

        out.fill(0.0);
        for voice in &mut self.voices {
            voice.render_add(out, block_start, sample_rate);
        }
        self.master.process(out);

        self.shared
            .frames
            .fetch_add(out.len() as u64, Ordering::AcqRel);

        let block_end = self.time();
        let mut i = 0;
        while i < self.voices.len() {
            if self.voices[i].is_finished(block_end) {
                let voice = self.voices.swap_remove(i);
                // Only full if the control thread stopped reclaiming; the
                // voice is then freed here.
                let _ = self.retired.push(voice);
            } else {
                i += 1;
            }
        }
    }
}
