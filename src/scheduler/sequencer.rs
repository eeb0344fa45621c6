//! StepSequencer - the public configure / play / stop surface.
//!
//! The sequencer owns its engine and all timing state. It is driven by calling
//! [`StepSequencer::tick`] periodically; see [`super::poller::Transport`] for a
//! ready-made threaded driver.

use super::lookahead::LookaheadLoop;
use crate::{
    clock::AudioEngine,
    envelope::{EnvelopeScheduler, NoteRequest},
    error::SequencerError,
    sequencing::{Pattern, SequencerConfig, SequencerState, Step},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Running,
}

/// Single-voice looping step sequencer.
pub struct StepSequencer<E: AudioEngine> {
    engine: E,
    config: SequencerConfig,
    /// Outcome of the last `configure()`; an error here blocks `play()`
    pattern: Result<Pattern, SequencerError>,
    state: Option<SequencerState>,
    transport: TransportState,
    lookahead: LookaheadLoop,
    /// Notes committed since construction (for display)
    notes_committed: u64,
}

impl<E: AudioEngine> StepSequencer<E> {
    /// Create a stopped sequencer playing the default pattern.
    pub fn new(engine: E, config: SequencerConfig) -> Self {
        let lookahead = LookaheadLoop::new(EnvelopeScheduler::new(config.envelope));

        Self {
            engine,
            config,
            pattern: Ok(Pattern::default()),
            state: None,
            transport: TransportState::Stopped,
            lookahead,
            notes_committed: 0,
        }
    }

    /// Replace the step list and step length.
    ///
    /// A rejected configuration is remembered: the following `play()` fails
    /// with the same error rather than running the previous pattern. Not
    /// allowed while running.
    pub fn configure<S: Into<Step>>(
        &mut self,
        steps: impl IntoIterator<Item = S>,
        step_length: f64,
    ) -> Result<(), SequencerError> {
        if self.transport == TransportState::Running {
            return Err(SequencerError::AlreadyRunning);
        }

        self.pattern = Pattern::new(steps, step_length);

        match &self.pattern {
            Ok(pattern) => {
                log::info!(
                    "configured {} steps at {:.3}s per step",
                    pattern.len(),
                    pattern.step_length()
                );
                Ok(())
            }
            Err(err) => {
                log::warn!("rejected configuration: {err}");
                Err(err.clone())
            }
        }
    }

    /// Start (or restart) playback from the first step.
    ///
    /// On error the sequencer ends up stopped, even if it was running, and
    /// its timing state is not touched.
    pub fn play(&mut self) -> Result<(), SequencerError> {
        let steps = match self.check_ready() {
            Ok(steps) => steps,
            Err(err) => {
                if self.transport == TransportState::Running {
                    log::warn!("play failed while running, stopping: {err}");
                }
                self.transport = TransportState::Stopped;
                return Err(err);
            }
        };

        let clock_now = self.engine.current_time();
        let state = SequencerState::reset(clock_now, self.config.start_offset);

        log::info!(
            "play: {} steps, sequence starts at {:.4} (clock {:.4})",
            steps,
            state.sequence_start_time,
            clock_now
        );

        self.state = Some(state);
        self.transport = TransportState::Running;

        // The host timer's first firing is immediate.
        self.tick();
        Ok(())
    }

    /// Pattern length if `play()` may proceed.
    fn check_ready(&self) -> Result<usize, SequencerError> {
        let pattern = self.pattern.as_ref().map_err(Clone::clone)?;
        self.config.validate()?;
        self.engine.check_available()?;
        Ok(pattern.len())
    }

    /// Halt future decisions. Notes already committed keep sounding.
    pub fn stop(&mut self) {
        if self.transport == TransportState::Running {
            log::info!("stop after {} notes", self.notes_committed);
        }
        self.transport = TransportState::Stopped;
    }

    /// Periodic body of the lookahead loop. Returns true if a note was committed.
    pub fn tick(&mut self) -> bool {
        self.tick_note().is_some()
    }

    /// Like [`tick`](Self::tick) but returns the committed note.
    pub fn tick_note(&mut self) -> Option<NoteRequest> {
        if self.transport != TransportState::Running {
            return None;
        }

        let (Some(state), Ok(pattern)) = (self.state.as_mut(), self.pattern.as_ref()) else {
            return None;
        };

        let note = self
            .lookahead
            .tick(&mut self.engine, state, pattern, &self.config)?;
        self.notes_committed += 1;
        Some(note)
    }

    pub fn is_running(&self) -> bool {
        self.transport == TransportState::Running
    }

    pub fn transport(&self) -> TransportState {
        self.transport
    }

    /// Timing state of the current or most recent run.
    pub fn state(&self) -> Option<&SequencerState> {
        self.state.as_ref()
    }

    pub fn pattern(&self) -> Result<&Pattern, &SequencerError> {
        self.pattern.as_ref()
    }

    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    pub fn notes_committed(&self) -> u64 {
        self.notes_committed
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{engine::offline::OfflineEngine, error::EngineError};

    fn sequencer() -> StepSequencer<OfflineEngine> {
        let config = SequencerConfig::new()
            .with_start_offset(0.125)
            .with_lookahead_offset(0.125);
        StepSequencer::new(OfflineEngine::new(), config)
    }

    #[test]
    fn starts_stopped_with_default_pattern() {
        let seq = sequencer();
        assert_eq!(seq.transport(), TransportState::Stopped);
        assert_eq!(seq.pattern().unwrap(), &Pattern::default());
        assert!(seq.state().is_none());
    }

    #[test]
    fn tick_while_stopped_does_nothing() {
        let mut seq = sequencer();
        seq.engine_mut().advance(5.0);
        assert!(!seq.tick());
        assert!(seq.engine().voices().is_empty());
    }

    #[test]
    fn configure_is_refused_while_running() {
        let mut seq = sequencer();
        seq.play().unwrap();

        assert_eq!(
            seq.configure([220.0], 0.5),
            Err(SequencerError::AlreadyRunning)
        );
        assert_eq!(seq.pattern().unwrap(), &Pattern::default());
    }

    #[test]
    fn failed_configure_blocks_next_play() {
        let mut seq = sequencer();
        assert!(seq.configure([440.0], -1.0).is_err());

        assert_eq!(
            seq.play(),
            Err(SequencerError::InvalidStepLength(-1.0))
        );
        assert!(!seq.is_running());
        assert!(seq.state().is_none());
    }

    #[test]
    fn play_restarts_from_first_step() {
        let mut seq = sequencer();
        seq.configure([220.0, 330.0], 0.25).unwrap();
        seq.play().unwrap();

        seq.engine_mut().advance(0.25);
        assert!(seq.tick());
        assert_eq!(seq.state().unwrap().current_step_index, 1);

        seq.engine_mut().advance(1.0);
        seq.play().unwrap();
        let state = seq.state().unwrap();
        assert_eq!(state.current_step_index, 0);
        assert_eq!(state.previous_note_end_time, 0.0);
        assert_eq!(state.sequence_start_time, 1.375);
    }

    #[test]
    fn failed_replay_stops_a_running_sequencer() {
        let mut seq = sequencer();
        seq.play().unwrap();
        seq.engine_mut().set_time(0.25);
        assert!(seq.tick());
        let before = *seq.state().unwrap();

        seq.engine_mut().set_available(false);
        assert!(matches!(
            seq.play(),
            Err(SequencerError::Engine(EngineError::Unavailable(_)))
        ));
        assert_eq!(seq.transport(), TransportState::Stopped);
        assert_eq!(seq.state(), Some(&before));

        seq.engine_mut().set_time(10.0);
        assert!(!seq.tick());
        assert_eq!(seq.engine().voices().len(), 1);
    }

    #[test]
    fn stop_keeps_state_inspectable() {
        let mut seq = sequencer();
        seq.play().unwrap();
        seq.stop();

        assert_eq!(seq.transport(), TransportState::Stopped);
        assert!(seq.state().is_some());
    }
}
