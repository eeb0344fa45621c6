use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{envelope::EnvelopeShape, error::SequencerError};

/// Timing knobs for one sequencer.
///
/// The defaults match a 100 ms host timer: notes are committed 100 ms ahead of
/// the clock and the first note is held back 100 ms after `play()`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SequencerConfig {
    /// Seconds between `play()` and sequence-relative time zero
    pub start_offset: f64,
    /// Seconds by which every committed note leads the clock reading
    pub lookahead_offset: f64,
    /// Period of the host timer that drives `tick()`
    pub poll_interval: Duration,
    /// Amplitude shape applied to every note
    pub envelope: EnvelopeShape,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            start_offset: 0.1,
            lookahead_offset: 0.1,
            poll_interval: Duration::from_millis(100),
            envelope: EnvelopeShape::default(),
        }
    }
}

impl SequencerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_offset(mut self, seconds: f64) -> Self {
        self.start_offset = seconds;
        self
    }

    pub fn with_lookahead_offset(mut self, seconds: f64) -> Self {
        self.lookahead_offset = seconds;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_envelope(mut self, envelope: EnvelopeShape) -> Self {
        self.envelope = envelope;
        self
    }

    /// Check every field; called by `play()` before any state changes.
    pub fn validate(&self) -> Result<(), SequencerError> {
        check_offset("start_offset", self.start_offset)?;
        check_offset("lookahead_offset", self.lookahead_offset)?;

        if self.poll_interval.is_zero() {
            return Err(SequencerError::InvalidPollInterval);
        }

        self.envelope.validate()?;

        // Notes stay on time only while the lead covers at least one poll period.
        if self.lookahead_offset < self.poll_interval.as_secs_f64() {
            log::warn!(
                "lookahead offset {:.3}s is shorter than the poll interval {:?}; late ticks may produce late notes",
                self.lookahead_offset,
                self.poll_interval
            );
        }

        Ok(())
    }
}

fn check_offset(name: &'static str, value: f64) -> Result<(), SequencerError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SequencerError::InvalidOffset { name, value })
    }
}
