//! Per-note amplitude envelopes.
//!
//! [`EnvelopeShape`] turns a note's start time and duration into five absolute
//! breakpoints, [`EnvelopeScheduler`] programs them onto a fresh voice, and
//! [`AutomationLane`] evaluates the resulting automation at render time.

/// Time-stamped parameter automation (set / linear ramp).
pub mod automation;
/// Commits one step as a voice on an [`crate::clock::AudioEngine`].
pub mod scheduler;

pub use automation::{AutomationEvent, AutomationLane, Ramp};
pub use scheduler::{EnvelopeScheduler, NoteRequest};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{clock::Time, error::SequencerError};

/*
Step Envelope
=============

Every note gets the same four-segment shape, stretched to the note's duration.
Segment lengths are fractions of the duration, so a 0.1 s blip and a 2.5 s
drone share one profile.

  Level
    1.0 ┐    ╱╲
    0.8 │   ╱  ╲________
   0.75 │  ╱            ‾‾‾‾╲
        │ ╱                  ╲
    0.0 └╱────────────────────╲──→ Time
        |attack|decay| sustain |release|
          15%    10%     50%      25%

Breakpoints (absolute time, target level):

  0  start                               0.0   (set)
  1  start + 0.15 d                      1.0   (linear ramp)
  2  start + 0.25 d                      0.8   (linear ramp)
  3  start + 0.75 d                      0.75  (linear ramp)
  4  start + d                           0.0   (linear ramp)

The final breakpoint is computed as `start + duration` directly rather than
as a sum of fractions, so it lands exactly on the note-off instant and the
voice is silent when its oscillator stops.
*/

/// Tolerance for "fractions sum to one".
const FRACTION_EPSILON: f64 = 1e-9;

/// One envelope target: ramp (or jump, for the first) to `level` at `time`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breakpoint {
    pub time: Time,
    pub level: f32,
}

/// Proportional attack/decay/sustain/release profile.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeShape {
    /// Fraction of the note spent rising from silence to `peak_level`
    pub attack: f64,
    /// Fraction spent falling from `peak_level` to `sustain_start_level`
    pub decay: f64,
    /// Fraction spent drifting from `sustain_start_level` to `sustain_end_level`
    pub sustain: f64,
    /// Fraction spent falling to silence
    pub release: f64,
    pub peak_level: f32,
    pub sustain_start_level: f32,
    pub sustain_end_level: f32,
}

impl Default for EnvelopeShape {
    fn default() -> Self {
        Self {
            attack: 0.15,
            decay: 0.10,
            sustain: 0.50,
            release: 0.25,
            peak_level: 1.0,
            sustain_start_level: 0.8,
            sustain_end_level: 0.75,
        }
    }
}

impl EnvelopeShape {
    pub fn validate(&self) -> Result<(), SequencerError> {
        let fractions = [
            ("attack", self.attack),
            ("decay", self.decay),
            ("sustain", self.sustain),
            ("release", self.release),
        ];

        for (name, value) in fractions {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SequencerError::InvalidEnvelope(format!(
                    "{name} fraction must be finite and non-negative, got {value}"
                )));
            }
        }

        let total: f64 = fractions.iter().map(|(_, v)| v).sum();
        if (total - 1.0).abs() > FRACTION_EPSILON {
            return Err(SequencerError::InvalidEnvelope(format!(
                "segment fractions must sum to 1, got {total}"
            )));
        }

        let levels = [
            ("peak", self.peak_level),
            ("sustain start", self.sustain_start_level),
            ("sustain end", self.sustain_end_level),
        ];
        for (name, level) in levels {
            if !(0.0..=1.0).contains(&level) {
                return Err(SequencerError::InvalidEnvelope(format!(
                    "{name} level must be within [0, 1], got {level}"
                )));
            }
        }

        Ok(())
    }

    /// Absolute breakpoints for a note of `duration` seconds starting at `start`.
    pub fn breakpoints(&self, start: Time, duration: f64) -> [Breakpoint; 5] {
        let attack_end = start + duration * self.attack;
        let decay_end = start + duration * (self.attack + self.decay);
        let sustain_end = start + duration * (self.attack + self.decay + self.sustain);

        [
            Breakpoint { time: start, level: 0.0 },
            Breakpoint { time: attack_end, level: self.peak_level },
            Breakpoint { time: decay_end, level: self.sustain_start_level },
            Breakpoint { time: sustain_end, level: self.sustain_end_level },
            Breakpoint { time: start + duration, level: 0.0 },
        ]
    }
}
