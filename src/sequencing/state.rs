use super::step::{Pattern, Step};
use crate::clock::Time;

/// Where the sequencer is in its pattern and when the next note is due.
///
/// `sequence_start_time` is absolute engine time. `previous_note_end_time` is
/// sequence-relative: seconds after `sequence_start_time` at which the most
/// recently committed note finishes sounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequencerState {
    pub sequence_start_time: Time,
    pub previous_note_end_time: Time,
    pub current_step_index: usize,
}

impl SequencerState {
    /// Fresh state for a `play()` issued at `clock_now`.
    pub fn reset(clock_now: Time, start_offset: f64) -> Self {
        Self {
            sequence_start_time: clock_now + start_offset,
            previous_note_end_time: 0.0,
            current_step_index: 0,
        }
    }

    /// Seconds since sequence-relative time zero (negative before it).
    pub fn elapsed(&self, clock_now: Time) -> Time {
        clock_now - self.sequence_start_time
    }

    /// Move the cursor forward one step, wrapping at `len`.
    pub fn advance(&mut self, len: usize) {
        self.current_step_index += 1;
        if self.current_step_index >= len {
            self.current_step_index = 0;
        }
    }

    /// Copy of `self` with the cursor advanced.
    pub fn advanced(mut self, len: usize) -> Self {
        self.advance(len);
        self
    }

    /// The step under the cursor. Does not move it.
    pub fn next_step(&self, pattern: &Pattern) -> Step {
        pattern.step(self.current_step_index)
    }
}
