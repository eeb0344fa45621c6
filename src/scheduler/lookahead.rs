use crate::{
    clock::{AudioEngine, Time},
    envelope::{EnvelopeScheduler, NoteRequest},
    sequencing::{Pattern, SequencerConfig, SequencerState},
};

/*
Lookahead Scheduling
====================

Two clocks are involved:

  host timer    Coarse and jittery. Fires `tick()` roughly every poll interval,
                later when the host is busy.

  engine clock  Sample-accurate. Anything stamped with an engine time plays
                exactly then, no matter when the stamp was issued.

The loop uses the host timer only to decide *whether* it is time to commit the
next note, and the engine clock to decide *when* that note sounds.

Vocabulary
----------

  elapsed                  clock_now - sequence_start_time (sequence-relative)

  previous_note_end_time   sequence-relative instant at which the last
                           committed note stops sounding

  lookahead_offset         lead between the clock reading and a note's start


The Gate
--------

    tick ──► elapsed > previous_note_end_time ? ──no──► nothing happens
                          │
                         yes
                          ▼
             start = clock_now + lookahead_offset
             commit(step, start, step_length)
             previous_note_end_time = (start - sequence_start_time) + step_length
             advance cursor

Each start is derived from a fresh clock read rather than a running total, so a
late tick delays the decision but cannot push drift into notes already
committed. Once a note fires, the gate stays closed until that note has
finished, so redundant ticks cannot double-schedule.
*/

/// Outcome of one gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// The previous note is still sounding; nothing to do.
    Wait,
    /// Commit `note`, then replace the state with `next`.
    Fire {
        note: NoteRequest,
        next: SequencerState,
    },
}

/// Evaluate the gate for a clock reading. Pure: no engine access, no mutation.
pub fn decide(
    state: &SequencerState,
    pattern: &Pattern,
    clock_now: Time,
    config: &SequencerConfig,
) -> Decision {
    if state.elapsed(clock_now) <= state.previous_note_end_time {
        return Decision::Wait;
    }

    let start = clock_now + config.lookahead_offset;
    let note = NoteRequest {
        frequency: state.next_step(pattern).frequency,
        start,
        duration: pattern.step_length(),
    };

    let mut next = state.advanced(pattern.len());
    next.previous_note_end_time = (start - state.sequence_start_time) + pattern.step_length();

    Decision::Fire { note, next }
}

/// Binds the gate to an envelope scheduler and an engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct LookaheadLoop {
    envelope: EnvelopeScheduler,
}

impl LookaheadLoop {
    pub fn new(envelope: EnvelopeScheduler) -> Self {
        Self { envelope }
    }

    /// One poll: read the clock once, commit at most one note.
    ///
    /// Returns the committed note, or `None` when the gate was closed (the
    /// state is then left exactly as it was).
    pub fn tick<E: AudioEngine>(
        &self,
        engine: &mut E,
        state: &mut SequencerState,
        pattern: &Pattern,
        config: &SequencerConfig,
    ) -> Option<NoteRequest> {
        let clock_now = engine.current_time();

        match decide(state, pattern, clock_now, config) {
            Decision::Wait => {
                log::trace!(
                    "tick at {clock_now:.4}: waiting ({:.4}s into sequence, note ends at {:.4})",
                    state.elapsed(clock_now),
                    state.previous_note_end_time
                );
                None
            }
            Decision::Fire { note, next } => {
                log::debug!(
                    "step {} -> {:.2} Hz at {:.4} for {:.3}s (clock {clock_now:.4})",
                    state.current_step_index,
                    note.frequency,
                    note.start,
                    note.duration
                );
                self.envelope.schedule_note(engine, &note);
                *state = next;
                Some(note)
            }
        }
    }
}
