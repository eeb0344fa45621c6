use super::EnvelopeShape;
use crate::clock::{AudioEngine, Time};

/// A note the lookahead loop has decided to commit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteRequest {
    pub frequency: f32,
    /// Absolute engine time of note-on
    pub start: Time,
    /// Seconds until note-off
    pub duration: f64,
}

impl NoteRequest {
    pub fn end(&self) -> Time {
        self.start + self.duration
    }
}

/// Turns one step into a timed, enveloped voice on the engine.
///
/// Every call builds brand-new engine primitives. Nothing is pooled and the
/// handles are dropped once the voice is committed.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeScheduler {
    shape: EnvelopeShape,
}

impl EnvelopeScheduler {
    pub fn new(shape: EnvelopeShape) -> Self {
        Self { shape }
    }

    pub fn shape(&self) -> &EnvelopeShape {
        &self.shape
    }

    pub fn schedule_note<E: AudioEngine>(&self, engine: &mut E, note: &NoteRequest) {
        self.schedule_step(engine, note.frequency, note.duration, note.start);
    }

    /// Program and commit one voice sounding `frequency` for `duration` seconds
    /// from `start_time`.
    pub fn schedule_step<E: AudioEngine>(
        &self,
        engine: &mut E,
        frequency: f32,
        duration: f64,
        start_time: Time,
    ) {
        let tone = engine.create_tone_source(frequency);

        let envelope = engine.create_envelope_control();
        engine.connect_to_output(&envelope);

        let [first, rest @ ..] = self.shape.breakpoints(start_time, duration);
        engine.set_value_at(&envelope, first.level, first.time);
        for point in rest {
            engine.linear_ramp_to(&envelope, point.level, point.time);
        }

        engine.connect(&tone, &envelope);

        engine.schedule_on(&tone, start_time);
        engine.schedule_off(&tone, start_time + duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every engine call in order.
    #[derive(Default)]
    struct CallLog {
        calls: Vec<String>,
        next_id: u32,
    }

    impl AudioEngine for CallLog {
        type ToneSource = u32;
        type EnvelopeControl = u32;

        fn current_time(&self) -> Time {
            0.0
        }

        fn create_tone_source(&mut self, frequency: f32) -> u32 {
            self.next_id += 1;
            self.calls.push(format!("tone#{} {frequency}", self.next_id));
            self.next_id
        }

        fn create_envelope_control(&mut self) -> u32 {
            self.next_id += 1;
            self.calls.push(format!("env#{}", self.next_id));
            self.next_id
        }

        fn set_value_at(&mut self, envelope: &u32, value: f32, time: Time) {
            self.calls.push(format!("set#{envelope} {value}@{time}"));
        }

        fn linear_ramp_to(&mut self, envelope: &u32, value: f32, time: Time) {
            self.calls.push(format!("ramp#{envelope} {value}@{time}"));
        }

        fn connect(&mut self, source: &u32, envelope: &u32) {
            self.calls.push(format!("connect#{source}->#{envelope}"));
        }

        fn connect_to_output(&mut self, envelope: &u32) {
            self.calls.push(format!("output#{envelope}"));
        }

        fn schedule_on(&mut self, source: &u32, time: Time) {
            self.calls.push(format!("on#{source}@{time}"));
        }

        fn schedule_off(&mut self, source: &u32, time: Time) {
            self.calls.push(format!("off#{source}@{time}"));
        }
    }

    #[test]
    fn programs_envelope_and_commits_on_off() {
        let mut engine = CallLog::default();
        EnvelopeScheduler::default().schedule_step(&mut engine, 440.0, 2.0, 1.0);

        assert_eq!(
            engine.calls,
            vec![
                "tone#1 440",
                "env#2",
                "output#2",
                "set#2 0@1",
                "ramp#2 1@1.3",
                "ramp#2 0.8@1.5",
                "ramp#2 0.75@2.5",
                "ramp#2 0@3",
                "connect#1->#2",
                "on#1@1",
                "off#1@3",
            ]
        );
    }

    #[test]
    fn each_call_creates_fresh_primitives() {
        let mut engine = CallLog::default();
        let scheduler = EnvelopeScheduler::default();
        let note = NoteRequest {
            frequency: 220.0,
            start: 0.5,
            duration: 0.5,
        };

        scheduler.schedule_note(&mut engine, &note);
        scheduler.schedule_note(&mut engine, &note);

        let tones: Vec<&String> = engine.calls.iter().filter(|c| c.starts_with("tone")).collect();
        assert_eq!(tones, vec!["tone#1 220", "tone#3 220"]);
        assert_eq!(note.end(), 1.0);
    }
}
