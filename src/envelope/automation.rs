use crate::clock::Time;

/// How a value is reached at its event time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ramp {
    /// Jump to the value at the event time.
    Set,
    /// Interpolate linearly from the previous event, arriving at the event time.
    Linear,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutomationEvent {
    pub time: Time,
    pub value: f32,
    pub ramp: Ramp,
}

/// Timeline of automation events for one parameter.
///
/// Events are kept sorted by time; events sharing a timestamp keep insertion
/// order. Before the first event the lane reads `default_value`, after the last
/// event it holds the last value.
#[derive(Debug, Clone, PartialEq)]
pub struct AutomationLane {
    default_value: f32,
    events: Vec<AutomationEvent>,
}

impl AutomationLane {
    pub fn new(default_value: f32) -> Self {
        Self {
            default_value,
            events: Vec::with_capacity(8),
        }
    }

    pub fn set_value_at(&mut self, value: f32, time: Time) {
        self.insert(AutomationEvent {
            time,
            value,
            ramp: Ramp::Set,
        });
    }

    pub fn linear_ramp_to(&mut self, value: f32, time: Time) {
        self.insert(AutomationEvent {
            time,
            value,
            ramp: Ramp::Linear,
        });
    }

    fn insert(&mut self, event: AutomationEvent) {
        let pos = self.events.partition_point(|e| e.time <= event.time);
        self.events.insert(pos, event);
    }

    pub fn events(&self) -> &[AutomationEvent] {
        &self.events
    }

    /// Time of the final event, if any.
    pub fn end_time(&self) -> Option<Time> {
        self.events.last().map(|e| e.time)
    }

    /// Parameter value at `time`.
    pub fn value_at(&self, time: Time) -> f32 {
        // Index of the first event strictly after `time`.
        let next = self.events.partition_point(|e| e.time <= time);

        let (prev_time, prev_value) = match next.checked_sub(1) {
            Some(i) => (self.events[i].time, self.events[i].value),
            None => (0.0, self.default_value),
        };

        match self.events.get(next) {
            Some(upcoming) if upcoming.ramp == Ramp::Linear => {
                let span = upcoming.time - prev_time;
                if span <= 0.0 {
                    return upcoming.value;
                }
                let progress = ((time - prev_time) / span).clamp(0.0, 1.0) as f32;
                prev_value + (upcoming.value - prev_value) * progress
            }
            _ => prev_value,
        }
    }
}

impl Default for AutomationLane {
    fn default() -> Self {
        Self::new(0.0)
    }
}
