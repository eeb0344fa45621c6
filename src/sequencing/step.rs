#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::SequencerError;

/// One step of a sequence: the pitch to sound, in Hz.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub frequency: f32,
}

impl Step {
    pub const fn new(frequency: f32) -> Self {
        Self { frequency }
    }
}

impl From<f32> for Step {
    fn from(frequency: f32) -> Self {
        Self { frequency }
    }
}

impl From<f64> for Step {
    fn from(frequency: f64) -> Self {
        Self {
            frequency: frequency as f32,
        }
    }
}

/// A validated, looping list of steps that all share one step length.
///
/// A `Pattern` can only be built through [`Pattern::new`], so it always holds at
/// least one step, every frequency is finite and positive, and the step length
/// is finite and positive.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    steps: Vec<Step>,
    /// Duration of every step in seconds
    step_length: f64,
}

impl Pattern {
    pub fn new<S: Into<Step>>(
        steps: impl IntoIterator<Item = S>,
        step_length: f64,
    ) -> Result<Self, SequencerError> {
        let steps: Vec<Step> = steps.into_iter().map(Into::into).collect();

        if steps.is_empty() {
            return Err(SequencerError::EmptySequence);
        }

        if !(step_length.is_finite() && step_length > 0.0) {
            return Err(SequencerError::InvalidStepLength(step_length));
        }

        if let Some((index, step)) = steps
            .iter()
            .enumerate()
            .find(|(_, s)| !(s.frequency.is_finite() && s.frequency > 0.0))
        {
            return Err(SequencerError::InvalidFrequency {
                index,
                frequency: step.frequency,
            });
        }

        Ok(Self { steps, step_length })
    }

    /// Step at `index`, wrapping past the end.
    pub fn step(&self, index: usize) -> Step {
        self.steps[index % self.steps.len()]
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Never zero.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn step_length(&self) -> f64 {
        self.step_length
    }

    /// Time for one full pass over every step, ignoring scheduling gaps.
    pub fn cycle_length(&self) -> f64 {
        self.step_length * self.steps.len() as f64
    }
}

impl Default for Pattern {
    /// The classic four-step figure at one second per step.
    fn default() -> Self {
        Self {
            steps: [440.0, 660.0, 440.0, 400.0].into_iter().map(Step::new).collect(),
            step_length: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_sequence() {
        let steps: [f32; 0] = [];
        assert_eq!(
            Pattern::new(steps, 1.0),
            Err(SequencerError::EmptySequence)
        );
    }

    #[test]
    fn rejects_non_positive_step_length() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = Pattern::new([440.0], bad).unwrap_err();
            assert!(matches!(err, SequencerError::InvalidStepLength(_)));
        }
    }

    #[test]
    fn rejects_bad_frequency_with_its_index() {
        let err = Pattern::new([440.0, 660.0, 0.0], 1.0).unwrap_err();
        assert_eq!(
            err,
            SequencerError::InvalidFrequency {
                index: 2,
                frequency: 0.0
            }
        );

        assert!(Pattern::new([-220.0], 1.0).is_err());
        assert!(Pattern::new([f32::NAN], 1.0).is_err());
    }

    #[test]
    fn step_lookup_wraps() {
        let pattern = Pattern::new([220.0, 330.0], 0.5).unwrap();
        assert_eq!(pattern.step(0).frequency, 220.0);
        assert_eq!(pattern.step(3).frequency, 330.0);
        assert_eq!(pattern.cycle_length(), 1.0);
    }

    #[test]
    fn default_pattern_is_valid() {
        let default = Pattern::default();
        let rebuilt = Pattern::new(default.steps().to_vec(), default.step_length()).unwrap();
        assert_eq!(default, rebuilt);
        assert_eq!(default.len(), 4);
    }
}
