#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use std::f32::consts::TAU;

/// Periodic waveform produced by a tone source.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

impl Waveform {
    /// Sample of the waveform at `phase` in [0, 1).
    #[inline]
    pub fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (TAU * phase).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * phase - 1.0,
            Waveform::Triangle => 1.0 - 4.0 * (phase - 0.5).abs(),
        }
    }
}

impl std::str::FromStr for Waveform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sine" => Ok(Waveform::Sine),
            "square" => Ok(Waveform::Square),
            "saw" | "sawtooth" => Ok(Waveform::Sawtooth),
            "triangle" | "tri" => Ok(Waveform::Triangle),
            other => Err(format!("unknown waveform: {other}")),
        }
    }
}

/// Phase-accumulating oscillator at a fixed frequency.
#[derive(Debug, Clone, Copy)]
pub struct Oscillator {
    waveform: Waveform,
    frequency: f32,
    phase: f32, // [0, 1)
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency: f32) -> Self {
        Self {
            waveform,
            frequency,
            phase: 0.0,
        }
    }

    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Current sample, then advance one sample period.
    #[inline]
    pub fn next_sample(&mut self, sample_rate: f32) -> f32 {
        let out = self.waveform.sample(self.phase);
        self.phase += self.frequency / sample_rate;
        self.phase -= self.phase.floor();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sine_matches_closed_form() {
        let sample_rate = 48_000.0;
        let mut osc = Oscillator::new(Waveform::Sine, 440.0);

        for n in 0..64 {
            let expected = (TAU * 440.0 * n as f32 / sample_rate).sin();
            let actual = osc.next_sample(sample_rate);
            assert!((actual - expected).abs() < 1e-4, "sample {n}: {actual} vs {expected}");
        }
    }

    #[test]
    fn waveforms_stay_in_unit_range() {
        for waveform in [
            Waveform::Sine,
            Waveform::Square,
            Waveform::Sawtooth,
            Waveform::Triangle,
        ] {
            let mut osc = Oscillator::new(waveform, 1_234.5);
            for _ in 0..1_000 {
                let s = osc.next_sample(44_100.0);
                assert!((-1.0..=1.0).contains(&s), "{waveform:?} produced {s}");
            }
        }
    }

    #[test]
    fn parses_waveform_names() {
        assert_eq!("Saw".parse::<Waveform>(), Ok(Waveform::Sawtooth));
        assert!("noise".parse::<Waveform>().is_err());
    }
}
