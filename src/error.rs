use thiserror::Error;

/// Failures reported by the host audio engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine exists but is not advancing its clock (e.g. a suspended stream).
    #[error("audio engine is suspended")]
    Suspended,
    /// The engine cannot be used at all.
    #[error("audio engine unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised by the sequencer's public surface.
///
/// Everything except [`SequencerError::Engine`] is a configuration error and is
/// detected before any state is touched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SequencerError {
    #[error("step sequence is empty")]
    EmptySequence,

    #[error("step length must be a positive number of seconds, got {0}")]
    InvalidStepLength(f64),

    #[error("{name} must be a positive number of seconds, got {value}")]
    InvalidOffset { name: &'static str, value: f64 },

    #[error("poll interval must be greater than zero")]
    InvalidPollInterval,

    #[error("step {index} has invalid frequency {frequency} Hz")]
    InvalidFrequency { index: usize, frequency: f32 },

    #[error("invalid envelope shape: {0}")]
    InvalidEnvelope(String),

    #[error("sequencer is running; stop it before reconfiguring")]
    AlreadyRunning,

    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The background thread that drives `tick()` could not be started.
    #[error("failed to start polling thread: {0}")]
    Poller(String),
}

impl SequencerError {
    /// True for errors caused by invalid configuration rather than the engine.
    pub fn is_configuration(&self) -> bool {
        !matches!(
            self,
            SequencerError::Engine(_) | SequencerError::AlreadyRunning | SequencerError::Poller(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_convert_and_are_not_configuration_errors() {
        let err: SequencerError = EngineError::Suspended.into();
        assert_eq!(err, SequencerError::Engine(EngineError::Suspended));
        assert!(!err.is_configuration());
        assert!(SequencerError::EmptySequence.is_configuration());
    }

    #[test]
    fn messages_name_the_offending_value() {
        let err = SequencerError::InvalidOffset {
            name: "lookahead_offset",
            value: -0.5,
        };
        assert_eq!(
            err.to_string(),
            "lookahead_offset must be a positive number of seconds, got -0.5"
        );
    }
}
