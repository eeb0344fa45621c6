//! The lookahead loop and the play/stop state machine around it.

pub mod lookahead;
pub mod poller;
pub mod sequencer;

pub use lookahead::{decide, Decision, LookaheadLoop};
pub use poller::{PollingTask, Transport};
pub use sequencer::{StepSequencer, TransportState};
