//! Duplex audio relay between the telephony edge and the speech-AI endpoint.

mod base;
mod coordinator;
mod state;

pub use base::{
    AudioSink, FrameSource, Leg, MediaSink, RelayError, RelayResult, UpstreamConnector,
};
pub use coordinator::{DEFAULT_CLOSE_TIMEOUT, RelayCoordinator, RelayCounters, SessionReport};
pub use state::SessionState;
