//! Base traits and types for the duplex relay.
//!
//! The relay coordinator only sees these seams, never a concrete socket:
//!
//! - [`FrameSource`] yields decoded frames from one leg
//! - [`MediaSink`] writes audio toward the telephony edge
//! - [`AudioSink`] writes configuration and audio toward the speech-AI endpoint
//! - [`UpstreamConnector`] opens the speech-AI leg and hands back its two halves
//!
//! Production code implements them over WebSockets; tests implement them
//! over in-memory channels.

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use crate::core::codec::{CodecError, Frame};
use crate::core::realtime::SessionConfig;

// =============================================================================
// Error Types
// =============================================================================

/// Identifies one of the two connections bridged by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Leg {
    /// Telephony media-stream connection
    Downstream,
    /// Speech-AI realtime connection
    Upstream,
}

impl Leg {
    /// The opposite leg.
    #[inline]
    pub fn peer(&self) -> Leg {
        match self {
            Self::Downstream => Self::Upstream,
            Self::Upstream => Self::Downstream,
        }
    }

    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Downstream => "downstream",
            Self::Upstream => "upstream",
        }
    }
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while relaying a session.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The speech-AI leg could not be opened
    #[error("Failed to establish upstream connection: {0}")]
    ConnectionEstablish(String),

    /// Writing to a leg failed
    #[error("Send to {leg} failed: {reason}")]
    Send { leg: Leg, reason: String },

    /// An outbound frame could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] CodecError),

    /// The leg was already closed
    #[error("Not connected")]
    NotConnected,

    /// Operations were issued in an order the protocol forbids
    #[error("Out of order: {0}")]
    OutOfOrder(String),
}

impl RelayError {
    /// Shorthand for a send failure on `leg`.
    pub fn send(leg: Leg, reason: impl fmt::Display) -> Self {
        Self::Send {
            leg,
            reason: reason.to_string(),
        }
    }
}

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;

// =============================================================================
// Leg Traits
// =============================================================================

/// Ordered source of decoded frames from one leg.
#[async_trait]
pub trait FrameSource: Send + 'static {
    /// Next frame, or `None` once the leg has ended.
    ///
    /// After the first `None` every later call returns `None` too.
    async fn receive_frame(&mut self) -> Option<Frame>;
}

/// Outbound half of the telephony leg.
#[async_trait]
pub trait MediaSink: Send + 'static {
    /// Send one audio chunk addressed to `stream_sid`.
    async fn send_media(&mut self, stream_sid: &str, payload: &str) -> RelayResult<()>;

    /// Close the leg. Closing an already closed leg is a no-op.
    async fn close(&mut self);
}

/// Outbound half of the speech-AI leg.
#[async_trait]
pub trait AudioSink: Send + 'static {
    /// Send the session configuration. Must be the first message and is only
    /// sent once.
    async fn send_config(&mut self, config: &SessionConfig) -> RelayResult<()>;

    /// Append one audio chunk to the remote input buffer.
    async fn send_audio(&mut self, payload: &str) -> RelayResult<()>;

    /// Close the leg. Closing an already closed leg is a no-op.
    async fn close(&mut self);
}

/// Opens the speech-AI leg for one session.
#[async_trait]
pub trait UpstreamConnector: Send + Sync + 'static {
    type Sink: AudioSink;
    type Source: FrameSource;

    /// Connect and split into outbound and inbound halves.
    async fn connect(&self) -> RelayResult<(Self::Sink, Self::Source)>;
}
