//! Telephony media-stream WebSocket message types.
//!
//! The telephony edge sends JSON text frames tagged by an `event` field:
//!
//! - connected - Socket handshake acknowledgement
//! - start - Stream metadata, carries the stream correlation id
//! - media - One chunk of encoded caller audio
//! - mark - Playback marker reached
//! - dtmf - Keypad digit pressed
//! - stop - Stream ended
//!
//! Outbound, the relay only ever sends `media` frames addressed to a stream.

use serde::{Deserialize, Serialize};

/// Events received from the telephony edge.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TelephonyInbound {
    /// Socket handshake acknowledgement
    Connected {
        #[serde(default)]
        protocol: Option<String>,
    },

    /// Stream started
    Start {
        /// Stream metadata
        start: StartMetadata,
    },

    /// Audio chunk from the caller
    Media {
        /// Media payload
        media: InboundMedia,
    },

    /// Playback marker reached
    Mark {},

    /// Keypad digit pressed
    Dtmf {},

    /// Stream stopped
    Stop {
        /// Stream identifier
        #[serde(rename = "streamSid")]
        stream_sid: String,
    },

    /// Any event this relay does not know about
    #[serde(other)]
    Unknown,
}

/// Metadata carried by the `start` event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartMetadata {
    /// Stream correlation identifier
    pub stream_sid: String,
    /// Call identifier
    #[serde(default)]
    pub call_sid: Option<String>,
    /// Negotiated media format
    #[serde(default)]
    pub media_format: Option<MediaFormat>,
}

/// Media format announced in the `start` event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFormat {
    pub encoding: String,
    pub sample_rate: u32,
    pub channels: u32,
}

/// Payload of an inbound `media` event.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundMedia {
    /// Opaque encoded audio
    pub payload: String,
    /// Track name (inbound/outbound)
    #[serde(default)]
    pub track: Option<String>,
}

/// Events sent to the telephony edge.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum TelephonyOutbound<'a> {
    /// Audio chunk to play to the caller
    Media {
        #[serde(rename = "streamSid")]
        stream_sid: &'a str,
        media: OutboundMedia<'a>,
    },
}

/// Payload of an outbound `media` event.
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMedia<'a> {
    pub payload: &'a str,
}
