//! Speech-AI realtime session configuration types.
//!
//! This module contains the value types negotiated with the realtime endpoint:
//! - Endpoint and protocol defaults
//! - Audio format selection
//! - Response modalities

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default realtime WebSocket endpoint.
pub const OPENAI_REALTIME_URL: &str = "wss://api.openai.com/v1/realtime";

/// Default realtime model requested via the `model` query parameter.
pub const DEFAULT_REALTIME_MODEL: &str = "gpt-4o-realtime-preview-2024-10-01";

/// Default value of the protocol-version header sent at connection time.
pub const DEFAULT_PROTOCOL_VERSION: &str = "realtime=v1";

/// Header carrying the protocol-version marker.
pub const PROTOCOL_VERSION_HEADER: &str = "OpenAI-Beta";

/// Default voice for audio output.
pub const DEFAULT_VOICE: &str = "alloy";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.8;

/// Voices accepted by the realtime endpoint at the time of writing.
pub const KNOWN_VOICES: &[&str] = &[
    "alloy", "ash", "ballad", "coral", "echo", "sage", "shimmer", "verse",
];

// =============================================================================
// Audio Formats
// =============================================================================

/// Audio formats understood by the realtime endpoint.
///
/// Telephony media streams carry 8kHz G.711 u-law, so that is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RealtimeAudioFormat {
    /// PCM 16-bit signed little-endian, 24kHz
    #[serde(rename = "pcm16")]
    Pcm16,
    /// G.711 u-law (8-bit, 8kHz)
    #[default]
    #[serde(rename = "g711_ulaw")]
    G711Ulaw,
    /// G.711 a-law (8-bit, 8kHz)
    #[serde(rename = "g711_alaw")]
    G711Alaw,
}

impl RealtimeAudioFormat {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pcm16 => "pcm16",
            Self::G711Ulaw => "g711_ulaw",
            Self::G711Alaw => "g711_alaw",
        }
    }

    /// Get the sample rate for this format.
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        match self {
            Self::Pcm16 => 24000,
            Self::G711Ulaw | Self::G711Alaw => 8000,
        }
    }
}

impl FromStr for RealtimeAudioFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pcm16" | "pcm" | "linear16" => Ok(Self::Pcm16),
            "g711_ulaw" | "ulaw" | "mulaw" => Ok(Self::G711Ulaw),
            "g711_alaw" | "alaw" => Ok(Self::G711Alaw),
            other => Err(format!(
                "unsupported audio format '{other}' (expected pcm16, g711_ulaw or g711_alaw)"
            )),
        }
    }
}

impl std::fmt::Display for RealtimeAudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Modalities
// =============================================================================

/// Response modalities requested from the realtime endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    /// Text output
    Text,
    /// Audio output
    Audio,
}

impl Modality {
    /// Convert to the API parameter value.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Audio => "audio",
        }
    }

    /// Default modality list: text and audio.
    pub fn defaults() -> Vec<Modality> {
        vec![Self::Text, Self::Audio]
    }
}

impl FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "audio" => Ok(Self::Audio),
            other => Err(format!(
                "unsupported modality '{other}' (expected text or audio)"
            )),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
