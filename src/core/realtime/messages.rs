//! Realtime speech-AI WebSocket message types.
//!
//! All events are JSON-encoded and carried in WebSocket text frames.
//!
//! # Protocol Overview
//!
//! Client events (sent to server):
//! - session.update - Configure the session (sent once, first)
//! - input_audio_buffer.append - Append an audio chunk to the input buffer
//!
//! Server events (received from server):
//! - session.created / session.updated - Session lifecycle
//! - input_audio_buffer.* - Buffer and speech detection notifications
//! - response.* - Response generation progress, including audio deltas
//! - rate_limits.updated - Rate limit snapshot
//! - error - Error occurred

use serde::{Deserialize, Serialize};

use super::config::{Modality, RealtimeAudioFormat};

// =============================================================================
// Session Configuration
// =============================================================================

/// Session configuration carried by the `session.update` event.
///
/// Built once per relay session and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Input audio format
    pub input_audio_format: RealtimeAudioFormat,
    /// Output audio format
    pub output_audio_format: RealtimeAudioFormat,
    /// Voice for audio output
    pub voice: String,
    /// System instructions for the assistant
    pub instructions: String,
    /// Response modalities
    pub modalities: Vec<Modality>,
    /// Temperature for response generation
    pub temperature: f32,
}

// =============================================================================
// Client Events (sent to server)
// =============================================================================

/// Client events sent to the realtime endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ClientEvent<'a> {
    /// Update session configuration
    #[serde(rename = "session.update")]
    SessionUpdate {
        /// Session configuration
        session: &'a SessionConfig,
    },

    /// Append audio to input buffer
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend {
        /// Opaque audio payload, forwarded as received from the telephony edge
        audio: &'a str,
    },
}

// =============================================================================
// Server Events (received from server)
// =============================================================================

/// Server events received from the realtime endpoint.
///
/// Only the audio delta and error payloads are read; every other event is
/// kept by name for diagnostics.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Audio delta (audio data chunk)
    #[serde(rename = "response.audio.delta")]
    AudioDelta {
        /// Encoded audio delta
        #[serde(default)]
        delta: String,
    },

    /// Error occurred
    #[serde(rename = "error")]
    Error {
        /// Error details
        error: ApiError,
    },

    #[serde(rename = "session.created")]
    SessionCreated {},

    #[serde(rename = "session.updated")]
    SessionUpdated {},

    #[serde(rename = "input_audio_buffer.speech_started")]
    SpeechStarted {},

    #[serde(rename = "input_audio_buffer.speech_stopped")]
    SpeechStopped {},

    #[serde(rename = "input_audio_buffer.committed")]
    InputAudioBufferCommitted {},

    #[serde(rename = "input_audio_buffer.cleared")]
    InputAudioBufferCleared {},

    #[serde(rename = "conversation.item.created")]
    ConversationItemCreated {},

    #[serde(rename = "response.created")]
    ResponseCreated {},

    #[serde(rename = "response.done")]
    ResponseDone {},

    #[serde(rename = "response.output_item.added")]
    OutputItemAdded {},

    #[serde(rename = "response.output_item.done")]
    OutputItemDone {},

    #[serde(rename = "response.content_part.added")]
    ContentPartAdded {},

    #[serde(rename = "response.content.done")]
    ContentDone {},

    #[serde(rename = "response.audio.done")]
    AudioDone {},

    #[serde(rename = "response.audio_transcript.delta")]
    AudioTranscriptDelta {},

    #[serde(rename = "response.audio_transcript.done")]
    AudioTranscriptDone {},

    #[serde(rename = "rate_limits.updated")]
    RateLimitsUpdated {},

    /// Any event type this relay does not know about
    #[serde(other)]
    Unknown,
}

impl ServerEvent {
    /// Wire name of the event, `None` for unrecognized types.
    pub fn name(&self) -> Option<&'static str> {
        let name = match self {
            Self::AudioDelta { .. } => "response.audio.delta",
            Self::Error { .. } => "error",
            Self::SessionCreated {} => "session.created",
            Self::SessionUpdated {} => "session.updated",
            Self::SpeechStarted {} => "input_audio_buffer.speech_started",
            Self::SpeechStopped {} => "input_audio_buffer.speech_stopped",
            Self::InputAudioBufferCommitted {} => "input_audio_buffer.committed",
            Self::InputAudioBufferCleared {} => "input_audio_buffer.cleared",
            Self::ConversationItemCreated {} => "conversation.item.created",
            Self::ResponseCreated {} => "response.created",
            Self::ResponseDone {} => "response.done",
            Self::OutputItemAdded {} => "response.output_item.added",
            Self::OutputItemDone {} => "response.output_item.done",
            Self::ContentPartAdded {} => "response.content_part.added",
            Self::ContentDone {} => "response.content.done",
            Self::AudioDone {} => "response.audio.done",
            Self::AudioTranscriptDelta {} => "response.audio_transcript.delta",
            Self::AudioTranscriptDone {} => "response.audio_transcript.done",
            Self::RateLimitsUpdated {} => "rate_limits.updated",
            Self::Unknown => return None,
        };
        Some(name)
    }
}

// =============================================================================
// Supporting Types
// =============================================================================

/// API error information.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    /// Error type
    #[serde(rename = "type", default)]
    pub error_type: String,
    /// Error code
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub code: Option<String>,
    /// Error message
    #[serde(default)]
    pub message: String,
}

// =============================================================================
// Tests
// =============================================================================
