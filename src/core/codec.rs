//! Frame codec for both wire vocabularies.
//!
//! The relay never works on raw JSON. Inbound text frames from either leg are
//! decoded into a [`Frame`], and the two outbound shapes (telephony `media`
//! events, speech-AI `input_audio_buffer.append` events) are produced by the
//! encode functions here. Everything in this module is pure: decode problems
//! come back as [`CodecError`] values and the caller decides to drop the frame.
//!
//! Audio payloads are opaque text. They are copied between the two
//! vocabularies untouched, so a chunk decoded from the telephony edge
//! re-encodes for the speech service byte-for-byte.

use phf::phf_set;
use thiserror::Error;

use super::realtime::messages::{ClientEvent, ServerEvent, SessionConfig};
use super::telephony::messages::{OutboundMedia, TelephonyInbound, TelephonyOutbound};

/// Upstream event types that are logged as session diagnostics.
pub static LOGGED_EVENT_TYPES: phf::Set<&'static str> = phf_set! {
    "response.content.done",
    "rate_limits.updated",
    "response.done",
    "input_audio_buffer.committed",
    "input_audio_buffer.speech_stopped",
    "input_audio_buffer.speech_started",
    "session.created",
};

/// Whether an upstream event type belongs to the diagnostic allow-list.
#[inline]
pub fn is_logged_event(name: &str) -> bool {
    LOGGED_EVENT_TYPES.contains(name)
}

/// Errors produced by the frame codec.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Inbound text was not valid JSON or lacked a required field
    #[error("Malformed frame: {0}")]
    Malformed(#[source] serde_json::Error),

    /// Outbound frame could not be serialized
    #[error("Failed to encode frame: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Stream lifecycle transitions reported by the telephony edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleKind {
    Start,
    Stop,
}

/// Internal frame representation shared by both legs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A chunk of encoded audio
    AudioChunk { payload: String },
    /// Stream started or stopped
    StreamLifecycle {
        kind: LifecycleKind,
        stream_id: String,
    },
    /// A recognized control event that is only interesting for logging
    Diagnostic {
        name: &'static str,
        detail: Option<String>,
    },
    /// Anything the codec does not recognize
    Unknown { raw: String },
}

impl Frame {
    /// Short label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::AudioChunk { .. } => "audio_chunk",
            Frame::StreamLifecycle { .. } => "stream_lifecycle",
            Frame::Diagnostic { .. } => "diagnostic",
            Frame::Unknown { .. } => "unknown",
        }
    }
}

/// Decode one text frame received from the telephony edge.
pub fn decode_downstream_wire(text: &str) -> Result<Frame, CodecError> {
    let event: TelephonyInbound = serde_json::from_str(text).map_err(CodecError::Malformed)?;

    let frame = match event {
        TelephonyInbound::Media { media } => Frame::AudioChunk {
            payload: media.payload,
        },
        TelephonyInbound::Start { start } => Frame::StreamLifecycle {
            kind: LifecycleKind::Start,
            stream_id: start.stream_sid,
        },
        TelephonyInbound::Stop { stream_sid } => Frame::StreamLifecycle {
            kind: LifecycleKind::Stop,
            stream_id: stream_sid,
        },
        TelephonyInbound::Connected { protocol } => Frame::Diagnostic {
            name: "connected",
            detail: protocol,
        },
        TelephonyInbound::Mark {} => Frame::Diagnostic {
            name: "mark",
            detail: None,
        },
        TelephonyInbound::Dtmf {} => Frame::Diagnostic {
            name: "dtmf",
            detail: None,
        },
        TelephonyInbound::Unknown => Frame::Unknown {
            raw: text.to_string(),
        },
    };

    Ok(frame)
}

/// Decode one text frame received from the speech-AI endpoint.
///
/// An audio delta without payload carries nothing to forward and is reported
/// as a diagnostic instead.
pub fn decode_upstream_wire(text: &str) -> Result<Frame, CodecError> {
    let event: ServerEvent = serde_json::from_str(text).map_err(CodecError::Malformed)?;

    let frame = match event {
        ServerEvent::AudioDelta { delta } if !delta.is_empty() => {
            Frame::AudioChunk { payload: delta }
        }
        ServerEvent::Error { error } => Frame::Diagnostic {
            name: "error",
            detail: Some(if error.error_type.is_empty() {
                error.message
            } else {
                format!("{}: {}", error.error_type, error.message)
            }),
        },
        other => match other.name() {
            Some(name) => Frame::Diagnostic { name, detail: None },
            None => Frame::Unknown {
                raw: text.to_string(),
            },
        },
    };

    Ok(frame)
}

/// Encode an audio payload as a telephony `media` event for one stream.
pub fn encode_downstream_media(stream_sid: &str, payload: &str) -> Result<String, CodecError> {
    let event = TelephonyOutbound::Media {
        stream_sid,
        media: OutboundMedia { payload },
    };
    serde_json::to_string(&event).map_err(CodecError::Encode)
}

/// Encode an audio payload as an `input_audio_buffer.append` event.
pub fn encode_upstream_append(payload: &str) -> Result<String, CodecError> {
    let event = ClientEvent::InputAudioBufferAppend { audio: payload };
    serde_json::to_string(&event).map_err(CodecError::Encode)
}

/// Encode the one-time `session.update` event.
pub fn encode_session_update(session: &SessionConfig) -> Result<String, CodecError> {
    let event = ClientEvent::SessionUpdate { session };
    serde_json::to_string(&event).map_err(CodecError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_decode_start_frame() {
        let frame =
            decode_downstream_wire(r#"{"event":"start","start":{"streamSid":"SID1"}}"#).unwrap();
        assert_eq!(
            frame,
            Frame::StreamLifecycle {
                kind: LifecycleKind::Start,
                stream_id: "SID1".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_media_frame() {
        let frame =
            decode_downstream_wire(r#"{"event":"media","media":{"payload":"AAAA"}}"#).unwrap();
        assert_eq!(
            frame,
            Frame::AudioChunk {
                payload: "AAAA".to_string()
            }
        );
    }

    #[test]
    fn test_decode_stop_frame() {
        let frame = decode_downstream_wire(
            r#"{"event":"stop","streamSid":"SID1","stop":{"callSid":"CA1"}}"#,
        )
        .unwrap();
        assert_eq!(
            frame,
            Frame::StreamLifecycle {
                kind: LifecycleKind::Stop,
                stream_id: "SID1".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_downstream_diagnostics() {
        let frame =
            decode_downstream_wire(r#"{"event":"connected","protocol":"Call","version":"1.0.0"}"#)
                .unwrap();
        assert_eq!(frame.kind(), "diagnostic");

        let frame =
            decode_downstream_wire(r#"{"event":"mark","mark":{"name":"greeting"}}"#).unwrap();
        assert_eq!(
            frame,
            Frame::Diagnostic {
                name: "mark",
                detail: None
            }
        );
    }

    #[test]
    fn test_decode_unrecognized_downstream_event() {
        let raw = r#"{"event":"something_new","data":1}"#;
        let frame = decode_downstream_wire(raw).unwrap();
        assert_eq!(
            frame,
            Frame::Unknown {
                raw: raw.to_string()
            }
        );
    }

    #[test]
    fn test_decode_downstream_failures() {
        assert!(matches!(
            decode_downstream_wire("not json"),
            Err(CodecError::Malformed(_))
        ));
        // Missing discriminator
        assert!(decode_downstream_wire(r#"{"media":{"payload":"AAAA"}}"#).is_err());
        // Known discriminator, missing required field
        assert!(decode_downstream_wire(r#"{"event":"media"}"#).is_err());
        assert!(decode_downstream_wire(r#"{"event":"start","start":{}}"#).is_err());
    }

    #[test]
    fn test_decode_audio_delta() {
        let frame =
            decode_upstream_wire(r#"{"type":"response.audio.delta","delta":"BBBB","item_id":"i1"}"#)
                .unwrap();
        assert_eq!(
            frame,
            Frame::AudioChunk {
                payload: "BBBB".to_string()
            }
        );
    }

    #[test]
    fn test_decode_empty_audio_delta_is_not_audio() {
        let frame = decode_upstream_wire(r#"{"type":"response.audio.delta","delta":""}"#).unwrap();
        assert_eq!(
            frame,
            Frame::Diagnostic {
                name: "response.audio.delta",
                detail: None
            }
        );

        let frame = decode_upstream_wire(r#"{"type":"response.audio.delta"}"#).unwrap();
        assert_eq!(frame.kind(), "diagnostic");
    }

    #[test]
    fn test_decode_allow_listed_events() {
        for name in LOGGED_EVENT_TYPES.iter() {
            let raw = json!({"type": name}).to_string();
            match decode_upstream_wire(&raw).unwrap() {
                Frame::Diagnostic { name: decoded, .. } => assert_eq!(decoded, *name),
                other => panic!("{name} decoded to {other:?}"),
            }
        }
    }

    #[test]
    fn test_decode_upstream_error_event() {
        let raw = r#"{"type":"error","error":{"type":"invalid_request_error","message":"bad"}}"#;
        assert_eq!(
            decode_upstream_wire(raw).unwrap(),
            Frame::Diagnostic {
                name: "error",
                detail: Some("invalid_request_error: bad".to_string()),
            }
        );
    }

    #[test]
    fn test_decode_unrecognized_upstream_event() {
        let raw = r#"{"type":"response.text.delta","delta":"hello"}"#;
        assert_eq!(
            decode_upstream_wire(raw).unwrap(),
            Frame::Unknown {
                raw: raw.to_string()
            }
        );
        assert!(decode_upstream_wire(r#"{"delta":"BBBB"}"#).is_err());
        assert!(decode_upstream_wire("").is_err());
    }

    #[test]
    fn test_allow_list_membership() {
        assert_eq!(LOGGED_EVENT_TYPES.len(), 7);
        assert!(is_logged_event("session.created"));
        assert!(is_logged_event("rate_limits.updated"));
        assert!(!is_logged_event("response.audio.delta"));
        assert!(!is_logged_event("session.updated"));
    }

    #[test]
    fn test_encode_downstream_media() {
        let text = encode_downstream_media("SID1", "BBBB").unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(
            value,
            json!({"event": "media", "streamSid": "SID1", "media": {"payload": "BBBB"}})
        );
    }

    #[test]
    fn test_audio_payload_survives_relay_encoding() {
        let payload = "f/9+/3x//n7+fn5+/n5+fn5+fn5+/v5+fv7+fn5+fg==";
        let inbound = json!({"event": "media", "media": {"payload": payload}}).to_string();

        let Frame::AudioChunk { payload: decoded } = decode_downstream_wire(&inbound).unwrap()
        else {
            panic!("expected audio chunk");
        };
        let outbound = encode_upstream_append(&decoded).unwrap();
        let value: Value = serde_json::from_str(&outbound).unwrap();

        assert_eq!(value["type"], "input_audio_buffer.append");
        assert_eq!(value["audio"].as_str().unwrap().as_bytes(), payload.as_bytes());
    }
}
