//! Speech-AI realtime leg.
//!
//! - `config` - endpoint defaults, audio formats, modalities
//! - `messages` - wire event types
//! - `session` - per-call session configuration builder
//! - `client` - WebSocket connector and the two connection halves

mod client;
pub mod config;
pub mod messages;
mod session;

pub use client::{RealtimeConnector, RealtimeReceiver, RealtimeSender};
pub use config::{
    DEFAULT_PROTOCOL_VERSION, DEFAULT_REALTIME_MODEL, DEFAULT_TEMPERATURE, DEFAULT_VOICE,
    KNOWN_VOICES, Modality, OPENAI_REALTIME_URL, PROTOCOL_VERSION_HEADER, RealtimeAudioFormat,
};
pub use messages::{ApiError, ClientEvent, ServerEvent, SessionConfig};
pub use session::SessionConfigBuilder;
