pub mod codec;
pub mod prompts;
pub mod realtime;
pub mod relay;
pub mod telephony;

// Re-export commonly used types for convenience
pub use codec::{
    CodecError, Frame, LOGGED_EVENT_TYPES, LifecycleKind, decode_downstream_wire,
    decode_upstream_wire, encode_downstream_media, encode_session_update, encode_upstream_append,
    is_logged_event,
};

pub use prompts::{FilePromptProvider, PromptProvider};

pub use realtime::{
    Modality, RealtimeAudioFormat, RealtimeConnector, RealtimeReceiver, RealtimeSender,
    SessionConfig, SessionConfigBuilder,
};

pub use relay::{
    AudioSink, DEFAULT_CLOSE_TIMEOUT, FrameSource, Leg, MediaSink, RelayCoordinator, RelayCounters, RelayError,
    RelayResult, SessionReport, SessionState, UpstreamConnector,
};

pub use telephony::{TelephonyReceiver, TelephonySender, split_socket};
