//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check endpoint
//! - `media_stream` - Telephony media-stream WebSocket, one relay session per socket
//! - `twiml` - Call-answer document pointing the provider at the media stream

pub mod api;
pub mod media_stream;
pub mod twiml;

// Re-export commonly used handlers for convenient access
pub use media_stream::media_stream_handler;
pub use twiml::outgoing_call_handler;
