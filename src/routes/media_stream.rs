//! Media-stream WebSocket route configuration

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::media_stream_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the media-stream WebSocket router
///
/// # Endpoint
///
/// `GET /media-stream` - WebSocket upgrade for one call's audio
///
/// # Protocol
///
/// The telephony provider sends JSON text frames tagged by `event`
/// (`connected`, `start`, `media`, `mark`, `stop`). Caller audio from `media`
/// events is relayed to the realtime speech service; audio coming back is
/// sent as `{"event":"media","streamSid":...,"media":{"payload":...}}`.
///
/// Connection limits are applied in `main`.
pub fn create_media_stream_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/media-stream", get(media_stream_handler))
        .layer(TraceLayer::new_for_http())
}
