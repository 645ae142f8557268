//! Media-stream WebSocket handler
//!
//! Each upgraded socket is one call: the handler splits it into relay halves,
//! builds the session configuration and hands both to a [`RelayCoordinator`]
//! that runs until either side hangs up.

use axum::{
    Extension,
    extract::{
        State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use std::sync::Arc;
use tracing::{Instrument, error, field, info, info_span};
use uuid::Uuid;

use crate::core::relay::RelayCoordinator;
use crate::core::telephony::split_socket;
use crate::middleware::ClientIp;
use crate::state::{AppState, ConnectionSlot};

/// Maximum WebSocket frame size (1 MB)
const MAX_WS_FRAME_SIZE: usize = 1024 * 1024;

/// Maximum WebSocket message size (1 MB)
const MAX_WS_MESSAGE_SIZE: usize = 1024 * 1024;

/// `GET /media-stream`
pub async fn media_stream_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    client_ip: Option<Extension<ClientIp>>,
) -> Response {
    // Slot reserved by the connection limit middleware, released when the session ends
    let slot = client_ip.map(|Extension(ClientIp(ip))| ConnectionSlot::new(state.clone(), ip));

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| async move {
            let _slot = slot;
            handle_media_stream(socket, state).await;
        })
}

async fn handle_media_stream(socket: WebSocket, state: Arc<AppState>) {
    let session_id = Uuid::new_v4();
    let span = info_span!(
        "relay_session",
        session_id = %session_id,
        stream_sid = field::Empty
    );

    async move {
        info!("Telephony client connected");

        let (source, sink) = split_socket(socket);
        let prompt = state.prompts.load(&state.config.prompts.system_prompt).await;
        let session_config = state
            .session_builder
            .build(&prompt, &state.config.session.voice);

        let coordinator = RelayCoordinator::new(state.realtime_connector(), session_config)
            .with_close_timeout(state.config.realtime.close_timeout);
        if let Err(e) = coordinator.run(source, sink).await {
            error!(error = %e, "Relay session failed");
        }
    }
    .instrument(span)
    .await
}
