//! Admission control for `/media-stream`.
//!
//! Every accepted call holds one slot for its whole relay session. Slots are
//! capped globally (`max_websocket_connections`) and per caller address
//! (`max_connections_per_ip`). Mount it with
//! `axum::middleware::from_fn_with_state(state, connection_limit_middleware)`.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::state::{AppState, ConnectionLimitError};

/// Caller address whose slot the media-stream handler now owns.
#[derive(Clone, Copy, Debug)]
pub struct ClientIp(pub IpAddr);

/// Reserve a call slot before the media-stream upgrade runs.
///
/// Refuses with 503 when the server is full and 429 when the caller address
/// already holds its share. On success the handler receives [`ClientIp`] and
/// takes over the slot; if it answers with anything but 101 the slot is
/// returned here. Requests without `Upgrade: websocket` are not counted.
pub async fn connection_limit_middleware(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let is_ws_upgrade = request
        .headers()
        .get("upgrade")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("websocket"))
        .unwrap_or(false);

    if !is_ws_upgrade {
        return next.run(request).await;
    }

    let client_ip = addr.ip();

    match state.try_acquire_connection(client_ip) {
        Ok(()) => {
            request.extensions_mut().insert(ClientIp(client_ip));
            let response = next.run(request).await;
            if response.status() != StatusCode::SWITCHING_PROTOCOLS {
                state.release_connection(client_ip);
            }
            response
        }
        Err(ConnectionLimitError::GlobalLimitReached) => {
            tracing::warn!(
                ip = %client_ip,
                "Refusing call stream: server at capacity"
            );
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "No call capacity available",
            )
                .into_response()
        }
        Err(ConnectionLimitError::PerIpLimitReached) => {
            tracing::warn!(
                ip = %client_ip,
                "Refusing call stream: per-address limit reached"
            );
            (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many concurrent call streams from this address",
            )
                .into_response()
        }
    }
}
