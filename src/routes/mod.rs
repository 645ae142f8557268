pub mod api;
pub mod media_stream;

use axum::{Router, middleware};
use http::HeaderValue;
use std::sync::Arc;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::middleware::connection_limit_middleware;
use crate::state::AppState;

/// Assemble the full application router.
///
/// The connection limiter is a route layer on `/media-stream` only, so unmatched
/// paths fall through to a plain 404.
/// The server must be started with
/// `into_make_service_with_connect_info::<SocketAddr>()` so the limiter can
/// see the peer address.
pub fn create_app(app_state: Arc<AppState>) -> Router {
    let media_routes = media_stream::create_media_stream_router().route_layer(
        middleware::from_fn_with_state(app_state.clone(), connection_limit_middleware),
    );

    let security_headers = tower::ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            http::header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            http::header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ));

    api::create_api_router()
        .merge(media_routes)
        .with_state(app_state)
        .layer(security_headers)
}
