use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::{api, twiml};
use crate::state::AppState;
use std::sync::Arc;

/// Create the plain HTTP router
///
/// - `GET /` - health check
/// - `GET|POST /outgoing-call` - call-answer document for the telephony provider
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api::health_check))
        .route(
            "/outgoing-call",
            get(twiml::outgoing_call_handler).post(twiml::outgoing_call_handler),
        )
        .layer(TraceLayer::new_for_http())
}
