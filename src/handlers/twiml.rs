//! Call-answer document for the telephony provider.
//!
//! When the provider picks up a call it fetches this document, speaks the
//! greeting and then opens a media stream back to `/media-stream`.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::state::AppState;

const MEDIA_STREAM_PATH: &str = "/media-stream";

/// `GET|POST /outgoing-call`
pub async fn outgoing_call_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let host = headers.get(header::HOST).and_then(|v| v.to_str().ok());

    let Some(stream_url) = media_stream_url(state.config.public_url.as_deref(), host) else {
        warn!("Cannot build media stream URL: no public URL configured and no Host header");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Public URL is not configured",
        )
            .into_response();
    };
    debug!(stream_url = %stream_url, "Answering call with media stream");

    let twiml = &state.config.twiml;
    let body = render_connect_stream(&twiml.greeting, &twiml.voice, &stream_url);
    ([(header::CONTENT_TYPE, "application/xml")], body).into_response()
}

/// WebSocket URL the provider should stream call audio to.
///
/// Uses `public_url` when configured (`https` becomes `wss`, `http` becomes
/// `ws`, a bare host gets `wss`), otherwise falls back to the request host.
pub fn media_stream_url(public_url: Option<&str>, host: Option<&str>) -> Option<String> {
    let base = match public_url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => {
            let url = url.trim_end_matches('/');
            if let Some(rest) = url.strip_prefix("https://") {
                format!("wss://{rest}")
            } else if let Some(rest) = url.strip_prefix("http://") {
                format!("ws://{rest}")
            } else if url.starts_with("wss://") || url.starts_with("ws://") {
                url.to_string()
            } else {
                format!("wss://{url}")
            }
        }
        None => format!("wss://{}", host.filter(|h| !h.is_empty())?),
    };
    Some(format!("{base}{MEDIA_STREAM_PATH}"))
}

fn render_connect_stream(greeting: &str, voice: &str, stream_url: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<Response><Say voice="{voice}">{greeting}</Say>"#,
            r#"<Connect><Stream url="{url}" /></Connect></Response>"#
        ),
        voice = encode_double_quoted_attribute(voice),
        greeting = encode_text(greeting),
        url = encode_double_quoted_attribute(stream_url),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_stream_url_from_public_url() {
        assert_eq!(
            media_stream_url(Some("https://abc.ngrok.app/"), None).as_deref(),
            Some("wss://abc.ngrok.app/media-stream")
        );
        assert_eq!(
            media_stream_url(Some("http://localhost:5000"), None).as_deref(),
            Some("ws://localhost:5000/media-stream")
        );
        assert_eq!(
            media_stream_url(Some("abc.ngrok.app"), Some("ignored")).as_deref(),
            Some("wss://abc.ngrok.app/media-stream")
        );
    }

    #[test]
    fn test_media_stream_url_falls_back_to_host() {
        assert_eq!(
            media_stream_url(None, Some("relay.example.com")).as_deref(),
            Some("wss://relay.example.com/media-stream")
        );
        assert_eq!(media_stream_url(Some("  "), None), None);
    }

    #[test]
    fn test_render_escapes_content() {
        let xml = render_connect_stream("Hi & welcome", "alice", "wss://h/media-stream");
        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#));
        assert!(xml.contains(r#"<Say voice="alice">Hi &amp; welcome</Say>"#));
        assert!(xml.contains(r#"<Connect><Stream url="wss://h/media-stream" /></Connect>"#));
    }

    #[test]
    fn test_render_escapes_attribute_quotes() {
        let xml = render_connect_stream(
            "Say \"hello\" <now>",
            r#"alice" extra="1"#,
            "wss://h/media-stream?a=1&b=2",
        );
        assert!(xml.contains(r#"<Say voice="alice&quot; extra=&quot;1">"#));
        assert!(xml.contains(r#">Say "hello" &lt;now&gt;</Say>"#));
        assert!(xml.contains(r#"<Stream url="wss://h/media-stream?a=1&amp;b=2" />"#));
    }
}
