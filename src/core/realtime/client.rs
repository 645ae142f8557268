//! Speech-AI realtime WebSocket client.
//!
//! # API Reference
//!
//! - Endpoint: `wss://api.openai.com/v1/realtime?model=<model>`
//! - Auth: `Authorization: Bearer <key>` plus the `OpenAI-Beta` protocol header
//! - Protocol: WebSocket with JSON text events
//!
//! The connection is split after the handshake. [`RealtimeSender`] owns the
//! write half and enforces that `session.update` goes out exactly once and
//! before any audio; [`RealtimeReceiver`] owns the read half and turns every
//! text frame into a [`Frame`].

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

use super::config::PROTOCOL_VERSION_HEADER;
use super::messages::SessionConfig;
use crate::config::{ApiKey, RealtimeSettings};
use crate::core::codec::{Frame, decode_upstream_wire, encode_session_update, encode_upstream_append};
use crate::core::relay::{
    AudioSink, FrameSource, Leg, RelayError, RelayResult, UpstreamConnector,
};

type RealtimeSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

// =============================================================================
// Connector
// =============================================================================

/// Opens one realtime session per call.
#[derive(Clone)]
pub struct RealtimeConnector {
    base_url: String,
    model: String,
    protocol_version: String,
    connect_timeout: Duration,
    api_key: Option<ApiKey>,
}

impl fmt::Debug for RealtimeConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RealtimeConnector")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("protocol_version", &self.protocol_version)
            .field("connect_timeout", &self.connect_timeout)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl RealtimeConnector {
    pub fn new(settings: &RealtimeSettings, api_key: Option<ApiKey>) -> Self {
        Self {
            base_url: settings.url.clone(),
            model: settings.model.clone(),
            protocol_version: settings.protocol_version.clone(),
            connect_timeout: settings.connect_timeout,
            api_key,
        }
    }

    /// Endpoint URL with the `model` query parameter appended.
    pub fn endpoint_url(&self) -> RelayResult<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            RelayError::ConnectionEstablish(format!("invalid realtime URL '{}': {e}", self.base_url))
        })?;
        if !self.model.is_empty() {
            url.query_pairs_mut().append_pair("model", &self.model);
        }
        Ok(url)
    }

    async fn open(&self) -> RelayResult<RealtimeSocket> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            RelayError::ConnectionEstablish("no realtime API key configured".to_string())
        })?;
        let url = self.endpoint_url()?;

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| RelayError::ConnectionEstablish(e.to_string()))?;
        let headers = request.headers_mut();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key.expose()))
                .map_err(|e| RelayError::ConnectionEstablish(format!("invalid API key: {e}")))?,
        );
        headers.insert(
            PROTOCOL_VERSION_HEADER,
            HeaderValue::from_str(&self.protocol_version).map_err(|e| {
                RelayError::ConnectionEstablish(format!("invalid protocol version: {e}"))
            })?,
        );

        let connect = tokio_tungstenite::connect_async(request);
        let (socket, _response) = tokio::time::timeout(self.connect_timeout, connect)
            .await
            .map_err(|_| {
                RelayError::ConnectionEstablish(format!(
                    "timed out after {:?} connecting to {}",
                    self.connect_timeout,
                    url.host_str().unwrap_or_default()
                ))
            })?
            .map_err(|e| RelayError::ConnectionEstablish(e.to_string()))?;

        info!(host = url.host_str().unwrap_or_default(), model = %self.model, "Connected to realtime endpoint");
        Ok(socket)
    }
}

#[async_trait]
impl UpstreamConnector for RealtimeConnector {
    type Sink = RealtimeSender<futures::stream::SplitSink<RealtimeSocket, Message>>;
    type Source = RealtimeReceiver<futures::stream::SplitStream<RealtimeSocket>>;

    async fn connect(&self) -> RelayResult<(Self::Sink, Self::Source)> {
        let (sink, stream) = self.open().await?.split();
        Ok((RealtimeSender::new(sink), RealtimeReceiver::new(stream)))
    }
}

// =============================================================================
// Write half
// =============================================================================

/// Outbound half of a realtime session.
pub struct RealtimeSender<K> {
    sink: K,
    config_sent: bool,
    closed: bool,
}

impl<K> RealtimeSender<K>
where
    K: Sink<Message> + Unpin + Send,
    K::Error: fmt::Display + Send,
{
    pub fn new(sink: K) -> Self {
        Self {
            sink,
            config_sent: false,
            closed: false,
        }
    }

    async fn send_text(&mut self, text: String) -> RelayResult<()> {
        if self.closed {
            return Err(RelayError::NotConnected);
        }
        match self.sink.send(Message::Text(text.into())).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.closed = true;
                Err(RelayError::send(Leg::Upstream, e))
            }
        }
    }
}

#[async_trait]
impl<K> AudioSink for RealtimeSender<K>
where
    K: Sink<Message> + Unpin + Send + 'static,
    K::Error: fmt::Display + Send,
{
    async fn send_config(&mut self, config: &SessionConfig) -> RelayResult<()> {
        if self.config_sent {
            return Err(RelayError::OutOfOrder(
                "session configuration already sent".to_string(),
            ));
        }
        let text = encode_session_update(config)?;
        self.send_text(text).await?;
        self.config_sent = true;
        debug!(voice = %config.voice, "Sent session update");
        Ok(())
    }

    async fn send_audio(&mut self, payload: &str) -> RelayResult<()> {
        if !self.config_sent {
            return Err(RelayError::OutOfOrder(
                "audio sent before session configuration".to_string(),
            ));
        }
        let text = encode_upstream_append(payload)?;
        self.send_text(text).await
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.sink.close().await {
            debug!(error = %e, "Realtime connection already closed");
        }
    }
}

// =============================================================================
// Read half
// =============================================================================

/// Inbound half of a realtime session.
pub struct RealtimeReceiver<S> {
    stream: S,
    ended: bool,
}

impl<S> RealtimeReceiver<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            ended: false,
        }
    }
}

#[async_trait]
impl<S> FrameSource for RealtimeReceiver<S>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin + Send + 'static,
{
    async fn receive_frame(&mut self) -> Option<Frame> {
        if self.ended {
            return None;
        }

        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    let frame = decode_upstream_wire(&text).unwrap_or_else(|e| {
                        debug!(error = %e, "Failed to decode realtime frame");
                        Frame::Unknown {
                            raw: text.as_str().to_owned(),
                        }
                    });
                    return Some(frame);
                }
                Some(Ok(Message::Binary(data))) => {
                    return Some(Frame::Unknown {
                        raw: format!("<{} bytes binary>", data.len()),
                    });
                }
                Some(Ok(Message::Close(frame))) => {
                    info!(close_frame = ?frame, "Realtime endpoint closed connection");
                    break;
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Err(e)) => {
                    warn!(error = %e, "Realtime WebSocket error");
                    break;
                }
                None => break,
            }
        }

        self.ended = true;
        None
    }
}
