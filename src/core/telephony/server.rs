//! Telephony media-stream connection halves.
//!
//! One accepted WebSocket per call, split into a [`TelephonyReceiver`] that
//! yields decoded frames and a [`TelephonySender`] that writes `media` events
//! back to the caller.

use std::fmt;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{Sink, SinkExt, Stream, StreamExt};
use tracing::{debug, info, warn};

use crate::core::codec::{Frame, decode_downstream_wire, encode_downstream_media};
use crate::core::relay::{FrameSource, Leg, MediaSink, RelayError, RelayResult};

/// Split an upgraded telephony socket into relay halves.
pub fn split_socket(
    socket: WebSocket,
) -> (
    TelephonyReceiver<SplitStream<WebSocket>>,
    TelephonySender<SplitSink<WebSocket, Message>>,
) {
    let (sink, stream) = socket.split();
    (TelephonyReceiver::new(stream), TelephonySender::new(sink))
}

/// Inbound half of the telephony connection.
pub struct TelephonyReceiver<S> {
    stream: S,
    ended: bool,
}

impl<S> TelephonyReceiver<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            ended: false,
        }
    }
}

#[async_trait]
impl<S, E> FrameSource for TelephonyReceiver<S>
where
    S: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
    E: fmt::Display + Send,
{
    async fn receive_frame(&mut self) -> Option<Frame> {
        if self.ended {
            return None;
        }

        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    let frame = decode_downstream_wire(&text).unwrap_or_else(|e| {
                        debug!(error = %e, "Failed to decode telephony frame");
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
                    info!(close_frame = ?frame, "Telephony edge closed connection");
                    break;
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                Some(Err(e)) => {
                    warn!(error = %e, "Telephony WebSocket error");
                    break;
                }
                None => break,
            }
        }

        self.ended = true;
        None
    }
}

/// Outbound half of the telephony connection.
pub struct TelephonySender<K> {
    sink: K,
    closed: bool,
}

impl<K> TelephonySender<K> {
    pub fn new(sink: K) -> Self {
        Self {
            sink,
            closed: false,
        }
    }
}

#[async_trait]
impl<K> MediaSink for TelephonySender<K>
where
    K: Sink<Message> + Unpin + Send + 'static,
    K::Error: fmt::Display + Send,
{
    async fn send_media(&mut self, stream_sid: &str, payload: &str) -> RelayResult<()> {
        if self.closed {
            return Err(RelayError::NotConnected);
        }
        let text = encode_downstream_media(stream_sid, payload)?;
        match self.sink.send(Message::Text(text.into())).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.closed = true;
                Err(RelayError::send(Leg::Downstream, e))
            }
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.sink.close().await {
            debug!(error = %e, "Telephony connection already closed");
        }
    }
}
