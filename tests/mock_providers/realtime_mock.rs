//! Mock realtime speech endpoint.
//!
//! Accepts WebSocket connections, records the handshake headers and every
//! client event, and echoes each `input_audio_buffer.append` back as a
//! `response.audio.delta` so audio makes a full round trip.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    accept_hdr_async,
    tungstenite::{
        Message,
        handshake::server::{ErrorResponse, Request, Response},
    },
};

/// What the mock saw.
#[derive(Default)]
pub struct RealtimeMockState {
    pub authorization: Mutex<Option<String>>,
    pub protocol_version: Mutex<Option<String>>,
    pub request_uri: Mutex<Option<String>>,
    pub events: Mutex<Vec<Value>>,
    pub closed: Mutex<bool>,
}

impl RealtimeMockState {
    pub fn events(&self) -> Vec<Value> {
        self.events.lock().unwrap().clone()
    }

    pub fn event_types(&self) -> Vec<String> {
        self.events()
            .iter()
            .filter_map(|e| e["type"].as_str().map(str::to_string))
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }
}

/// Bind on an ephemeral port and serve connections until the test ends.
pub async fn spawn_realtime_mock() -> (SocketAddr, Arc<RealtimeMockState>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = Arc::new(RealtimeMockState::default());

    let server_state = state.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let state = server_state.clone();
            tokio::spawn(async move {
                let _ = handle_connection(stream, state).await;
            });
        }
    });

    (addr, state)
}

async fn handle_connection(
    stream: TcpStream,
    state: Arc<RealtimeMockState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let handshake_state = state.clone();
    let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        *handshake_state.authorization.lock().unwrap() = header("authorization");
        *handshake_state.protocol_version.lock().unwrap() = header("openai-beta");
        *handshake_state.request_uri.lock().unwrap() = Some(req.uri().to_string());
        Ok(resp)
    };

    let ws_stream = accept_hdr_async(stream, callback).await?;
    let (mut write, mut read) = ws_stream.split();

    while let Some(msg) = read.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let event: Value = serde_json::from_str(text.as_str())?;
                let event_type = event["type"].as_str().unwrap_or_default().to_string();
                let audio = event["audio"].as_str().map(str::to_string);
                state.events.lock().unwrap().push(event);

                match event_type.as_str() {
                    "session.update" => {
                        let updated = json!({
                            "type": "session.updated",
                            "event_id": "evt_session",
                            "session": {}
                        });
                        write.send(Message::Text(updated.to_string().into())).await?;
                    }
                    "input_audio_buffer.append" => {
                        let delta = json!({
                            "type": "response.audio.delta",
                            "event_id": "evt_delta",
                            "response_id": "resp_1",
                            "item_id": "item_1",
                            "output_index": 0,
                            "content_index": 0,
                            "delta": audio.unwrap_or_default(),
                        });
                        write.send(Message::Text(delta.to_string().into())).await?;
                    }
                    _ => {}
                }
            }
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }

    *state.closed.lock().unwrap() = true;
    Ok(())
}
