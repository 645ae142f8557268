//! In-memory relay legs.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use voxbridge::{
    AudioSink, Frame, FrameSource, LifecycleKind, MediaSink, RelayError, RelayResult,
    SessionConfig, UpstreamConnector,
};

/// Something a recording sink observed, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Config(SessionConfig),
    Audio(String),
    Media { stream_sid: String, payload: String },
    Closed,
}

pub type Log = Arc<Mutex<Vec<Recorded>>>;

pub fn snapshot(log: &Log) -> Vec<Recorded> {
    log.lock().unwrap().clone()
}

pub fn audio_payloads(log: &Log) -> Vec<String> {
    snapshot(log)
        .into_iter()
        .filter_map(|r| match r {
            Recorded::Audio(p) => Some(p),
            Recorded::Media { payload, .. } => Some(payload),
            _ => None,
        })
        .collect()
}

pub fn close_count(log: &Log) -> usize {
    snapshot(log)
        .iter()
        .filter(|r| matches!(r, Recorded::Closed))
        .count()
}

// ============================================================================
// Frame sources
// ============================================================================

/// Yields whatever the test pushes; ends when every [`FrameFeed`] is dropped.
pub struct ChannelSource {
    rx: mpsc::UnboundedReceiver<Frame>,
}

#[async_trait]
impl FrameSource for ChannelSource {
    async fn receive_frame(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }
}

/// Test-side handle feeding a [`ChannelSource`].
#[derive(Clone)]
pub struct FrameFeed {
    tx: mpsc::UnboundedSender<Frame>,
}

impl FrameFeed {
    pub fn push(&self, frame: Frame) {
        let _ = self.tx.send(frame);
    }

    pub fn start(&self, stream_sid: &str) {
        self.push(Frame::StreamLifecycle {
            kind: LifecycleKind::Start,
            stream_id: stream_sid.to_string(),
        });
    }

    pub fn stop(&self, stream_sid: &str) {
        self.push(Frame::StreamLifecycle {
            kind: LifecycleKind::Stop,
            stream_id: stream_sid.to_string(),
        });
    }

    pub fn audio(&self, payload: &str) {
        self.push(Frame::AudioChunk {
            payload: payload.to_string(),
        });
    }
}

pub fn frame_channel() -> (FrameFeed, ChannelSource) {
    let (tx, rx) = mpsc::unbounded_channel();
    (FrameFeed { tx }, ChannelSource { rx })
}

// ============================================================================
// Recording sinks
// ============================================================================

/// Telephony-side sink. Fails every send after `fail_after` successes.
pub struct RecordingMediaSink {
    pub log: Log,
    fail_after: Option<usize>,
    sent: usize,
}

impl RecordingMediaSink {
    pub fn new() -> Self {
        Self {
            log: Log::default(),
            fail_after: None,
            sent: 0,
        }
    }

    pub fn failing_after(sent: usize) -> Self {
        Self {
            fail_after: Some(sent),
            ..Self::new()
        }
    }
}

#[async_trait]
impl MediaSink for RecordingMediaSink {
    async fn send_media(&mut self, stream_sid: &str, payload: &str) -> RelayResult<()> {
        if self.fail_after.is_some_and(|n| self.sent >= n) {
            return Err(RelayError::send(
                voxbridge::Leg::Downstream,
                "telephony socket reset",
            ));
        }
        self.sent += 1;
        self.log.lock().unwrap().push(Recorded::Media {
            stream_sid: stream_sid.to_string(),
            payload: payload.to_string(),
        });
        Ok(())
    }

    async fn close(&mut self) {
        self.log.lock().unwrap().push(Recorded::Closed);
    }
}

/// Speech-AI-side sink.
pub struct RecordingAudioSink {
    pub log: Log,
    fail_config: bool,
    hang_on_close: bool,
}

impl RecordingAudioSink {
    pub fn new() -> Self {
        Self {
            log: Log::default(),
            fail_config: false,
            hang_on_close: false,
        }
    }

    pub fn rejecting_config() -> Self {
        Self {
            fail_config: true,
            ..Self::new()
        }
    }

    /// A peer that never finishes the closing handshake.
    pub fn stuck_on_close() -> Self {
        Self {
            hang_on_close: true,
            ..Self::new()
        }
    }
}

#[async_trait]
impl AudioSink for RecordingAudioSink {
    async fn send_config(&mut self, config: &SessionConfig) -> RelayResult<()> {
        if self.fail_config {
            return Err(RelayError::send(voxbridge::Leg::Upstream, "broken pipe"));
        }
        self.log
            .lock()
            .unwrap()
            .push(Recorded::Config(config.clone()));
        Ok(())
    }

    async fn send_audio(&mut self, payload: &str) -> RelayResult<()> {
        self.log
            .lock()
            .unwrap()
            .push(Recorded::Audio(payload.to_string()));
        Ok(())
    }

    async fn close(&mut self) {
        if self.hang_on_close {
            std::future::pending::<()>().await;
        }
        self.log.lock().unwrap().push(Recorded::Closed);
    }
}

// ============================================================================
// Connector
// ============================================================================

/// Hands out one prepared upstream leg, or refuses to connect.
pub struct FakeConnector {
    halves: Mutex<Option<(RecordingAudioSink, ChannelSource)>>,
}

impl FakeConnector {
    pub fn new(sink: RecordingAudioSink, source: ChannelSource) -> Self {
        Self {
            halves: Mutex::new(Some((sink, source))),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            halves: Mutex::new(None),
        }
    }
}

#[async_trait]
impl UpstreamConnector for FakeConnector {
    type Sink = RecordingAudioSink;
    type Source = ChannelSource;

    async fn connect(&self) -> RelayResult<(Self::Sink, Self::Source)> {
        self.halves.lock().unwrap().take().ok_or_else(|| {
            RelayError::ConnectionEstablish("connection refused".to_string())
        })
    }
}
