//! Relay coordinator: one instance per accepted telephony connection.
//!
//! The coordinator opens the speech-AI leg, sends the session configuration,
//! then runs two drain tasks until either leg ends:
//!
//! - downstream drain: telephony frames -> speech-AI `send_audio`
//! - upstream drain: speech-AI frames -> telephony `send_media`
//!
//! The tasks share nothing but [`RelayShared`]: a single-assignment cell for
//! the stream id, a single-assignment cell recording which leg ended first,
//! a cancellation token and counters. Whichever task finishes first cancels
//! the token, which unblocks the other one, and the coordinator then closes
//! both legs concurrently, giving each at most the close timeout.

use std::future::Future;
use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use once_cell::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, error, info, trace, warn};

use super::base::{AudioSink, FrameSource, Leg, MediaSink, RelayResult, UpstreamConnector};
use super::state::SessionState;
use crate::core::codec::{Frame, LifecycleKind, is_logged_event};
use crate::core::realtime::SessionConfig;

/// Default upper bound on closing one leg at teardown.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Per-session frame counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayCounters {
    /// Audio chunks forwarded to the speech-AI leg
    pub audio_to_upstream: u64,
    /// Audio chunks forwarded to the telephony leg
    pub audio_to_downstream: u64,
    /// Upstream audio dropped because no stream had started yet
    pub dropped_before_start: u64,
    /// Unrecognized or undecodable frames dropped on either leg
    pub dropped_unknown: u64,
}

/// Summary of a finished session.
#[derive(Debug, Clone)]
pub struct SessionReport {
    /// Stream id learned from the telephony `start` event, if any
    pub stream_sid: Option<String>,
    /// Leg whose end triggered teardown
    pub closed_by: Leg,
    pub counters: RelayCounters,
    /// Every state the session went through, in order
    pub transitions: Vec<SessionState>,
}

/// State shared by the two drain tasks.
#[derive(Default)]
struct RelayShared {
    stream_sid: OnceCell<String>,
    first_closed: OnceCell<Leg>,
    cancel: CancellationToken,
    audio_to_upstream: AtomicU64,
    audio_to_downstream: AtomicU64,
    dropped_before_start: AtomicU64,
    dropped_unknown: AtomicU64,
}

impl RelayShared {
    /// Record that `leg` ended and stop both drain tasks.
    fn end(&self, leg: Leg) {
        if self.first_closed.set(leg).is_ok() {
            debug!(leg = %leg, peer = %leg.peer(), "Leg ended, tearing down session");
        }
        self.cancel.cancel();
    }

    fn counters(&self) -> RelayCounters {
        RelayCounters {
            audio_to_upstream: self.audio_to_upstream.load(Ordering::Relaxed),
            audio_to_downstream: self.audio_to_downstream.load(Ordering::Relaxed),
            dropped_before_start: self.dropped_before_start.load(Ordering::Relaxed),
            dropped_unknown: self.dropped_unknown.load(Ordering::Relaxed),
        }
    }
}

/// Bridges one telephony connection with one speech-AI session.
pub struct RelayCoordinator<C: UpstreamConnector> {
    connector: C,
    session_config: SessionConfig,
    close_timeout: Duration,
    state: SessionState,
    transitions: Vec<SessionState>,
}

impl<C: UpstreamConnector> RelayCoordinator<C> {
    pub fn new(connector: C, session_config: SessionConfig) -> Self {
        Self {
            connector,
            session_config,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
            state: SessionState::Connecting,
            transitions: vec![SessionState::Connecting],
        }
    }

    /// Bound each leg's close at teardown by `timeout`.
    pub fn with_close_timeout(mut self, timeout: Duration) -> Self {
        self.close_timeout = timeout;
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        if self.state.is_terminal() {
            warn!(to = %next, "Ignoring transition out of closed session");
            return;
        }
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        debug!(from = %self.state, to = %next, "Session state transition");
        self.state = next;
        self.transitions.push(next);
    }

    /// Run the session to completion.
    ///
    /// Returns an error only when the speech-AI leg cannot be established or
    /// configured; in that case the telephony leg has already been closed.
    /// Every other ending, including send failures, is a normal teardown and
    /// is described by the returned report.
    pub async fn run<D, M>(
        mut self,
        downstream_source: D,
        mut downstream_sink: M,
    ) -> RelayResult<SessionReport>
    where
        D: FrameSource,
        M: MediaSink,
    {
        let (mut upstream_sink, upstream_source) = match self.connector.connect().await {
            Ok(halves) => halves,
            Err(e) => {
                error!(error = %e, "Failed to connect to realtime endpoint");
                close_within(Leg::Downstream, self.close_timeout, downstream_sink.close()).await;
                self.transition(SessionState::Closed);
                return Err(e);
            }
        };

        if let Err(e) = upstream_sink.send_config(&self.session_config).await {
            error!(error = %e, "Failed to send session configuration");
            tokio::join!(
                close_within(Leg::Upstream, self.close_timeout, upstream_sink.close()),
                close_within(Leg::Downstream, self.close_timeout, downstream_sink.close()),
            );
            self.transition(SessionState::Closed);
            return Err(e);
        }
        self.transition(SessionState::ConfigSent);

        let shared = Arc::new(RelayShared::default());
        self.transition(SessionState::Streaming);
        info!("Relay session streaming");

        let downstream_task = tokio::spawn(
            drain_downstream(shared.clone(), downstream_source, upstream_sink).in_current_span(),
        );
        let upstream_task = tokio::spawn(
            drain_upstream(shared.clone(), upstream_source, downstream_sink).in_current_span(),
        );

        let (upstream_sink, downstream_sink) = tokio::join!(downstream_task, upstream_task);

        // A task that panicked never recorded its leg; blame the panicking side.
        let closed_by = match shared.first_closed.get() {
            Some(leg) => *leg,
            None if upstream_sink.is_err() => Leg::Downstream,
            None => Leg::Upstream,
        };
        self.transition(SessionState::closing_for(closed_by));

        // Neither leg may hold the other open
        let close_timeout = self.close_timeout;
        let close_upstream = async move {
            match upstream_sink {
                Ok(mut sink) => close_within(Leg::Upstream, close_timeout, sink.close()).await,
                Err(e) => error!(error = %e, "Downstream drain task failed"),
            }
        };
        let close_downstream = async move {
            match downstream_sink {
                Ok(mut sink) => close_within(Leg::Downstream, close_timeout, sink.close()).await,
                Err(e) => error!(error = %e, "Upstream drain task failed"),
            }
        };
        tokio::join!(close_upstream, close_downstream);
        self.transition(SessionState::Closed);

        let report = SessionReport {
            stream_sid: shared.stream_sid.get().cloned(),
            closed_by,
            counters: shared.counters(),
            transitions: self.transitions,
        };
        info!(
            closed_by = %report.closed_by,
            audio_to_upstream = report.counters.audio_to_upstream,
            audio_to_downstream = report.counters.audio_to_downstream,
            dropped_before_start = report.counters.dropped_before_start,
            dropped_unknown = report.counters.dropped_unknown,
            "Relay session closed"
        );
        Ok(report)
    }
}

/// Close one leg, abandoning it if it does not finish within `limit`.
async fn close_within<F>(leg: Leg, limit: Duration, close: F)
where
    F: Future<Output = ()>,
{
    if tokio::time::timeout(limit, close).await.is_err() {
        warn!(leg = %leg, timeout = ?limit, "Leg did not close in time, abandoning it");
    }
}

/// Telephony -> speech-AI. Hands the speech-AI sink back for closing.
async fn drain_downstream<D, A>(shared: Arc<RelayShared>, mut source: D, mut sink: A) -> A
where
    D: FrameSource,
    A: AudioSink,
{
    // Also cancels the peer task if this one unwinds
    let _guard = shared.cancel.clone().drop_guard();

    loop {
        let flow = tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => break,
            flow = forward_downstream(&shared, &mut source, &mut sink) => flow,
        };
        if flow.is_break() {
            break;
        }
    }
    sink
}

async fn forward_downstream<D, A>(
    shared: &RelayShared,
    source: &mut D,
    sink: &mut A,
) -> ControlFlow<()>
where
    D: FrameSource,
    A: AudioSink,
{
    let Some(frame) = source.receive_frame().await else {
        info!("Telephony stream closed");
        shared.end(Leg::Downstream);
        return ControlFlow::Break(());
    };

    match frame {
        Frame::AudioChunk { payload } => {
            if let Err(e) = sink.send_audio(&payload).await {
                warn!(error = %e, "Failed to forward audio to realtime endpoint");
                shared.end(Leg::Upstream);
                return ControlFlow::Break(());
            }
            shared.audio_to_upstream.fetch_add(1, Ordering::Relaxed);
        }
        Frame::StreamLifecycle {
            kind: LifecycleKind::Start,
            stream_id,
        } => match shared.stream_sid.set(stream_id) {
            Ok(()) => {
                if let Some(sid) = shared.stream_sid.get() {
                    Span::current().record("stream_sid", sid.as_str());
                    info!(stream_sid = %sid, "Incoming stream has started");
                }
            }
            Err(duplicate) => {
                warn!(ignored = %duplicate, "Stream already started, ignoring repeated start");
            }
        },
        Frame::StreamLifecycle {
            kind: LifecycleKind::Stop,
            stream_id,
        } => {
            info!(stream_sid = %stream_id, "Incoming stream has stopped");
            shared.end(Leg::Downstream);
            return ControlFlow::Break(());
        }
        Frame::Diagnostic { name, detail } => {
            debug!(event = name, detail = ?detail, "Telephony event");
        }
        Frame::Unknown { raw } => {
            shared.dropped_unknown.fetch_add(1, Ordering::Relaxed);
            debug!(frame = %raw, "Dropping unrecognized telephony frame");
        }
    }
    ControlFlow::Continue(())
}

/// Speech-AI -> telephony. Hands the telephony sink back for closing.
async fn drain_upstream<U, M>(shared: Arc<RelayShared>, mut source: U, mut sink: M) -> M
where
    U: FrameSource,
    M: MediaSink,
{
    let _guard = shared.cancel.clone().drop_guard();

    loop {
        let flow = tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => break,
            flow = forward_upstream(&shared, &mut source, &mut sink) => flow,
        };
        if flow.is_break() {
            break;
        }
    }
    sink
}

async fn forward_upstream<U, M>(
    shared: &RelayShared,
    source: &mut U,
    sink: &mut M,
) -> ControlFlow<()>
where
    U: FrameSource,
    M: MediaSink,
{
    let Some(frame) = source.receive_frame().await else {
        info!("Realtime connection closed");
        shared.end(Leg::Upstream);
        return ControlFlow::Break(());
    };

    match frame {
        Frame::AudioChunk { payload } => {
            let Some(sid) = shared.stream_sid.get() else {
                shared.dropped_before_start.fetch_add(1, Ordering::Relaxed);
                debug!("Dropping audio delta received before stream start");
                return ControlFlow::Continue(());
            };
            if let Err(e) = sink.send_media(sid, &payload).await {
                warn!(error = %e, "Failed to forward audio to telephony stream");
                shared.end(Leg::Downstream);
                return ControlFlow::Break(());
            }
            shared.audio_to_downstream.fetch_add(1, Ordering::Relaxed);
        }
        Frame::Diagnostic {
            name: "error",
            detail,
        } => {
            warn!(detail = detail.as_deref().unwrap_or(""), "Realtime endpoint reported an error");
        }
        Frame::Diagnostic { name, .. } if is_logged_event(name) => {
            info!(event = name, "Received realtime event");
        }
        Frame::Diagnostic { name, .. } => {
            trace!(event = name, "Ignoring realtime event");
        }
        Frame::StreamLifecycle { .. } => {
            trace!("Ignoring lifecycle frame on realtime leg");
        }
        Frame::Unknown { raw } => {
            shared.dropped_unknown.fetch_add(1, Ordering::Relaxed);
            debug!(frame = %raw, "Dropping unrecognized realtime frame");
        }
    }
    ControlFlow::Continue(())
}
