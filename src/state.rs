//! Shared application state.

use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use thiserror::Error;
use tracing::debug;

use crate::config::ServerConfig;
use crate::core::prompts::{FilePromptProvider, PromptProvider};
use crate::core::realtime::{RealtimeConnector, SessionConfigBuilder};

/// Reasons a new media-stream connection is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConnectionLimitError {
    #[error("global WebSocket connection limit reached")]
    GlobalLimitReached,
    #[error("per-IP connection limit reached")]
    PerIpLimitReached,
}

/// State shared by every request handler.
///
/// Relay sessions share nothing with each other; the only mutable state here
/// is connection accounting.
pub struct AppState {
    pub config: ServerConfig,
    pub prompts: Arc<dyn PromptProvider>,
    pub session_builder: SessionConfigBuilder,
    ws_connections: AtomicUsize,
    ip_connections: DashMap<IpAddr, u32>,
}

impl AppState {
    /// State with prompts read from the configured directory.
    pub fn new(config: ServerConfig) -> Arc<Self> {
        let prompts = FilePromptProvider::new(config.prompts.dir.clone());
        debug!(dir = %prompts.dir().display(), "Loading prompts from directory");
        Self::with_prompt_provider(config, Arc::new(prompts))
    }

    pub fn with_prompt_provider(
        config: ServerConfig,
        prompts: Arc<dyn PromptProvider>,
    ) -> Arc<Self> {
        let session_builder = SessionConfigBuilder::from_settings(&config.session);
        Arc::new(Self {
            config,
            prompts,
            session_builder,
            ws_connections: AtomicUsize::new(0),
            ip_connections: DashMap::new(),
        })
    }

    /// Connector for a new realtime session.
    pub fn realtime_connector(&self) -> RealtimeConnector {
        RealtimeConnector::new(&self.config.realtime, self.config.openai_api_key.clone())
    }

    /// Reserve a connection slot for `ip`.
    pub fn try_acquire_connection(&self, ip: IpAddr) -> Result<(), ConnectionLimitError> {
        let acquired = match self.config.max_websocket_connections {
            Some(max) => self
                .ws_connections
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                    (n < max).then_some(n + 1)
                })
                .is_ok(),
            None => {
                self.ws_connections.fetch_add(1, Ordering::SeqCst);
                true
            }
        };
        if !acquired {
            return Err(ConnectionLimitError::GlobalLimitReached);
        }

        let mut count = self.ip_connections.entry(ip).or_insert(0);
        if *count >= self.config.max_connections_per_ip {
            drop(count);
            self.decrement_global();
            return Err(ConnectionLimitError::PerIpLimitReached);
        }
        *count += 1;
        Ok(())
    }

    /// Return a slot reserved by [`try_acquire_connection`](Self::try_acquire_connection).
    pub fn release_connection(&self, ip: IpAddr) {
        self.decrement_global();

        if let Some(mut count) = self.ip_connections.get_mut(&ip) {
            *count = count.saturating_sub(1);
        }
        self.ip_connections.remove_if(&ip, |_, count| *count == 0);
        debug!(ip = %ip, "Released connection slot");
    }

    fn decrement_global(&self) {
        let _ = self
            .ws_connections
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    pub fn ws_connection_count(&self) -> usize {
        self.ws_connections.load(Ordering::SeqCst)
    }

    pub fn ip_connection_count(&self, ip: &IpAddr) -> u32 {
        self.ip_connections.get(ip).map(|c| *c).unwrap_or(0)
    }
}

/// Releases its connection slot when dropped.
pub struct ConnectionSlot {
    state: Arc<AppState>,
    ip: IpAddr,
}

impl ConnectionSlot {
    pub fn new(state: Arc<AppState>, ip: IpAddr) -> Self {
        Self { state, ip }
    }
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.state.release_connection(self.ip);
    }
}
