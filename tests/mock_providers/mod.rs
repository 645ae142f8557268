//! Test doubles for both relay legs.
//!
//! - `fake_legs` - in-memory frame sources and recording sinks for driving a
//!   [`RelayCoordinator`](voxbridge::RelayCoordinator) directly
//! - `realtime_mock` - a WebSocket server that speaks enough of the realtime
//!   protocol to stand in for the speech-AI endpoint

// Each test binary uses a different subset of these helpers
#![allow(dead_code)]

pub mod fake_legs;
pub mod realtime_mock;

use std::time::Duration;

/// Poll `cond` until it holds or `within` elapses.
pub async fn wait_until(within: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}
