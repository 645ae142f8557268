//! Relay session lifecycle.

use std::fmt;

use super::base::Leg;

/// Lifecycle state of one relay session.
///
/// ```text
/// Connecting -> ConfigSent -> Streaming -> ClosingDownstream | ClosingUpstream -> Closed
///      |                                                                          ^
///      `---------------------- connect or configure failure ----------------------'
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Upstream connection being established
    #[default]
    Connecting,
    /// Session configuration sent upstream
    ConfigSent,
    /// Both drain tasks running
    Streaming,
    /// Downstream ended first, both legs being closed
    ClosingDownstream,
    /// Upstream ended first, both legs being closed
    ClosingUpstream,
    /// Terminal
    Closed,
}

impl SessionState {
    /// Closing state entered when `leg` is the first to end.
    pub fn closing_for(leg: Leg) -> Self {
        match leg {
            Leg::Downstream => Self::ClosingDownstream,
            Leg::Upstream => Self::ClosingUpstream,
        }
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Connecting, ConfigSent)
                | (Connecting, Closed)
                | (ConfigSent, Streaming)
                | (Streaming, ClosingDownstream)
                | (Streaming, ClosingUpstream)
                | (ClosingDownstream, Closed)
                | (ClosingUpstream, Closed)
        )
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::ConfigSent => "config_sent",
            Self::Streaming => "streaming",
            Self::ClosingDownstream => "closing_downstream",
            Self::ClosingUpstream => "closing_upstream",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let path = [
            SessionState::Connecting,
            SessionState::ConfigSent,
            SessionState::Streaming,
            SessionState::ClosingDownstream,
            SessionState::Closed,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_connect_failure_goes_straight_to_closed() {
        assert!(SessionState::Connecting.can_transition_to(SessionState::Closed));
        assert!(!SessionState::Connecting.can_transition_to(SessionState::Streaming));
    }

    #[test]
    fn test_closed_is_terminal() {
        assert!(SessionState::Closed.is_terminal());
        for next in [
            SessionState::Connecting,
            SessionState::ConfigSent,
            SessionState::Streaming,
            SessionState::ClosingUpstream,
        ] {
            assert!(!SessionState::Closed.can_transition_to(next));
        }
    }

    #[test]
    fn test_streaming_cannot_skip_closing() {
        assert!(!SessionState::Streaming.can_transition_to(SessionState::Closed));
        assert_eq!(
            SessionState::closing_for(Leg::Upstream),
            SessionState::ClosingUpstream
        );
    }
}
