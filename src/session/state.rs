//! Module `state`
//!
//! Lifecycle of one control connection.

use std::fmt;

/// Represents where a control connection is in its lifecycle.
///
/// `Disconnected → Connected → Authenticated → Closed`; a session only ever
/// moves forward and a closed session is never reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
    Authenticated,
    Closed,
}

impl SessionState {
    /// Returns whether commands may still be written in this state.
    pub fn is_open(self) -> bool {
        matches!(self, SessionState::Connected | SessionState::Authenticated)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connected => "connected",
            SessionState::Authenticated => "authenticated",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}
