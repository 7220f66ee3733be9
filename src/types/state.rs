//! Session connection state definitions

use serde::{Deserialize, Serialize};

/// Lifecycle of the chat connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// No transport yet, or the last one was lost
    Disconnected,
    /// Attempting a transport connection, with backoff between attempts
    Connecting,
    /// Credential and identity handshake sent
    Authenticated,
    /// Channel join sent
    Joined,
    /// Reading and moderating chat
    Active,
    /// Shut down; terminal
    Closed,
}

impl SessionState {
    /// Can move to `next` from here
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        use SessionState::*;
        match (self, next) {
            (Closed, _) => false,
            (_, Closed) | (_, Disconnected) => true,
            (Disconnected, Connecting) => true,
            (Connecting, Authenticated) => true,
            (Authenticated, Joined) => true,
            (Joined, Active) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Disconnected => "DISCONNECTED",
            SessionState::Connecting => "CONNECTING",
            SessionState::Authenticated => "AUTHENTICATED",
            SessionState::Joined => "JOINED",
            SessionState::Active => "ACTIVE",
            SessionState::Closed => "CLOSED",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_path() {
        assert!(SessionState::Disconnected.can_transition_to(SessionState::Connecting));
        assert!(SessionState::Connecting.can_transition_to(SessionState::Authenticated));
        assert!(SessionState::Authenticated.can_transition_to(SessionState::Joined));
        assert!(SessionState::Joined.can_transition_to(SessionState::Active));
    }

    #[test]
    fn test_active_can_drop_back() {
        assert!(SessionState::Active.can_transition_to(SessionState::Disconnected));
        assert!(!SessionState::Active.can_transition_to(SessionState::Joined));
    }

    #[test]
    fn test_closed_is_terminal() {
        assert!(!SessionState::Closed.can_transition_to(SessionState::Connecting));
    }
}
