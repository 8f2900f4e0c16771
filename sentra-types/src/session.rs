//! Observable license session status.

use crate::SessionId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a license session.
///
/// ```text
/// Unauthenticated -> Authenticating -> Authenticated -> Expired | Terminated
///                          |
///                          +-> Unauthenticated (rejected)
/// ```
///
/// `Expired` and `Terminated` are terminal for a session instance; a new
/// login always starts a fresh instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated,
    Expired,
    Terminated,
}

impl SessionState {
    /// Returns true once the session instance can no longer change state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Expired | Self::Terminated)
    }

    /// Returns true if the session currently permits gated work.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }

    /// Stable lowercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticating => "authenticating",
            Self::Authenticated => "authenticated",
            Self::Expired => "expired",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot published to observers whenever the session transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStatus {
    /// The session instance this state belongs to.
    pub session: SessionId,
    /// Its current state.
    pub state: SessionState,
}

impl SessionStatus {
    /// Status of a brand new, unauthenticated instance.
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self {
            session: SessionId::new(),
            state: SessionState::Unauthenticated,
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.is_authenticated()
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self::unauthenticated()
    }
}
