//! Backend identity and per-backend state.
//!
//! # Responsibilities
//! - Normalize backend identifiers (case-insensitive lookup)
//! - Hold the online flag and connection count for one backend
//! - Apply connect/disconnect/probe transitions to that state

use std::fmt;

use serde::{Deserialize, Serialize};

/// Case-normalized backend identifier.
///
/// Construction lower-cases and trims the raw name, so `"Lobby-1"` and
/// `" lobby-1 "` refer to the same backend. Ordering is lexicographic on the
/// normalized form and is what the selector uses to break ties.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct BackendId(String);

impl BackendId {
    /// Normalize a raw backend name.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for BackendId {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl From<&str> for BackendId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<BackendId> for String {
    fn from(id: BackendId) -> Self {
        id.0
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Health and load of a single backend.
///
/// Values are copied out of the registry, so a `BackendState` held by a
/// caller is a consistent reading of both fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BackendState {
    /// Whether the most recent probe (or connection) succeeded.
    pub online: bool,
    /// Sessions the router believes are active on this backend.
    pub connection_count: usize,
}

impl Default for BackendState {
    /// Optimistic: online with no connections until the first probe resolves.
    fn default() -> Self {
        Self {
            online: true,
            connection_count: 0,
        }
    }
}

impl BackendState {
    /// A session was established: the backend is reachable.
    pub fn connect(&mut self) {
        self.online = true;
        self.connection_count = self.connection_count.saturating_add(1);
    }

    /// A session ended. Returns `false` when the count was already zero,
    /// i.e. the disconnect had no matching connect.
    pub fn disconnect(&mut self) -> bool {
        match self.connection_count.checked_sub(1) {
            Some(count) => {
                self.connection_count = count;
                true
            }
            None => false,
        }
    }

    /// Successful probe. Reported occupancy replaces the tracked count.
    pub fn probe_succeeded(&mut self, occupancy: Option<usize>) {
        self.online = true;
        if let Some(count) = occupancy {
            self.connection_count = count;
        }
    }

    /// Failed or timed-out probe. The count is left alone.
    pub fn probe_failed(&mut self) {
        self.online = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_normalization() {
        assert_eq!(BackendId::new("Lobby-1"), BackendId::new(" lobby-1 "));
        assert_eq!(BackendId::new("LOBBY").as_str(), "lobby");
        assert!(BackendId::new("a") < BackendId::new("B"));
    }

    #[test]
    fn test_id_serde() {
        let id: BackendId = serde_json::from_str("\"Survival\"").unwrap();
        assert_eq!(id.as_str(), "survival");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"survival\"");
    }

    #[test]
    fn test_state_transitions() {
        let mut state = BackendState::default();
        assert!(state.online);

        state.probe_failed();
        assert!(!state.online);

        state.connect();
        state.connect();
        assert!(state.online);
        assert_eq!(state.connection_count, 2);

        state.probe_succeeded(Some(7));
        assert_eq!(state.connection_count, 7);

        state.probe_succeeded(None);
        assert_eq!(state.connection_count, 7);
    }

    #[test]
    fn test_disconnect_underflow() {
        let mut state = BackendState::default();
        state.connect();
        assert!(state.disconnect());
        assert!(!state.disconnect());
        assert_eq!(state.connection_count, 0);
    }
}
