//! Session lifecycle events delivered by the host proxy.

use serde::{Deserialize, Serialize};

use crate::load_balancer::BackendId;

/// A session lifecycle callback from the host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A new session needs its first backend.
    ChooseInitialServer,
    /// A session is now connected to `to`, having left `from` if present.
    SessionEstablished {
        to: BackendId,
        from: Option<BackendId>,
    },
    /// A session connected to `backend` ended.
    SessionClosed { backend: BackendId },
    /// A session failed on `backend`. Only failures while connecting are
    /// redirected; drops after the session was established are not.
    ConnectFailure {
        backend: BackendId,
        during_initial_connect: bool,
    },
}

/// What the host should do after an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "backend", rename_all = "snake_case")]
pub enum RoutingDecision {
    /// Send the new session to this backend.
    Route(BackendId),
    /// Redirect the failed session to this backend.
    Redirect(BackendId),
    /// Keep the host's own choice.
    NoChange,
}
