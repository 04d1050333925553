//! Host environment interfaces.
//!
//! # Data Flow
//! ```text
//! HealthProber
//!     → BackendDirectory::resolve(id)   (None → backend gone, drop entry)
//!     → BackendHandle::probe(timeout)   (occupancy optional)
//! ```
//!
//! # Design Decisions
//! - The router never talks to backends directly; the host supplies handles
//! - Probe futures are boxed so directories stay object-safe and spawnable
//! - `tcp.rs` is the directory used by the standalone binary

pub mod tcp;

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::load_balancer::BackendId;

/// Result of a successful probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeResponse {
    /// Sessions the backend reports hosting, if it reports them.
    pub occupancy: Option<usize>,
}

/// Reasons a probe can fail.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connection failed: {0}")]
    Connect(#[from] std::io::Error),

    #[error("probe timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected probe response: {0}")]
    Protocol(String),
}

/// A live backend the host can probe.
pub trait BackendHandle: Send + Sync {
    /// Probe the backend. Implementations should give up after `timeout`;
    /// the prober enforces the deadline regardless.
    fn probe(&self, timeout: Duration) -> BoxFuture<'static, Result<ProbeResponse, ProbeError>>;
}

/// Lookup of live backends by id.
pub trait BackendDirectory: Send + Sync {
    /// Resolve `id` to a live backend. `None` means the host no longer knows it.
    fn resolve(&self, id: &BackendId) -> Option<Arc<dyn BackendHandle>>;
}
