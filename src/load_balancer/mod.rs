//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Config load/reload
//!     → registry.rs (new generation of backend entries)
//!
//! Routing query
//!     → registry.rs (copied snapshot, ordered by id)
//!     → least_conn.rs (online filter, min connections, id tie-break)
//!     → BackendId or None
//! ```
//!
//! # Design Decisions
//! - Selectors are pure functions over a snapshot; the registry owns all state
//! - Offline backends are excluded from selection
//! - Ties are broken deterministically by id

pub mod backend;
pub mod least_conn;
pub mod registry;

pub use backend::{BackendId, BackendState};
pub use least_conn::LeastLoaded;
pub use registry::BackendRegistry;

/// A backend selection strategy.
pub trait LoadBalancer: Send + Sync {
    /// Pick a backend from `snapshot`, never returning `exclude`.
    fn select(
        &self,
        snapshot: &[(BackendId, BackendState)],
        exclude: Option<&BackendId>,
    ) -> Option<BackendId>;
}
