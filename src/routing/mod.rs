//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Host lifecycle callback
//!     → events.rs (SessionEvent)
//!     → router.rs (dispatch)
//!         ChooseInitialServer → least-loaded selection → Route / NoChange
//!         SessionEstablished  → tracker.rs (connect, or transfer from previous)
//!         SessionClosed       → tracker.rs (disconnect)
//!         ConnectFailure      → tracker.rs (redirect candidate) → Redirect / NoChange
//! ```
//!
//! # Design Decisions
//! - Events for backends outside the registry are ignored, never registered
//! - Transfers decrement the old backend before incrementing the new one
//! - Redirects never pick the backend that just failed
//! - No online backend means "keep the host default", not an error

pub mod events;
pub mod router;
pub mod tracker;

pub use events::{RoutingDecision, SessionEvent};
pub use router::Router;
pub use tracker::ConnectionTracker;
