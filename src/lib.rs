//! Least-loaded backend router.
//!
//! Tracks the health and load of a fixed set of named backends and answers
//! which backend a new (or redirected) connection should go to.

pub mod admin;
pub mod config;
pub mod health;
pub mod host;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod routing;

pub use config::RouterConfig;
pub use lifecycle::Shutdown;
pub use load_balancer::{BackendId, BackendState};
pub use routing::{Router, RoutingDecision, SessionEvent};
