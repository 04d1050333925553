//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Init metrics → Build directory + router
//!     → Start prober, config watcher, admin API
//!
//! Reload (reload.rs):
//!     File change / SIGHUP / admin API → load + validate
//!     → update directory → new registry generation
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → graceful shutdown
//!     SIGHUP → config reload
//!
//! Shutdown (shutdown.rs):
//!     Broadcast → prober and admin API exit → process exits
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then router, then listeners
//! - A rejected reload keeps the previous generation

pub mod reload;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use reload::Reloader;
pub use shutdown::Shutdown;
