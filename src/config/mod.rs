//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config.toml (written with defaults if missing)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RouterConfig (validated, immutable)
//!
//! On reload (file change, SIGHUP, admin API):
//!     watcher.rs / lifecycle::reload
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → registry replaced with a new generation
//!     → on failure the current generation stays in effect
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::ConfigError;
pub use schema::{AdminConfig, HealthCheckConfig, ObservabilityConfig, RouterConfig};
