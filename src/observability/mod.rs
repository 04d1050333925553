//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Registry, prober, tracker, reloads produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters and per-backend gauges)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape endpoint
//! ```

pub mod logging;
pub mod metrics;
