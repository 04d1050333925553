//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → Snapshot registered ids + generation
//!     → Resolve each id in the host directory (unresolved → removed)
//!     → Spawn one probe per backend, bounded by the probe timeout
//!     → Write result into the registry if the generation is still current
//! ```
//!
//! # Design Decisions
//! - Probes within a cycle run concurrently; a slow backend delays nobody
//! - A failed probe marks the backend offline immediately, without thresholds
//! - Reported occupancy overrides locally tracked counts
//! - Probe failures are routine and never stop the scheduler

pub mod active;

pub use active::{HealthProber, ProbeCycle, ProbeOutcome};
