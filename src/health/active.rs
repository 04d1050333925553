//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every registered backend
//! - Drop backends the host directory no longer resolves
//! - Update online state and occupancy from probe results

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::host::{BackendDirectory, BackendHandle, ProbeResponse};
use crate::load_balancer::{BackendId, BackendRegistry};
use crate::observability::metrics;

/// What a single probe did to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Probe succeeded; `occupancy` overwrote the count when present.
    Online { occupancy: Option<usize> },
    /// Probe returned an error; backend marked offline.
    Failed,
    /// Probe missed its deadline; backend marked offline.
    TimedOut,
    /// Registry was reloaded (or the entry removed) while the probe ran;
    /// the result was discarded.
    Stale,
}

/// Probes issued by one cycle.
///
/// Dropping a cycle detaches its probes; they still apply their results.
#[derive(Debug)]
pub struct ProbeCycle {
    /// Registry generation the cycle was started against.
    pub generation: u64,
    /// Backends removed because they no longer resolve.
    pub removed: Vec<BackendId>,
    probes: Vec<(BackendId, JoinHandle<ProbeOutcome>)>,
}

impl ProbeCycle {
    /// Number of probes in flight.
    pub fn probe_count(&self) -> usize {
        self.probes.len()
    }

    /// Wait for every probe of this cycle to resolve.
    pub async fn finish(self) -> Vec<(BackendId, ProbeOutcome)> {
        let mut outcomes = Vec::with_capacity(self.probes.len());
        for (id, probe) in self.probes {
            match probe.await {
                Ok(outcome) => outcomes.push((id, outcome)),
                Err(e) => tracing::error!(backend = %id, error = %e, "Probe task failed"),
            }
        }
        outcomes
    }
}

/// Recurring prober over the backend registry.
pub struct HealthProber {
    registry: Arc<BackendRegistry>,
    directory: Arc<dyn BackendDirectory>,
    interval: Duration,
    timeout: Duration,
}

impl HealthProber {
    pub fn new(
        registry: Arc<BackendRegistry>,
        directory: Arc<dyn BackendDirectory>,
        config: &HealthCheckConfig,
    ) -> Self {
        Self {
            registry,
            directory,
            interval: Duration::from_secs(config.interval_secs),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Run cycles until shutdown. The first cycle starts immediately.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            timeout_secs = self.timeout.as_secs(),
            "Health prober starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // Probes are detached; the next tick does not wait on them.
                    let cycle = self.start_cycle();
                    tracing::debug!(
                        generation = cycle.generation,
                        probes = cycle.probe_count(),
                        removed = cycle.removed.len(),
                        "Probe cycle started"
                    );
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health prober received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Resolve every registered backend and spawn one probe per live backend.
    pub fn start_cycle(&self) -> ProbeCycle {
        let (generation, ids) = self.registry.ids();
        let mut removed = Vec::new();
        let mut probes = Vec::with_capacity(ids.len());

        for id in ids {
            let Some(handle) = self.directory.resolve(&id) else {
                if self.registry.remove_in(generation, &id) {
                    tracing::warn!(backend = %id, "Backend no longer resolves, removed until next reload");
                    metrics::record_backend_removed(&id);
                    metrics::clear_backend_state(&id);
                    removed.push(id);
                }
                continue;
            };

            let probe = tokio::spawn(probe_backend(
                self.registry.clone(),
                generation,
                id.clone(),
                handle,
                self.timeout,
            ));
            probes.push((id, probe));
        }

        ProbeCycle {
            generation,
            removed,
            probes,
        }
    }
}

async fn probe_backend(
    registry: Arc<BackendRegistry>,
    generation: u64,
    id: BackendId,
    handle: Arc<dyn BackendHandle>,
    timeout: Duration,
) -> ProbeOutcome {
    let outcome = match time::timeout(timeout, handle.probe(timeout)).await {
        Ok(Ok(ProbeResponse { occupancy })) => ProbeOutcome::Online { occupancy },
        Ok(Err(e)) => {
            tracing::debug!(backend = %id, error = %e, "Probe failed");
            ProbeOutcome::Failed
        }
        Err(_) => {
            tracing::debug!(backend = %id, timeout_ms = timeout.as_millis() as u64, "Probe timed out");
            ProbeOutcome::TimedOut
        }
    };

    let applied = registry.mutate_in(generation, &id, |state| {
        let was_online = state.online;
        match outcome {
            ProbeOutcome::Online { occupancy } => state.probe_succeeded(occupancy),
            _ => state.probe_failed(),
        }
        (was_online, *state)
    });

    let Some((was_online, state)) = applied else {
        tracing::debug!(backend = %id, generation, "Discarding probe result from replaced generation");
        metrics::record_probe("stale");
        return ProbeOutcome::Stale;
    };

    if was_online != state.online {
        if state.online {
            tracing::info!(backend = %id, "Backend back online");
        } else {
            tracing::warn!(backend = %id, outcome = ?outcome, "Backend marked offline");
        }
    }

    metrics::record_probe(match outcome {
        ProbeOutcome::Online { .. } => "online",
        ProbeOutcome::Failed => "failed",
        ProbeOutcome::TimedOut => "timeout",
        ProbeOutcome::Stale => "stale",
    });
    metrics::record_backend_state(&id, &state);
    outcome
}
