//! Router service.
//!
//! Owns the registry, tracker, selector, and prober task, and is the single
//! entry point the host (or the admin API) talks to.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;

use crate::config::HealthCheckConfig;
use crate::health::HealthProber;
use crate::host::BackendDirectory;
use crate::lifecycle::Shutdown;
use crate::load_balancer::{BackendId, BackendRegistry, BackendState, LeastLoaded, LoadBalancer};
use crate::observability::metrics;
use crate::routing::events::{RoutingDecision, SessionEvent};
use crate::routing::tracker::ConnectionTracker;

/// Least-loaded routing service for one set of backends.
pub struct Router {
    registry: Arc<BackendRegistry>,
    tracker: ConnectionTracker,
    balancer: LeastLoaded,
    directory: Arc<dyn BackendDirectory>,
    health_check: HealthCheckConfig,
    prober: Mutex<Option<ProberTask>>,
}

/// A running prober and the channel that stops it.
struct ProberTask {
    shutdown: Shutdown,
    handle: JoinHandle<()>,
}

impl Router {
    /// Create a router with an empty registry. Nothing runs until [`start`](Self::start).
    pub fn new(directory: Arc<dyn BackendDirectory>, health_check: HealthCheckConfig) -> Self {
        let registry = Arc::new(BackendRegistry::new());
        Self {
            tracker: ConnectionTracker::new(registry.clone()),
            registry,
            balancer: LeastLoaded::new(),
            directory,
            health_check,
            prober: Mutex::new(None),
        }
    }

    /// Load the initial backend set and spawn the prober.
    ///
    /// Must be called from within a Tokio runtime. Calling it again while
    /// running only reloads the backend set; after [`stop`](Self::stop) it
    /// spawns a new prober.
    pub fn start<I>(&self, ids: I) -> u64
    where
        I: IntoIterator<Item = BackendId>,
    {
        let generation = self.reload(ids);

        let mut prober = self.prober.lock().unwrap_or_else(PoisonError::into_inner);
        if prober.is_some() {
            return generation;
        }
        if !self.health_check.enabled {
            tracing::info!("Active health checks disabled");
            return generation;
        }

        let task = HealthProber::new(self.registry.clone(), self.directory.clone(), &self.health_check);
        let shutdown = Shutdown::new();
        let handle = tokio::spawn(task.run(shutdown.subscribe()));
        *prober = Some(ProberTask { shutdown, handle });
        generation
    }

    /// Replace the backend set. In-flight probes for the old set are discarded.
    pub fn reload<I>(&self, ids: I) -> u64
    where
        I: IntoIterator<Item = BackendId>,
    {
        let (_, previous) = self.registry.ids();
        let generation = self.registry.upsert_all(ids);
        for id in previous.iter().filter(|id| !self.registry.contains(id)) {
            metrics::clear_backend_state(id);
        }
        for (id, state) in self.registry.snapshot() {
            metrics::record_backend_state(&id, &state);
        }
        metrics::record_reload("applied");
        tracing::info!(generation, backends = self.registry.len(), "Backend set loaded");
        generation
    }

    /// Stop the prober and wait for it to exit.
    pub async fn stop(&self) {
        let task = self.prober.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(ProberTask { shutdown, handle }) = task {
            shutdown.trigger();
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Health prober task failed");
            }
        }
    }

    /// Least-loaded online backend, or `None` if none is online.
    pub fn find_best_server(&self) -> Option<BackendId> {
        let best = self.balancer.select(&self.registry.snapshot(), None);
        metrics::record_selection(best.is_some());
        best
    }

    pub fn on_connect(&self, id: &BackendId) -> bool {
        self.tracker.on_connect(id)
    }

    pub fn on_disconnect(&self, id: &BackendId) -> bool {
        self.tracker.on_disconnect(id)
    }

    pub fn on_transfer(&self, from: &BackendId, to: &BackendId) {
        self.tracker.on_transfer(from, to)
    }

    /// Apply a host lifecycle event and tell the host what to do next.
    pub fn handle_event(&self, event: SessionEvent) -> RoutingDecision {
        match event {
            SessionEvent::ChooseInitialServer => match self.find_best_server() {
                Some(id) => RoutingDecision::Route(id),
                None => {
                    tracing::debug!("No online backend, keeping host default");
                    RoutingDecision::NoChange
                }
            },
            SessionEvent::SessionEstablished { to, from } => {
                match from {
                    Some(from) => self.on_transfer(&from, &to),
                    None => {
                        self.on_connect(&to);
                    }
                }
                RoutingDecision::NoChange
            }
            SessionEvent::SessionClosed { backend } => {
                self.on_disconnect(&backend);
                RoutingDecision::NoChange
            }
            SessionEvent::ConnectFailure {
                backend,
                during_initial_connect,
            } => {
                if !during_initial_connect {
                    return RoutingDecision::NoChange;
                }
                match self.tracker.redirect_candidate(&backend, &self.balancer) {
                    Some(target) => {
                        tracing::info!(failed = %backend, target = %target, "Redirecting failed connection");
                        RoutingDecision::Redirect(target)
                    }
                    None => RoutingDecision::NoChange,
                }
            }
        }
    }

    pub fn get(&self, id: &BackendId) -> Option<BackendState> {
        self.registry.get(id)
    }

    pub fn snapshot(&self) -> Vec<(BackendId, BackendState)> {
        self.registry.snapshot()
    }

    pub fn generation(&self) -> u64 {
        self.registry.generation()
    }

    /// Shared registry, for driving a [`HealthProber`] by hand.
    pub fn registry(&self) -> &Arc<BackendRegistry> {
        &self.registry
    }

    pub fn underflow_count(&self) -> u64 {
        self.tracker.underflow_count()
    }
}
