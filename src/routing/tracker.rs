//! Connection accounting.
//!
//! # Responsibilities
//! - Apply connect/disconnect/transfer events to registry counts
//! - Ignore events for backends that are not registered
//! - Clamp counts at zero and record unmatched disconnects as anomalies
//! - Pick a redirect target after a failed connection attempt

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::load_balancer::{BackendId, BackendRegistry, LoadBalancer};
use crate::observability::metrics;

/// Keeps registry connection counts in line with the host's sessions.
#[derive(Debug)]
pub struct ConnectionTracker {
    registry: Arc<BackendRegistry>,
    underflows: AtomicU64,
}

impl ConnectionTracker {
    pub fn new(registry: Arc<BackendRegistry>) -> Self {
        Self {
            registry,
            underflows: AtomicU64::new(0),
        }
    }

    /// A session was established on `id`. Returns `false` if unregistered.
    pub fn on_connect(&self, id: &BackendId) -> bool {
        let Some(state) = self.registry.mutate(id, |state| {
            state.connect();
            *state
        }) else {
            tracing::trace!(backend = %id, "Connect for unregistered backend ignored");
            return false;
        };

        tracing::debug!(backend = %id, connections = state.connection_count, "Session connected");
        metrics::record_backend_state(id, &state);
        true
    }

    /// A session on `id` ended. Returns `false` if unregistered.
    pub fn on_disconnect(&self, id: &BackendId) -> bool {
        let Some((matched, state)) = self.registry.mutate(id, |state| (state.disconnect(), *state)) else {
            tracing::trace!(backend = %id, "Disconnect for unregistered backend ignored");
            return false;
        };

        if !matched {
            self.underflows.fetch_add(1, Ordering::Relaxed);
            metrics::record_count_underflow(id);
            tracing::warn!(backend = %id, "Disconnect without matching connect, count held at zero");
        } else {
            tracing::debug!(backend = %id, connections = state.connection_count, "Session disconnected");
        }
        metrics::record_backend_state(id, &state);
        true
    }

    /// A session moved from `from` to `to`: decrement first, then increment.
    pub fn on_transfer(&self, from: &BackendId, to: &BackendId) {
        self.on_disconnect(from);
        self.on_connect(to);
    }

    /// Best alternative after a failed connection attempt to `failed`.
    ///
    /// Declines (returns `None`) when `failed` is not a balanced backend, so
    /// the host's own handling applies. The failed backend is never chosen.
    pub fn redirect_candidate(&self, failed: &BackendId, lb: &dyn LoadBalancer) -> Option<BackendId> {
        if !self.registry.contains(failed) {
            return None;
        }
        let target = lb.select(&self.registry.snapshot(), Some(failed));
        metrics::record_selection(target.is_some());
        target
    }

    /// Disconnects seen without a matching connect since startup.
    pub fn underflow_count(&self) -> u64 {
        self.underflows.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::{BackendState, LeastLoaded};

    fn tracker(names: &[&str]) -> (Arc<BackendRegistry>, ConnectionTracker) {
        let registry = Arc::new(BackendRegistry::new());
        registry.upsert_all(names.iter().map(BackendId::new));
        let tracker = ConnectionTracker::new(registry.clone());
        (registry, tracker)
    }

    #[test]
    fn test_connect_is_cumulative() {
        let (registry, tracker) = tracker(&["a"]);
        let id = BackendId::new("a");
        registry.mutate(&id, |s| s.probe_failed());

        assert!(tracker.on_connect(&id));
        assert!(tracker.on_connect(&id));

        assert_eq!(
            registry.get(&id),
            Some(BackendState { online: true, connection_count: 2 })
        );
    }

    #[test]
    fn test_unregistered_events_are_noops() {
        let (registry, tracker) = tracker(&["a"]);
        let ghost = BackendId::new("ghost");

        assert!(!tracker.on_connect(&ghost));
        assert!(!tracker.on_disconnect(&ghost));
        assert!(registry.get(&ghost).is_none());
        assert_eq!(registry.len(), 1);
        assert_eq!(tracker.underflow_count(), 0);
    }

    #[test]
    fn test_disconnect_clamps_and_counts_anomaly() {
        let (registry, tracker) = tracker(&["a"]);
        let id = BackendId::new("a");

        tracker.on_connect(&id);
        tracker.on_disconnect(&id);
        tracker.on_disconnect(&id);

        assert_eq!(registry.get(&id).unwrap().connection_count, 0);
        assert_eq!(tracker.underflow_count(), 1);
    }

    #[test]
    fn test_transfer_moves_one_session() {
        let (registry, tracker) = tracker(&["a", "b"]);
        let (a, b) = (BackendId::new("a"), BackendId::new("b"));

        tracker.on_connect(&a);
        tracker.on_transfer(&a, &b);

        assert_eq!(registry.get(&a).unwrap().connection_count, 0);
        assert_eq!(registry.get(&b).unwrap().connection_count, 1);
        assert_eq!(tracker.underflow_count(), 0);
    }

    #[test]
    fn test_redirect_excludes_failed_backend() {
        let (_registry, tracker) = tracker(&["a", "b"]);
        let lb = LeastLoaded::new();
        let (a, b) = (BackendId::new("a"), BackendId::new("b"));

        // `a` is the least loaded, but it just failed.
        tracker.on_connect(&b);
        assert_eq!(tracker.redirect_candidate(&a, &lb), Some(b.clone()));

        // Unbalanced backend: decline.
        assert_eq!(tracker.redirect_candidate(&BackendId::new("hub"), &lb), None);
    }

    #[test]
    fn test_redirect_none_when_only_failed_backend() {
        let (_registry, tracker) = tracker(&["a"]);
        let lb = LeastLoaded::new();
        assert_eq!(tracker.redirect_candidate(&BackendId::new("a"), &lb), None);
    }
}
