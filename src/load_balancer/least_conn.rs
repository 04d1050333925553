//! Least-loaded selection strategy.

use crate::load_balancer::backend::{BackendId, BackendState};
use crate::load_balancer::LoadBalancer;

/// Least-loaded selector.
/// Picks the online backend with the fewest connections; ties go to the
/// lexicographically smallest id so the result does not depend on map order.
#[derive(Debug, Default, Clone, Copy)]
pub struct LeastLoaded;

impl LeastLoaded {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for LeastLoaded {
    fn select(
        &self,
        snapshot: &[(BackendId, BackendState)],
        exclude: Option<&BackendId>,
    ) -> Option<BackendId> {
        snapshot
            .iter()
            .filter(|(id, state)| state.online && Some(id) != exclude)
            .min_by(|(a_id, a), (b_id, b)| {
                a.connection_count
                    .cmp(&b.connection_count)
                    .then_with(|| a_id.cmp(b_id))
            })
            .map(|(id, _)| id.clone())
    }
}
