//! Backend registry.
//!
//! # Responsibilities
//! - Hold the state of every configured backend, keyed by `BackendId`
//! - Replace the whole backend set atomically on load/reload
//! - Provide per-entry atomic updates and copied snapshots
//!
//! # Design Decisions
//! - Each load/reload creates a new `Generation`; readers load it through
//!   `ArcSwap` and never see a mix of two backend sets
//! - Entries live in a `DashMap`, so updates to one backend lock only its shard
//! - Writers that started against an older generation (in-flight probes) use
//!   the `*_in` variants, which drop the write once that generation is replaced

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use dashmap::DashMap;

use crate::load_balancer::backend::{BackendId, BackendState};

/// One backend set, as loaded by a single load/reload.
#[derive(Debug, Default)]
struct Generation {
    number: u64,
    entries: DashMap<BackendId, BackendState>,
}

/// Thread-safe mapping from `BackendId` to `BackendState`.
#[derive(Debug)]
pub struct BackendRegistry {
    current: ArcSwap<Generation>,
    next_generation: AtomicU64,
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendRegistry {
    /// Create an empty registry at generation 0.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(Generation::default()),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Replace the whole backend set with fresh, optimistic entries.
    ///
    /// Returns the number of the new generation.
    pub fn upsert_all<I>(&self, ids: I) -> u64
    where
        I: IntoIterator<Item = BackendId>,
    {
        let number = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let entries = DashMap::new();
        for id in ids {
            entries.insert(id, BackendState::default());
        }

        tracing::debug!(generation = number, backends = entries.len(), "Registry generation replaced");
        self.current.store(Arc::new(Generation { number, entries }));
        number
    }

    /// Number of the generation currently in effect.
    pub fn generation(&self) -> u64 {
        self.current.load().number
    }

    pub fn get(&self, id: &BackendId) -> Option<BackendState> {
        self.current.load().entries.get(id).map(|entry| *entry.value())
    }

    pub fn contains(&self, id: &BackendId) -> bool {
        self.current.load().entries.contains_key(id)
    }

    /// Atomically transform the state of `id`. No-op if absent.
    ///
    /// Returns the closure's result when the entry exists.
    pub fn mutate<F, R>(&self, id: &BackendId, f: F) -> Option<R>
    where
        F: FnOnce(&mut BackendState) -> R,
    {
        let generation = self.current.load();
        let mut entry = generation.entries.get_mut(id)?;
        Some(f(entry.value_mut()))
    }

    /// Like [`mutate`](Self::mutate), but only if `generation` is still current.
    pub fn mutate_in<F, R>(&self, generation: u64, id: &BackendId, f: F) -> Option<R>
    where
        F: FnOnce(&mut BackendState) -> R,
    {
        let current = self.current.load();
        if current.number != generation {
            return None;
        }
        let mut entry = current.entries.get_mut(id)?;
        Some(f(entry.value_mut()))
    }

    /// Drop an entry. Returns `true` if it was present.
    pub fn remove(&self, id: &BackendId) -> bool {
        self.current.load().entries.remove(id).is_some()
    }

    /// Drop an entry only if `generation` is still current.
    pub fn remove_in(&self, generation: u64, id: &BackendId) -> bool {
        let current = self.current.load();
        current.number == generation && current.entries.remove(id).is_some()
    }

    /// Copied view of every entry, ordered by id.
    pub fn snapshot(&self) -> Vec<(BackendId, BackendState)> {
        let generation = self.current.load();
        let mut entries: Vec<_> = generation
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Registered ids together with the generation they belong to.
    pub fn ids(&self) -> (u64, BTreeSet<BackendId>) {
        let generation = self.current.load();
        let ids = generation.entries.iter().map(|entry| entry.key().clone()).collect();
        (generation.number, ids)
    }

    pub fn len(&self) -> usize {
        self.current.load().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<BackendId> {
        names.iter().map(BackendId::new).collect()
    }

    #[test]
    fn test_upsert_all_replaces_generation() {
        let registry = BackendRegistry::new();
        let first = registry.upsert_all(ids(&["a", "b"]));
        registry.mutate(&BackendId::new("a"), |s| s.connect());

        let second = registry.upsert_all(ids(&["b", "c"]));
        assert!(second > first);
        assert_eq!(registry.generation(), second);
        assert!(registry.get(&BackendId::new("a")).is_none());
        assert_eq!(registry.get(&BackendId::new("b")), Some(BackendState::default()));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_mutate_absent_is_noop() {
        let registry = BackendRegistry::new();
        registry.upsert_all(ids(&["a"]));

        assert!(registry.mutate(&BackendId::new("ghost"), |s| s.connect()).is_none());
        assert!(!registry.contains(&BackendId::new("ghost")));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_stale_generation_writes_dropped() {
        let registry = BackendRegistry::new();
        let old = registry.upsert_all(ids(&["a"]));
        registry.upsert_all(ids(&["a"]));

        let applied = registry.mutate_in(old, &BackendId::new("a"), |s| s.probe_failed());
        assert!(applied.is_none());
        assert!(registry.get(&BackendId::new("a")).unwrap().online);

        assert!(!registry.remove_in(old, &BackendId::new("a")));
        assert!(registry.contains(&BackendId::new("a")));
    }

    #[test]
    fn test_snapshot_sorted_and_detached() {
        let registry = BackendRegistry::new();
        registry.upsert_all(ids(&["charlie", "alpha", "bravo"]));

        let snapshot = registry.snapshot();
        registry.remove(&BackendId::new("alpha"));

        let names: Vec<_> = snapshot.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(names, vec!["alpha", "bravo", "charlie"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let registry = BackendRegistry::new();
        registry.upsert_all(ids(&["Lobby"]));
        assert!(registry.contains(&BackendId::new("LOBBY")));
    }
}
