//! Configuration reload.
//!
//! # Responsibilities
//! - Re-read the config file on request (SIGHUP, admin API, file watcher)
//! - Apply a validated config: directory first, then a new registry generation
//!
//! # Design Decisions
//! - A config that fails to load or validate is rejected; the current
//!   generation and directory stay in effect
//! - Only `servers` and `addresses` are reloadable; health check,
//!   observability, and admin settings take effect on restart
//! - A config whose backend set matches the applied one is skipped, so
//!   unrelated edits never reset connection counts

use std::collections::{BTreeSet, HashMap};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::loader::load_config;
use crate::config::{ConfigError, RouterConfig};
use crate::host::tcp::StaticDirectory;
use crate::load_balancer::BackendId;
use crate::observability::metrics;
use crate::routing::Router;

/// The reloadable part of a config.
#[derive(Debug, Clone, PartialEq, Eq)]
struct BackendSet {
    ids: BTreeSet<BackendId>,
    addresses: HashMap<BackendId, SocketAddr>,
}

impl BackendSet {
    fn of(config: &RouterConfig) -> Self {
        Self {
            ids: config.backend_ids(),
            addresses: config.backend_addresses(),
        }
    }
}

/// Applies config files to a running router.
pub struct Reloader {
    path: PathBuf,
    router: Arc<Router>,
    directory: Arc<StaticDirectory>,
    applied: Mutex<Option<BackendSet>>,
}

impl Reloader {
    pub fn new(path: &Path, router: Arc<Router>, directory: Arc<StaticDirectory>) -> Self {
        Self {
            path: path.to_path_buf(),
            router,
            directory,
            applied: Mutex::new(None),
        }
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Apply the startup config and start the router's prober.
    pub fn start(&self, config: &RouterConfig) -> u64 {
        let set = BackendSet::of(config);
        let mut applied = self.applied.lock().unwrap_or_else(PoisonError::into_inner);
        self.directory.update(set.addresses.clone());
        let generation = self.router.start(set.ids.iter().cloned());
        *applied = Some(set);
        generation
    }

    /// Load the config file and apply it. Returns the generation in effect.
    pub fn reload_from_disk(&self) -> Result<u64, ConfigError> {
        match load_config(&self.path) {
            Ok(config) => Ok(self.apply(&config)),
            Err(e) => {
                metrics::record_reload("rejected");
                tracing::error!(path = %self.path.display(), error = %e, "Reload rejected, keeping current backends");
                Err(e)
            }
        }
    }

    /// Apply an already validated config. Returns the generation in effect,
    /// which is unchanged when the backend set is the one already applied.
    pub fn apply(&self, config: &RouterConfig) -> u64 {
        let set = BackendSet::of(config);
        let mut applied = self.applied.lock().unwrap_or_else(PoisonError::into_inner);
        if applied.as_ref() == Some(&set) {
            metrics::record_reload("unchanged");
            tracing::debug!(
                generation = self.router.generation(),
                "Backend set unchanged, keeping current generation"
            );
            return self.router.generation();
        }

        self.directory.update(set.addresses.clone());
        let generation = self.router.reload(set.ids.iter().cloned());
        *applied = Some(set);
        generation
    }
}
