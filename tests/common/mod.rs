//! Shared mock host for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use backend_router::host::{BackendDirectory, BackendHandle, ProbeError, ProbeResponse};
use backend_router::BackendId;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;

/// How a mock backend answers probes.
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    /// Answer immediately, optionally reporting occupancy.
    Online(Option<usize>),
    /// Answer with an error.
    Fail,
    /// Never answer.
    Hang,
    /// Answer after a delay.
    Delayed(Duration, Option<usize>),
}

/// Programmable backend directory.
#[derive(Default)]
pub struct MockDirectory {
    backends: Mutex<HashMap<BackendId, Behavior>>,
    probes: Arc<AtomicUsize>,
}

impl MockDirectory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, name: &str, behavior: Behavior) {
        self.backends.lock().unwrap().insert(BackendId::new(name), behavior);
    }

    pub fn remove(&self, name: &str) {
        self.backends.lock().unwrap().remove(&BackendId::new(name));
    }

    /// Probes issued so far.
    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

impl BackendDirectory for MockDirectory {
    fn resolve(&self, id: &BackendId) -> Option<Arc<dyn BackendHandle>> {
        let behavior = *self.backends.lock().unwrap().get(id)?;
        Some(Arc::new(MockBackend {
            behavior,
            probes: self.probes.clone(),
        }))
    }
}

struct MockBackend {
    behavior: Behavior,
    probes: Arc<AtomicUsize>,
}

impl BackendHandle for MockBackend {
    fn probe(&self, _timeout: Duration) -> BoxFuture<'static, Result<ProbeResponse, ProbeError>> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        let behavior = self.behavior;
        async move {
            match behavior {
                Behavior::Online(occupancy) => Ok(ProbeResponse { occupancy }),
                Behavior::Fail => Err(ProbeError::Protocol("mock failure".into())),
                Behavior::Hang => futures_util::future::pending().await,
                Behavior::Delayed(delay, occupancy) => {
                    tokio::time::sleep(delay).await;
                    Ok(ProbeResponse { occupancy })
                }
            }
        }
        .boxed()
    }
}

pub fn id(name: &str) -> BackendId {
    BackendId::new(name)
}

pub fn ids(names: &[&str]) -> Vec<BackendId> {
    names.iter().map(BackendId::new).collect()
}

/// Write a config file to a fresh temp path.
pub fn write_config(name: &str, content: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!(
        "backend-router-test-{}-{}.toml",
        std::process::id(),
        name
    ));
    std::fs::write(&path, content).unwrap();
    path
}
