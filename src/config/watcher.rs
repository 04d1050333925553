//! Config file watcher for hot reload.
//!
//! An editor save usually arrives as several filesystem events. Events are
//! forwarded to a task that waits for the burst to settle, loads the file
//! once, and hands the validated config to the reload loop.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time;

use crate::config::loader::load_config;
use crate::config::schema::RouterConfig;
use crate::observability::metrics;

const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Quiet period after the last event before the file is read.
const SETTLE: Duration = Duration::from_millis(250);

/// Watches the config file and emits validated configs.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<RouterConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiver for validated configs.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<RouterConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. Must be called from within a Tokio runtime.
    ///
    /// The returned handle must be kept alive; dropping it ends the watch and
    /// the forwarding task.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    let _ = event_tx.send(());
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(POLL_INTERVAL),
        )?;
        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %self.path.display(), "Config watcher started");
        tokio::spawn(forward_changes(self.path, event_rx, self.update_tx));
        Ok(watcher)
    }
}

async fn forward_changes(
    path: PathBuf,
    mut events: mpsc::UnboundedReceiver<()>,
    updates: mpsc::UnboundedSender<RouterConfig>,
) {
    while events.recv().await.is_some() {
        while let Ok(Some(())) = time::timeout(SETTLE, events.recv()).await {}

        match load_config(&path) {
            Ok(config) => {
                tracing::debug!(path = %path.display(), "Config file changed");
                if updates.send(config).is_err() {
                    break;
                }
            }
            Err(e) => {
                metrics::record_reload("rejected");
                tracing::error!(path = %path.display(), error = %e, "Changed config rejected, keeping current backends");
            }
        }
    }
}
