//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order (metrics, directory, router)
//! - Start background tasks (prober, config watcher, admin API)
//! - Dispatch signals and config updates until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Reload errors after startup are logged, never fatal

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::admin::{self, AdminState};
use crate::config::watcher::ConfigWatcher;
use crate::config::{ConfigError, RouterConfig};
use crate::host::tcp::StaticDirectory;
use crate::lifecycle::reload::Reloader;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::{SignalEvent, Signals};
use crate::observability::metrics;
use crate::routing::Router;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to bind admin API on {addr}: {source}")]
    AdminBind {
        addr: String,
        source: std::io::Error,
    },

    #[error("failed to register signal handlers: {0}")]
    Signals(std::io::Error),
}

/// Run the router until a shutdown signal arrives.
pub async fn run(config_path: &Path, config: RouterConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse::<SocketAddr>() {
            metrics::init_metrics(addr);
        }
    }

    let directory = Arc::new(StaticDirectory::default());
    let router = Arc::new(Router::new(directory.clone(), config.health_check.clone()));
    let reloader = Arc::new(Reloader::new(config_path, router.clone(), directory));
    reloader.start(&config);
    let shutdown = Shutdown::new();

    let (watcher, mut config_updates) = ConfigWatcher::new(config_path);
    // Dropping the handle stops the watch.
    let _watcher = match watcher.run() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Config watcher unavailable, reload with SIGHUP or the admin API");
            None
        }
    };

    let admin_task = if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address)
            .await
            .map_err(|source| StartupError::AdminBind {
                addr: config.admin.bind_address.clone(),
                source,
            })?;
        let state = AdminState {
            reloader: reloader.clone(),
            api_key: config.admin.api_key.as_str().into(),
        };
        let admin_shutdown = shutdown.subscribe();
        Some(tokio::spawn(async move {
            if let Err(e) = admin::serve(listener, state, admin_shutdown).await {
                tracing::error!(error = %e, "Admin API failed");
            }
        }))
    } else {
        None
    };

    let mut signals = Signals::new().map_err(StartupError::Signals)?;
    tracing::info!(backends = router.snapshot().len(), "Router started");

    loop {
        tokio::select! {
            event = signals.recv() => match event {
                SignalEvent::Reload => {
                    tracing::info!("SIGHUP received, reloading configuration");
                    let _ = reloader.reload_from_disk();
                }
                SignalEvent::Shutdown => {
                    tracing::info!("Shutdown signal received");
                    break;
                }
            },
            Some(new_config) = config_updates.recv() => {
                reloader.apply(&new_config);
            }
        }
    }

    shutdown.trigger();
    router.stop().await;
    if let Some(task) = admin_task {
        let _ = task.await;
    }

    Ok(())
}
