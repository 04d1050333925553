//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Written when the config file does not exist yet.
pub const DEFAULT_CONFIG: &str = r#"# Backends to balance between. Names are case-insensitive.
servers = []

# Address of each backend, probed with a TCP connect.
[addresses]
# lobby-1 = "127.0.0.1:25566"

[health_check]
enabled = true
interval_secs = 30
timeout_secs = 3

[observability]
log_level = "info"
log_format = "pretty"
metrics_enabled = false
metrics_address = "127.0.0.1:9090"

[admin]
enabled = false
api_key = ""
bind_address = "127.0.0.1:8081"
"#;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<RouterConfig, ConfigError> {
    let config = read_config(path)?;
    log_loaded(path, &config);
    Ok(config)
}

fn read_config(path: &Path) -> Result<RouterConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: RouterConfig = toml::from_str(&content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn log_loaded(path: &Path, config: &RouterConfig) {
    let ids = config.backend_ids();
    if ids.len() != config.servers.len() {
        tracing::warn!(
            listed = config.servers.len(),
            unique = ids.len(),
            "Duplicate backend names collapsed (names are case-insensitive)"
        );
    }
    tracing::info!(path = %path.display(), servers = ids.len(), "Loaded configuration");
}

/// Startup config, read before logging is installed.
#[derive(Debug)]
pub struct InitialConfig {
    pub config: RouterConfig,
    /// The file was missing and [`DEFAULT_CONFIG`] was written.
    pub created: bool,
}

impl InitialConfig {
    /// Emit the load messages. Call once the subscriber is installed.
    pub fn log(&self, path: &Path) {
        if self.created {
            tracing::info!(path = %path.display(), "Wrote default configuration");
        }
        log_loaded(path, &self.config);
    }
}

/// Load the config, first writing [`DEFAULT_CONFIG`] if the file is missing.
///
/// Nothing is logged here; see [`InitialConfig::log`].
pub fn load_or_init(path: &Path) -> Result<InitialConfig, ConfigError> {
    let created = !path.exists();
    if created {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, DEFAULT_CONFIG)?;
    }
    Ok(InitialConfig {
        config: read_config(path)?,
        created,
    })
}
