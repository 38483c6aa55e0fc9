//! Strategy configuration utilities

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{info, warn};

/// Load configuration from a TOML file.
pub fn load_config<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config = toml::from_str(&content)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    Ok(config)
}

/// Resolve a service's config path: env var override first, fallback default.
pub fn resolve_config_path(env_var: &str, default_path: &str) -> String {
    std::env::var(env_var).unwrap_or_else(|_| default_path.to_string())
}

/// Load a config file, falling back to the provided default when the file
/// does not exist. A file that exists but fails to parse is an error, never
/// silently replaced by defaults.
pub fn load_config_file<T: DeserializeOwned>(path: &str, default: T) -> Result<T> {
    if Path::new(path).exists() {
        let config = load_config(path)?;
        info!("Loaded configuration from {}", path);
        Ok(config)
    } else {
        warn!("Config file {} not found, using defaults", path);
        Ok(default)
    }
}
