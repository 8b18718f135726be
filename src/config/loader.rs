//! Store options loader with XDG-compliant path resolution
//!
//! Loads `StoreOptions` from multiple locations with layered priority:
//! 1. `~/.config/confstore/options.toml` (lowest priority)
//! 2. `./.confstore.toml`
//! 3. An explicit override path
//! 4. `CONFSTORE_*` environment variables (highest priority)

use std::path::PathBuf;

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use super::model::StoreOptions;

/// Application name used for XDG directories
const APP_NAME: &str = "confstore";

/// Prefix for option overrides taken from the environment
const ENV_PREFIX: &str = "CONFSTORE_";

/// Get options search paths in priority order (lowest to highest)
pub fn options_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join(APP_NAME).join("options.toml"));
    }

    paths.push(PathBuf::from(format!(".{}.toml", APP_NAME)));

    paths
}

/// Load store options with XDG layering
///
/// Files are merged in priority order, later files overriding earlier ones.
/// Environment variables with prefix `CONFSTORE_` override everything, with
/// `__` separating nested keys:
/// `CONFSTORE_ENVIRONMENT_DEFAULTS__PREFIX=app` sets `environment_defaults.prefix`.
pub fn load_options(override_path: Option<&str>) -> Result<StoreOptions> {
    let override_path = override_path.map(PathBuf::from);
    if let Some(path) = override_path.as_ref().filter(|path| !path.exists()) {
        tracing::warn!("Override options not found: {}", path.display());
    }

    options_paths()
        .into_iter()
        .chain(override_path)
        .filter(|path| path.exists())
        .fold(
            Figment::from(Serialized::defaults(StoreOptions::default())),
            |figment, path| {
                tracing::debug!("Merging store options from {}", path.display());
                figment.merge(Toml::file(path))
            },
        )
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .context("Failed to load store options")
}

/// Find all existing options files
pub fn find_options_files() -> Vec<PathBuf> {
    options_paths().into_iter().filter(|p| p.exists()).collect()
}
