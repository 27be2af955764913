use std::path::Path;
use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;
use crate::errors::Result;

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

/// Get the global configuration instance
///
/// Returns an Arc pointer to the configuration, which is cheap to clone
/// and doesn't hold any locks. Loads `maps-loader.toml` on first access
/// if [`init_config`] was never called.
pub fn get_config() -> Arc<StaticConfig> {
    CONFIG
        .get_or_init(|| ArcSwap::from_pointee(StaticConfig::load()))
        .load_full()
}

/// Initialize the global configuration
///
/// Loads configuration from "maps-loader.toml" in the current directory.
/// If the file doesn't exist, uses in-memory defaults.
///
/// # Examples
/// ```no_run
/// use maps_loader::config::init_config;
/// init_config();
/// ```
pub fn init_config() {
    CONFIG.get_or_init(|| ArcSwap::from_pointee(StaticConfig::load()));
}

/// Initialize the global configuration from an explicit file
///
/// Replaces the current configuration if one was already loaded.
pub fn init_config_from<P: AsRef<Path>>(path: P) -> Result<Arc<StaticConfig>> {
    let config = Arc::new(StaticConfig::load_from(path)?);
    set_config(config.clone());
    Ok(config)
}

/// Swap in a new global configuration
///
/// Coordinators already created keep the options they were started with.
pub fn set_config(config: Arc<StaticConfig>) {
    CONFIG
        .get_or_init(|| ArcSwap::new(config.clone()))
        .store(config);
}
