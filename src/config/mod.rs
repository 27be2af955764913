//! Configuration management
//!
//! `StaticConfig` is read once from `maps-loader.toml` plus `MAPS_LOADER__*`
//! environment variables and kept behind a lock-free global.

mod r#impl;
mod structs;

pub use r#impl::{get_config, init_config, init_config_from, set_config};
pub use structs::*;
