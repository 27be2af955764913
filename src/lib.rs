//! Maps Loader - locale-aware lifecycle manager for the Google Maps JS SDK
//!
//! The SDK can be configured only once per page, yet hosts want maps to
//! follow the UI language. This crate drives the whole cycle: bootstrap the
//! SDK script, import the requested libraries, and on every locale change
//! tear everything down and load it again while dependent views are told to
//! unmount.
//!
//! # Features
//! - **memory-env**: in-memory page environment for tests and headless use (default)
//!
//! # Architecture
//! - `environment`: the page adapter (head nodes, globals, script loading)
//! - `loader`: options, script URL, bootstrap, library import, teardown
//! - `signal`: the host's reactive locale value
//! - `system`: reload coordination, process-wide coordinator, logging
//! - `config`: file + environment configuration

pub mod config;
pub mod environment;
pub mod errors;
pub mod loader;
pub mod signal;
pub mod system;

pub use environment::Environment;
pub use errors::{LoaderError, Result};
pub use loader::{ApiOptions, LoadHandle, NamespaceRef, UnloadReport};
pub use signal::LocaleSignal;
pub use system::reload::{
    DefaultReloadCoordinator, ReloadCoordinator, get_coordinator, get_or_create_coordinator,
};
