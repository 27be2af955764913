//! Reload operations module
//!
//! This module provides the SDK lifecycle core:
//! - `ReloadCoordinator`: trait for following and driving SDK reloads
//! - `DefaultReloadCoordinator`: the locale-driven state machine
//! - `CoordinatorStore`: single-instance guard, plus the process-wide instance
//! - `ReloadEvent` / `ReloadStatus`: observability of reloads
//!
//! # Lifecycle
//!
//! `Uninitialized -> Loading -> Ready <-> Reloading`. A locale change waits
//! for the current load to settle, drops availability, yields a UI tick,
//! tears the SDK down and loads it again. Availability comes back once the
//! new load has settled, successfully or not.
//!
//! # Usage
//!
//! ```ignore
//! use maps_loader::system::reload::get_or_create_coordinator;
//!
//! let coordinator = get_or_create_coordinator(env, options, &locale)?;
//! let maps = coordinator.current_handle().await?;
//!
//! locale.set("fr");
//! coordinator.wait_until_available().await;
//! ```

mod coordinator;
mod global;
mod types;

pub use coordinator::{DefaultReloadCoordinator, ReloadCoordinator};
pub use global::{
    CoordinatorStore, get_coordinator, get_locale_signal, get_or_create_coordinator,
    init_coordinator_from_config,
};
pub use types::{LoaderSettings, ReloadEvent, ReloadPhase, ReloadResult, ReloadStatus};
