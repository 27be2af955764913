//! Global ReloadCoordinator instance management
//!
//! The SDK can only be configured once per page, so one coordinator serves
//! the whole process. `CoordinatorStore` is the single-instance guard; the
//! process-wide store sits behind the free functions below.

use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

use crate::config::get_config;
use crate::environment::Environment;
use crate::errors::Result;
use crate::loader::ApiOptions;
use crate::signal::LocaleSignal;

use super::coordinator::{DefaultReloadCoordinator, ReloadCoordinator, ensure_runtime};
use super::types::LoaderSettings;

struct Stored {
    coordinator: Arc<dyn ReloadCoordinator>,
    locale: LocaleSignal,
}

/// Holds at most one coordinator, created on first request, together with
/// the locale signal it follows
pub struct CoordinatorStore {
    cell: OnceLock<Stored>,
}

impl Default for CoordinatorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CoordinatorStore {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Returns the stored coordinator, creating it on first call.
    ///
    /// Once a coordinator exists, the arguments of later calls are ignored.
    ///
    /// # Errors
    /// * `LoaderError::Configuration` - no coordinator yet and called outside
    ///   a tokio runtime
    pub fn get_or_create(
        &self,
        env: Arc<dyn Environment>,
        options: ApiOptions,
        locale: &LocaleSignal,
    ) -> Result<Arc<dyn ReloadCoordinator>> {
        self.get_or_create_with(env, options, locale, LoaderSettings::default())
    }

    pub fn get_or_create_with(
        &self,
        env: Arc<dyn Environment>,
        options: ApiOptions,
        locale: &LocaleSignal,
        settings: LoaderSettings,
    ) -> Result<Arc<dyn ReloadCoordinator>> {
        if let Some(existing) = self.cell.get() {
            debug!("Reusing existing Maps loader coordinator");
            return Ok(existing.coordinator.clone());
        }
        ensure_runtime()?;

        let stored = self.cell.get_or_init(|| {
            info!("Creating Maps loader coordinator");
            let coordinator: Arc<dyn ReloadCoordinator> =
                DefaultReloadCoordinator::launch(env, options, locale, settings);
            Stored {
                coordinator,
                locale: locale.clone(),
            }
        });
        Ok(stored.coordinator.clone())
    }

    pub fn get(&self) -> Option<Arc<dyn ReloadCoordinator>> {
        self.cell.get().map(|stored| stored.coordinator.clone())
    }

    /// Locale signal the stored coordinator follows
    pub fn locale(&self) -> Option<LocaleSignal> {
        self.cell.get().map(|stored| stored.locale.clone())
    }
}

/// Process-wide store
static GLOBAL_STORE: CoordinatorStore = CoordinatorStore::new();

/// Get the process-wide coordinator, creating it on first call
///
/// # Errors
/// * `LoaderError::Configuration` - no coordinator yet and called outside a
///   tokio runtime
pub fn get_or_create_coordinator(
    env: Arc<dyn Environment>,
    options: ApiOptions,
    locale: &LocaleSignal,
) -> Result<Arc<dyn ReloadCoordinator>> {
    GLOBAL_STORE.get_or_create(env, options, locale)
}

/// Get the process-wide coordinator
///
/// Returns None if it has not been created yet.
pub fn get_coordinator() -> Option<Arc<dyn ReloadCoordinator>> {
    GLOBAL_STORE.get()
}

/// Locale signal followed by the process-wide coordinator
pub fn get_locale_signal() -> Option<LocaleSignal> {
    GLOBAL_STORE.locale()
}

/// Convenience function: create the process-wide coordinator from the
/// global configuration
///
/// The locale signal starts at `loader.language`; hosts change the SDK
/// locale by setting the returned signal. If the coordinator already
/// exists, it is returned with the signal it was created with.
///
/// # Errors
/// * `LoaderError::Validation` - the configured loader options are unusable
/// * `LoaderError::Configuration` - called outside a tokio runtime
pub fn init_coordinator_from_config(
    env: Arc<dyn Environment>,
) -> Result<(Arc<dyn ReloadCoordinator>, LocaleSignal)> {
    if let Some(stored) = GLOBAL_STORE.cell.get() {
        return Ok((stored.coordinator.clone(), stored.locale.clone()));
    }

    let config = get_config();
    let options = config.loader.api_options()?;
    let locale = config.loader.locale_signal();
    let settings = config.loader.settings();
    let coordinator = GLOBAL_STORE.get_or_create_with(env, options, &locale, settings)?;

    // Another caller may have won the race to create it
    Ok((coordinator, GLOBAL_STORE.locale().unwrap_or(locale)))
}
