//! ReloadCoordinator trait and default implementation
//!
//! The coordinator owns the one current `LoadHandle`, follows the host's
//! locale signal and runs teardown + reload whenever the locale changes.
//! Dependent views watch the availability flag to know when to unmount and
//! remount around a reload.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, broadcast, watch};
use tracing::{debug, error, info, warn};

use crate::environment::Environment;
use crate::errors::{LoaderError, Result};
use crate::loader::{ApiOptions, Cleanup, Injector, LibraryLoader, LoadHandle, LoadOptions};
use crate::signal::LocaleSignal;

use super::types::{LoaderSettings, ReloadEvent, ReloadPhase, ReloadResult, ReloadStatus};

const EVENT_CAPACITY: usize = 32;

/// ReloadCoordinator trait
///
/// Defines the interface hosts use to follow the SDK's lifecycle.
#[async_trait]
pub trait ReloadCoordinator: Send + Sync {
    /// Tears the SDK down and loads it again with `locale`.
    ///
    /// Waits for the current load to settle first. Locale changes go through
    /// here automatically; calling it directly forces a reload, e.g. to retry
    /// after a failed load.
    async fn reload(&self, locale: &str) -> Result<ReloadResult>;

    /// The current load handle
    fn current_handle(&self) -> LoadHandle;

    /// Receiver that sees every newly published load handle
    fn handles(&self) -> watch::Receiver<LoadHandle>;

    fn is_available(&self) -> bool;

    /// Availability flag, false while a reload is in progress
    fn availability(&self) -> watch::Receiver<bool>;

    fn status(&self) -> ReloadStatus;

    /// Subscribe to reload events
    fn subscribe(&self) -> broadcast::Receiver<ReloadEvent>;

    /// Resolves once the SDK may be used
    async fn wait_until_available(&self) {
        let mut availability = self.availability();
        let _ = availability.wait_for(|available| *available).await;
    }
}

/// The coordinator spawns its load cycles and locale follower on the
/// ambient tokio runtime
pub(super) fn ensure_runtime() -> Result<()> {
    tokio::runtime::Handle::try_current()
        .map(|_| ())
        .map_err(|e| {
            LoaderError::configuration(format!(
                "Maps loader coordinator needs a tokio runtime: {}",
                e
            ))
        })
}

/// Starts one bootstrap + library import cycle
fn spawn_cycle(
    injector: &Arc<Injector>,
    libraries: &Arc<LibraryLoader>,
    generation: u64,
    options: LoadOptions,
) -> LoadHandle {
    let injector = injector.clone();
    let libraries = libraries.clone();
    let language = options.language().to_string();
    LoadHandle::spawn(generation, &language, async move {
        injector.bootstrap(&options).await?;
        libraries.load(options.libraries()).await
    })
}

/// Default implementation of ReloadCoordinator
pub struct DefaultReloadCoordinator {
    env: Arc<dyn Environment>,
    base: ApiOptions,
    injector: Arc<Injector>,
    libraries: Arc<LibraryLoader>,
    cleanup: Cleanup,
    /// Single slot for the current handle; held for a whole reload
    slot: Mutex<LoadHandle>,
    handle_sender: watch::Sender<LoadHandle>,
    available: watch::Sender<bool>,
    generation: AtomicU64,
    status: RwLock<ReloadStatus>,
    event_sender: broadcast::Sender<ReloadEvent>,
}

impl DefaultReloadCoordinator {
    /// Creates the coordinator with default hosts and starts the initial load
    ///
    /// # Errors
    /// * `LoaderError::Configuration` - called outside a tokio runtime
    pub fn start(
        env: Arc<dyn Environment>,
        options: ApiOptions,
        locale: &LocaleSignal,
    ) -> Result<Arc<Self>> {
        Self::start_with(env, options, locale, LoaderSettings::default())
    }

    /// Creates the coordinator and starts the initial load.
    ///
    /// Registers the SDK options on the page, which the SDK allows exactly
    /// once; if that fails the initial handle carries the error.
    ///
    /// # Errors
    /// * `LoaderError::Configuration` - called outside a tokio runtime
    pub fn start_with(
        env: Arc<dyn Environment>,
        options: ApiOptions,
        locale: &LocaleSignal,
        settings: LoaderSettings,
    ) -> Result<Arc<Self>> {
        ensure_runtime()?;
        Ok(Self::launch(env, options, locale, settings))
    }

    /// Builds the coordinator and spawns its tasks; the caller has checked
    /// for a runtime.
    pub(super) fn launch(
        env: Arc<dyn Environment>,
        options: ApiOptions,
        locale: &LocaleSignal,
        settings: LoaderSettings,
    ) -> Arc<Self> {
        // Subscribe before anything else so no change is missed
        let changes = locale.subscribe();
        let language = locale.get();
        let initial = options.with_language(&language);

        let injector = Arc::new(Injector::new(env.clone()).with_sdk_host(settings.sdk_host));
        let libraries = Arc::new(LibraryLoader::new(env.clone()));
        let cleanup = Cleanup::new(env.clone(), settings.cleanup);

        info!(
            "Set options: language={}, libraries={}",
            initial.language(),
            initial.libraries().joined()
        );
        let generation = 1;
        let handle = match env.register_options(&initial) {
            Ok(()) => spawn_cycle(&injector, &libraries, generation, initial),
            Err(e) => {
                error!("Failed to register SDK options: {}", e);
                LoadHandle::failed(generation, &language, e)
            }
        };

        let (handle_sender, _) = watch::channel(handle.clone());
        let (available, _) = watch::channel(true);
        let (event_sender, _) = broadcast::channel(EVENT_CAPACITY);

        let coordinator = Arc::new(Self {
            env,
            base: options,
            injector,
            libraries,
            cleanup,
            slot: Mutex::new(handle.clone()),
            handle_sender,
            available,
            generation: AtomicU64::new(generation),
            status: RwLock::new(ReloadStatus {
                phase: ReloadPhase::Loading,
                locale: language,
                generation,
                reload_count: 0,
                last_reload: None,
            }),
            event_sender,
        });

        coordinator.watch_initial_load(handle);
        coordinator.follow_locale(changes);
        coordinator
    }

    fn watch_initial_load(self: &Arc<Self>, handle: LoadHandle) {
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            let outcome = handle.wait().await;
            let Some(coordinator) = weak.upgrade() else {
                return;
            };

            match &outcome {
                Ok(_) => info!("Maps SDK loaded (locale '{}')", handle.language()),
                Err(e) => error!("Initial Maps SDK load failed: {}", e),
            }

            let mut status = coordinator.status.write();
            if status.phase == ReloadPhase::Loading && status.generation == handle.generation() {
                status.phase = ReloadPhase::Ready;
            }
        });
    }

    /// One persistent subscription; each change runs to completion before
    /// the next one is looked at.
    fn follow_locale(self: &Arc<Self>, mut changes: broadcast::Receiver<String>) {
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            loop {
                let locale = match changes.recv().await {
                    Ok(locale) => locale,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Locale subscription lagged, {} changes skipped", skipped);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                let Some(coordinator) = weak.upgrade() else {
                    break;
                };

                if coordinator.status.read().locale == locale {
                    debug!("Locale '{}' already applied, skipping reload", locale);
                    continue;
                }
                // Failures are reported through the handle and the event stream
                let _ = coordinator.reload(&locale).await;
            }
            debug!("Locale subscription closed");
        });
    }
}

#[async_trait]
impl ReloadCoordinator for DefaultReloadCoordinator {
    async fn reload(&self, locale: &str) -> Result<ReloadResult> {
        let mut slot = self.slot.lock().await;

        // Wait for the previous load to finish, whatever its outcome
        if let Err(e) = slot.wait().await {
            debug!(
                "Previous load (generation {}) had failed: {}",
                slot.generation(),
                e
            );
        }

        let started_at = Utc::now();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut status = self.status.write();
            status.phase = ReloadPhase::Reloading;
            status.locale = locale.to_string();
            status.generation = generation;
        }

        // Let dependent views unmount before the namespace goes away
        self.available.send_replace(false);
        let _ = self.event_sender.send(ReloadEvent::Started {
            locale: locale.to_string(),
            generation,
        });
        info!("Reloading Maps SDK with locale '{}'", locale);
        self.env.next_tick().await;

        let report = self.cleanup.unload();
        debug!(
            "Teardown removed {} scripts, {} links, {} styles (namespace deleted: {})",
            report.scripts_removed,
            report.links_removed,
            report.styles_removed,
            report.namespace_deleted
        );

        let options = self.base.with_language(locale);
        let handle = spawn_cycle(&self.injector, &self.libraries, generation, options);
        *slot = handle.clone();
        self.handle_sender.send_replace(handle.clone());

        let outcome = handle.wait().await;
        let reload_result = match &outcome {
            Ok(_) => ReloadResult::success(locale, generation, started_at),
            Err(e) => ReloadResult::failure(locale, generation, started_at, e.to_string()),
        };

        {
            let mut status = self.status.write();
            status.phase = ReloadPhase::Ready;
            status.reload_count += 1;
            status.last_reload = Some(reload_result.clone());
        }
        // Back up even on failure; consumers inspect the handle for errors
        self.available.send_replace(true);

        if reload_result.success {
            info!(
                "Maps SDK reloaded with locale '{}' in {}ms",
                locale, reload_result.duration_ms
            );
            let _ = self.event_sender.send(ReloadEvent::Completed {
                result: reload_result.clone(),
            });
        } else {
            let message = reload_result.message.clone().unwrap_or_default();
            error!("Reload to locale '{}' failed: {}", locale, message);
            let _ = self.event_sender.send(ReloadEvent::Failed {
                locale: locale.to_string(),
                generation,
                error: message,
            });
        }

        outcome.map(|_| reload_result)
    }

    fn current_handle(&self) -> LoadHandle {
        self.handle_sender.borrow().clone()
    }

    fn handles(&self) -> watch::Receiver<LoadHandle> {
        self.handle_sender.subscribe()
    }

    fn is_available(&self) -> bool {
        *self.available.borrow()
    }

    fn availability(&self) -> watch::Receiver<bool> {
        self.available.subscribe()
    }

    fn status(&self) -> ReloadStatus {
        self.status.read().clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.event_sender.subscribe()
    }
}

impl std::fmt::Debug for DefaultReloadCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultReloadCoordinator")
            .field("status", &self.status())
            .field("available", &self.is_available())
            .finish_non_exhaustive()
    }
}
