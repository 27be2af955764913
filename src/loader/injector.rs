//! SDK bootstrap
//!
//! Injects the loader script and waits for the SDK to call back through the
//! well-known global slot. This replaces the official loader's own bootstrap,
//! which cannot be run a second time in the same page.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::debug;

use crate::environment::{Environment, ScriptElement};
use crate::errors::{LoaderError, Result};

use super::namespace::MAPS_NAMESPACE;
use super::options::LoadOptions;
use super::query::{CALLBACK_SLOT, DEFAULT_SDK_HOST, build_script_url};

pub struct Injector {
    env: Arc<dyn Environment>,
    sdk_host: String,
    callback_slot: String,
}

impl Injector {
    pub fn new(env: Arc<dyn Environment>) -> Self {
        Self {
            env,
            sdk_host: DEFAULT_SDK_HOST.to_string(),
            callback_slot: CALLBACK_SLOT.to_string(),
        }
    }

    pub fn with_sdk_host<T: Into<String>>(mut self, host: T) -> Self {
        self.sdk_host = host.into();
        self
    }

    /// Injects one loader script for `options` and resolves once the SDK
    /// has called back.
    ///
    /// # Errors
    /// * `LoaderError::ScriptLoad` - the page reported that the script could
    ///   not be loaded, or both hooks were dropped without firing
    pub async fn bootstrap(&self, options: &LoadOptions) -> Result<()> {
        debug!(
            "Bootstrap: language={}, libraries={}",
            options.language(),
            options.libraries().joined()
        );
        self.env.ensure_global_object(&MAPS_NAMESPACE);

        let src = build_script_url(&self.sdk_host, options, &self.callback_slot);

        let (tx, rx) = oneshot::channel::<Result<()>>();
        let tx = Arc::new(Mutex::new(Some(tx)));

        let on_load = {
            let tx = tx.clone();
            Box::new(move || {
                if let Some(tx) = tx.lock().take() {
                    let _ = tx.send(Ok(()));
                }
            })
        };
        let on_error = Box::new(move |reason: String| {
            if let Some(tx) = tx.lock().take() {
                let _ = tx.send(Err(LoaderError::script_load(format!(
                    "The Maps API could not load: {}",
                    reason
                ))));
            }
        });

        let script = ScriptElement {
            src: Some(src),
            nonce: self.env.find_nonce(),
        };

        self.env.register_callback(&self.callback_slot, on_load);
        let id = self.env.append_script(script, on_error);
        debug!("Loader script {} appended, waiting for callback", id);

        rx.await.unwrap_or_else(|_| {
            Err(LoaderError::script_load(
                "loader callback was discarded before it ran",
            ))
        })
    }
}
