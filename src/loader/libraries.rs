use futures_util::future::try_join_all;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::environment::Environment;
use crate::errors::{LoaderError, Result};

use super::namespace::{MAPS_NAMESPACE, NAMESPACE_ROOT, NamespaceRef};
use super::options::Libraries;

/// Resolves sub-libraries against the bootstrapped SDK
pub struct LibraryLoader {
    env: Arc<dyn Environment>,
}

impl LibraryLoader {
    pub fn new(env: Arc<dyn Environment>) -> Self {
        Self { env }
    }

    /// Imports every library; the first failure fails the whole load.
    pub async fn load(&self, libraries: &Libraries) -> Result<NamespaceRef> {
        debug!("Load libraries: {}", libraries.joined());

        try_join_all(libraries.iter().map(|name| self.env.import_library(name))).await?;

        if !self.env.global(&MAPS_NAMESPACE).is_some_and(|v| v.is_object()) {
            return Err(LoaderError::library_import(
                "SDK namespace disappeared while importing libraries",
            ));
        }
        self.env
            .global(&[NAMESPACE_ROOT])
            .filter(Value::is_object)
            .map(NamespaceRef::new)
            .ok_or_else(|| LoaderError::library_import("SDK namespace is missing"))
    }
}
