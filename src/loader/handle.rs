//! Load handles
//!
//! A `LoadHandle` is one bootstrap + library-load cycle. The work is spawned
//! on the runtime as soon as the handle exists, so the load progresses
//! whether or not anyone awaits it. Clones share the same outcome.

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use std::fmt;
use std::future::{Future, IntoFuture};
use tokio::sync::watch;

use crate::errors::{LoaderError, Result};

use super::namespace::NamespaceRef;

type Outcome = Option<Result<NamespaceRef>>;

#[derive(Clone)]
pub struct LoadHandle {
    generation: u64,
    language: String,
    outcome: watch::Receiver<Outcome>,
}

impl LoadHandle {
    /// Starts `load` on the tokio runtime
    pub fn spawn<F>(generation: u64, language: &str, load: F) -> Self
    where
        F: Future<Output = Result<NamespaceRef>> + Send + 'static,
    {
        let (tx, outcome) = watch::channel(None);
        tokio::spawn(async move {
            let result = load.await;
            let _ = tx.send(Some(result));
        });

        Self {
            generation,
            language: language.to_string(),
            outcome,
        }
    }

    /// Handle that is already settled with `err`
    pub fn failed(generation: u64, language: &str, err: LoaderError) -> Self {
        let (_, outcome) = watch::channel(Some(Err(err)));
        Self {
            generation,
            language: language.to_string(),
            outcome,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Locale this cycle was started with
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn is_settled(&self) -> bool {
        self.outcome.borrow().is_some()
    }

    /// Outcome, if settled
    pub fn try_result(&self) -> Option<Result<NamespaceRef>> {
        self.outcome.borrow().clone()
    }

    /// Waits for the cycle to settle
    pub async fn wait(&self) -> Result<NamespaceRef> {
        let mut outcome = self.outcome.clone();
        let settled = outcome
            .wait_for(Option::is_some)
            .await
            .map(|state| state.clone());

        match settled {
            Ok(Some(result)) => result,
            _ => Err(LoaderError::script_load(
                "load task ended without reporting a result",
            )),
        }
    }
}

impl IntoFuture for LoadHandle {
    type Output = Result<NamespaceRef>;
    type IntoFuture = BoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        async move { self.wait().await }.boxed()
    }
}

impl fmt::Debug for LoadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadHandle")
            .field("generation", &self.generation)
            .field("language", &self.language)
            .field("settled", &self.is_settled())
            .finish()
    }
}
