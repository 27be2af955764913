//! Host-owned locale cell
//!
//! Hosts write the display locale here. Readers either look at the current
//! value through a `watch` receiver or subscribe to the change stream, which
//! carries one notification per distinct value, in order, with no
//! coalescing. The coordinator relies on the latter so that `en -> fr -> de`
//! yields two reloads even when the writes happen back to back.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::trace;

const CHANGE_CAPACITY: usize = 64;

struct Inner {
    value: watch::Sender<String>,
    changes: broadcast::Sender<String>,
    // Keeps the watch value and the change stream in the same order
    write: Mutex<()>,
}

#[derive(Clone)]
pub struct LocaleSignal {
    inner: Arc<Inner>,
}

impl LocaleSignal {
    pub fn new<T: Into<String>>(initial: T) -> Self {
        let (value, _) = watch::channel(initial.into());
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                value,
                changes,
                write: Mutex::new(()),
            }),
        }
    }

    pub fn get(&self) -> String {
        self.inner.value.borrow().clone()
    }

    /// Stores `locale`. Returns `false`, and notifies nobody, when it equals
    /// the current value.
    pub fn set<T: Into<String>>(&self, locale: T) -> bool {
        let locale = locale.into();
        let _guard = self.inner.write.lock();

        let changed = self.inner.value.send_if_modified(|current| {
            if *current == locale {
                false
            } else {
                *current = locale.clone();
                true
            }
        });
        if changed {
            trace!("Locale changed to '{}'", locale);
            let _ = self.inner.changes.send(locale);
        }
        changed
    }

    /// Stream of distinct new values, starting after the call
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.inner.changes.subscribe()
    }

    /// Latest value only
    pub fn watch(&self) -> watch::Receiver<String> {
        self.inner.value.subscribe()
    }
}

impl std::fmt::Debug for LocaleSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("LocaleSignal").field(&self.get()).finish()
    }
}
