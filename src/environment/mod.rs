//! Page environment abstraction
//!
//! Everything the loader does to the hosting page goes through the
//! [`Environment`] trait: head nodes, global namespace objects, the SDK's
//! callback slots and its library import mechanism. The coordinator's state
//! machine never touches a page directly, so it runs the same against a real
//! browser binding or against [`InMemoryEnvironment`].

pub mod dom;
#[cfg(feature = "memory-env")]
pub mod memory;

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::Result;
use crate::loader::LoadOptions;

pub use dom::{HeadNode, LinkElement, NodeId, ScriptElement, StyleElement};
#[cfg(feature = "memory-env")]
pub use memory::{EnvOp, InMemoryEnvironment, ScriptBehavior};

/// Invoked by the SDK through a global callback slot once its script has run
pub type LoadCallback = Box<dyn FnOnce() + Send + 'static>;

/// Invoked when an injected script fails to load (network or parse error)
pub type ErrorCallback = Box<dyn FnOnce(String) + Send + 'static>;

#[async_trait]
pub trait Environment: Send + Sync {
    /// Snapshot of the document head, in document order
    fn head_nodes(&self) -> Vec<(NodeId, HeadNode)>;

    /// Appends a node to the document head
    fn append_node(&self, node: HeadNode) -> NodeId;

    /// Removes a head node. Returns `false` if it was already gone.
    fn remove_node(&self, id: NodeId) -> bool;

    /// Appends an external script; `on_error` fires if the browser reports
    /// that the script could not be loaded.
    fn append_script(&self, script: ScriptElement, on_error: ErrorCallback) -> NodeId;

    /// Nonce of the first nonce-bearing script on the page
    fn find_nonce(&self) -> Option<String> {
        self.head_nodes().into_iter().find_map(|(_, node)| match node {
            HeadNode::Script(script) => script.nonce.filter(|n| !n.is_empty()),
            _ => None,
        })
    }

    /// Value of a global, `path` being the dotted property chain from `window`
    fn global(&self, path: &[&str]) -> Option<Value>;

    /// Creates each object along `path` that does not exist yet
    fn ensure_global_object(&self, path: &[&str]);

    /// Deletes the property at `path`. Returns `false` if it was absent.
    fn delete_global(&self, path: &[&str]) -> bool;

    /// Installs `callback` into the global slot, replacing any previous one
    fn register_callback(&self, slot: &str, callback: LoadCallback);

    /// The SDK's one-time, process-wide options registration.
    ///
    /// A second call is an error of the underlying library.
    fn register_options(&self, options: &LoadOptions) -> Result<()>;

    /// The SDK's own on-demand import of a named sub-library
    async fn import_library(&self, name: &str) -> Result<()>;

    /// Yields one scheduling tick to the host UI layer
    async fn next_tick(&self) {
        tokio::task::yield_now().await;
    }
}
