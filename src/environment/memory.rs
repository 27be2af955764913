//! In-memory page environment
//!
//! Models a document head and the `window` global tree, and plays the part of
//! the SDK when an injected loader script "runs": it attaches `google.maps`,
//! adds the web-font link and style sheets the real SDK leaves behind, and
//! calls the callback named in the script URL. Every mutation is appended to
//! an operation log so tests can assert on ordering.

use parking_lot::Mutex;
use serde_json::{Map, Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, trace};
use url::Url;

use crate::errors::{LoaderError, Result};
use crate::loader::{DEFAULT_FONT_HOST, LoadOptions};

use super::dom::{HeadNode, LinkElement, NodeId, ScriptElement, StyleElement};
use super::{Environment, ErrorCallback, LoadCallback};

/// What happens to an injected script
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScriptBehavior {
    /// Runs on the next scheduler turn and calls back into the loader
    #[default]
    Execute,
    /// Fires the script error hook on the next scheduler turn
    Fail,
    /// Stays pending until [`InMemoryEnvironment::complete_pending`] or
    /// [`InMemoryEnvironment::fail_pending`]
    Hold,
}

/// Recorded environment mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvOp {
    NodeAppended { id: NodeId, tag: &'static str },
    ScriptInjected { id: NodeId, src: String, nonce: Option<String> },
    ScriptExecuted { id: NodeId },
    ScriptFailed { id: NodeId },
    NodeRemoved { id: NodeId, tag: &'static str },
    GlobalCreated { path: String },
    GlobalDeleted { path: String },
    CallbackRegistered { slot: String },
    OptionsRegistered { language: String },
    LibraryImported { name: String },
    Tick,
}

struct PendingScript {
    id: NodeId,
    src: String,
    on_error: ErrorCallback,
}

#[derive(Default)]
struct PageState {
    next_id: u64,
    head: Vec<(NodeId, HeadNode)>,
    window: Map<String, Value>,
    callbacks: HashMap<String, LoadCallback>,
    pending: Vec<PendingScript>,
    options: Option<LoadOptions>,
    failing_libraries: HashSet<String>,
    behavior: ScriptBehavior,
    ops: Vec<EnvOp>,
}

impl PageState {
    fn push_node(&mut self, node: HeadNode) -> NodeId {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        self.head.push((id, node));
        id
    }

    fn lookup(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.window.get(*first)?;
        for segment in rest {
            current = current.as_object()?.get(*segment)?;
        }
        Some(current)
    }

    fn ensure_object(&mut self, path: &[&str]) {
        let mut created = Vec::new();
        let mut current = &mut self.window;
        for (depth, segment) in path.iter().enumerate() {
            let slot = current
                .entry(segment.to_string())
                .or_insert(Value::Null);
            if slot.is_null() {
                *slot = Value::Object(Map::new());
                created.push(path[..=depth].join("."));
            }
            match slot.as_object_mut() {
                Some(next) => current = next,
                None => break,
            }
        }
        self.ops
            .extend(created.into_iter().map(|path| EnvOp::GlobalCreated { path }));
    }

    fn parent_mut(&mut self, path: &[&str]) -> Option<&mut Map<String, Value>> {
        let mut current = &mut self.window;
        for segment in path {
            current = current.get_mut(*segment)?.as_object_mut()?;
        }
        Some(current)
    }
}

/// Page environment held entirely in memory
#[derive(Clone)]
pub struct InMemoryEnvironment {
    state: Arc<Mutex<PageState>>,
    injected: Arc<watch::Sender<usize>>,
}

impl Default for InMemoryEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryEnvironment {
    pub fn new() -> Self {
        let (injected, _) = watch::channel(0);
        Self {
            state: Arc::new(Mutex::new(PageState::default())),
            injected: Arc::new(injected),
        }
    }

    pub fn with_behavior(self, behavior: ScriptBehavior) -> Self {
        self.set_script_behavior(behavior);
        self
    }

    /// Adds a host script carrying a CSP nonce
    pub fn with_nonce<T: Into<String>>(self, nonce: T) -> Self {
        self.append_node(ScriptElement::with_nonce(nonce).into());
        self
    }

    pub fn set_script_behavior(&self, behavior: ScriptBehavior) {
        self.state.lock().behavior = behavior;
    }

    /// Makes every later import of `name` fail
    pub fn fail_library<T: Into<String>>(&self, name: T) {
        self.state.lock().failing_libraries.insert(name.into());
    }

    /// Overwrites a global with an arbitrary value
    pub fn set_global(&self, path: &[&str], value: Value) {
        let mut state = self.state.lock();
        if let Some((last, parents)) = path.split_last() {
            state.ensure_object(parents);
            if let Some(parent) = state.parent_mut(parents) {
                parent.insert(last.to_string(), value);
            }
        }
    }

    pub fn ops(&self) -> Vec<EnvOp> {
        self.state.lock().ops.clone()
    }

    /// Sources of all head scripts whose `src` contains `host`
    pub fn scripts_from(&self, host: &str) -> Vec<String> {
        self.state
            .lock()
            .head
            .iter()
            .filter_map(|(_, node)| match node {
                HeadNode::Script(script) => script.src.clone(),
                _ => None,
            })
            .filter(|src| src.contains(host))
            .collect()
    }

    pub fn pending_scripts(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Number of scripts injected since creation
    pub fn injected_count(&self) -> usize {
        *self.injected.borrow()
    }

    /// Resolves once at least `count` scripts have been injected
    pub async fn wait_for_injections(&self, count: usize) {
        let mut rx = self.injected.subscribe();
        let _ = rx.wait_for(|injected| *injected >= count).await;
    }

    /// Runs every held script. Returns how many ran.
    pub fn complete_pending(&self) -> usize {
        let ids: Vec<NodeId> = self.state.lock().pending.iter().map(|p| p.id).collect();
        ids.into_iter().filter(|id| self.execute_script(*id)).count()
    }

    /// Fails every held script. Returns how many failed.
    pub fn fail_pending(&self) -> usize {
        let ids: Vec<NodeId> = self.state.lock().pending.iter().map(|p| p.id).collect();
        ids.into_iter().filter(|id| self.reject_script(*id)).count()
    }

    fn take_pending(state: &mut PageState, id: NodeId) -> Option<PendingScript> {
        let index = state.pending.iter().position(|p| p.id == id)?;
        Some(state.pending.remove(index))
    }

    /// Plays the SDK: attaches the namespace, leaves its fonts and styles
    /// behind and calls the loader callback.
    fn execute_script(&self, id: NodeId) -> bool {
        let callback = {
            let mut state = self.state.lock();
            let Some(script) = Self::take_pending(&mut state, id) else {
                return false;
            };

            let params: HashMap<String, String> = Url::parse(&script.src)
                .map(|url| url.query_pairs().into_owned().collect())
                .unwrap_or_default();
            let language = params.get("language").cloned().unwrap_or_default();

            state.ensure_object(&["google", "maps"]);
            if let Some(maps) = state.parent_mut(&["google", "maps"]) {
                maps.insert("version".to_string(), json!("3"));
                maps.insert("language".to_string(), json!(language));
            }

            state.push_node(
                LinkElement::stylesheet(format!(
                    "https://{}/css?family=Google+Sans+Text:400,500",
                    DEFAULT_FONT_HOST
                ))
                .into(),
            );
            state.push_node(
                StyleElement::untyped(".gm-style .gm-style-iw { font-weight: 300; }").into(),
            );
            state.push_node(
                StyleElement::untyped(".gmp-advanced-marker-view { position: absolute; }")
                    .into(),
            );
            state.ops.push(EnvOp::ScriptExecuted { id: script.id });

            params
                .get("callback")
                .and_then(|slot| state.callbacks.remove(slot))
        };

        trace!("In-memory SDK script {} executed", id);
        if let Some(callback) = callback {
            callback();
        }
        true
    }

    fn reject_script(&self, id: NodeId) -> bool {
        let script = {
            let mut state = self.state.lock();
            let Some(script) = Self::take_pending(&mut state, id) else {
                return false;
            };
            state.ops.push(EnvOp::ScriptFailed { id: script.id });
            script
        };

        (script.on_error)(format!("failed to fetch {}", script.src));
        true
    }
}

#[async_trait::async_trait]
impl Environment for InMemoryEnvironment {
    fn head_nodes(&self) -> Vec<(NodeId, HeadNode)> {
        self.state.lock().head.clone()
    }

    fn append_node(&self, node: HeadNode) -> NodeId {
        let mut state = self.state.lock();
        let tag = node.tag();
        let id = state.push_node(node);
        state.ops.push(EnvOp::NodeAppended { id, tag });
        id
    }

    fn remove_node(&self, id: NodeId) -> bool {
        let mut state = self.state.lock();
        let Some(index) = state.head.iter().position(|(node_id, _)| *node_id == id) else {
            return false;
        };
        let (_, node) = state.head.remove(index);
        state.ops.push(EnvOp::NodeRemoved {
            id,
            tag: node.tag(),
        });
        true
    }

    fn append_script(&self, script: ScriptElement, on_error: ErrorCallback) -> NodeId {
        let src = script.src.clone().unwrap_or_default();
        let nonce = script.nonce.clone();

        let (id, behavior) = {
            let mut state = self.state.lock();
            let id = state.push_node(script.into());
            state.ops.push(EnvOp::ScriptInjected {
                id,
                src: src.clone(),
                nonce,
            });
            state.pending.push(PendingScript { id, src, on_error });
            (id, state.behavior)
        };
        self.injected.send_modify(|count| *count += 1);
        debug!("In-memory page: script {} injected ({:?})", id, behavior);

        match behavior {
            ScriptBehavior::Execute => {
                let env = self.clone();
                tokio::spawn(async move {
                    tokio::task::yield_now().await;
                    env.execute_script(id);
                });
            }
            ScriptBehavior::Fail => {
                let env = self.clone();
                tokio::spawn(async move {
                    tokio::task::yield_now().await;
                    env.reject_script(id);
                });
            }
            ScriptBehavior::Hold => {}
        }
        id
    }

    fn global(&self, path: &[&str]) -> Option<Value> {
        self.state.lock().lookup(path).cloned()
    }

    fn ensure_global_object(&self, path: &[&str]) {
        self.state.lock().ensure_object(path);
    }

    fn delete_global(&self, path: &[&str]) -> bool {
        let Some((last, parents)) = path.split_last() else {
            return false;
        };

        let mut state = self.state.lock();
        let removed = state
            .parent_mut(parents)
            .and_then(|parent| parent.remove(*last))
            .is_some();
        if removed {
            // Callback slots live on the deleted object
            let prefix = format!("{}.", path.join("."));
            state.callbacks.retain(|slot, _| !slot.starts_with(&prefix));
            state.ops.push(EnvOp::GlobalDeleted {
                path: path.join("."),
            });
        }
        removed
    }

    fn register_callback(&self, slot: &str, callback: LoadCallback) {
        let mut state = self.state.lock();
        state.callbacks.insert(slot.to_string(), callback);
        state.ops.push(EnvOp::CallbackRegistered {
            slot: slot.to_string(),
        });
    }

    fn register_options(&self, options: &LoadOptions) -> Result<()> {
        let mut state = self.state.lock();
        if state.options.is_some() {
            return Err(LoaderError::configuration(
                "SDK options have already been registered for this page",
            ));
        }
        state.options = Some(options.clone());
        state.ops.push(EnvOp::OptionsRegistered {
            language: options.language().to_string(),
        });
        Ok(())
    }

    async fn import_library(&self, name: &str) -> Result<()> {
        tokio::task::yield_now().await;

        let mut state = self.state.lock();
        if !state.lookup(&["google", "maps"]).is_some_and(Value::is_object) {
            return Err(LoaderError::library_import(format!(
                "cannot import '{}': google.maps is not bootstrapped",
                name
            )));
        }
        if state.failing_libraries.contains(name) {
            return Err(LoaderError::library_import(format!(
                "library '{}' failed to load",
                name
            )));
        }

        if let Some(maps) = state.parent_mut(&["google", "maps"]) {
            maps.insert(name.to_string(), json!({ "loaded": true }));
        }
        state.ops.push(EnvOp::LibraryImported {
            name: name.to_string(),
        });
        Ok(())
    }

    async fn next_tick(&self) {
        self.state.lock().ops.push(EnvOp::Tick);
        tokio::task::yield_now().await;
    }
}
