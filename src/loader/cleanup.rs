//! SDK teardown
//!
//! Reverses what a bootstrap and the SDK itself leave in the page. The SDK
//! does not tag the style sheets it injects, so those are matched on a few
//! class-name fragments it is known to use.

use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::environment::{Environment, HeadNode};

use super::namespace::MAPS_NAMESPACE;
use super::query::DEFAULT_SDK_HOST;

pub const DEFAULT_FONT_HOST: &str = "fonts.googleapis.com";

/// Fragments found in the style sheets the SDK injects
pub const STYLE_MARKERS: [&str; 3] = ["gm-", "-marker-view", "-keyboard-shortcuts-view"];

/// Which head nodes belong to the SDK
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupRules {
    pub hosts: Vec<String>,
    pub style_markers: Vec<String>,
}

impl Default for CleanupRules {
    fn default() -> Self {
        Self::new(DEFAULT_SDK_HOST, DEFAULT_FONT_HOST)
    }
}

impl CleanupRules {
    pub fn new<A: Into<String>, B: Into<String>>(sdk_host: A, font_host: B) -> Self {
        Self {
            hosts: vec![sdk_host.into(), font_host.into()],
            style_markers: STYLE_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn matches(&self, node: &HeadNode) -> bool {
        match node {
            HeadNode::Script(_) | HeadNode::Link(_) => node
                .url()
                .is_some_and(|url| self.hosts.iter().any(|host| url.contains(host.as_str()))),
            HeadNode::Style(style) => {
                style.type_attr.is_none()
                    && self
                        .style_markers
                        .iter()
                        .any(|marker| style.text.contains(marker.as_str()))
            }
        }
    }
}

/// What an unload removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnloadReport {
    pub scripts_removed: usize,
    pub links_removed: usize,
    pub styles_removed: usize,
    pub namespace_deleted: bool,
}

impl UnloadReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub struct Cleanup {
    env: Arc<dyn Environment>,
    rules: CleanupRules,
}

impl Cleanup {
    pub fn new(env: Arc<dyn Environment>, rules: CleanupRules) -> Self {
        Self { env, rules }
    }

    /// Removes SDK scripts, font links and style sheets, then deletes the
    /// namespace. Safe to call on a page where nothing was loaded.
    pub fn unload(&self) -> UnloadReport {
        debug!("Unload Maps");
        let mut report = UnloadReport::default();

        for (id, node) in self.env.head_nodes() {
            if !self.rules.matches(&node) || !self.env.remove_node(id) {
                continue;
            }
            match node {
                HeadNode::Script(_) => report.scripts_removed += 1,
                HeadNode::Link(_) => report.links_removed += 1,
                HeadNode::Style(_) => report.styles_removed += 1,
            }
        }

        // Only a plain object is ours to delete
        if self
            .env
            .global(&MAPS_NAMESPACE)
            .is_some_and(|value| matches!(value, Value::Object(_)))
        {
            report.namespace_deleted = self.env.delete_global(&MAPS_NAMESPACE);
        }

        debug!(?report, "Unload finished");
        report
    }
}
