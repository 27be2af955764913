//! Minimal model of the document head nodes the loader touches

use std::fmt;

/// Opaque handle of a node in the document head
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// `<script>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptElement {
    pub src: Option<String>,
    pub nonce: Option<String>,
}

impl ScriptElement {
    pub fn external<T: Into<String>>(src: T) -> Self {
        Self {
            src: Some(src.into()),
            nonce: None,
        }
    }

    /// Inline script carrying a CSP nonce, the way host pages usually do
    pub fn with_nonce<T: Into<String>>(nonce: T) -> Self {
        Self {
            src: None,
            nonce: Some(nonce.into()),
        }
    }
}

/// `<link>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkElement {
    pub rel: String,
    pub href: String,
}

impl LinkElement {
    pub fn stylesheet<T: Into<String>>(href: T) -> Self {
        Self {
            rel: "stylesheet".to_string(),
            href: href.into(),
        }
    }
}

/// `<style>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleElement {
    /// The `type` attribute, if the element has one
    pub type_attr: Option<String>,
    pub text: String,
}

impl StyleElement {
    pub fn untyped<T: Into<String>>(text: T) -> Self {
        Self {
            type_attr: None,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadNode {
    Script(ScriptElement),
    Link(LinkElement),
    Style(StyleElement),
}

impl HeadNode {
    pub fn tag(&self) -> &'static str {
        match self {
            HeadNode::Script(_) => "script",
            HeadNode::Link(_) => "link",
            HeadNode::Style(_) => "style",
        }
    }

    /// `src` of a script or `href` of a link
    pub fn url(&self) -> Option<&str> {
        match self {
            HeadNode::Script(script) => script.src.as_deref(),
            HeadNode::Link(link) => Some(link.href.as_str()),
            HeadNode::Style(_) => None,
        }
    }
}

impl From<ScriptElement> for HeadNode {
    fn from(value: ScriptElement) -> Self {
        HeadNode::Script(value)
    }
}

impl From<LinkElement> for HeadNode {
    fn from(value: LinkElement) -> Self {
        HeadNode::Link(value)
    }
}

impl From<StyleElement> for HeadNode {
    fn from(value: StyleElement) -> Self {
        HeadNode::Style(value)
    }
}
