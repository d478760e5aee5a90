//! Document Tree Provider: the live page the engine reads and drives.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use skillstar_browser::WaitUntil;

use crate::error::TreeError;

/// Handle to one rendered element.
///
/// A CSS selector pinned to a single node; it stays valid until the node is
/// removed from the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementRef(String);

impl ElementRef {
    pub fn new(selector: impl Into<String>) -> Self {
        Self(selector.into())
    }

    pub fn selector(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Structural copy of an element: enough to evaluate predicates offline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub handle: ElementRef,
    #[serde(default)]
    pub tag: String,
    /// Rendered text, trimmed.
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Filled by [`DocumentTree::inspect`]; empty in [`DocumentTree::find`] results.
    #[serde(default)]
    pub children: Vec<NodeSnapshot>,
}

impl NodeSnapshot {
    pub fn new(handle: ElementRef, tag: impl Into<String>) -> Self {
        Self {
            handle,
            tag: tag.into(),
            text: String::new(),
            classes: Vec::new(),
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: NodeSnapshot) -> Self {
        self.children.push(child);
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Every node below this one, depth first.
    pub fn descendants(&self) -> Vec<&NodeSnapshot> {
        let mut out = Vec::new();
        let mut stack: Vec<&NodeSnapshot> = self.children.iter().rev().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }
}

/// A CSS query, optionally scoped to the subtree of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub scope: Option<ElementRef>,
    pub selector: String,
}

impl Query {
    /// Match across the whole document.
    pub fn all(selector: impl Into<String>) -> Self {
        Self {
            scope: None,
            selector: selector.into(),
        }
    }

    /// Match inside `scope` only.
    pub fn within(scope: &ElementRef, selector: impl Into<String>) -> Self {
        Self {
            scope: Some(scope.clone()),
            selector: selector.into(),
        }
    }
}

/// The live, mutable page.
///
/// Every operation is a suspension point; callers await each one before
/// issuing the next, so implementations never see concurrent calls from a
/// single task.
#[async_trait]
pub trait DocumentTree: Send + Sync {
    /// Load `url` and wait per `wait`.
    async fn navigate(&self, url: &str, wait: WaitUntil) -> Result<(), TreeError>;

    /// Elements matching `query`, in document order.
    async fn find(&self, query: &Query) -> Result<Vec<NodeSnapshot>, TreeError>;

    /// Element with its subtree.
    async fn inspect(&self, element: &ElementRef) -> Result<NodeSnapshot, TreeError>;

    /// Move the pointer over the element.
    async fn hover(&self, element: &ElementRef) -> Result<(), TreeError>;

    /// Fire synthetic hover events on the element without moving the pointer.
    async fn dispatch_hover(&self, element: &ElementRef) -> Result<(), TreeError>;

    async fn click(&self, element: &ElementRef) -> Result<(), TreeError>;

    async fn scroll_into_view(&self, element: &ElementRef) -> Result<(), TreeError>;

    /// Scroll a scrollable element's content by `delta_y` pixels.
    async fn scroll_by(&self, element: &ElementRef, delta_y: f64) -> Result<(), TreeError>;

    async fn press_key(&self, key: &str) -> Result<(), TreeError>;

    /// Poll until something matching `selector` is visible; `false` on timeout.
    async fn wait_for_visible(&self, selector: &str, timeout: Duration) -> Result<bool, TreeError>;

    async fn wait_for_timeout(&self, duration: Duration);
}
