//! Platform contract.
//!
//! The renderer never touches a real node tree. Everything it does to the
//! platform goes through [`RendererOptions`], and platform nodes are only
//! known to it as opaque [`NodeHandle`]s.

use std::fmt;

use crate::value::Value;

/// Opaque reference to a platform node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(u64);

impl NodeHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Node operations a platform supplies to the renderer.
pub trait RendererOptions {
    fn create_element(&self, tag: &str) -> NodeHandle;

    /// Replace all children of `el` with a single text (none if empty).
    fn set_element_text(&self, el: NodeHandle, text: &str);

    /// Insert `child` into `parent` before `anchor`, or append when `anchor`
    /// is `None`. Inserting an attached node moves it.
    fn insert(&self, parent: NodeHandle, child: NodeHandle, anchor: Option<NodeHandle>);

    /// Detach `child` from its parent, if any.
    fn remove(&self, child: NodeHandle);

    fn create_text(&self, text: &str) -> NodeHandle;

    /// The node following `node` under the same parent.
    fn next_sibling(&self, node: NodeHandle) -> Option<NodeHandle>;

    fn set_text(&self, node: NodeHandle, text: &str);

    /// Apply a property change. `next == None` means the property was removed.
    fn patch_prop(&self, el: NodeHandle, key: &str, prev: Option<&Value>, next: Option<&Value>);

    /// Platforms without comment nodes can rely on the text fallback.
    fn create_comment(&self, text: &str) -> NodeHandle {
        self.create_text(text)
    }

    /// Resolve a selector to a node, for mounting by selector.
    fn query_selector(&self, _selector: &str) -> Option<NodeHandle> {
        None
    }
}
