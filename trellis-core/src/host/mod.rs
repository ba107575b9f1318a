//! Headless host platform.
//!
//! [`MemoryDom`] implements [`RendererOptions`] over an in-memory node arena.
//! It is enough to run the renderer and whole apps without a browser:
//! elements carry attributes and event listeners, the tree serializes to
//! HTML, and every platform operation is counted so tests can check how
//! much work a patch did.

use std::cell::{Cell, RefCell};
use std::fmt;

use indexmap::IndexMap;

use crate::render::{normalize_class, normalize_style, NodeHandle, RendererOptions};
use crate::value::{Function, Value};

/// Counts of platform operations since creation or the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DomStats {
    /// Elements, text and comment nodes created by the renderer.
    pub created: usize,
    pub inserted: usize,
    pub removed: usize,
    /// `set_text` and `set_element_text` calls.
    pub text_sets: usize,
    pub prop_patches: usize,
}

#[derive(Debug)]
enum NodeKind {
    Element {
        tag: String,
        attrs: IndexMap<String, String>,
        listeners: IndexMap<String, Function>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug)]
struct HostNode {
    kind: NodeKind,
    parent: Option<NodeHandle>,
    children: Vec<NodeHandle>,
}

impl HostNode {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
        }
    }
}

const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

/// In-memory platform.
#[derive(Default)]
pub struct MemoryDom {
    nodes: RefCell<Vec<HostNode>>,
    containers: RefCell<Vec<NodeHandle>>,
    stats: Cell<DomStats>,
}

impl MemoryDom {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached `<div id="...">` that selectors can find.
    pub fn create_container(&self, id: &str) -> NodeHandle {
        let mut attrs = IndexMap::new();
        attrs.insert("id".to_string(), id.to_string());
        let handle = self.alloc(NodeKind::Element {
            tag: "div".to_string(),
            attrs,
            listeners: IndexMap::new(),
        });
        self.containers.borrow_mut().push(handle);
        handle
    }

    fn alloc(&self, kind: NodeKind) -> NodeHandle {
        let mut nodes = self.nodes.borrow_mut();
        nodes.push(HostNode::new(kind));
        NodeHandle::new(nodes.len() as u64 - 1)
    }

    fn bump(&self, f: impl FnOnce(&mut DomStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }

    pub fn stats(&self) -> DomStats {
        self.stats.get()
    }

    pub fn reset_stats(&self) {
        self.stats.set(DomStats::default());
    }

    /// Detach `child` from its parent without counting a removal.
    fn detach(nodes: &mut [HostNode], child: NodeHandle) {
        let index = child.raw() as usize;
        let Some(parent) = nodes.get_mut(index).and_then(|node| node.parent.take()) else {
            return;
        };
        if let Some(parent) = nodes.get_mut(parent.raw() as usize) {
            parent.children.retain(|c| *c != child);
        }
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    pub fn children(&self, node: NodeHandle) -> Vec<NodeHandle> {
        self.nodes
            .borrow()
            .get(node.raw() as usize)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn parent(&self, node: NodeHandle) -> Option<NodeHandle> {
        self.nodes.borrow().get(node.raw() as usize).and_then(|n| n.parent)
    }

    pub fn tag(&self, node: NodeHandle) -> Option<String> {
        match &self.nodes.borrow().get(node.raw() as usize)?.kind {
            NodeKind::Element { tag, .. } => Some(tag.clone()),
            _ => None,
        }
    }

    pub fn attribute(&self, node: NodeHandle, name: &str) -> Option<String> {
        match &self.nodes.borrow().get(node.raw() as usize)?.kind {
            NodeKind::Element { attrs, .. } => attrs.get(name).cloned(),
            _ => None,
        }
    }

    /// Event names with a registered listener on `node`.
    pub fn listeners(&self, node: NodeHandle) -> Vec<String> {
        match self.nodes.borrow().get(node.raw() as usize).map(|n| &n.kind) {
            Some(NodeKind::Element { listeners, .. }) => listeners.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Concatenated text of `node` and its descendants.
    pub fn text_content(&self, node: NodeHandle) -> String {
        let nodes = self.nodes.borrow();
        let mut out = String::new();
        collect_text(&nodes, node, &mut out);
        out
    }

    /// Serialize `node` and its descendants.
    pub fn to_html(&self, node: NodeHandle) -> String {
        let nodes = self.nodes.borrow();
        let mut out = String::new();
        write_html(&nodes, node, &mut out);
        out
    }

    /// Serialize the children of `node`.
    pub fn inner_html(&self, node: NodeHandle) -> String {
        let nodes = self.nodes.borrow();
        let mut out = String::new();
        if let Some(host) = nodes.get(node.raw() as usize) {
            for child in &host.children {
                write_html(&nodes, *child, &mut out);
            }
        }
        out
    }

    /// Call the listener for `event` on `el` with `args`. Returns whether a
    /// listener was registered.
    pub fn dispatch(&self, el: NodeHandle, event: &str, args: &[Value]) -> bool {
        let handler = match self.nodes.borrow().get(el.raw() as usize).map(|n| &n.kind) {
            Some(NodeKind::Element { listeners, .. }) => listeners.get(event).cloned(),
            _ => None,
        };

        match handler {
            Some(handler) => {
                tracing::trace!(el = ?el, event, "dispatching event");
                handler.call(args);
                true
            }
            None => false,
        }
    }

    fn find(&self, root: NodeHandle, selector: &Selector<'_>) -> Option<NodeHandle> {
        let nodes = self.nodes.borrow();
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            let node = nodes.get(handle.raw() as usize)?;
            if selector.matches(&node.kind) {
                return Some(handle);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }
}

impl fmt::Debug for MemoryDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryDom")
            .field("nodes", &self.nodes.borrow().len())
            .field("containers", &self.containers.borrow())
            .field("stats", &self.stats.get())
            .finish()
    }
}

enum Selector<'a> {
    Id(&'a str),
    Class(&'a str),
    Tag(&'a str),
}

impl<'a> Selector<'a> {
    fn parse(selector: &'a str) -> Self {
        let selector = selector.trim();
        if let Some(id) = selector.strip_prefix('#') {
            Selector::Id(id)
        } else if let Some(class) = selector.strip_prefix('.') {
            Selector::Class(class)
        } else {
            Selector::Tag(selector)
        }
    }

    fn matches(&self, kind: &NodeKind) -> bool {
        let NodeKind::Element { tag, attrs, .. } = kind else {
            return false;
        };
        match self {
            Selector::Id(id) => attrs.get("id").map_or(false, |v| v == id),
            Selector::Class(class) => attrs
                .get("class")
                .map_or(false, |v| v.split_whitespace().any(|c| c == *class)),
            Selector::Tag(name) => tag.eq_ignore_ascii_case(name),
        }
    }
}

fn collect_text(nodes: &[HostNode], handle: NodeHandle, out: &mut String) {
    let Some(node) = nodes.get(handle.raw() as usize) else {
        return;
    };
    match &node.kind {
        NodeKind::Text(text) => out.push_str(text),
        NodeKind::Comment(_) => {}
        NodeKind::Element { .. } => {
            for child in &node.children {
                collect_text(nodes, *child, out);
            }
        }
    }
}

fn write_html(nodes: &[HostNode], handle: NodeHandle, out: &mut String) {
    let Some(node) = nodes.get(handle.raw() as usize) else {
        return;
    };
    match &node.kind {
        NodeKind::Text(text) => out.push_str(&escape(text, false)),
        NodeKind::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeKind::Element { tag, attrs, .. } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in attrs {
                out.push(' ');
                out.push_str(name);
                if !value.is_empty() {
                    out.push_str("=\"");
                    out.push_str(&escape(value, true));
                    out.push('"');
                }
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&tag.as_str()) {
                return;
            }
            for child in &node.children {
                write_html(nodes, *child, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

/// `onClick` to `click`, `onItemClick` to `itemClick`.
fn event_name(key: &str) -> Option<String> {
    let rest = key.strip_prefix("on")?;
    let mut chars = rest.chars();
    let first = chars.next()?;
    if !first.is_ascii_uppercase() {
        return None;
    }
    Some(first.to_ascii_lowercase().to_string() + chars.as_str())
}

impl RendererOptions for MemoryDom {
    fn create_element(&self, tag: &str) -> NodeHandle {
        self.bump(|s| s.created += 1);
        self.alloc(NodeKind::Element {
            tag: tag.to_string(),
            attrs: IndexMap::new(),
            listeners: IndexMap::new(),
        })
    }

    fn set_element_text(&self, el: NodeHandle, text: &str) {
        self.bump(|s| s.text_sets += 1);
        let mut nodes = self.nodes.borrow_mut();
        let old_children = match nodes.get_mut(el.raw() as usize) {
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };
        for child in old_children {
            if let Some(node) = nodes.get_mut(child.raw() as usize) {
                node.parent = None;
            }
        }

        if !text.is_empty() {
            nodes.push(HostNode {
                kind: NodeKind::Text(text.to_string()),
                parent: Some(el),
                children: Vec::new(),
            });
            let text_node = NodeHandle::new(nodes.len() as u64 - 1);
            if let Some(node) = nodes.get_mut(el.raw() as usize) {
                node.children.push(text_node);
            }
        }
    }

    fn insert(&self, parent: NodeHandle, child: NodeHandle, anchor: Option<NodeHandle>) {
        self.bump(|s| s.inserted += 1);
        let mut nodes = self.nodes.borrow_mut();
        Self::detach(&mut nodes, child);

        let Some(parent_node) = nodes.get_mut(parent.raw() as usize) else {
            tracing::warn!(parent = ?parent, "insert into unknown node");
            return;
        };
        let position = anchor.and_then(|anchor| parent_node.children.iter().position(|c| *c == anchor));
        match position {
            Some(index) => parent_node.children.insert(index, child),
            None => {
                if let Some(anchor) = anchor {
                    tracing::warn!(anchor = ?anchor, "anchor is not a child of the parent, appending");
                }
                parent_node.children.push(child);
            }
        }

        if let Some(node) = nodes.get_mut(child.raw() as usize) {
            node.parent = Some(parent);
        }
    }

    fn remove(&self, child: NodeHandle) {
        self.bump(|s| s.removed += 1);
        Self::detach(&mut self.nodes.borrow_mut(), child);
    }

    fn create_text(&self, text: &str) -> NodeHandle {
        self.bump(|s| s.created += 1);
        self.alloc(NodeKind::Text(text.to_string()))
    }

    fn next_sibling(&self, node: NodeHandle) -> Option<NodeHandle> {
        let nodes = self.nodes.borrow();
        let parent = nodes.get(node.raw() as usize)?.parent?;
        let siblings = &nodes.get(parent.raw() as usize)?.children;
        let index = siblings.iter().position(|c| *c == node)?;
        siblings.get(index + 1).copied()
    }

    fn set_text(&self, node: NodeHandle, text: &str) {
        self.bump(|s| s.text_sets += 1);
        let mut nodes = self.nodes.borrow_mut();
        match nodes.get_mut(node.raw() as usize).map(|n| &mut n.kind) {
            Some(NodeKind::Text(current)) | Some(NodeKind::Comment(current)) => {
                *current = text.to_string();
            }
            _ => tracing::warn!(node = ?node, "set_text on a non-text node"),
        }
    }

    fn patch_prop(&self, el: NodeHandle, key: &str, _prev: Option<&Value>, next: Option<&Value>) {
        self.bump(|s| s.prop_patches += 1);
        let mut nodes = self.nodes.borrow_mut();
        let Some(NodeKind::Element { attrs, listeners, .. }) =
            nodes.get_mut(el.raw() as usize).map(|n| &mut n.kind)
        else {
            tracing::warn!(el = ?el, key, "patch_prop on a non-element node");
            return;
        };

        if let Some(event) = event_name(key) {
            let previous = match next {
                Some(Value::Function(handler)) => listeners.insert(event, handler.clone()),
                _ => listeners.shift_remove(&event),
            };
            drop(nodes);
            drop(previous);
            return;
        }

        let rendered = match next {
            None | Some(Value::Null) | Some(Value::Bool(false)) => None,
            Some(Value::Bool(true)) => Some(String::new()),
            Some(value) => Some(match key {
                "class" => normalize_class(value),
                "style" => normalize_style(value),
                _ => value.to_display_string(),
            }),
        };

        match rendered {
            Some(value) => {
                attrs.insert(key.to_string(), value);
            }
            None => {
                attrs.shift_remove(key);
            }
        }
    }

    fn create_comment(&self, text: &str) -> NodeHandle {
        self.bump(|s| s.created += 1);
        self.alloc(NodeKind::Comment(text.to_string()))
    }

    fn query_selector(&self, selector: &str) -> Option<NodeHandle> {
        let selector = Selector::parse(selector);
        let containers = self.containers.borrow().clone();
        containers
            .into_iter()
            .find_map(|container| self.find(container, &selector))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn insert_before_anchor_and_move() {
        let dom = MemoryDom::new();
        let root = dom.create_container("root");
        let a = dom.create_element("a");
        let b = dom.create_element("b");
        let c = dom.create_element("c");

        dom.insert(root, a, None);
        dom.insert(root, c, None);
        dom.insert(root, b, Some(c));
        assert_eq!(dom.inner_html(root), "<a></a><b></b><c></c>");

        // Inserting an attached node moves it
        dom.insert(root, a, None);
        assert_eq!(dom.inner_html(root), "<b></b><c></c><a></a>");
        assert_eq!(dom.stats().inserted, 4);
        assert_eq!(dom.stats().removed, 0);
    }

    #[test]
    fn props_render_as_attributes() {
        let dom = MemoryDom::new();
        let el = dom.create_element("input");

        dom.patch_prop(el, "disabled", None, Some(&Value::Bool(true)));
        dom.patch_prop(el, "value", None, Some(&Value::from(3)));
        dom.patch_prop(
            el,
            "class",
            None,
            Some(&Value::from(serde_json::json!({"active": true, "hidden": false}))),
        );
        assert_eq!(dom.to_html(el), r#"<input disabled value="3" class="active">"#);

        dom.patch_prop(el, "disabled", Some(&Value::Bool(true)), None);
        assert_eq!(dom.attribute(el, "disabled"), None);
    }

    #[test]
    fn listeners_are_dispatched() {
        let dom = MemoryDom::new();
        let el = dom.create_element("button");
        let clicks = Rc::new(Cell::new(0));
        let clicks_clone = clicks.clone();
        let handler = Value::Function(Function::new(move |_| {
            clicks_clone.set(clicks_clone.get() + 1);
            Value::Null
        }));

        dom.patch_prop(el, "onClick", None, Some(&handler));
        assert_eq!(dom.listeners(el), vec!["click"]);
        assert!(dom.dispatch(el, "click", &[]));
        assert!(!dom.dispatch(el, "input", &[]));
        assert_eq!(clicks.get(), 1);

        dom.patch_prop(el, "onClick", Some(&handler), None);
        assert!(!dom.dispatch(el, "click", &[]));
    }

    #[test]
    fn next_sibling_follows_parent_order() {
        let dom = MemoryDom::new();
        let root = dom.create_container("root");
        let a = dom.create_element("a");
        let b = dom.create_text("b");
        dom.insert(root, a, None);
        dom.insert(root, b, None);

        assert_eq!(dom.next_sibling(a), Some(b));
        assert_eq!(dom.next_sibling(b), None);
        assert_eq!(dom.next_sibling(root), None);
    }

    #[test]
    fn query_selector_searches_containers() {
        let dom = MemoryDom::new();
        let app = dom.create_container("app");
        let list = dom.create_element("ul");
        dom.patch_prop(list, "class", None, Some(&Value::from("items big")));
        dom.insert(app, list, None);

        assert_eq!(dom.query_selector("#app"), Some(app));
        assert_eq!(dom.query_selector(".big"), Some(list));
        assert_eq!(dom.query_selector("ul"), Some(list));
        assert_eq!(dom.query_selector("#missing"), None);
    }

    #[test]
    fn element_text_replaces_children() {
        let dom = MemoryDom::new();
        let el = dom.create_element("p");
        let child = dom.create_element("b");
        dom.insert(el, child, None);

        dom.set_element_text(el, "a < b");
        assert_eq!(dom.to_html(el), "<p>a &lt; b</p>");
        assert_eq!(dom.parent(child), None);

        dom.set_element_text(el, "");
        assert!(dom.children(el).is_empty());
    }
}
