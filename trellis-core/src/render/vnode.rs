//! Virtual nodes.
//!
//! A [`VNode`] is an immutable description of one node of the UI tree plus
//! two pieces of mutable bookkeeping filled in by the renderer: the platform
//! node it was mounted to (`el`) and, for component vnodes, the live
//! component instance.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::component::{Component, ComponentInstance, FunctionalComponent};
use super::options::NodeHandle;
use super::shape::ShapeFlags;
use crate::value::Value;

/// Properties passed to an element or component.
pub type Props = IndexMap<String, Value>;

/// What a vnode describes.
#[derive(Clone)]
pub enum VNodeType {
    Element(Rc<str>),
    Component(Component),
    Functional(FunctionalComponent),
    Text,
    Comment,
    Fragment,
}

impl VNodeType {
    fn shape(&self) -> ShapeFlags {
        match self {
            VNodeType::Element(_) => ShapeFlags::ELEMENT,
            VNodeType::Component(_) => ShapeFlags::STATEFUL_COMPONENT,
            VNodeType::Functional(_) => ShapeFlags::FUNCTIONAL_COMPONENT,
            VNodeType::Text | VNodeType::Comment | VNodeType::Fragment => ShapeFlags::empty(),
        }
    }
}

impl PartialEq for VNodeType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (VNodeType::Element(a), VNodeType::Element(b)) => a == b,
            (VNodeType::Component(a), VNodeType::Component(b)) => a.ptr_eq(b),
            (VNodeType::Functional(a), VNodeType::Functional(b)) => a.ptr_eq(b),
            (VNodeType::Text, VNodeType::Text)
            | (VNodeType::Comment, VNodeType::Comment)
            | (VNodeType::Fragment, VNodeType::Fragment) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for VNodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VNodeType::Element(tag) => write!(f, "<{}>", tag),
            VNodeType::Component(c) => write!(f, "Component({})", c.name().unwrap_or("anonymous")),
            VNodeType::Functional(_) => f.write_str("Functional"),
            VNodeType::Text => f.write_str("Text"),
            VNodeType::Comment => f.write_str("Comment"),
            VNodeType::Fragment => f.write_str("Fragment"),
        }
    }
}

impl From<&str> for VNodeType {
    fn from(tag: &str) -> Self {
        VNodeType::Element(Rc::from(tag))
    }
}

impl From<String> for VNodeType {
    fn from(tag: String) -> Self {
        VNodeType::Element(Rc::from(tag))
    }
}

impl From<Component> for VNodeType {
    fn from(c: Component) -> Self {
        VNodeType::Component(c)
    }
}

impl From<&Component> for VNodeType {
    fn from(c: &Component) -> Self {
        VNodeType::Component(c.clone())
    }
}

impl From<FunctionalComponent> for VNodeType {
    fn from(f: FunctionalComponent) -> Self {
        VNodeType::Functional(f)
    }
}

/// Identity of a vnode among its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Str(Rc<str>),
    Int(i64),
}

impl Key {
    /// Keys come from the `key` prop. Integral numbers key as integers,
    /// anything else by its display string.
    pub fn from_value(value: &Value) -> Option<Key> {
        match value {
            Value::Null => None,
            Value::Number(n) if n.fract() == 0.0 => Some(Key::Int(*n as i64)),
            Value::Str(s) => Some(Key::Str(s.clone())),
            other => Some(Key::Str(Rc::from(other.to_display_string()))),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(Rc::from(s))
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Int(n)
    }
}

/// A slot function: takes slot props, returns the rendered nodes.
pub type SlotFn = Rc<dyn Fn(&Value) -> Vec<VNode>>;

/// Slot content passed to a component.
#[derive(Clone)]
pub enum SlotContent {
    /// Nodes rendered as-is.
    Static(Vec<VNode>),
    /// Nodes produced from slot props on each render.
    Scoped(SlotFn),
}

impl SlotContent {
    pub fn scoped<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Vec<VNode> + 'static,
    {
        SlotContent::Scoped(Rc::new(f))
    }
}

/// Named slot content, as written by a parent.
pub type RawSlots = IndexMap<String, SlotContent>;

/// Children of a vnode.
#[derive(Clone, Default)]
pub enum Children {
    #[default]
    None,
    Text(Rc<str>),
    Array(Vec<VNode>),
    Slots(RawSlots),
}

impl Children {
    fn shape(&self) -> ShapeFlags {
        match self {
            Children::None => ShapeFlags::empty(),
            Children::Text(_) => ShapeFlags::TEXT_CHILDREN,
            Children::Array(_) => ShapeFlags::ARRAY_CHILDREN,
            Children::Slots(_) => ShapeFlags::SLOTS_CHILDREN,
        }
    }

    pub fn as_array(&self) -> &[VNode] {
        match self {
            Children::Array(items) => items,
            _ => &[],
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Children::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<()> for Children {
    fn from(_: ()) -> Self {
        Children::None
    }
}

impl From<&str> for Children {
    fn from(text: &str) -> Self {
        Children::Text(Rc::from(text))
    }
}

impl From<String> for Children {
    fn from(text: String) -> Self {
        Children::Text(Rc::from(text))
    }
}

impl From<Vec<VNode>> for Children {
    fn from(items: Vec<VNode>) -> Self {
        Children::Array(items)
    }
}

impl From<VNode> for Children {
    fn from(item: VNode) -> Self {
        Children::Array(vec![item])
    }
}

impl From<RawSlots> for Children {
    fn from(slots: RawSlots) -> Self {
        Children::Slots(slots)
    }
}

impl<T: Into<Children>> From<Option<T>> for Children {
    fn from(children: Option<T>) -> Self {
        children.map_or(Children::None, Into::into)
    }
}

/// Anything usable as the props argument of [`h`].
pub trait IntoProps {
    fn into_props(self) -> Option<Props>;
}

impl IntoProps for () {
    fn into_props(self) -> Option<Props> {
        None
    }
}

impl IntoProps for Props {
    fn into_props(self) -> Option<Props> {
        Some(self)
    }
}

impl IntoProps for Option<Props> {
    fn into_props(self) -> Option<Props> {
        self
    }
}

impl<K: Into<String>, const N: usize> IntoProps for [(K, Value); N] {
    fn into_props(self) -> Option<Props> {
        Some(self.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<K: Into<String>> IntoProps for Vec<(K, Value)> {
    fn into_props(self) -> Option<Props> {
        Some(self.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl IntoProps for serde_json::Value {
    fn into_props(self) -> Option<Props> {
        match self {
            serde_json::Value::Object(map) => {
                Some(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
            serde_json::Value::Null => None,
            other => {
                tracing::warn!(props = %other, "props must be an object");
                None
            }
        }
    }
}

struct VNodeInner {
    node_type: VNodeType,
    props: Option<Props>,
    children: Children,
    key: Option<Key>,
    shape_flag: ShapeFlags,
    el: Cell<Option<NodeHandle>>,
    /// End marker of a mounted fragment.
    anchor: Cell<Option<NodeHandle>>,
    component: RefCell<Option<ComponentInstance>>,
}

/// A node of the virtual tree.
#[derive(Clone)]
pub struct VNode(Rc<VNodeInner>);

/// Non-owning handle to a [`VNode`].
#[derive(Clone, Default)]
pub struct WeakVNode(Weak<VNodeInner>);

impl WeakVNode {
    pub fn upgrade(&self) -> Option<VNode> {
        self.0.upgrade().map(VNode)
    }
}

impl VNode {
    pub fn node_type(&self) -> &VNodeType {
        &self.0.node_type
    }

    pub fn props(&self) -> Option<&Props> {
        self.0.props.as_ref()
    }

    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.0.props.as_ref().and_then(|props| props.get(key))
    }

    pub fn children(&self) -> &Children {
        &self.0.children
    }

    pub fn key(&self) -> Option<&Key> {
        self.0.key.as_ref()
    }

    pub fn shape_flag(&self) -> ShapeFlags {
        self.0.shape_flag
    }

    /// Platform node this vnode was mounted to.
    pub fn el(&self) -> Option<NodeHandle> {
        self.0.el.get()
    }

    pub(crate) fn set_el(&self, el: Option<NodeHandle>) {
        self.0.el.set(el);
    }

    pub(crate) fn anchor(&self) -> Option<NodeHandle> {
        self.0.anchor.get()
    }

    pub(crate) fn set_anchor(&self, anchor: Option<NodeHandle>) {
        self.0.anchor.set(anchor);
    }

    /// Live instance behind a component vnode.
    pub fn component(&self) -> Option<ComponentInstance> {
        self.0.component.borrow().clone()
    }

    pub(crate) fn set_component(&self, instance: Option<ComponentInstance>) {
        let previous = self.0.component.replace(instance);
        drop(previous);
    }

    pub fn is_component(&self) -> bool {
        self.0.shape_flag.intersects(ShapeFlags::COMPONENT)
    }

    /// Tag name of an element vnode.
    pub fn tag(&self) -> Option<&str> {
        match &self.0.node_type {
            VNodeType::Element(tag) => Some(tag),
            _ => None,
        }
    }

    pub fn ptr_eq(&self, other: &VNode) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn downgrade(&self) -> WeakVNode {
        WeakVNode(Rc::downgrade(&self.0))
    }
}

impl fmt::Debug for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("VNode");
        s.field("type", &self.0.node_type);
        if let Some(key) = &self.0.key {
            s.field("key", key);
        }
        match &self.0.children {
            Children::None => {}
            Children::Text(text) => {
                s.field("text", text);
            }
            Children::Array(items) => {
                s.field("children", items);
            }
            Children::Slots(slots) => {
                s.field("slots", &slots.keys().collect::<Vec<_>>());
            }
        }
        s.field("el", &self.0.el.get()).finish()
    }
}

/// Build a vnode.
///
/// The `key` prop, if present, becomes the vnode's key and is removed from
/// the props. The shape flag combines the node kind with the children kind.
pub fn create_vnode(
    node_type: impl Into<VNodeType>,
    props: Option<Props>,
    children: impl Into<Children>,
) -> VNode {
    let node_type = node_type.into();
    let mut children = children.into();
    // Fragments only hold arrays
    if node_type == VNodeType::Fragment && matches!(children, Children::Text(_)) {
        children = Children::Array(normalize_children_to_array(&children));
    }

    let mut props = props;
    let key = props
        .as_mut()
        .and_then(|p| p.shift_remove("key"))
        .and_then(|k| Key::from_value(&k));

    let mut shape_flag = node_type.shape() | children.shape();
    // Only components interpret slot objects
    if shape_flag.contains(ShapeFlags::SLOTS_CHILDREN) && !shape_flag.intersects(ShapeFlags::COMPONENT) {
        tracing::warn!(node = ?node_type, "slot children on a non-component vnode are ignored");
        shape_flag.remove(ShapeFlags::SLOTS_CHILDREN);
    }

    VNode(Rc::new(VNodeInner {
        node_type,
        props,
        children,
        key,
        shape_flag,
        el: Cell::new(None),
        anchor: Cell::new(None),
        component: RefCell::new(None),
    }))
}

/// Hyperscript helper: `h("div", [("id", "app".into())], "hello")`.
pub fn h(node_type: impl Into<VNodeType>, props: impl IntoProps, children: impl Into<Children>) -> VNode {
    create_vnode(node_type, props.into_props(), children)
}

/// A text node.
pub fn text_vnode(text: impl Into<String>) -> VNode {
    create_vnode(VNodeType::Text, None, Children::Text(Rc::from(text.into())))
}

/// A comment node. Also stands in for "renders nothing".
pub fn comment_vnode(text: impl Into<String>) -> VNode {
    create_vnode(VNodeType::Comment, None, Children::Text(Rc::from(text.into())))
}

/// A fragment: children are mounted directly into the parent.
pub fn fragment(children: Vec<VNode>) -> VNode {
    create_vnode(VNodeType::Fragment, None, Children::Array(children))
}

/// A keyed fragment.
pub fn keyed_fragment(key: Key, children: Vec<VNode>) -> VNode {
    let mut props = Props::new();
    props.insert(
        "key".into(),
        match key {
            Key::Str(s) => Value::Str(s),
            Key::Int(n) => Value::from(n),
        },
    );
    create_vnode(VNodeType::Fragment, Some(props), Children::Array(children))
}

/// Children as a flat list: text becomes a single text vnode, slot maps
/// and no children become an empty list.
pub fn normalize_children_to_array(children: &Children) -> Vec<VNode> {
    match children {
        Children::None | Children::Slots(_) => Vec::new(),
        Children::Text(text) => vec![text_vnode(text.to_string())],
        Children::Array(items) => items.clone(),
    }
}

/// Same type and same key: the renderer may patch one into the other.
pub fn is_same_vnode_type(a: &VNode, b: &VNode) -> bool {
    a.node_type() == b.node_type() && a.key() == b.key()
}

/// Class binding as a class attribute: a list keeps its non-empty strings,
/// a map keeps the keys whose values are truthy.
pub fn normalize_class(value: &Value) -> String {
    match value {
        Value::Object(_) | Value::Reactive(_) => {
            let json = serde_json::Value::from(value);
            match json {
                serde_json::Value::Array(items) => items
                    .iter()
                    .filter_map(|item| item.as_str().filter(|s| !s.is_empty()))
                    .collect::<Vec<_>>()
                    .join(" "),
                serde_json::Value::Object(map) => map
                    .iter()
                    .filter(|(_, enabled)| Value::from((*enabled).clone()).truthy())
                    .map(|(name, _)| name.as_str())
                    .collect::<Vec<_>>()
                    .join(" "),
                other => other.to_string(),
            }
        }
        other => other.to_display_string(),
    }
}

/// Style binding as a style attribute, `name: value` pairs joined by `; `.
pub fn normalize_style(value: &Value) -> String {
    match serde_json::Value::from(value) {
        serde_json::Value::Object(map) => map
            .iter()
            .map(|(name, v)| match v {
                serde_json::Value::String(s) => format!("{name}: {s}"),
                other => format!("{name}: {other}"),
            })
            .collect::<Vec<_>>()
            .join("; "),
        _ => value.to_display_string(),
    }
}
