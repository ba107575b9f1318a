//! Components and component instances.
//!
//! # How Components Work
//!
//! A [`Component`] is a shared, immutable definition built with
//! [`define_component`]. Mounting a component vnode creates a
//! [`ComponentInstance`] that holds everything live about that occurrence of
//! the component: its props and attrs, slots, setup state, provided values,
//! lifecycle hooks, current sub-tree and the render effect.
//!
//! Setting up an instance runs in this order:
//!
//! 1. Split the vnode's props into declared props and fallthrough attrs.
//! 2. Normalize slot content into slot functions.
//! 3. Call `setup` (if any) with the instance as the current instance and
//!    dependency tracking paused. A returned render function becomes the
//!    instance's renderer; a returned object becomes its setup state.
//! 4. Call `data` (if any) and keep the result as reactive state.
//! 5. Fall back to the options' `render`, then to a `template` string in the
//!    setup state, then to the compiled `template` option.
//!
//! Render functions receive a [`ComponentProxy`], a unified read view that
//! resolves names against setup state, props, data, `$`-properties and the
//! application's global properties, in that order.
//!
//! # Ownership
//!
//! The vnode owns its instance, the instance owns its sub-tree, and child
//! instances point back at their parent weakly, so a mounted tree has no
//! reference cycles.

use std::cell::{Cell, OnceCell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

use super::app::AppContext;
use super::emit::Emitter;
use super::lifecycle::{Hook, LifecycleHook};
use super::props::init_props;
use super::slots::{init_slots, Slots};
use super::vnode::{comment_vnode, VNode, VNodeType, WeakVNode};
use crate::compiler;
use crate::reactive::{
    pause_tracking, proxy_refs, reactive, shallow_readonly, ProxyRefs, Reactive, ReactiveEffect,
};
use crate::value::{Object, Value};

/// Renders a component's sub-tree.
pub type RenderFn = Rc<dyn Fn(&ComponentProxy) -> VNode>;

/// Component `setup`: receives shallow-readonly props and the setup context.
pub type SetupFn = Rc<dyn Fn(&Reactive, &SetupContext) -> SetupResult>;

/// Component `data`: returns the initial data object.
pub type DataFn = Rc<dyn Fn() -> Value>;

/// What `setup` produced.
pub enum SetupResult {
    None,
    /// The component renders with this function.
    Render(RenderFn),
    /// An object exposed to the renderer; refs in it auto-unwrap.
    State(Value),
}

impl SetupResult {
    pub fn render<F>(f: F) -> Self
    where
        F: Fn(&ComponentProxy) -> VNode + 'static,
    {
        SetupResult::Render(Rc::new(f))
    }

    pub fn state(state: impl Into<Value>) -> Self {
        SetupResult::State(state.into())
    }
}

impl From<()> for SetupResult {
    fn from(_: ()) -> Self {
        SetupResult::None
    }
}

/// Definition of a stateful component.
#[derive(Default)]
pub struct ComponentOptions {
    pub name: Option<String>,
    /// Declared prop names. Other props become attrs.
    pub props: Vec<String>,
    pub setup: Option<SetupFn>,
    pub render: Option<RenderFn>,
    pub data: Option<DataFn>,
    pub template: Option<String>,
    /// Locally registered child components, by tag name.
    pub components: IndexMap<String, Component>,
}

impl ComponentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn props<I, S>(mut self, props: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.props = props.into_iter().map(Into::into).collect();
        self
    }

    pub fn setup<F>(mut self, setup: F) -> Self
    where
        F: Fn(&Reactive, &SetupContext) -> SetupResult + 'static,
    {
        self.setup = Some(Rc::new(setup));
        self
    }

    pub fn render<F>(mut self, render: F) -> Self
    where
        F: Fn(&ComponentProxy) -> VNode + 'static,
    {
        self.render = Some(Rc::new(render));
        self
    }

    pub fn data<F, R>(mut self, data: F) -> Self
    where
        F: Fn() -> R + 'static,
        R: Into<Value>,
    {
        self.data = Some(Rc::new(move || data().into()));
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn component(mut self, name: impl Into<String>, component: Component) -> Self {
        self.components.insert(name.into(), component);
        self
    }
}

struct ComponentDef {
    options: ComponentOptions,
    compiled: OnceCell<RenderFn>,
}

/// A shared component definition.
#[derive(Clone)]
pub struct Component(Rc<ComponentDef>);

impl Component {
    pub fn name(&self) -> Option<&str> {
        self.0.options.name.as_deref()
    }

    pub fn options(&self) -> &ComponentOptions {
        &self.0.options
    }

    pub fn ptr_eq(&self, other: &Component) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Render function compiled from the template, compiled once per
    /// definition.
    fn compiled_template(&self, app: &AppContext) -> Option<RenderFn> {
        let template = self.0.options.template.as_ref()?;
        let render = self.0.compiled.get_or_init(|| {
            let options = app.config().compiler_options.clone();
            compiler::compile_to_function(template, &options)
        });
        Some(render.clone())
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name())
            .field("props", &self.0.options.props)
            .finish()
    }
}

/// Build a component definition.
pub fn define_component(options: ComponentOptions) -> Component {
    Component(Rc::new(ComponentDef {
        options,
        compiled: OnceCell::new(),
    }))
}

/// A stateless component: a function from props and context to a vnode.
///
/// All props passed to a functional component are props; it has no attrs.
#[derive(Clone)]
pub struct FunctionalComponent(Rc<dyn Fn(&Reactive, &SetupContext) -> VNode>);

impl FunctionalComponent {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Reactive, &SetupContext) -> VNode + 'static,
    {
        Self(Rc::new(f))
    }

    pub fn ptr_eq(&self, other: &FunctionalComponent) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Second argument of `setup`.
#[derive(Clone)]
pub struct SetupContext {
    attrs: Object,
    slots: Slots,
    emitter: Emitter,
}

impl SetupContext {
    pub(crate) fn new(instance: &ComponentInstance) -> Self {
        Self {
            attrs: instance.attrs(),
            slots: instance.slots(),
            emitter: Emitter::new(instance),
        }
    }

    pub fn attrs(&self) -> &Object {
        &self.attrs
    }

    pub fn slots(&self) -> &Slots {
        &self.slots
    }

    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    /// Call the parent's handler for `event`.
    pub fn emit(&self, event: &str, args: &[Value]) {
        self.emitter.emit(event, args);
    }
}

// ----------------------------------------------------------------------------
// Instances
// ----------------------------------------------------------------------------

pub(crate) struct InstanceInner {
    uid: u64,
    vnode_type: VNodeType,
    parent: Option<Weak<InstanceInner>>,
    app: Rc<AppContext>,
    vnode: RefCell<WeakVNode>,
    next: RefCell<Option<VNode>>,
    props: Reactive,
    attrs: Object,
    slots: Slots,
    setup_state: RefCell<Option<ProxyRefs>>,
    data: RefCell<Option<Reactive>>,
    render: RefCell<Option<RenderFn>>,
    provides: RefCell<Option<IndexMap<String, Value>>>,
    hooks: RefCell<HashMap<LifecycleHook, Vec<Hook>>>,
    sub_tree: RefCell<Option<VNode>>,
    update: RefCell<Option<ReactiveEffect>>,
    is_mounted: Cell<bool>,
    is_unmounted: Cell<bool>,
}

/// A live occurrence of a component in the mounted tree.
#[derive(Clone)]
pub struct ComponentInstance(Rc<InstanceInner>);

impl ComponentInstance {
    pub(crate) fn downgrade(&self) -> Weak<InstanceInner> {
        Rc::downgrade(&self.0)
    }

    pub(crate) fn upgrade(weak: &Weak<InstanceInner>) -> Option<ComponentInstance> {
        weak.upgrade().map(ComponentInstance)
    }

    /// Unique, increasing per instance.
    pub fn uid(&self) -> u64 {
        self.0.uid
    }

    pub fn name(&self) -> Option<String> {
        match &self.0.vnode_type {
            VNodeType::Component(c) => c.name().map(str::to_string),
            _ => None,
        }
    }

    pub fn vnode_type(&self) -> &VNodeType {
        &self.0.vnode_type
    }

    pub(crate) fn is_functional(&self) -> bool {
        matches!(self.0.vnode_type, VNodeType::Functional(_))
    }

    /// Declared prop names (empty for functional components).
    pub(crate) fn declared_props(&self) -> &[String] {
        match &self.0.vnode_type {
            VNodeType::Component(c) => &c.options().props,
            _ => &[],
        }
    }

    pub fn parent(&self) -> Option<ComponentInstance> {
        self.0.parent.as_ref().and_then(Weak::upgrade).map(Self)
    }

    pub fn app_context(&self) -> &Rc<AppContext> {
        &self.0.app
    }

    /// The vnode currently representing this instance.
    pub fn vnode(&self) -> Option<VNode> {
        self.0.vnode.borrow().upgrade()
    }

    pub(crate) fn set_vnode(&self, vnode: &VNode) {
        *self.0.vnode.borrow_mut() = vnode.downgrade();
    }

    pub(crate) fn set_next(&self, vnode: Option<VNode>) {
        *self.0.next.borrow_mut() = vnode;
    }

    pub(crate) fn take_next(&self) -> Option<VNode> {
        self.0.next.borrow_mut().take()
    }

    /// Reactive props.
    pub fn props(&self) -> Reactive {
        self.0.props.clone()
    }

    /// Fallthrough attributes: props the component did not declare.
    pub fn attrs(&self) -> Object {
        self.0.attrs.clone()
    }

    pub fn slots(&self) -> Slots {
        self.0.slots.clone()
    }

    pub fn setup_state(&self) -> Option<ProxyRefs> {
        self.0.setup_state.borrow().clone()
    }

    pub fn data(&self) -> Option<Reactive> {
        self.0.data.borrow().clone()
    }

    pub(crate) fn render_fn(&self) -> Option<RenderFn> {
        self.0.render.borrow().clone()
    }

    pub(crate) fn provides(&self) -> &RefCell<Option<IndexMap<String, Value>>> {
        &self.0.provides
    }

    pub(crate) fn add_hook(&self, kind: LifecycleHook, hook: Hook) {
        self.0.hooks.borrow_mut().entry(kind).or_default().push(hook);
    }

    pub(crate) fn hooks(&self, kind: LifecycleHook) -> Vec<Hook> {
        self.0.hooks.borrow().get(&kind).cloned().unwrap_or_default()
    }

    /// Root vnode of the last render.
    pub fn sub_tree(&self) -> Option<VNode> {
        self.0.sub_tree.borrow().clone()
    }

    pub(crate) fn replace_sub_tree(&self, tree: Option<VNode>) -> Option<VNode> {
        self.0.sub_tree.replace(tree)
    }

    /// The render effect. Present once the instance is mounted.
    pub fn update_effect(&self) -> Option<ReactiveEffect> {
        self.0.update.borrow().clone()
    }

    pub(crate) fn set_update_effect(&self, effect: ReactiveEffect) {
        *self.0.update.borrow_mut() = Some(effect);
    }

    pub fn is_mounted(&self) -> bool {
        self.0.is_mounted.get()
    }

    pub(crate) fn set_mounted(&self) {
        self.0.is_mounted.set(true);
    }

    pub fn is_unmounted(&self) -> bool {
        self.0.is_unmounted.get()
    }

    pub(crate) fn set_unmounted(&self) {
        self.0.is_unmounted.set(true);
    }

    /// The read view handed to render functions.
    pub fn proxy(&self) -> ComponentProxy {
        ComponentProxy(self.clone())
    }

    /// Call the parent's handler for `event`.
    pub fn emit(&self, event: &str, args: &[Value]) {
        Emitter::new(self).emit(event, args);
    }

    pub fn ptr_eq(&self, other: &ComponentInstance) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("uid", &self.0.uid)
            .field("type", &self.0.vnode_type)
            .field("mounted", &self.0.is_mounted.get())
            .field("unmounted", &self.0.is_unmounted.get())
            .finish()
    }
}

/// Create the instance for a component vnode.
pub(crate) fn create_component_instance(
    vnode: &VNode,
    parent: Option<&ComponentInstance>,
    app: Rc<AppContext>,
) -> ComponentInstance {
    static UID: AtomicU64 = AtomicU64::new(0);

    let instance = ComponentInstance(Rc::new(InstanceInner {
        uid: UID.fetch_add(1, Ordering::Relaxed),
        vnode_type: vnode.node_type().clone(),
        parent: parent.map(ComponentInstance::downgrade),
        app,
        vnode: RefCell::new(vnode.downgrade()),
        next: RefCell::new(None),
        props: Reactive::new(&Object::new()),
        attrs: Object::new(),
        slots: Slots::default(),
        setup_state: RefCell::new(None),
        data: RefCell::new(None),
        render: RefCell::new(None),
        provides: RefCell::new(None),
        hooks: RefCell::new(HashMap::new()),
        sub_tree: RefCell::new(None),
        update: RefCell::new(None),
        is_mounted: Cell::new(false),
        is_unmounted: Cell::new(false),
    }));

    tracing::trace!(uid = instance.uid(), component = ?vnode.node_type(), "created component instance");
    instance
}

/// Run the setup sequence described in the module docs.
pub(crate) fn setup_component(instance: &ComponentInstance, vnode: &VNode) {
    init_props(instance, vnode.props());
    init_slots(instance, vnode.children());

    match instance.vnode_type().clone() {
        VNodeType::Component(component) => setup_stateful_component(instance, &component),
        VNodeType::Functional(functional) => {
            let render: RenderFn = Rc::new(move |proxy: &ComponentProxy| {
                let context = SetupContext::new(proxy.instance());
                (functional.0)(&proxy.props(), &context)
            });
            *instance.0.render.borrow_mut() = Some(render);
        }
        other => tracing::error!(node = ?other, "setup_component called on a non-component vnode"),
    }
}

fn setup_stateful_component(instance: &ComponentInstance, component: &Component) {
    let options = component.options();

    if let Some(setup) = &options.setup {
        let context = SetupContext::new(instance);
        let props = match shallow_readonly(instance.props()) {
            Value::Reactive(view) => view,
            _ => instance.props(),
        };

        let result = {
            let _current = set_current_instance(Some(instance.clone()));
            let _pause = pause_tracking();
            setup(&props, &context)
        };
        handle_setup_result(instance, result);
    }

    if let Some(data) = &options.data {
        match reactive(data()) {
            Value::Reactive(view) => *instance.0.data.borrow_mut() = Some(view),
            other => tracing::warn!(
                value_type = other.type_name(),
                "data() should return an object"
            ),
        }
    }

    finish_component_setup(instance, component);
}

fn handle_setup_result(instance: &ComponentInstance, result: SetupResult) {
    match result {
        SetupResult::None => {}
        SetupResult::Render(render) => *instance.0.render.borrow_mut() = Some(render),
        SetupResult::State(state) if state.is_object() => {
            *instance.0.setup_state.borrow_mut() = Some(proxy_refs(state));
        }
        SetupResult::State(other) => tracing::warn!(
            value_type = other.type_name(),
            "setup() should return an object or a render function"
        ),
    }
}

fn finish_component_setup(instance: &ComponentInstance, component: &Component) {
    if instance.render_fn().is_some() {
        return;
    }

    let render = component
        .options()
        .render
        .clone()
        .or_else(|| setup_state_template(instance))
        .or_else(|| component.compiled_template(instance.app_context()));

    match render {
        Some(render) => *instance.0.render.borrow_mut() = Some(render),
        None => tracing::warn!(
            component = component.name().unwrap_or("anonymous"),
            "component is missing a template or render function"
        ),
    }
}

/// Template string returned from `setup`, compiled for this instance only.
fn setup_state_template(instance: &ComponentInstance) -> Option<RenderFn> {
    let state = instance.setup_state()?;
    if !state.has("template") {
        return None;
    }
    let template = state.get("template");
    let template = template.as_str()?;
    let options = instance.app_context().config().compiler_options.clone();
    Some(compiler::compile_to_function(template, &options))
}

/// Call the instance's render function. A missing renderer renders nothing.
pub(crate) fn render_component_root(instance: &ComponentInstance) -> VNode {
    match instance.render_fn() {
        Some(render) => render(&instance.proxy()),
        None => comment_vnode(""),
    }
}

// ----------------------------------------------------------------------------
// Current instance
// ----------------------------------------------------------------------------

thread_local! {
    static CURRENT_INSTANCE: RefCell<Option<ComponentInstance>> = const { RefCell::new(None) };
}

/// The instance whose `setup` or lifecycle hook is running.
pub fn get_current_instance() -> Option<ComponentInstance> {
    CURRENT_INSTANCE.with(|current| current.borrow().clone())
}

/// Restores the previous current instance when dropped.
pub(crate) struct CurrentInstanceGuard {
    previous: Option<ComponentInstance>,
}

impl Drop for CurrentInstanceGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT_INSTANCE.with(|current| *current.borrow_mut() = previous);
    }
}

pub(crate) fn set_current_instance(instance: Option<ComponentInstance>) -> CurrentInstanceGuard {
    let previous = CURRENT_INSTANCE.with(|current| current.replace(instance));
    CurrentInstanceGuard { previous }
}

// ----------------------------------------------------------------------------
// Proxy
// ----------------------------------------------------------------------------

/// Unified read view over an instance, handed to render functions.
#[derive(Clone)]
pub struct ComponentProxy(ComponentInstance);

/// Non-owning [`ComponentProxy`], for closures stored in the tree.
#[derive(Clone)]
pub struct WeakProxy(Weak<InstanceInner>);

impl WeakProxy {
    pub fn upgrade(&self) -> Option<ComponentProxy> {
        self.0.upgrade().map(|inner| ComponentProxy(ComponentInstance(inner)))
    }
}

impl ComponentProxy {
    /// Resolve a name: setup state (refs unwrapped), props, data, the
    /// `$props`/`$attrs`/`$emit`/`$el` properties, then global properties.
    /// Unknown names read as `Null`.
    pub fn get(&self, key: &str) -> Value {
        let instance = &self.0;

        if let Some(state) = instance.setup_state() {
            if state.has(key) {
                return state.get(key);
            }
        }

        if instance.0.props.raw().contains_key(key) {
            return instance.0.props.get(key);
        }

        if let Some(data) = instance.data() {
            if data.raw().contains_key(key) {
                return data.get(key);
            }
        }

        match key {
            "$props" => return Value::Reactive(instance.props()),
            "$attrs" => return Value::Object(instance.attrs()),
            "$emit" => {
                let emitter = Emitter::new(instance);
                return Value::Function(emitter.as_function());
            }
            "$el" => {
                return instance
                    .vnode()
                    .and_then(|vnode| vnode.el())
                    .map_or(Value::Null, |el| Value::from(el.raw()));
            }
            _ => {}
        }

        if let Some(value) = instance.app_context().global_property(key) {
            return value;
        }

        tracing::trace!(key, "property not found on component proxy");
        Value::Null
    }

    /// Write setup state or data. Props are readonly.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> bool {
        let instance = &self.0;
        let value = value.into();

        if let Some(state) = instance.setup_state() {
            if state.has(key) {
                return state.set(key, value);
            }
        }

        if let Some(data) = instance.data() {
            if data.raw().contains_key(key) {
                return data.set(key, value);
            }
        }

        if instance.0.props.raw().contains_key(key) {
            tracing::warn!(key, "attempting to mutate prop: props are readonly");
            return false;
        }

        tracing::warn!(key, "cannot set unknown property on component proxy");
        false
    }

    pub fn has(&self, key: &str) -> bool {
        let instance = &self.0;
        instance.setup_state().map_or(false, |s| s.has(key))
            || instance.0.props.raw().contains_key(key)
            || instance.data().map_or(false, |d| d.raw().contains_key(key))
    }

    pub fn props(&self) -> Reactive {
        self.0.props()
    }

    pub fn attrs(&self) -> Object {
        self.0.attrs()
    }

    pub fn slots(&self) -> Slots {
        self.0.slots()
    }

    pub fn emit(&self, event: &str, args: &[Value]) {
        self.0.emit(event, args);
    }

    pub fn instance(&self) -> &ComponentInstance {
        &self.0
    }

    /// Look up a child component by tag: local registrations first, then the
    /// application's. Tags match as written, camelized, or capitalized.
    pub fn resolve_component(&self, tag: &str) -> Option<Component> {
        let candidates = component_name_candidates(tag);
        let local = match self.0.vnode_type() {
            VNodeType::Component(c) => Some(c.clone()),
            _ => None,
        };

        for name in &candidates {
            if let Some(found) = local
                .as_ref()
                .and_then(|c| c.options().components.get(name.as_str()).cloned())
            {
                return Some(found);
            }
        }
        candidates
            .iter()
            .find_map(|name| self.0.app_context().component(name))
    }

    pub fn downgrade(&self) -> WeakProxy {
        WeakProxy(self.0.downgrade())
    }
}

fn component_name_candidates(tag: &str) -> Vec<String> {
    let camel = super::emit::camelize(tag);
    let pascal = super::emit::capitalize(&camel);
    let mut names = vec![tag.to_string()];
    for name in [camel, pascal] {
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::create_ref;
    use crate::render::vnode::h;

    /// The vnode is returned too: the instance only points at it weakly.
    fn mounted_setup(
        component: &Component,
        props: Option<crate::render::Props>,
    ) -> (ComponentInstance, VNode) {
        let vnode = crate::render::vnode::create_vnode(component.clone(), props, ());
        let instance = create_component_instance(&vnode, None, Rc::new(AppContext::default()));
        vnode.set_component(Some(instance.clone()));
        setup_component(&instance, &vnode);
        (instance, vnode)
    }

    #[test]
    fn proxy_resolves_setup_state_before_props_and_data() {
        let component = define_component(
            ComponentOptions::new()
                .props(["shared", "only_prop"])
                .setup(|_, _| {
                    SetupResult::state(Object::from_entries([
                        ("shared", Value::from("from setup")),
                        ("count", Value::from(create_ref(1))),
                    ]))
                })
                .data(|| serde_json::json!({"shared": "from data", "only_data": 3}))
                .render(|_| h("div", (), ())),
        );

        let mut props = crate::render::Props::new();
        props.insert("shared".into(), "from props".into());
        props.insert("only_prop".into(), 2.into());
        let (instance, _vnode) = mounted_setup(&component, Some(props));
        let proxy = instance.proxy();

        assert_eq!(proxy.get("shared"), Value::from("from setup"));
        // Refs in setup state unwrap
        assert_eq!(proxy.get("count"), Value::Number(1.0));
        assert_eq!(proxy.get("only_prop"), Value::Number(2.0));
        assert_eq!(proxy.get("only_data"), Value::Number(3.0));
        assert_eq!(proxy.get("missing"), Value::Null);
    }

    #[test]
    fn proxy_writes_update_refs_and_reject_props() {
        let count = create_ref(0);
        let count_clone = count.clone();
        let component = define_component(
            ComponentOptions::new()
                .props(["label"])
                .setup(move |_, _| {
                    SetupResult::state(Object::from_entries([("count", Value::from(count_clone.clone()))]))
                })
                .render(|_| h("div", (), ())),
        );

        let mut props = crate::render::Props::new();
        props.insert("label".into(), "x".into());
        let (instance, _vnode) = mounted_setup(&component, Some(props));
        let proxy = instance.proxy();

        assert!(proxy.set("count", 5));
        assert_eq!(count.get(), Value::Number(5.0));

        assert!(!proxy.set("label", "y"));
        assert_eq!(proxy.get("label"), Value::from("x"));
    }

    #[test]
    fn current_instance_is_set_only_during_setup() {
        let seen = Rc::new(Cell::new(false));
        let seen_clone = seen.clone();
        let component = define_component(ComponentOptions::new().setup(move |_, _| {
            seen_clone.set(get_current_instance().is_some());
            SetupResult::None
        }));

        let _mounted = mounted_setup(&component, None);
        assert!(seen.get());
        assert!(get_current_instance().is_none());
    }

    #[test]
    fn setup_render_function_wins_over_options_render() {
        let component = define_component(
            ComponentOptions::new()
                .setup(|_, _| SetupResult::render(|_| h("p", (), "from setup")))
                .render(|_| h("p", (), "from options")),
        );

        let (instance, _vnode) = mounted_setup(&component, None);
        let tree = render_component_root(&instance);
        assert_eq!(tree.children().as_text(), Some("from setup"));
    }

    #[test]
    fn missing_renderer_renders_a_comment() {
        let component = define_component(ComponentOptions::new());
        let (instance, _vnode) = mounted_setup(&component, None);
        let tree = render_component_root(&instance);
        assert!(matches!(tree.node_type(), VNodeType::Comment));
    }

    #[test]
    fn name_candidates_cover_kebab_and_pascal() {
        assert_eq!(
            component_name_candidates("todo-item"),
            vec!["todo-item", "todoItem", "TodoItem"]
        );
        assert_eq!(component_name_candidates("Child"), vec!["Child"]);
    }
}
