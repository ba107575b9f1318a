//! Renderer
//!
//! The renderer turns vnode trees into platform nodes and keeps them in sync.
//!
//! # How Patching Works
//!
//! `patch(old, new)` is the single entry point for mount, update and
//! replace:
//!
//! - no `old`: mount `new`;
//! - `old` and `new` differ in type or key: unmount `old`, then mount `new`
//!   where `old` was;
//! - otherwise update in place, reusing `old`'s platform node.
//!
//! Component vnodes own a render effect. The effect renders the component's
//! sub-tree and patches it against the previous one; when state it read
//! changes, its scheduler queues it in the job queue, so updates are applied
//! on the next flush.
//!
//! # Keyed Children
//!
//! Two child lists are reconciled in four steps:
//!
//! 1. Patch the common prefix and the common suffix.
//! 2. If only new nodes remain, mount them; if only old nodes remain,
//!    unmount them.
//! 3. Otherwise map every remaining old node to a new position (by key, or
//!    for unkeyed nodes, the first unconsumed node of the same type), patch
//!    the matches and unmount the rest.
//! 4. Walk the new range backwards, mounting unmatched nodes and moving
//!    matched nodes that are not part of the longest increasing run of old
//!    positions. Each node is placed before the first platform node of its
//!    next sibling, or before the parent anchor for the last one.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use super::app::{create_app, App, AppContext};
use super::component::{
    create_component_instance, render_component_root, setup_component, Component,
    ComponentInstance,
};
use super::lifecycle::{call_hooks, LifecycleHook};
use super::options::{NodeHandle, RendererOptions};
use super::props::update_props;
use super::scheduler::{invalidate_job, queue_job};
use super::shape::ShapeFlags;
use super::slots::init_slots;
use super::vnode::{is_same_vnode_type, Children, Key, Props, VNode, VNodeType};
use crate::reactive::{ReactiveEffect, Scheduler};

struct RendererInner {
    host: Rc<dyn RendererOptions>,
    /// Last tree rendered into each container.
    roots: RefCell<HashMap<NodeHandle, VNode>>,
    /// Context for trees rendered without an app.
    context: Rc<AppContext>,
}

/// Renders vnode trees through a platform's [`RendererOptions`].
#[derive(Clone)]
pub struct Renderer(Rc<RendererInner>);

/// Build a renderer over a platform.
pub fn create_renderer<O>(options: Rc<O>) -> Renderer
where
    O: RendererOptions + 'static,
{
    Renderer(Rc::new(RendererInner {
        host: options,
        roots: RefCell::new(HashMap::new()),
        context: Rc::new(AppContext::default()),
    }))
}

/// Where patched nodes go and who owns them.
#[derive(Clone, Copy)]
struct Scope<'a> {
    parent: Option<&'a ComponentInstance>,
    app: &'a Rc<AppContext>,
}

impl Renderer {
    pub fn host(&self) -> &Rc<dyn RendererOptions> {
        &self.0.host
    }

    /// Render `vnode` into `container`, patching against the previous tree.
    /// `None` unmounts whatever is there.
    pub fn render(&self, vnode: Option<&VNode>, container: NodeHandle) {
        let context = self.0.context.clone();
        self.render_with_context(vnode, container, &context);
    }

    pub(crate) fn render_with_context(
        &self,
        vnode: Option<&VNode>,
        container: NodeHandle,
        app: &Rc<AppContext>,
    ) {
        let previous = self.0.roots.borrow().get(&container).cloned();
        let scope = Scope { parent: None, app };

        match vnode {
            Some(vnode) => {
                self.patch(previous.as_ref(), vnode, container, None, scope);
                let replaced = self.0.roots.borrow_mut().insert(container, vnode.clone());
                drop(replaced);
            }
            None => {
                if let Some(previous) = previous {
                    self.unmount(&previous, true);
                    let removed = self.0.roots.borrow_mut().remove(&container);
                    drop(removed);
                }
            }
        }
    }

    /// The tree last rendered into `container`.
    pub fn root(&self, container: NodeHandle) -> Option<VNode> {
        self.0.roots.borrow().get(&container).cloned()
    }

    pub fn create_app(&self, root: Component, props: Option<Props>) -> App {
        create_app(self, root, props)
    }

    fn downgrade(&self) -> Weak<RendererInner> {
        Rc::downgrade(&self.0)
    }

    // ------------------------------------------------------------------------
    // Patch
    // ------------------------------------------------------------------------

    fn patch(
        &self,
        old: Option<&VNode>,
        new: &VNode,
        container: NodeHandle,
        anchor: Option<NodeHandle>,
        scope: Scope<'_>,
    ) {
        if let Some(old) = old {
            if old.ptr_eq(new) {
                return;
            }
            if !is_same_vnode_type(old, new) {
                tracing::trace!(old = ?old.node_type(), new = ?new.node_type(), "replacing vnode");
                let anchor = last_host_node(old)
                    .and_then(|node| self.0.host.next_sibling(node))
                    .or(anchor);
                self.unmount(old, true);
                self.patch(None, new, container, anchor, scope);
                return;
            }
        }

        match new.node_type() {
            VNodeType::Text => self.process_text(old, new, container, anchor),
            VNodeType::Comment => self.process_comment(old, new, container, anchor),
            VNodeType::Fragment => self.process_fragment(old, new, container, anchor, scope),
            VNodeType::Element(_) => self.process_element(old, new, container, anchor, scope),
            VNodeType::Component(_) | VNodeType::Functional(_) => {
                self.process_component(old, new, container, anchor, scope)
            }
        }
    }

    fn process_text(
        &self,
        old: Option<&VNode>,
        new: &VNode,
        container: NodeHandle,
        anchor: Option<NodeHandle>,
    ) {
        let text = new.children().as_text().unwrap_or_default();
        match old {
            None => {
                let el = self.0.host.create_text(text);
                new.set_el(Some(el));
                self.0.host.insert(container, el, anchor);
            }
            Some(old) => {
                new.set_el(old.el());
                if let Some(el) = old.el() {
                    if old.children().as_text() != Some(text) {
                        self.0.host.set_text(el, text);
                    }
                }
            }
        }
    }

    fn process_comment(
        &self,
        old: Option<&VNode>,
        new: &VNode,
        container: NodeHandle,
        anchor: Option<NodeHandle>,
    ) {
        match old {
            None => {
                let text = new.children().as_text().unwrap_or_default();
                let el = self.0.host.create_comment(text);
                new.set_el(Some(el));
                self.0.host.insert(container, el, anchor);
            }
            // Comments are static
            Some(old) => new.set_el(old.el()),
        }
    }

    fn process_fragment(
        &self,
        old: Option<&VNode>,
        new: &VNode,
        container: NodeHandle,
        anchor: Option<NodeHandle>,
        scope: Scope<'_>,
    ) {
        match old {
            None => {
                let start = self.0.host.create_text("");
                let end = self.0.host.create_text("");
                new.set_el(Some(start));
                new.set_anchor(Some(end));
                self.0.host.insert(container, start, anchor);
                self.0.host.insert(container, end, anchor);
                self.mount_children(new.children().as_array(), container, Some(end), scope);
            }
            Some(old) => {
                new.set_el(old.el());
                new.set_anchor(old.anchor());
                self.patch_children(old, new, container, old.anchor(), scope);
            }
        }
    }

    fn process_element(
        &self,
        old: Option<&VNode>,
        new: &VNode,
        container: NodeHandle,
        anchor: Option<NodeHandle>,
        scope: Scope<'_>,
    ) {
        match old {
            None => self.mount_element(new, container, anchor, scope),
            Some(old) => self.patch_element(old, new, scope),
        }
    }

    fn mount_element(
        &self,
        vnode: &VNode,
        container: NodeHandle,
        anchor: Option<NodeHandle>,
        scope: Scope<'_>,
    ) {
        let tag = vnode.tag().unwrap_or_default();
        let el = self.0.host.create_element(tag);
        vnode.set_el(Some(el));
        tracing::trace!(tag, el = ?el, "mounting element");

        if let Some(props) = vnode.props() {
            for (key, value) in props {
                self.0.host.patch_prop(el, key, None, Some(value));
            }
        }

        match vnode.children() {
            Children::Text(text) => self.0.host.set_element_text(el, text),
            Children::Array(children) => self.mount_children(children, el, None, scope),
            Children::None | Children::Slots(_) => {}
        }

        self.0.host.insert(container, el, anchor);
    }

    fn patch_element(&self, old: &VNode, new: &VNode, scope: Scope<'_>) {
        let Some(el) = old.el() else {
            tracing::error!(node = ?old.node_type(), "patching an element that was never mounted");
            return;
        };
        new.set_el(Some(el));

        self.patch_children(old, new, el, None, scope);
        self.patch_props(el, old.props(), new.props());
    }

    fn patch_props(&self, el: NodeHandle, old: Option<&Props>, new: Option<&Props>) {
        if let Some(new) = new {
            for (key, next) in new {
                let prev = old.and_then(|old| old.get(key));
                let unchanged = prev.map_or(false, |prev| prev.same_value(next));
                if !unchanged {
                    self.0.host.patch_prop(el, key, prev, Some(next));
                }
            }
        }

        if let Some(old) = old {
            for (key, prev) in old {
                let still_present = new.map_or(false, |new| new.contains_key(key));
                if !still_present {
                    self.0.host.patch_prop(el, key, Some(prev), None);
                }
            }
        }
    }

    fn mount_children(
        &self,
        children: &[VNode],
        container: NodeHandle,
        anchor: Option<NodeHandle>,
        scope: Scope<'_>,
    ) {
        for child in children {
            self.patch(None, child, container, anchor, scope);
        }
    }

    fn unmount_children(&self, children: &[VNode]) {
        for child in children {
            self.unmount(child, true);
        }
    }

    /// Reconcile the children of `old` and `new`, which share `container`.
    fn patch_children(
        &self,
        old: &VNode,
        new: &VNode,
        container: NodeHandle,
        anchor: Option<NodeHandle>,
        scope: Scope<'_>,
    ) {
        let prev_flag = old.shape_flag();

        match new.children() {
            Children::Text(text) => {
                if prev_flag.contains(ShapeFlags::ARRAY_CHILDREN) {
                    self.unmount_children(old.children().as_array());
                }
                if old.children().as_text() != Some(text) {
                    self.0.host.set_element_text(container, text);
                }
            }
            Children::Array(children) => {
                if prev_flag.contains(ShapeFlags::ARRAY_CHILDREN) {
                    self.patch_keyed_children(
                        old.children().as_array(),
                        children,
                        container,
                        anchor,
                        scope,
                    );
                } else {
                    if prev_flag.contains(ShapeFlags::TEXT_CHILDREN) {
                        self.0.host.set_element_text(container, "");
                    }
                    self.mount_children(children, container, anchor, scope);
                }
            }
            Children::None | Children::Slots(_) => {
                if prev_flag.contains(ShapeFlags::ARRAY_CHILDREN) {
                    self.unmount_children(old.children().as_array());
                } else if prev_flag.contains(ShapeFlags::TEXT_CHILDREN) {
                    self.0.host.set_element_text(container, "");
                }
            }
        }
    }

    fn patch_keyed_children(
        &self,
        old: &[VNode],
        new: &[VNode],
        container: NodeHandle,
        parent_anchor: Option<NodeHandle>,
        scope: Scope<'_>,
    ) {
        let mut start = 0;
        let mut old_end = old.len();
        let mut new_end = new.len();

        // 1. Common prefix
        while start < old_end && start < new_end && is_same_vnode_type(&old[start], &new[start]) {
            self.patch(Some(&old[start]), &new[start], container, None, scope);
            start += 1;
        }

        // 1. Common suffix
        while start < old_end
            && start < new_end
            && is_same_vnode_type(&old[old_end - 1], &new[new_end - 1])
        {
            self.patch(Some(&old[old_end - 1]), &new[new_end - 1], container, None, scope);
            old_end -= 1;
            new_end -= 1;
        }

        // 2. Only additions or only removals left
        if start >= old_end {
            let anchor = new
                .get(new_end)
                .and_then(first_host_node)
                .or(parent_anchor);
            self.mount_children(&new[start..new_end], container, anchor, scope);
            return;
        }
        if start >= new_end {
            self.unmount_children(&old[start..old_end]);
            return;
        }

        // 3. Match the middle ranges
        let to_patch = new_end - start;
        let key_to_new: HashMap<&Key, usize> = (start..new_end)
            .filter_map(|i| new[i].key().map(|key| (key, i)))
            .collect();
        // Old index of the node patched into each new position
        let mut new_to_old: Vec<Option<usize>> = vec![None; to_patch];
        let mut patched = 0;
        let mut moved = false;
        let mut max_new_index = 0;

        for (old_index, old_node) in old.iter().enumerate().take(old_end).skip(start) {
            if patched >= to_patch {
                self.unmount(old_node, true);
                continue;
            }

            let candidate = match old_node.key() {
                Some(key) => key_to_new.get(key).copied(),
                None => (start..new_end).find(|&i| {
                    new_to_old[i - start].is_none()
                        && new[i].key().is_none()
                        && is_same_vnode_type(old_node, &new[i])
                }),
            };

            match candidate {
                Some(new_index)
                    if new_to_old[new_index - start].is_none()
                        && is_same_vnode_type(old_node, &new[new_index]) =>
                {
                    new_to_old[new_index - start] = Some(old_index);
                    if new_index >= max_new_index {
                        max_new_index = new_index;
                    } else {
                        moved = true;
                    }
                    self.patch(Some(old_node), &new[new_index], container, None, scope);
                    patched += 1;
                }
                _ => self.unmount(old_node, true),
            }
        }

        // 4. Mount and move, back to front
        let stable = if moved {
            longest_increasing_subsequence(&new_to_old)
        } else {
            Vec::new()
        };
        let mut stable_cursor = stable.len();

        for offset in (0..to_patch).rev() {
            let index = start + offset;
            let node = &new[index];
            let anchor = new
                .get(index + 1)
                .and_then(first_host_node)
                .or(parent_anchor);

            match new_to_old[offset] {
                None => self.patch(None, node, container, anchor, scope),
                Some(_) if moved => {
                    if stable_cursor > 0 && stable[stable_cursor - 1] == offset {
                        stable_cursor -= 1;
                    } else {
                        self.move_vnode(node, container, anchor);
                    }
                }
                Some(_) => {}
            }
        }
    }

    /// Move a mounted vnode's platform nodes before `anchor`.
    fn move_vnode(&self, vnode: &VNode, container: NodeHandle, anchor: Option<NodeHandle>) {
        if vnode.is_component() {
            if let Some(tree) = vnode.component().and_then(|instance| instance.sub_tree()) {
                self.move_vnode(&tree, container, anchor);
            }
            return;
        }

        if matches!(vnode.node_type(), VNodeType::Fragment) {
            if let Some(start) = vnode.el() {
                self.0.host.insert(container, start, anchor);
            }
            for child in vnode.children().as_array() {
                self.move_vnode(child, container, anchor);
            }
            if let Some(end) = vnode.anchor() {
                self.0.host.insert(container, end, anchor);
            }
            return;
        }

        if let Some(el) = vnode.el() {
            self.0.host.insert(container, el, anchor);
        }
    }

    // ------------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------------

    fn process_component(
        &self,
        old: Option<&VNode>,
        new: &VNode,
        container: NodeHandle,
        anchor: Option<NodeHandle>,
        scope: Scope<'_>,
    ) {
        match old {
            None => self.mount_component(new, container, anchor, scope),
            Some(old) => self.update_component(old, new),
        }
    }

    fn mount_component(
        &self,
        vnode: &VNode,
        container: NodeHandle,
        anchor: Option<NodeHandle>,
        scope: Scope<'_>,
    ) {
        let app = scope
            .parent
            .map_or_else(|| scope.app.clone(), |parent| parent.app_context().clone());
        let instance = create_component_instance(vnode, scope.parent, app);
        vnode.set_component(Some(instance.clone()));
        tracing::debug!(uid = instance.uid(), component = ?vnode.node_type(), "mounting component");

        setup_component(&instance, vnode);
        self.setup_render_effect(&instance, container, anchor);
    }

    fn setup_render_effect(
        &self,
        instance: &ComponentInstance,
        container: NodeHandle,
        anchor: Option<NodeHandle>,
    ) {
        let renderer = self.downgrade();
        let weak_instance = instance.downgrade();
        let scheduler: Scheduler = Rc::new(|effect: &ReactiveEffect| queue_job(effect));

        let effect = ReactiveEffect::with_scheduler(
            move || {
                let Some(renderer) = renderer.upgrade() else { return };
                let Some(instance) = ComponentInstance::upgrade(&weak_instance) else {
                    return;
                };
                Renderer(renderer).component_update(&instance, container, anchor);
            },
            scheduler,
        );

        instance.set_update_effect(effect.clone());
        effect.run();
    }

    /// Body of a component's render effect: first mount, then updates.
    fn component_update(
        &self,
        instance: &ComponentInstance,
        container: NodeHandle,
        anchor: Option<NodeHandle>,
    ) {
        let app = instance.app_context().clone();
        let scope = Scope {
            parent: Some(instance),
            app: &app,
        };

        if !instance.is_mounted() {
            call_hooks(instance, LifecycleHook::BeforeMount);

            let tree = render_component_root(instance);
            self.patch(None, &tree, container, anchor, scope);
            if let Some(vnode) = instance.vnode() {
                vnode.set_el(first_host_node(&tree));
            }
            let previous = instance.replace_sub_tree(Some(tree));
            drop(previous);
            instance.set_mounted();

            call_hooks(instance, LifecycleHook::Mounted);
            return;
        }

        call_hooks(instance, LifecycleHook::BeforeUpdate);

        // Parent-driven update: adopt the new vnode
        if let Some(next) = instance.take_next() {
            instance.set_vnode(&next);
            update_props(instance, next.props());
            init_slots(instance, next.children());
        }

        let next_tree = render_component_root(instance);
        let prev_tree = instance.replace_sub_tree(Some(next_tree.clone()));
        tracing::trace!(uid = instance.uid(), "re-rendering component");
        self.patch(prev_tree.as_ref(), &next_tree, container, anchor, scope);
        if let Some(vnode) = instance.vnode() {
            vnode.set_el(first_host_node(&next_tree));
        }

        call_hooks(instance, LifecycleHook::Updated);
    }

    fn update_component(&self, old: &VNode, new: &VNode) {
        let Some(instance) = old.component() else {
            tracing::error!(node = ?old.node_type(), "patching a component vnode without an instance");
            return;
        };
        new.set_component(Some(instance.clone()));

        if should_update_component(old, new) {
            instance.set_next(Some(new.clone()));
            if let Some(effect) = instance.update_effect() {
                // Already queued by a state change: this run covers it
                invalidate_job(&effect);
                effect.run();
            }
        } else {
            new.set_el(old.el());
            instance.set_vnode(new);
        }
    }

    // ------------------------------------------------------------------------
    // Unmount
    // ------------------------------------------------------------------------

    /// Tear down `vnode`. `remove` detaches its platform nodes; nested nodes
    /// of a removed element are unmounted without being detached one by one.
    fn unmount(&self, vnode: &VNode, remove: bool) {
        if vnode.is_component() {
            if let Some(instance) = vnode.component() {
                self.unmount_component(&instance, remove);
            }
            return;
        }

        match vnode.node_type() {
            VNodeType::Fragment => {
                for child in vnode.children().as_array() {
                    self.unmount(child, remove);
                }
                if remove {
                    for marker in [vnode.el(), vnode.anchor()].into_iter().flatten() {
                        self.0.host.remove(marker);
                    }
                }
            }
            VNodeType::Element(_) => {
                for child in vnode.children().as_array() {
                    self.unmount(child, false);
                }
                if remove {
                    if let Some(el) = vnode.el() {
                        self.0.host.remove(el);
                    }
                }
            }
            _ => {
                if remove {
                    if let Some(el) = vnode.el() {
                        self.0.host.remove(el);
                    }
                }
            }
        }
    }

    fn unmount_component(&self, instance: &ComponentInstance, remove: bool) {
        tracing::debug!(uid = instance.uid(), "unmounting component");
        call_hooks(instance, LifecycleHook::BeforeUnmount);

        if let Some(effect) = instance.update_effect() {
            effect.stop();
            invalidate_job(&effect);
        }
        if let Some(tree) = instance.sub_tree() {
            self.unmount(&tree, remove);
        }
        instance.set_unmounted();

        call_hooks(instance, LifecycleHook::Unmounted);
    }
}

/// First platform node of a mounted vnode, looking through components.
fn first_host_node(vnode: &VNode) -> Option<NodeHandle> {
    if vnode.is_component() {
        return vnode
            .component()
            .and_then(|instance| instance.sub_tree())
            .and_then(|tree| first_host_node(&tree));
    }
    vnode.el()
}

/// Last platform node of a mounted vnode: a fragment's end marker, or the
/// last node of a component's subtree.
fn last_host_node(vnode: &VNode) -> Option<NodeHandle> {
    if vnode.is_component() {
        return vnode
            .component()
            .and_then(|instance| instance.sub_tree())
            .and_then(|tree| last_host_node(&tree));
    }
    match vnode.node_type() {
        VNodeType::Fragment => vnode.anchor(),
        _ => vnode.el(),
    }
}

/// A parent re-render only reaches the child when its inputs changed.
fn should_update_component(old: &VNode, new: &VNode) -> bool {
    if !matches!(old.children(), Children::None) || !matches!(new.children(), Children::None) {
        return true;
    }

    match (old.props(), new.props()) {
        (None, None) => false,
        (Some(old), Some(new)) => {
            old.len() != new.len()
                || new.iter().any(|(key, next)| {
                    old.get(key).map_or(true, |prev| !prev.same_value(next))
                })
        }
        (Some(props), None) | (None, Some(props)) => !props.is_empty(),
    }
}

/// Positions (into `values`) of a longest strictly increasing subsequence,
/// ignoring `None` entries.
fn longest_increasing_subsequence(values: &[Option<usize>]) -> Vec<usize> {
    let mut tails: Vec<usize> = Vec::new();
    let mut previous: Vec<Option<usize>> = vec![None; values.len()];

    for (position, value) in values.iter().enumerate() {
        let Some(value) = *value else { continue };
        let slot = tails.partition_point(|&tail| values[tail] < Some(value));
        if slot > 0 {
            previous[position] = Some(tails[slot - 1]);
        }
        if slot == tails.len() {
            tails.push(position);
        } else {
            tails[slot] = position;
        }
    }

    let mut sequence = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(position) = cursor {
        sequence.push(position);
        cursor = previous[position];
    }
    sequence.reverse();
    sequence
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryDom;
    use crate::reactive::create_ref;
    use std::cell::RefCell;

    use crate::render::component::{define_component, ComponentOptions, SetupResult};
    use crate::render::lifecycle::{on_before_unmount, on_before_update, on_mounted, on_unmounted};
    use crate::render::scheduler::flush_jobs;
    use crate::render::vnode::{fragment, h, text_vnode};
    use crate::value::Value;

    fn setup() -> (Rc<MemoryDom>, Renderer, NodeHandle) {
        let dom = Rc::new(MemoryDom::new());
        let renderer = create_renderer(dom.clone());
        let container = dom.create_container("app");
        (dom, renderer, container)
    }

    fn keyed_list(keys: &[&str]) -> VNode {
        h(
            "ul",
            (),
            keys.iter()
                .map(|key| h("li", [("key", Value::from(*key))], *key))
                .collect::<Vec<_>>(),
        )
    }

    // ------------------------------------------------------------------------
    // Elements and text
    // ------------------------------------------------------------------------

    #[test]
    fn mounts_and_patches_elements() {
        let (dom, renderer, container) = setup();

        renderer.render(Some(&h("div", [("id", Value::from("a"))], "hello")), container);
        assert_eq!(dom.inner_html(container), r#"<div id="a">hello</div>"#);

        renderer.render(Some(&h("div", [("class", Value::from("b"))], "bye")), container);
        assert_eq!(dom.inner_html(container), r#"<div class="b">bye</div>"#);

        // Same element reused
        assert_eq!(dom.stats().created, 1);
    }

    #[test]
    fn replaces_node_of_a_different_type_in_place() {
        let (dom, renderer, container) = setup();

        renderer.render(
            Some(&h("div", (), vec![h("p", (), "a"), h("span", (), "b"), h("i", (), "c")])),
            container,
        );
        renderer.render(
            Some(&h("div", (), vec![h("p", (), "a"), h("em", (), "b"), h("i", (), "c")])),
            container,
        );

        assert_eq!(
            dom.inner_html(container),
            "<div><p>a</p><em>b</em><i>c</i></div>"
        );
    }

    #[test]
    fn text_and_array_children_swap() {
        let (dom, renderer, container) = setup();

        renderer.render(Some(&h("div", (), vec![text_vnode("x"), h("b", (), "y")])), container);
        renderer.render(Some(&h("div", (), "plain")), container);
        assert_eq!(dom.inner_html(container), "<div>plain</div>");

        renderer.render(Some(&h("div", (), vec![h("b", (), "again")])), container);
        assert_eq!(dom.inner_html(container), "<div><b>again</b></div>");
    }

    #[test]
    fn fragment_children_stay_in_place() {
        let (dom, renderer, container) = setup();

        let tree = |items: &[&str]| {
            h(
                "div",
                (),
                vec![
                    h("header", (), ()),
                    fragment(items.iter().map(|i| h("p", [("key", Value::from(*i))], *i)).collect()),
                    h("footer", (), ()),
                ],
            )
        };

        renderer.render(Some(&tree(&["a"])), container);
        renderer.render(Some(&tree(&["a", "b"])), container);
        assert_eq!(
            dom.inner_html(container),
            "<div><header></header><p>a</p><p>b</p><footer></footer></div>"
        );
    }

    // ------------------------------------------------------------------------
    // Keyed children
    // ------------------------------------------------------------------------

    #[test]
    fn keyed_reorder_moves_without_remounting() {
        let (dom, renderer, container) = setup();

        renderer.render(Some(&keyed_list(&["a", "b", "c", "d", "e"])), container);
        dom.reset_stats();

        renderer.render(Some(&keyed_list(&["e", "c", "a", "d", "b"])), container);

        let ul = dom.children(container)[0];
        let texts: Vec<String> = dom.children(ul).iter().map(|&li| dom.text_content(li)).collect();
        assert_eq!(texts, vec!["e", "c", "a", "d", "b"]);
        assert_eq!(dom.stats().created, 0);
        assert_eq!(dom.stats().removed, 0);
    }

    #[test]
    fn keyed_replace_unmounts_one_and_mounts_one() {
        let (dom, renderer, container) = setup();

        renderer.render(Some(&keyed_list(&["a", "b"])), container);
        dom.reset_stats();

        renderer.render(Some(&keyed_list(&["b", "c"])), container);

        let ul = dom.children(container)[0];
        let texts: Vec<String> = dom.children(ul).iter().map(|&li| dom.text_content(li)).collect();
        assert_eq!(texts, vec!["b", "c"]);
        assert_eq!(dom.stats().created, 1);
        assert_eq!(dom.stats().removed, 1);
    }

    #[test]
    fn keyed_insert_in_the_middle_uses_sibling_anchor() {
        let (dom, renderer, container) = setup();

        renderer.render(Some(&keyed_list(&["a", "d"])), container);
        renderer.render(Some(&keyed_list(&["a", "b", "c", "d"])), container);

        assert_eq!(
            dom.inner_html(container),
            "<ul><li>a</li><li>b</li><li>c</li><li>d</li></ul>"
        );
    }

    #[test]
    fn unkeyed_children_match_by_type() {
        let (dom, renderer, container) = setup();

        renderer.render(Some(&h("div", (), vec![h("p", (), "1"), h("p", (), "2")])), container);
        dom.reset_stats();
        renderer.render(Some(&h("div", (), vec![h("p", (), "1"), h("p", (), "2"), h("p", (), "3")])), container);

        assert_eq!(dom.stats().created, 1);
        assert_eq!(dom.inner_html(container), "<div><p>1</p><p>2</p><p>3</p></div>");
    }

    #[test]
    fn lis_picks_longest_run() {
        let values = [Some(4), Some(2), Some(0), Some(3), Some(1)];
        let sequence = longest_increasing_subsequence(&values);
        assert_eq!(sequence.len(), 2);
        assert!(sequence.windows(2).all(|w| values[w[0]] < values[w[1]]));

        assert_eq!(longest_increasing_subsequence(&[Some(0), None, Some(1)]), vec![0, 2]);
        assert!(longest_increasing_subsequence(&[]).is_empty());
    }

    // ------------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------------

    #[test]
    fn component_rerenders_after_flush() {
        let (dom, renderer, container) = setup();
        let count = create_ref(0);
        let count_clone = count.clone();

        let counter = define_component(ComponentOptions::new().setup(move |_, _| {
            let count = count_clone.clone();
            SetupResult::render(move |_| h("span", (), count.get().to_display_string()))
        }));

        renderer.render(Some(&h(counter, (), ())), container);
        assert_eq!(dom.inner_html(container), "<span>0</span>");

        count.set(1);
        count.set(2);
        assert_eq!(dom.inner_html(container), "<span>0</span>");

        assert_eq!(flush_jobs(), 1);
        assert_eq!(dom.inner_html(container), "<span>2</span>");
    }

    #[test]
    fn render_none_unmounts_everything() {
        let (dom, renderer, container) = setup();
        let child = define_component(ComponentOptions::new().render(|_| h("i", (), "child")));

        renderer.render(Some(&h("div", (), vec![h(child.clone(), (), ()), h(child, (), ())])), container);
        let root = renderer.root(container);
        assert!(root.is_some());

        renderer.render(None, container);
        assert_eq!(dom.inner_html(container), "");
        assert!(renderer.root(container).is_none());

        let root = root.unwrap();
        for child in root.children().as_array() {
            assert!(child.component().unwrap().is_unmounted());
        }
    }

    #[test]
    fn replacing_a_component_unmounts_before_mounting() {
        let (dom, renderer, container) = setup();
        let log: Rc<RefCell<Vec<String>>> = Rc::default();

        let logged = |name: &'static str| {
            let log = log.clone();
            define_component(ComponentOptions::new().setup(move |_, _| {
                let record = |label: &'static str| {
                    let log = log.clone();
                    move || log.borrow_mut().push(format!("{name}:{label}"))
                };
                on_mounted(record("mounted"));
                on_before_unmount(record("before_unmount"));
                on_unmounted(record("unmounted"));
                SetupResult::render(move |_| h("p", (), name))
            }))
        };
        let first = logged("a");
        let second = logged("b");

        renderer.render(Some(&h(first, (), ())), container);
        log.borrow_mut().clear();
        renderer.render(Some(&h(second, (), ())), container);

        assert_eq!(*log.borrow(), ["a:before_unmount", "a:unmounted", "b:mounted"]);
        assert_eq!(dom.inner_html(container), "<p>b</p>");
    }

    #[test]
    fn replacement_takes_the_old_position() {
        let (dom, renderer, container) = setup();
        let first = define_component(ComponentOptions::new().render(|_| h("p", (), "a")));
        let second = define_component(ComponentOptions::new().render(|_| {
            fragment(vec![h("em", (), "b"), h("em", (), "c")])
        }));

        renderer.render(
            Some(&h("div", (), vec![h("i", (), "x"), h(first, (), ()), h("i", (), "y")])),
            container,
        );
        renderer.render(
            Some(&h("div", (), vec![h("i", (), "x"), h(second, (), ()), h("i", (), "y")])),
            container,
        );

        assert_eq!(
            dom.inner_html(container),
            "<div><i>x</i><em>b</em><em>c</em><i>y</i></div>"
        );
    }

    #[test]
    fn before_update_sees_previous_props() {
        let (dom, renderer, container) = setup();
        let seen: Rc<RefCell<Vec<Value>>> = Rc::default();

        let child = {
            let seen = seen.clone();
            define_component(ComponentOptions::new().props(["msg"]).setup(move |props, _| {
                let seen = seen.clone();
                let props = props.clone();
                on_before_update(move || seen.borrow_mut().push(props.get("msg")));
                SetupResult::render(|proxy| h("p", (), proxy.get("msg").to_display_string()))
            }))
        };

        renderer.render(Some(&h(child.clone(), [("msg", Value::from("old"))], ())), container);
        renderer.render(Some(&h(child, [("msg", Value::from("new"))], ())), container);

        assert_eq!(*seen.borrow(), vec![Value::from("old")]);
        assert_eq!(dom.inner_html(container), "<p>new</p>");
    }

    /// Host that logs element prop patches and inserts in call order.
    struct Recording {
        dom: MemoryDom,
        log: RefCell<Vec<String>>,
    }

    impl RendererOptions for Recording {
        fn create_element(&self, tag: &str) -> NodeHandle {
            self.dom.create_element(tag)
        }

        fn set_element_text(&self, el: NodeHandle, text: &str) {
            self.dom.set_element_text(el, text)
        }

        fn insert(&self, parent: NodeHandle, child: NodeHandle, anchor: Option<NodeHandle>) {
            let tag = self.dom.tag(child).unwrap_or_default();
            self.log.borrow_mut().push(format!("insert {tag}"));
            self.dom.insert(parent, child, anchor)
        }

        fn remove(&self, child: NodeHandle) {
            self.dom.remove(child)
        }

        fn create_text(&self, text: &str) -> NodeHandle {
            self.dom.create_text(text)
        }

        fn next_sibling(&self, node: NodeHandle) -> Option<NodeHandle> {
            self.dom.next_sibling(node)
        }

        fn set_text(&self, node: NodeHandle, text: &str) {
            self.dom.set_text(node, text)
        }

        fn patch_prop(&self, el: NodeHandle, key: &str, prev: Option<&Value>, next: Option<&Value>) {
            let tag = self.dom.tag(el).unwrap_or_default();
            self.log.borrow_mut().push(format!("prop {tag}.{key}"));
            self.dom.patch_prop(el, key, prev, next)
        }
    }

    #[test]
    fn element_props_apply_before_children_mount() {
        let host = Rc::new(Recording {
            dom: MemoryDom::new(),
            log: RefCell::default(),
        });
        let container = host.dom.create_container("app");
        let renderer = create_renderer(host.clone());

        renderer.render(
            Some(&h(
                "ul",
                [("class", Value::from("list"))],
                vec![h("li", [("id", Value::from("a"))], "a")],
            )),
            container,
        );

        assert_eq!(
            *host.log.borrow(),
            ["prop ul.class", "prop li.id", "insert li", "insert ul"]
        );
        assert_eq!(
            host.dom.inner_html(container),
            r#"<ul class="list"><li id="a">a</li></ul>"#
        );
    }
}
