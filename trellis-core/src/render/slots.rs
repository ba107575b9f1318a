//! Component slots.
//!
//! A parent passes slot content as the children of a component vnode. On
//! setup (and again on every parent-driven update) the content is normalized
//! into one function per slot name. Array or text children passed to a
//! component become its `default` slot.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::component::ComponentInstance;
use super::vnode::{fragment, normalize_children_to_array, Children, SlotContent, SlotFn, VNode};
use crate::value::Value;

/// Normalized slots of an instance.
///
/// The handle is shared with the instance, so slots captured during setup
/// see the content of later updates.
#[derive(Clone, Default)]
pub struct Slots(Rc<RefCell<IndexMap<String, SlotFn>>>);

impl Slots {
    pub fn get(&self, name: &str) -> Option<SlotFn> {
        self.0.borrow().get(name).cloned()
    }

    pub fn has(&self, name: &str) -> bool {
        self.0.borrow().contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Nodes of slot `name` for the given slot props. Empty if the parent
    /// passed nothing for it.
    pub fn render(&self, name: &str, props: &Value) -> Vec<VNode> {
        match self.get(name) {
            Some(slot) => slot(props),
            None => Vec::new(),
        }
    }

    fn replace(&self, slots: IndexMap<String, SlotFn>) {
        let previous = self.0.replace(slots);
        drop(previous);
    }
}

impl fmt::Debug for Slots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.borrow().keys()).finish()
    }
}

fn normalize(content: &SlotContent) -> SlotFn {
    match content {
        SlotContent::Static(nodes) => {
            let nodes = nodes.clone();
            Rc::new(move |_: &Value| nodes.clone())
        }
        SlotContent::Scoped(f) => f.clone(),
    }
}

/// Normalize a component vnode's children into the instance's slots.
pub(crate) fn init_slots(instance: &ComponentInstance, children: &Children) {
    let slots: IndexMap<String, SlotFn> = match children {
        Children::None => IndexMap::new(),
        Children::Slots(raw) => raw
            .iter()
            .map(|(name, content)| (name.clone(), normalize(content)))
            .collect(),
        Children::Array(_) | Children::Text(_) => {
            let nodes = normalize_children_to_array(children);
            let mut slots = IndexMap::new();
            slots.insert("default".to_string(), normalize(&SlotContent::Static(nodes)));
            slots
        }
    };
    instance.slots().replace(slots);
}

/// Render slot `name` of `slots` as a fragment.
pub fn render_slot(slots: &Slots, name: &str, props: &Value) -> VNode {
    fragment(slots.render(name, props))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::app::AppContext;
    use crate::render::component::{create_component_instance, define_component, ComponentOptions};
    use crate::render::vnode::{create_vnode, h, RawSlots};

    #[test]
    fn named_and_scoped_slots_normalize() {
        let mut raw = RawSlots::new();
        raw.insert("header".into(), SlotContent::Static(vec![h("h1", (), "title")]));
        raw.insert(
            "item".into(),
            SlotContent::scoped(|props| vec![h("li", (), props.get("label").to_display_string())]),
        );

        let component = define_component(ComponentOptions::new());
        let vnode = create_vnode(component, None, raw);
        let instance = create_component_instance(&vnode, None, std::rc::Rc::new(AppContext::default()));
        init_slots(&instance, vnode.children());

        let slots = instance.slots();
        assert_eq!(slots.names(), vec!["header", "item"]);

        let item = slots.render("item", &Value::from(serde_json::json!({"label": "one"})));
        assert_eq!(item[0].children().as_text(), Some("one"));

        assert!(slots.render("missing", &Value::Null).is_empty());
    }

    #[test]
    fn array_children_become_default_slot() {
        let component = define_component(ComponentOptions::new());
        let vnode = create_vnode(component, None, vec![h("span", (), "a"), h("span", (), "b")]);
        let instance = create_component_instance(&vnode, None, std::rc::Rc::new(AppContext::default()));
        init_slots(&instance, vnode.children());

        let rendered = render_slot(&instance.slots(), "default", &Value::Null);
        assert_eq!(rendered.children().as_array().len(), 2);
    }
}
