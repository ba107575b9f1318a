//! Splitting vnode props into component props and attrs.
//!
//! A key is a prop if the component declares it (as written or camelized)
//! or if it looks like an event handler (`on...`). Everything else is a
//! fallthrough attr. Functional components take every key as a prop.

use super::component::ComponentInstance;
use super::emit::camelize;
use super::vnode::Props;
use crate::reactive::to_raw;

/// Where a raw prop key lands on an instance.
enum PropSlot {
    Prop(String),
    Attr,
}

fn classify(instance: &ComponentInstance, key: &str) -> PropSlot {
    if instance.is_functional() {
        return PropSlot::Prop(key.to_string());
    }

    let declared = instance.declared_props();
    if declared.iter().any(|p| p == key) {
        return PropSlot::Prop(key.to_string());
    }
    let camel = camelize(key);
    if declared.iter().any(|p| *p == camel) {
        return PropSlot::Prop(camel);
    }
    if key.starts_with("on") {
        return PropSlot::Prop(key.to_string());
    }
    PropSlot::Attr
}

/// Fill a fresh instance's props and attrs. Does not trigger anything.
pub(crate) fn init_props(instance: &ComponentInstance, raw: Option<&Props>) {
    let props = instance.props().raw();
    let attrs = instance.attrs();

    for (key, value) in raw.into_iter().flatten() {
        match classify(instance, key) {
            PropSlot::Prop(name) => {
                props.set(&name, to_raw(value));
            }
            PropSlot::Attr => {
                attrs.set(key, value.clone());
            }
        }
    }
}

/// Bring props and attrs in line with a new vnode's props.
///
/// Changed props are written through the reactive view so that anything
/// that read them is notified. Keys missing from the new props are removed.
pub(crate) fn update_props(instance: &ComponentInstance, raw: Option<&Props>) {
    let props = instance.props();
    let attrs = instance.attrs();
    let mut seen_props = Vec::new();

    for (key, value) in raw.into_iter().flatten() {
        match classify(instance, key) {
            PropSlot::Prop(name) => {
                let changed = props
                    .raw()
                    .get(&name)
                    .map_or(true, |old| !old.same_value(&to_raw(value)));
                if changed {
                    props.set(&name, value.clone());
                }
                seen_props.push(name);
            }
            PropSlot::Attr => {
                attrs.set(key, value.clone());
            }
        }
    }

    for key in props.raw().keys() {
        if !seen_props.contains(&key) {
            props.delete(&key);
        }
    }

    for key in attrs.keys() {
        let still_present = raw.map_or(false, |raw| raw.contains_key(&key));
        if !still_present {
            attrs.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::app::AppContext;
    use crate::render::component::{create_component_instance, define_component, ComponentOptions};
    use crate::render::vnode::create_vnode;
    use crate::value::Value;
    use std::rc::Rc;

    fn props(entries: &[(&str, Value)]) -> Props {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn declared_and_handler_keys_become_props() {
        let component = define_component(ComponentOptions::new().props(["title", "itemCount"]));
        let raw = props(&[
            ("title", "hi".into()),
            ("item-count", 3.into()),
            ("onClick", Value::Null),
            ("id", "root".into()),
        ]);
        let vnode = create_vnode(component, Some(raw.clone()), ());
        let instance = create_component_instance(&vnode, None, Rc::new(AppContext::default()));

        init_props(&instance, Some(&raw));

        let prop_keys = instance.props().raw().keys();
        assert_eq!(prop_keys, vec!["title", "itemCount", "onClick"]);
        assert_eq!(instance.attrs().keys(), vec!["id"]);
    }

    #[test]
    fn update_props_writes_changes_and_drops_missing_keys() {
        let component = define_component(ComponentOptions::new().props(["a", "b"]));
        let first = props(&[("a", 1.into()), ("b", 2.into()), ("class", "x".into())]);
        let vnode = create_vnode(component, Some(first.clone()), ());
        let instance = create_component_instance(&vnode, None, Rc::new(AppContext::default()));
        init_props(&instance, Some(&first));

        let second = props(&[("a", 10.into())]);
        update_props(&instance, Some(&second));

        assert_eq!(instance.props().raw().keys(), vec!["a"]);
        assert_eq!(instance.props().get("a"), Value::Number(10.0));
        assert!(instance.attrs().is_empty());
    }
}
