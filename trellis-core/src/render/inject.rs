//! Provide / inject.
//!
//! Each instance owns at most one table of provided values, created on its
//! first `provide`. `inject` never looks at the calling instance's own table:
//! it walks the parent links up to the root, checking each ancestor's table,
//! and finally the application's provides.

use indexmap::IndexMap;

use super::component::get_current_instance;
use crate::value::Value;

/// Make `value` available to descendants of the current instance.
pub fn provide(key: impl Into<String>, value: impl Into<Value>) {
    let key = key.into();
    let Some(instance) = get_current_instance() else {
        tracing::warn!(key = %key, "provide() can only be used inside setup()");
        return;
    };

    let mut provides = instance.provides().borrow_mut();
    let table = provides.get_or_insert_with(IndexMap::new);
    let previous = table.insert(key, value.into());
    drop(provides);
    drop(previous);
}

/// Look up a value provided by an ancestor or the app.
pub fn inject(key: &str) -> Option<Value> {
    let Some(instance) = get_current_instance() else {
        tracing::warn!(key, "inject() can only be used inside setup() or functional components");
        return None;
    };

    let mut ancestor = instance.parent();
    while let Some(current) = ancestor {
        let found = current
            .provides()
            .borrow()
            .as_ref()
            .and_then(|table| table.get(key).cloned());
        if found.is_some() {
            return found;
        }
        ancestor = current.parent();
    }

    let found = instance.app_context().provided(key);
    if found.is_none() {
        tracing::debug!(key, "injection not found");
    }
    found
}

/// [`inject`] with a fallback value.
pub fn inject_or(key: &str, default: impl Into<Value>) -> Value {
    inject(key).unwrap_or_else(|| default.into())
}

/// [`inject`] with a lazily built fallback.
pub fn inject_with<F>(key: &str, default: F) -> Value
where
    F: FnOnce() -> Value,
{
    inject(key).unwrap_or_else(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::app::AppContext;
    use crate::render::component::{
        create_component_instance, define_component, set_current_instance, ComponentOptions,
    };
    use crate::render::vnode::create_vnode;
    use std::rc::Rc;

    #[test]
    fn inject_walks_ancestors_and_skips_own_table() {
        let app = Rc::new(AppContext::default());
        let component = define_component(ComponentOptions::new());

        let root_vnode = create_vnode(component.clone(), None, ());
        let root = create_component_instance(&root_vnode, None, app.clone());
        let middle_vnode = create_vnode(component.clone(), None, ());
        let middle = create_component_instance(&middle_vnode, Some(&root), app.clone());
        let leaf_vnode = create_vnode(component, None, ());
        let leaf = create_component_instance(&leaf_vnode, Some(&middle), app);

        {
            let _current = set_current_instance(Some(root.clone()));
            provide("theme", "dark");
            provide("depth", 0);
        }
        {
            let _current = set_current_instance(Some(middle.clone()));
            provide("depth", 1);
            // Own table is not consulted
            assert_eq!(inject("depth"), Some(Value::from(0)));
        }

        let _current = set_current_instance(Some(leaf));
        assert_eq!(inject("theme"), Some(Value::from("dark")));
        assert_eq!(inject("depth"), Some(Value::from(1)));
        assert_eq!(inject("missing"), None);
        assert_eq!(inject_or("missing", "default"), Value::from("default"));
        assert_eq!(inject_with("missing", || Value::from(5)), Value::from(5));
    }

    #[test]
    fn provide_and_inject_outside_setup_degrade() {
        provide("x", 1);
        assert_eq!(inject("x"), None);
        assert_eq!(inject_or("x", 2), Value::from(2));
    }
}
