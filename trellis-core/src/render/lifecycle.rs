//! Lifecycle hooks.
//!
//! Hooks are registered from `setup` against the current instance and run
//! by the renderer at fixed points: `before_mount`/`mounted` around the first
//! render, `before_update`/`updated` around every re-render, and
//! `before_unmount`/`unmounted` around removal. A parent's `mounted` runs
//! after all of its children's.
//!
//! Hooks run with the owning instance as the current instance and with
//! dependency tracking paused.

use std::rc::Rc;

use super::component::{get_current_instance, set_current_instance, ComponentInstance};
use crate::reactive::pause_tracking;

/// Points in an instance's life where hooks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleHook {
    BeforeMount,
    Mounted,
    BeforeUpdate,
    Updated,
    BeforeUnmount,
    Unmounted,
}

/// A registered hook.
pub type Hook = Rc<dyn Fn()>;

fn register<F>(kind: LifecycleHook, hook: F)
where
    F: Fn() + 'static,
{
    match get_current_instance() {
        Some(instance) => instance.add_hook(kind, Rc::new(hook)),
        None => tracing::warn!(
            hook = ?kind,
            "lifecycle hook registered outside of setup: there is no current instance"
        ),
    }
}

pub fn on_before_mount<F: Fn() + 'static>(hook: F) {
    register(LifecycleHook::BeforeMount, hook);
}

pub fn on_mounted<F: Fn() + 'static>(hook: F) {
    register(LifecycleHook::Mounted, hook);
}

pub fn on_before_update<F: Fn() + 'static>(hook: F) {
    register(LifecycleHook::BeforeUpdate, hook);
}

pub fn on_updated<F: Fn() + 'static>(hook: F) {
    register(LifecycleHook::Updated, hook);
}

pub fn on_before_unmount<F: Fn() + 'static>(hook: F) {
    register(LifecycleHook::BeforeUnmount, hook);
}

pub fn on_unmounted<F: Fn() + 'static>(hook: F) {
    register(LifecycleHook::Unmounted, hook);
}

/// Run an instance's hooks of one kind, in registration order.
pub(crate) fn call_hooks(instance: &ComponentInstance, kind: LifecycleHook) {
    let hooks = instance.hooks(kind);
    if hooks.is_empty() {
        return;
    }

    tracing::trace!(uid = instance.uid(), hook = ?kind, count = hooks.len(), "calling lifecycle hooks");
    let _current = set_current_instance(Some(instance.clone()));
    let _pause = pause_tracking();
    for hook in hooks {
        hook();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::app::AppContext;
    use crate::render::component::{
        create_component_instance, define_component, setup_component, ComponentOptions, SetupResult,
    };
    use crate::render::vnode::create_vnode;
    use std::cell::RefCell;

    #[test]
    fn hooks_registered_in_setup_run_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let log_clone = log.clone();

        let component = define_component(ComponentOptions::new().setup(move |_, _| {
            let first = log_clone.clone();
            let second = log_clone.clone();
            on_mounted(move || first.borrow_mut().push("first"));
            on_mounted(move || second.borrow_mut().push("second"));
            SetupResult::None
        }));

        let vnode = create_vnode(component, None, ());
        let instance = create_component_instance(&vnode, None, Rc::new(AppContext::default()));
        setup_component(&instance, &vnode);

        call_hooks(&instance, LifecycleHook::Updated);
        assert!(log.borrow().is_empty());

        call_hooks(&instance, LifecycleHook::Mounted);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn hook_sees_its_instance_as_current() {
        let component = define_component(ComponentOptions::new().setup(|_, _| {
            on_before_unmount(|| assert!(get_current_instance().is_some()));
            SetupResult::None
        }));

        let vnode = create_vnode(component, None, ());
        let instance = create_component_instance(&vnode, None, Rc::new(AppContext::default()));
        setup_component(&instance, &vnode);

        call_hooks(&instance, LifecycleHook::BeforeUnmount);
        assert!(get_current_instance().is_none());
    }

    #[test]
    fn registering_outside_setup_is_ignored() {
        // Only logs a warning
        on_mounted(|| panic!("should never run"));
    }
}
