//! Watchers
//!
//! [`watch`] observes a source and calls a callback with the new and previous
//! value whenever the source changes. [`watch_effect`] runs a function and
//! re-runs it whenever anything it read changes.
//!
//! # How Watchers Work
//!
//! The source is turned into a getter that runs inside a [`ReactiveEffect`].
//! The effect's scheduler is the watcher's job:
//!
//! 1. run the cleanup registered during the previous callback, if any
//! 2. re-run the getter, re-collecting dependencies
//! 3. call the callback with `(new, old)`
//! 4. remember `new` as the next `old`
//!
//! Jobs run synchronously when the source is triggered. A deep watcher
//! traverses every nested property of the source so that a change anywhere
//! underneath triggers it; a seen-set guards against cycles.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use serde::Deserialize;

use super::effect::ReactiveEffect;
use super::memo::Computed;
use super::proxy::Reactive;
use super::signal::Ref;
use crate::value::{ObjectId, Value};

/// What a watcher observes.
#[derive(Clone)]
pub enum WatchSource {
    Ref(Ref),
    Getter(Rc<dyn Fn() -> Value>),
    Reactive(Reactive),
    /// Anything else. Watching it logs a warning and never fires.
    Invalid(Value),
}

impl WatchSource {
    /// Watch the return value of a function.
    pub fn getter<F, R>(f: F) -> Self
    where
        F: Fn() -> R + 'static,
        R: Into<Value>,
    {
        WatchSource::Getter(Rc::new(move || f().into()))
    }
}

impl From<Ref> for WatchSource {
    fn from(r: Ref) -> Self {
        WatchSource::Ref(r)
    }
}

impl From<Computed> for WatchSource {
    fn from(c: Computed) -> Self {
        WatchSource::Ref(c.into())
    }
}

impl From<Reactive> for WatchSource {
    fn from(r: Reactive) -> Self {
        WatchSource::Reactive(r)
    }
}

impl From<Value> for WatchSource {
    fn from(value: Value) -> Self {
        match value {
            Value::Ref(r) => WatchSource::Ref(r),
            Value::Reactive(r) => WatchSource::Reactive(r),
            Value::Function(f) => WatchSource::Getter(Rc::new(move || f.call(&[]))),
            other => WatchSource::Invalid(other),
        }
    }
}

/// Options for [`watch`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WatchOptions {
    /// Run the callback once right away, with `Null` as the old value.
    pub immediate: bool,
    /// Traverse the source so nested changes trigger the watcher.
    pub deep: bool,
}

type CleanupSlot = Rc<RefCell<Option<Box<dyn FnOnce()>>>>;

/// Registers a function to run before the next callback invocation.
#[derive(Clone, Default)]
pub struct OnCleanup {
    slot: CleanupSlot,
}

impl OnCleanup {
    /// Replace the pending cleanup with `f`.
    pub fn register<F>(&self, f: F)
    where
        F: FnOnce() + 'static,
    {
        *self.slot.borrow_mut() = Some(Box::new(f));
    }

    fn run(&self) {
        let pending = self.slot.borrow_mut().take();
        if let Some(cleanup) = pending {
            cleanup();
        }
    }
}

/// Handle returned by [`watch`] and [`watch_effect`].
///
/// Dropping the handle does not stop the watcher.
#[must_use = "a watcher keeps running until stop() is called"]
pub struct WatchHandle {
    effect: ReactiveEffect,
    cleanup: OnCleanup,
}

impl WatchHandle {
    /// Stop watching. A pending cleanup runs immediately.
    pub fn stop(&self) {
        self.effect.stop();
        self.cleanup.run();
    }

    pub fn is_active(&self) -> bool {
        self.effect.is_active()
    }

    pub fn effect(&self) -> &ReactiveEffect {
        &self.effect
    }
}

/// Watch `source` and call `callback(new, old, on_cleanup)` when it changes.
pub fn watch<S, F>(source: S, callback: F, options: WatchOptions) -> WatchHandle
where
    S: Into<WatchSource>,
    F: Fn(&Value, &Value, &OnCleanup) + 'static,
{
    let getter: Rc<dyn Fn() -> Value> = match source.into() {
        WatchSource::Ref(r) => Rc::new(move || r.get()),
        WatchSource::Getter(f) => f,
        // Without `deep` nothing inside the object is read, so nothing fires
        WatchSource::Reactive(view) => Rc::new(move || Value::Reactive(view.clone())),
        WatchSource::Invalid(value) => {
            tracing::warn!(
                value_type = value.type_name(),
                "invalid watch source: expected a ref, a reactive object or a getter"
            );
            Rc::new(|| Value::Null)
        }
    };

    let getter: Rc<dyn Fn() -> Value> = if options.deep {
        Rc::new(move || {
            let value = getter();
            traverse(&value, &mut HashSet::new());
            value
        })
    } else {
        getter
    };

    let cleanup = OnCleanup::default();
    let old_value = Rc::new(RefCell::new(Value::Null));

    let job = {
        let cleanup = cleanup.clone();
        let old_value = old_value.clone();
        move |effect: &ReactiveEffect| {
            if !effect.is_active() {
                return;
            }
            cleanup.run();
            let new_value = effect.run();
            let previous = old_value.borrow().clone();
            callback(&new_value, &previous, &cleanup);
            *old_value.borrow_mut() = new_value;
        }
    };
    let job: Rc<dyn Fn(&ReactiveEffect)> = Rc::new(job);

    let effect = ReactiveEffect::with_scheduler(move || getter(), job.clone());

    if options.immediate {
        job(&effect);
    } else {
        let initial = effect.run();
        *old_value.borrow_mut() = initial;
    }

    WatchHandle { effect, cleanup }
}

/// Run `f` now and again whenever anything it read changes.
///
/// Cleanups registered through the [`OnCleanup`] argument run before each
/// re-run and when the watcher stops.
pub fn watch_effect<F>(f: F) -> WatchHandle
where
    F: Fn(&OnCleanup) + 'static,
{
    let cleanup = OnCleanup::default();

    let runner = {
        let cleanup = cleanup.clone();
        move || {
            cleanup.run();
            f(&cleanup);
        }
    };

    let effect = ReactiveEffect::with_scheduler(
        runner,
        Rc::new(|effect: &ReactiveEffect| {
            effect.run();
        }),
    );
    effect.run();

    WatchHandle { effect, cleanup }
}

/// Read every nested property of `value`, subscribing the running effect.
pub fn traverse(value: &Value, seen: &mut HashSet<ObjectId>) {
    match value {
        Value::Reactive(view) => {
            if !seen.insert(view.raw().id()) {
                return;
            }
            for nested in view.values() {
                traverse(&nested, seen);
            }
        }
        Value::Object(object) => {
            if !seen.insert(object.id()) {
                return;
            }
            for nested in object.values() {
                traverse(&nested, seen);
            }
        }
        Value::Ref(r) => traverse(&r.get(), seen),
        _ => {}
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
