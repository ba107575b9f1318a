//! Refs
//!
//! A [`Ref`] is a single reactive cell. It is the fundamental primitive for
//! state that is not a property of some object.
//!
//! # How Refs Work
//!
//! 1. Each ref owns one [`Dep`]. Reading the ref inside a running effect
//!    subscribes that effect.
//!
//! 2. Writing a ref compares the new value (with views unwrapped) against the
//!    stored raw value under [`Value::same_value`]. Only an actual change
//!    triggers the dep.
//!
//! 3. Object values are stored raw and exposed through a deep reactive view,
//!    so mutating the object through the ref is tracked too. Shallow refs
//!    expose the stored value as-is.
//!
//! Three kinds of refs share the [`Ref`] handle: plain value refs, property
//! refs created by [`to_ref`] that forward to a key of a reactive object, and
//! computed values.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::proxy::{to_raw, to_reactive, Reactive};
use super::runtime::{track_effects, trigger_effects, Dep};
use crate::value::{Object, Value};

/// Behaviour shared by every kind of ref.
pub trait RefLike {
    /// Tracked read.
    fn get(&self) -> Value;

    /// Read without subscribing the running effect.
    fn get_untracked(&self) -> Value;

    fn set(&self, value: Value);

    fn kind(&self) -> RefKind;
}

/// What a [`Ref`] is backed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Value,
    Shallow,
    Property,
    Computed,
}

/// A reactive cell.
#[derive(Clone)]
pub struct Ref(Rc<dyn RefLike>);

impl Ref {
    /// A deep ref holding `value`.
    pub fn new(value: impl Into<Value>) -> Self {
        create_ref(value)
    }

    pub(crate) fn from_impl(inner: Rc<dyn RefLike>) -> Self {
        Self(inner)
    }

    /// Read the value, subscribing the running effect.
    pub fn get(&self) -> Value {
        self.0.get()
    }

    pub fn get_untracked(&self) -> Value {
        self.0.get_untracked()
    }

    /// Replace the value. No-op if it is the same value.
    pub fn set(&self, value: impl Into<Value>) {
        self.0.set(value.into());
    }

    /// Set the value from a function of the current one.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(Value) -> Value,
    {
        let current = self.get_untracked();
        self.set(f(current));
    }

    pub fn kind(&self) -> RefKind {
        self.0.kind()
    }

    pub fn ptr_eq(&self, other: &Ref) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ref")
            .field("kind", &self.kind())
            .field("value", &self.get_untracked())
            .finish()
    }
}

struct ValueRef {
    raw: RefCell<Value>,
    value: RefCell<Value>,
    shallow: bool,
    dep: Dep,
}

impl ValueRef {
    fn new(value: Value, shallow: bool) -> Self {
        let raw = if shallow { value.clone() } else { to_raw(&value) };
        let exposed = if shallow { value } else { to_reactive(raw.clone()) };
        Self {
            raw: RefCell::new(raw),
            value: RefCell::new(exposed),
            shallow,
            dep: Dep::new(),
        }
    }
}

impl RefLike for ValueRef {
    fn get(&self) -> Value {
        track_effects(&self.dep);
        self.value.borrow().clone()
    }

    fn get_untracked(&self) -> Value {
        self.value.borrow().clone()
    }

    fn set(&self, value: Value) {
        let new_raw = if self.shallow { value.clone() } else { to_raw(&value) };
        if new_raw.same_value(&self.raw.borrow()) {
            return;
        }

        let exposed = if self.shallow { value } else { to_reactive(new_raw.clone()) };
        let old_raw = self.raw.replace(new_raw);
        let old_value = self.value.replace(exposed);
        trigger_effects(&self.dep);
        drop((old_raw, old_value));
    }

    fn kind(&self) -> RefKind {
        if self.shallow {
            RefKind::Shallow
        } else {
            RefKind::Value
        }
    }
}

struct PropertyRef {
    object: Reactive,
    key: String,
}

impl RefLike for PropertyRef {
    fn get(&self) -> Value {
        self.object.get(&self.key)
    }

    fn get_untracked(&self) -> Value {
        self.object.raw().get(&self.key).unwrap_or_default()
    }

    fn set(&self, value: Value) {
        self.object.set(&self.key, value);
    }

    fn kind(&self) -> RefKind {
        RefKind::Property
    }
}

/// Create a deep ref. A ref value is returned as-is.
pub fn create_ref(value: impl Into<Value>) -> Ref {
    match value.into() {
        Value::Ref(existing) => existing,
        other => Ref(Rc::new(ValueRef::new(other, false))),
    }
}

/// Create a ref that stores its value without wrapping it.
pub fn shallow_ref(value: impl Into<Value>) -> Ref {
    match value.into() {
        Value::Ref(existing) => existing,
        other => Ref(Rc::new(ValueRef::new(other, true))),
    }
}

pub fn is_ref(value: &Value) -> bool {
    matches!(value, Value::Ref(_))
}

/// The ref's value (tracked), or the value itself.
pub fn unref(value: &Value) -> Value {
    match value {
        Value::Ref(r) => r.get(),
        other => other.clone(),
    }
}

/// A ref bound to `key` of `object`. Reads and writes go through the object.
///
/// If the property already holds a ref, that ref is returned.
pub fn to_ref(object: &Reactive, key: &str) -> Ref {
    if let Some(Value::Ref(existing)) = object.raw().get(key) {
        return existing;
    }
    Ref(Rc::new(PropertyRef {
        object: object.clone(),
        key: key.to_string(),
    }))
}

/// A property ref for every key of `object`.
pub fn to_refs(object: &Reactive) -> IndexMap<String, Ref> {
    object
        .raw()
        .keys()
        .into_iter()
        .map(|key| {
            let r = to_ref(object, &key);
            (key, r)
        })
        .collect()
}

/// A view over an object that auto-unwraps refs stored in it.
///
/// Writing a plain value to a key that holds a ref updates the ref instead
/// of replacing it. Reactive views are already ref-unwrapping in this sense
/// and are used as-is.
#[derive(Clone, Debug)]
pub struct ProxyRefs {
    target: Value,
}

impl ProxyRefs {
    pub fn get(&self, key: &str) -> Value {
        unref(&self.target.get(key))
    }

    pub fn set(&self, key: &str, value: impl Into<Value>) -> bool {
        let value = value.into();
        let current = match &self.target {
            Value::Object(object) => object.get(key),
            Value::Reactive(view) => view.raw().get(key),
            _ => None,
        };
        if let Some(Value::Ref(existing)) = current {
            if !is_ref(&value) {
                existing.set(value);
                return true;
            }
        }
        self.target.set(key, value)
    }

    pub fn has(&self, key: &str) -> bool {
        match &self.target {
            Value::Object(object) => object.contains_key(key),
            Value::Reactive(view) => view.has(key),
            _ => false,
        }
    }

    pub fn keys(&self) -> Vec<String> {
        match &self.target {
            Value::Object(object) => object.keys(),
            Value::Reactive(view) => view.keys(),
            _ => Vec::new(),
        }
    }

    /// The wrapped object or view.
    pub fn target(&self) -> &Value {
        &self.target
    }
}

/// Wrap an object so refs stored in it read and write as plain values.
pub fn proxy_refs(target: impl Into<Value>) -> ProxyRefs {
    let target = target.into();
    if !target.is_object() {
        tracing::warn!(value_type = target.type_name(), "proxy_refs expects an object");
    }
    ProxyRefs { target }
}

/// Convenience: a map object built from refs, for setup state.
pub fn ref_object<I, K>(entries: I) -> Object
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    Object::from_entries(entries)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{reactive, ReactiveEffect};
    use serde_json::json;
    use std::cell::Cell;

    fn observe(r: &Ref) -> (ReactiveEffect, Rc<Cell<i32>>) {
        let runs = Rc::new(Cell::new(0));
        let runs_clone = runs.clone();
        let r = r.clone();
        let effect = ReactiveEffect::new(move || {
            r.get();
            runs_clone.set(runs_clone.get() + 1);
        });
        (effect, runs)
    }

    #[test]
    fn ref_get_and_set() {
        let count = create_ref(0);
        assert_eq!(count.get(), Value::Number(0.0));

        count.set(42);
        assert_eq!(count.get(), Value::Number(42.0));

        count.update(|v| Value::Number(v.as_f64().unwrap_or_default() + 1.0));
        assert_eq!(count.get(), Value::Number(43.0));
    }

    #[test]
    fn setting_same_value_does_not_trigger() {
        let count = create_ref(1);
        let (_effect, runs) = observe(&count);

        count.set(1);
        assert_eq!(runs.get(), 1);

        count.set(2);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn object_values_are_deeply_reactive() {
        let state = create_ref(json!({"n": 1}));
        assert!(matches!(state.get(), Value::Reactive(_)));

        let runs = Rc::new(Cell::new(0));
        let runs_clone = runs.clone();
        let state_clone = state.clone();
        let _effect = ReactiveEffect::new(move || {
            state_clone.get().get("n");
            runs_clone.set(runs_clone.get() + 1);
        });

        state.get().set("n", 2);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn setting_view_of_same_object_is_noop() {
        let object = Object::new();
        let state = create_ref(object.clone());
        let (_effect, runs) = observe(&state);

        state.set(reactive(object));
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn shallow_ref_keeps_raw_objects() {
        let state = shallow_ref(json!({"n": 1}));
        assert!(matches!(state.get(), Value::Object(_)));
        assert_eq!(state.kind(), RefKind::Shallow);
    }

    #[test]
    fn create_ref_of_ref_returns_it() {
        let a = create_ref(1);
        let b = create_ref(a.clone());
        assert!(a.ptr_eq(&b));
    }

    #[test]
    fn unref_unwraps_only_refs() {
        assert_eq!(unref(&Value::from(create_ref(3))), Value::Number(3.0));
        assert_eq!(unref(&Value::from("x")), Value::from("x"));
    }

    #[test]
    fn to_ref_forwards_to_the_object() {
        let state = reactive(json!({"foo": 1}));
        let view = state.as_reactive().unwrap();
        let foo = to_ref(view, "foo");

        foo.set(2);
        assert_eq!(state.get("foo"), Value::Number(2.0));

        state.set("foo", 3);
        assert_eq!(foo.get(), Value::Number(3.0));

        let refs = to_refs(view);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs["foo"].get(), Value::Number(3.0));
    }

    #[test]
    fn to_ref_returns_existing_ref_property() {
        let inner = create_ref(1);
        let state = reactive(Object::from_entries([("r", Value::from(inner.clone()))]));
        let r = to_ref(state.as_reactive().unwrap(), "r");
        assert!(r.ptr_eq(&inner));
    }

    #[test]
    fn proxy_refs_unwraps_and_writes_through() {
        let count = create_ref(1);
        let state = ref_object([("count", Value::from(count.clone())), ("plain", Value::from(5))]);
        let proxy = proxy_refs(state.clone());

        assert_eq!(proxy.get("count"), Value::Number(1.0));
        assert_eq!(proxy.get("plain"), Value::Number(5.0));

        proxy.set("count", 10);
        assert_eq!(count.get(), Value::Number(10.0));

        // Assigning a ref replaces the stored ref
        let other = create_ref(20);
        proxy.set("count", other.clone());
        assert!(matches!(state.get("count"), Some(Value::Ref(r)) if r.ptr_eq(&other)));
    }
}
