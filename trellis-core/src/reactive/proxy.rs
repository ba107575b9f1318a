//! Reactive views over objects.
//!
//! A [`Reactive`] wraps an [`Object`] and routes every access through the
//! dependency tracker: reads call [`track`], writes and deletes call
//! [`trigger`] when they change something. Four flavours exist:
//!
//! | kind             | writes | nested objects          |
//! |------------------|--------|-------------------------|
//! | reactive         | yes    | wrapped reactive        |
//! | readonly         | no     | wrapped readonly        |
//! | shallow reactive | yes    | returned raw            |
//! | shallow readonly | no     | returned raw            |
//!
//! Views are cached per `(object, kind)`, so wrapping the same object twice
//! yields the same view. A readonly view of a reactive view stays tracked:
//! reads through it still subscribe the running effect.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use super::runtime::{track, trigger};
use crate::value::{Object, ObjectId, Value};

pub(crate) const IS_REACTIVE: &str = "__v_isReactive";
pub(crate) const IS_READONLY: &str = "__v_isReadonly";
pub(crate) const RAW: &str = "__v_raw";

/// Flavour of a reactive view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyKind {
    Reactive,
    Readonly,
    ShallowReactive,
    ShallowReadonly,
}

impl ProxyKind {
    pub fn is_readonly(self) -> bool {
        matches!(self, ProxyKind::Readonly | ProxyKind::ShallowReadonly)
    }

    pub fn is_shallow(self) -> bool {
        matches!(self, ProxyKind::ShallowReactive | ProxyKind::ShallowReadonly)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    target: ObjectId,
    kind: ProxyKind,
    tracked_readonly: bool,
}

thread_local! {
    static PROXY_CACHE: RefCell<HashMap<CacheKey, Weak<ProxyInner>>> = RefCell::new(HashMap::new());
}

struct ProxyInner {
    raw: Object,
    kind: ProxyKind,
    /// Readonly view over a reactive view: reads still track.
    tracked_readonly: bool,
}

impl ProxyInner {
    fn cache_key(&self) -> CacheKey {
        CacheKey {
            target: self.raw.id(),
            kind: self.kind,
            tracked_readonly: self.tracked_readonly,
        }
    }
}

impl Drop for ProxyInner {
    fn drop(&mut self) {
        let key = self.cache_key();
        let _ = PROXY_CACHE.try_with(|cache| {
            if let Ok(mut cache) = cache.try_borrow_mut() {
                // A newer view for the same key may already be cached
                if cache.get(&key).map_or(false, |weak| weak.strong_count() == 0) {
                    cache.remove(&key);
                }
            }
        });
    }
}

/// A tracking view over an [`Object`].
#[derive(Clone)]
pub struct Reactive(Rc<ProxyInner>);

impl Reactive {
    fn cached(raw: &Object, kind: ProxyKind, tracked_readonly: bool) -> Self {
        let key = CacheKey {
            target: raw.id(),
            kind,
            tracked_readonly,
        };
        if let Some(existing) = PROXY_CACHE.with(|cache| cache.borrow().get(&key).and_then(Weak::upgrade)) {
            return Self(existing);
        }

        let inner = Rc::new(ProxyInner {
            raw: raw.clone(),
            kind,
            tracked_readonly,
        });
        PROXY_CACHE.with(|cache| cache.borrow_mut().insert(key, Rc::downgrade(&inner)));
        Self(inner)
    }

    /// Deep reactive view of `raw`.
    pub fn new(raw: &Object) -> Self {
        Self::cached(raw, ProxyKind::Reactive, false)
    }

    /// Deep readonly view of `raw`.
    pub fn readonly(raw: &Object) -> Self {
        Self::cached(raw, ProxyKind::Readonly, false)
    }

    /// Reactive view that does not wrap nested objects.
    pub fn shallow(raw: &Object) -> Self {
        Self::cached(raw, ProxyKind::ShallowReactive, false)
    }

    /// Readonly view that does not wrap nested objects.
    pub fn shallow_readonly(raw: &Object) -> Self {
        Self::cached(raw, ProxyKind::ShallowReadonly, false)
    }

    pub fn kind(&self) -> ProxyKind {
        self.0.kind
    }

    pub fn is_readonly(&self) -> bool {
        self.0.kind.is_readonly()
    }

    pub fn is_shallow(&self) -> bool {
        self.0.kind.is_shallow()
    }

    /// The wrapped object.
    pub fn raw(&self) -> Object {
        self.0.raw.clone()
    }

    fn tracks(&self) -> bool {
        !self.is_readonly() || self.0.tracked_readonly
    }

    /// Read a key.
    ///
    /// The probe keys `__v_isReactive`, `__v_isReadonly` and `__v_raw` answer
    /// without tracking. Nested objects are wrapped in a view of the same
    /// kind unless the view is shallow. Missing keys read as `Null`.
    pub fn get(&self, key: &str) -> Value {
        match key {
            IS_REACTIVE => return Value::Bool(!self.is_readonly()),
            IS_READONLY => return Value::Bool(self.is_readonly()),
            RAW => return Value::Object(self.raw()),
            _ => {}
        }

        let value = self.0.raw.get(key).unwrap_or_default();

        if self.tracks() {
            track(self.0.raw.id(), key);
        }

        if self.is_shallow() {
            return value;
        }

        match value {
            Value::Object(nested) => {
                let view = if self.is_readonly() {
                    Self::cached(&nested, ProxyKind::Readonly, self.0.tracked_readonly)
                } else {
                    Self::new(&nested)
                };
                Value::Reactive(view)
            }
            Value::Reactive(nested) if self.is_readonly() && !nested.is_readonly() => {
                Value::Reactive(Self::cached(&nested.raw(), ProxyKind::Readonly, true))
            }
            other => other,
        }
    }

    /// Write a key.
    ///
    /// Readonly views refuse with a warning and report success, leaving the
    /// object untouched. Otherwise the key is triggered only if the stored
    /// value changes under [`Value::same_value`]. Appending to a list also
    /// triggers `length`.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> bool {
        if self.is_readonly() {
            tracing::warn!(key, "set operation on key failed: target is readonly");
            return true;
        }

        let value = match value.into() {
            Value::Reactive(view) if !self.is_shallow() && !view.is_readonly() => {
                Value::Object(view.raw())
            }
            other => other,
        };

        let raw = &self.0.raw;
        let previous_len = raw.is_list().then(|| raw.len());
        let had_key = raw.contains_key(key);
        let previous = raw.set(key, value.clone());

        let changed = match (&previous, had_key) {
            (Some(old), true) => !old.same_value(&value),
            _ => true,
        };

        if changed {
            trigger(raw.id(), key);
            if previous_len.map_or(false, |len| len != raw.len()) && key != "length" {
                trigger(raw.id(), "length");
            }
        }
        drop(previous);
        true
    }

    /// Whether the key exists. Tracked.
    pub fn has(&self, key: &str) -> bool {
        if self.tracks() {
            track(self.0.raw.id(), key);
        }
        self.0.raw.contains_key(key)
    }

    /// Remove a key.
    ///
    /// Readonly views refuse with a warning and report success. Otherwise the
    /// key is triggered if it existed.
    pub fn delete(&self, key: &str) -> bool {
        if self.is_readonly() {
            tracing::warn!(key, "delete operation on key failed: target is readonly");
            return true;
        }

        let had_key = self.0.raw.contains_key(key);
        let removed = self.0.raw.remove(key);
        if had_key {
            trigger(self.0.raw.id(), key);
        }
        drop(removed);
        true
    }

    /// Own keys. Tracks `length` on lists.
    pub fn keys(&self) -> Vec<String> {
        if self.tracks() && self.0.raw.is_list() {
            track(self.0.raw.id(), "length");
        }
        self.0.raw.keys()
    }

    /// Length of a list (tracked) or entry count of a map.
    pub fn len(&self) -> usize {
        if self.tracks() {
            track(self.0.raw.id(), "length");
        }
        self.0.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append to a list view.
    pub fn push(&self, value: impl Into<Value>) -> bool {
        if !self.0.raw.is_list() {
            tracing::warn!("push on a non-list reactive object");
            return false;
        }
        let index = self.0.raw.len().to_string();
        self.set(&index, value)
    }

    /// Read every element of a list view (or every value of a map view),
    /// tracking each.
    pub fn values(&self) -> Vec<Value> {
        self.keys().iter().map(|key| self.get(key)).collect()
    }

    pub fn ptr_eq(&self, other: &Reactive) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Reactive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reactive")
            .field("kind", &self.0.kind)
            .field("raw", &self.0.raw)
            .finish()
    }
}

fn create_view(value: Value, kind: ProxyKind) -> Value {
    match value {
        Value::Object(object) => Value::Reactive(Reactive::cached(&object, kind, false)),
        Value::Reactive(view) => {
            if kind.is_readonly() && !view.is_readonly() {
                Value::Reactive(Reactive::cached(&view.raw(), kind, true))
            } else {
                Value::Reactive(view)
            }
        }
        other => {
            tracing::warn!(
                kind = ?kind,
                value_type = other.type_name(),
                "target cannot be made reactive"
            );
            other
        }
    }
}

/// Deep reactive view of an object value.
///
/// Non-objects are returned unchanged with a warning; views are returned
/// unchanged.
pub fn reactive(value: impl Into<Value>) -> Value {
    create_view(value.into(), ProxyKind::Reactive)
}

/// Deep readonly view of an object value.
pub fn readonly(value: impl Into<Value>) -> Value {
    create_view(value.into(), ProxyKind::Readonly)
}

pub fn shallow_reactive(value: impl Into<Value>) -> Value {
    create_view(value.into(), ProxyKind::ShallowReactive)
}

pub fn shallow_readonly(value: impl Into<Value>) -> Value {
    create_view(value.into(), ProxyKind::ShallowReadonly)
}

/// True for reactive (non-readonly) views.
pub fn is_reactive(value: &Value) -> bool {
    matches!(value, Value::Reactive(view) if !view.is_readonly())
}

pub fn is_readonly(value: &Value) -> bool {
    matches!(value, Value::Reactive(view) if view.is_readonly())
}

/// True for any view.
pub fn is_proxy(value: &Value) -> bool {
    matches!(value, Value::Reactive(_))
}

/// The object behind a view, or the value itself.
pub fn to_raw(value: &Value) -> Value {
    match value {
        Value::Reactive(view) => Value::Object(view.raw()),
        other => other.clone(),
    }
}

/// Wrap object values in a deep reactive view, pass others through.
pub(crate) fn to_reactive(value: Value) -> Value {
    match value {
        Value::Object(object) => Value::Reactive(Reactive::new(&object)),
        other => other,
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
