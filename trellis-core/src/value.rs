//! Dynamic Values
//!
//! Component state, props and template expressions are dynamically shaped, so
//! the runtime works with a small dynamic value model instead of concrete Rust
//! types.
//!
//! # Model
//!
//! - Scalars (`Null`, `Bool`, `Number`, `Str`) are plain values.
//! - [`Object`] is a shared, mutable container: either a string-keyed map
//!   (insertion ordered) or a list. Cloning an `Object` clones the handle, not
//!   the contents, so two handles observe the same mutations.
//! - [`Reactive`] is a tracking view over an `Object` (see
//!   [`reactive`](crate::reactive::reactive)).
//! - [`Ref`] is a boxed reactive cell.
//! - [`Function`] is a callable taking positional arguments.
//!
//! Every `Object` has an identity ([`ObjectId`]) that the dependency tracker
//! uses as its target key. When the last handle to an object is dropped, its
//! entries in the dependency table are released.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValueError;
use crate::reactive::{runtime, Reactive, Ref};

/// Identity of an [`Object`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric id.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Storage behind an [`Object`].
#[derive(Debug, Clone)]
pub enum ObjectData {
    Map(IndexMap<String, Value>),
    List(Vec<Value>),
}

struct ObjectInner {
    id: ObjectId,
    data: RefCell<ObjectData>,
}

impl Drop for ObjectInner {
    fn drop(&mut self) {
        runtime::release_target(self.id);
    }
}

/// A shared, mutable map or list.
///
/// List objects answer the key `"length"` and numeric string keys, so the
/// same string-keyed accessors work for both shapes.
#[derive(Clone)]
pub struct Object(Rc<ObjectInner>);

impl Object {
    /// Create an empty map object.
    pub fn new() -> Self {
        Self::from_data(ObjectData::Map(IndexMap::new()))
    }

    /// Create a list object.
    pub fn list(items: Vec<Value>) -> Self {
        Self::from_data(ObjectData::List(items))
    }

    /// Create a map object from existing entries.
    pub fn from_map(map: IndexMap<String, Value>) -> Self {
        Self::from_data(ObjectData::Map(map))
    }

    fn from_data(data: ObjectData) -> Self {
        Self(Rc::new(ObjectInner {
            id: ObjectId::next(),
            data: RefCell::new(data),
        }))
    }

    /// Build a map object from `(key, value)` pairs.
    pub fn from_entries<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::from_map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn id(&self) -> ObjectId {
        self.0.id
    }

    pub fn is_list(&self) -> bool {
        matches!(*self.0.data.borrow(), ObjectData::List(_))
    }

    /// Read a key without any tracking.
    pub fn get(&self, key: &str) -> Option<Value> {
        match &*self.0.data.borrow() {
            ObjectData::Map(map) => map.get(key).cloned(),
            ObjectData::List(items) => {
                if key == "length" {
                    return Some(Value::Number(items.len() as f64));
                }
                key.parse::<usize>()
                    .ok()
                    .and_then(|index| items.get(index).cloned())
            }
        }
    }

    /// Write a key without triggering. Returns the previous value.
    ///
    /// For lists, writing one past the end appends, writing further pads with
    /// `Null`, and writing `"length"` truncates or extends.
    pub fn set(&self, key: &str, value: Value) -> Option<Value> {
        match &mut *self.0.data.borrow_mut() {
            ObjectData::Map(map) => map.insert(key.to_string(), value),
            ObjectData::List(items) => {
                if key == "length" {
                    let previous = items.len();
                    let len = value.as_f64().unwrap_or(0.0).max(0.0) as usize;
                    items.resize(len, Value::Null);
                    return Some(Value::Number(previous as f64));
                }
                let Ok(index) = key.parse::<usize>() else {
                    tracing::warn!(key, "ignoring non-index key on list object");
                    return None;
                };
                if index < items.len() {
                    Some(std::mem::replace(&mut items[index], value))
                } else {
                    items.resize(index, Value::Null);
                    items.push(value);
                    None
                }
            }
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        match &*self.0.data.borrow() {
            ObjectData::Map(map) => map.contains_key(key),
            ObjectData::List(items) => {
                key == "length" || key.parse::<usize>().map_or(false, |i| i < items.len())
            }
        }
    }

    /// Remove a key without triggering.
    ///
    /// Removing a list index leaves a `Null` hole so later indices keep
    /// their positions.
    pub fn remove(&self, key: &str) -> Option<Value> {
        match &mut *self.0.data.borrow_mut() {
            ObjectData::Map(map) => map.shift_remove(key),
            ObjectData::List(items) => key
                .parse::<usize>()
                .ok()
                .filter(|&index| index < items.len())
                .map(|index| std::mem::take(&mut items[index])),
        }
    }

    /// Own keys in order. Lists report their indices.
    pub fn keys(&self) -> Vec<String> {
        match &*self.0.data.borrow() {
            ObjectData::Map(map) => map.keys().cloned().collect(),
            ObjectData::List(items) => (0..items.len()).map(|i| i.to_string()).collect(),
        }
    }

    pub fn values(&self) -> Vec<Value> {
        match &*self.0.data.borrow() {
            ObjectData::Map(map) => map.values().cloned().collect(),
            ObjectData::List(items) => items.clone(),
        }
    }

    pub fn entries(&self) -> Vec<(String, Value)> {
        match &*self.0.data.borrow() {
            ObjectData::Map(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            ObjectData::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v.clone()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        match &*self.0.data.borrow() {
            ObjectData::Map(map) => map.len(),
            ObjectData::List(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append to a list. Returns the new length, or `None` for maps.
    pub fn push(&self, value: Value) -> Option<usize> {
        match &mut *self.0.data.borrow_mut() {
            ObjectData::List(items) => {
                items.push(value);
                Some(items.len())
            }
            ObjectData::Map(_) => None,
        }
    }

    /// Snapshot of the underlying storage.
    pub fn data(&self) -> ObjectData {
        self.0.data.borrow().clone()
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.data.try_borrow() {
            Ok(data) => match &*data {
                ObjectData::Map(map) => f.debug_map().entries(map.iter()).finish(),
                ObjectData::List(items) => f.debug_list().entries(items.iter()).finish(),
            },
            Err(_) => write!(f, "Object({})", self.0.id.0),
        }
    }
}

/// A callable value.
#[derive(Clone)]
pub struct Function(Rc<dyn Fn(&[Value]) -> Value>);

impl Function {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + 'static,
    {
        Self(Rc::new(f))
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.0)(args)
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Function")
    }
}

/// A dynamically typed value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Object(Object),
    Reactive(Reactive),
    Ref(Ref),
    Function(Function),
}

impl Value {
    /// Name of the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Object(_) => "object",
            Value::Reactive(_) => "reactive",
            Value::Ref(_) => "ref",
            Value::Function(_) => "function",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether the value is an object or a view over one.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Reactive(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_reactive(&self) -> Option<&Reactive> {
        match self {
            Value::Reactive(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_ref_cell(&self) -> Option<&Ref> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Truthiness as template expressions see it.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Ref(r) => r.get().truthy(),
            _ => true,
        }
    }

    /// Identity comparison: scalars by value (NaN equals NaN, `0.0` and
    /// `-0.0` differ), containers and callables by handle.
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => {
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b && a.is_sign_negative() == b.is_sign_negative()
                }
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Reactive(a), Value::Reactive(b)) => a.ptr_eq(b),
            (Value::Ref(a), Value::Ref(b)) => a.ptr_eq(b),
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Read a property, following reactive views (tracked) and unwrapping a
    /// ref receiver. Missing properties read as `Null`.
    pub fn get(&self, key: &str) -> Value {
        match self {
            Value::Object(o) => o.get(key).unwrap_or_default(),
            Value::Reactive(r) => r.get(key),
            Value::Ref(r) => r.get().get(key),
            Value::Str(s) if key == "length" => Value::Number(s.chars().count() as f64),
            _ => Value::Null,
        }
    }

    /// Write a property. Returns `false` when the receiver cannot hold
    /// properties or rejects the write.
    pub fn set(&self, key: &str, value: impl Into<Value>) -> bool {
        match self {
            Value::Object(o) => {
                o.set(key, value.into());
                true
            }
            Value::Reactive(r) => r.set(key, value),
            Value::Ref(r) => r.get().set(key, value),
            _ => {
                tracing::warn!(key, receiver = self.type_name(), "cannot set property");
                false
            }
        }
    }

    /// Text form used for interpolation and attribute values.
    ///
    /// `Null` renders as the empty string, integral numbers without a
    /// fractional part, containers as JSON.
    pub fn to_display_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::Str(s) => s.to_string(),
            Value::Object(_) | Value::Reactive(_) => {
                serde_json::Value::from(self).to_string()
            }
            Value::Ref(r) => r.get().to_display_string(),
            Value::Function(_) => "[function]".to_string(),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Number(n) => write!(f, "Number({})", n),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Object(o) => write!(f, "Object({:?})", o),
            Value::Reactive(r) => write!(f, "{:?}", r),
            Value::Ref(r) => write!(f, "{:?}", r),
            Value::Function(func) => write!(f, "{:?}", func),
        }
    }
}

/// Structural equality over the plain-data shape, mainly for tests.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Ref(a), Value::Ref(b)) => a.ptr_eq(b),
            (Value::Function(_), _) | (_, Value::Function(_)) => false,
            _ => serde_json::Value::from(self) == serde_json::Value::from(other),
        }
    }
}

// ----------------------------------------------------------------------------
// Conversions
// ----------------------------------------------------------------------------

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! number_from {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(n: $t) -> Self {
                Value::Number(n as f64)
            }
        })*
    };
}

number_from!(i32, i64, u32, u64, usize, f32, f64);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<Rc<str>> for Value {
    fn from(s: Rc<str>) -> Self {
        Value::Str(s)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl From<Reactive> for Value {
    fn from(r: Reactive) -> Self {
        Value::Reactive(r)
    }
}

impl From<Ref> for Value {
    fn from(r: Ref) -> Self {
        Value::Ref(r)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Object(Object::list(items))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::from(s),
            serde_json::Value::Array(items) => {
                Value::Object(Object::list(items.into_iter().map(Value::from).collect()))
            }
            serde_json::Value::Object(map) => Value::Object(Object::from_map(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            )),
        }
    }
}

/// Plain-data snapshot. Views and refs are unwrapped without tracking,
/// functions become `null`.
impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null | Value::Function(_) => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                serde_json::Value::Number(serde_json::Number::from(*n as i64))
            }
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s.to_string()),
            Value::Object(o) => object_to_json(o),
            Value::Reactive(r) => object_to_json(&r.raw()),
            Value::Ref(r) => serde_json::Value::from(&r.get_untracked()),
        }
    }
}

fn object_to_json(object: &Object) -> serde_json::Value {
    match object.data() {
        ObjectData::Map(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                .collect(),
        ),
        ObjectData::List(items) => {
            serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde_json::Value::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl TryFrom<Value> for f64 {
    type Error = ValueError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Number(n) => Ok(n),
            Value::Ref(r) => f64::try_from(r.get()),
            other => Err(ValueError::TypeMismatch {
                expected: "number",
                found: other.type_name(),
            }),
        }
    }
}

impl TryFrom<Value> for bool {
    type Error = ValueError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Bool(b) => Ok(b),
            Value::Ref(r) => bool::try_from(r.get()),
            other => Err(ValueError::TypeMismatch {
                expected: "bool",
                found: other.type_name(),
            }),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = ValueError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Str(s) => Ok(s.to_string()),
            Value::Ref(r) => String::try_from(r.get()),
            other => Err(ValueError::TypeMismatch {
                expected: "string",
                found: other.type_name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn same_value_follows_identity_rules() {
        assert!(Value::Number(f64::NAN).same_value(&Value::Number(f64::NAN)));
        assert!(!Value::Number(0.0).same_value(&Value::Number(-0.0)));
        assert!(Value::from("a").same_value(&Value::from("a")));

        let a = Object::new();
        let b = Object::new();
        assert!(Value::from(a.clone()).same_value(&Value::from(a)));
        assert!(!Value::from(b).same_value(&Value::from(Object::new())));
    }

    #[test]
    fn list_objects_answer_length_and_indices() {
        let list = Object::list(vec![1.into(), 2.into()]);
        assert_eq!(list.get("length"), Some(Value::Number(2.0)));
        assert_eq!(list.get("1"), Some(Value::Number(2.0)));

        // Writing one past the end appends
        list.set("2", 3.into());
        assert_eq!(list.len(), 3);

        // Writing further out pads with null
        list.set("5", 6.into());
        assert_eq!(list.len(), 6);
        assert_eq!(list.get("4"), Some(Value::Null));

        list.set("length", 1.into());
        assert_eq!(list.values(), vec![Value::Number(1.0)]);
    }

    #[test]
    fn json_conversion_preserves_shape() {
        let value = Value::from(json!({"a": [1, "two", null], "b": {"c": true}}));
        assert_eq!(value.get("b").get("c"), Value::Bool(true));
        assert_eq!(value.get("a").get("1"), Value::from("two"));
        assert_eq!(
            serde_json::Value::from(&value),
            json!({"a": [1, "two", null], "b": {"c": true}})
        );
    }

    #[test]
    fn display_strings() {
        assert_eq!(Value::Null.to_display_string(), "");
        assert_eq!(Value::Number(3.0).to_display_string(), "3");
        assert_eq!(Value::Number(2.5).to_display_string(), "2.5");
        assert_eq!(Value::from(json!([1, 2])).to_display_string(), "[1,2]");
    }

    #[test]
    fn typed_extraction_reports_mismatch() {
        assert_eq!(f64::try_from(Value::Number(4.0)), Ok(4.0));
        assert_eq!(
            bool::try_from(Value::from("x")),
            Err(ValueError::TypeMismatch {
                expected: "bool",
                found: "string"
            })
        );
    }

    #[test]
    fn deserializes_from_json_text() {
        let value: Value = serde_json::from_str(r#"{"title": "hi"}"#).unwrap();
        assert_eq!(value.get("title"), Value::from("hi"));
    }
}
