//! Computed Values
//!
//! A [`Computed`] is a cached derived value that re-evaluates only when its
//! dependencies change.
//!
//! # How Computed Values Work
//!
//! 1. The getter runs inside a lazy [`ReactiveEffect`] whose scheduler does
//!    not re-run it. Instead the scheduler marks the value dirty and notifies
//!    the computed value's own readers.
//!
//! 2. Reading the value subscribes the reader, then recomputes if dirty.
//!
//! 3. A computed value that is never read never runs its getter, however
//!    often its inputs change.
//!
//! This makes computed values chain naturally: an effect reading a computed
//! value is notified when any input of the getter changes, and the getter
//! only runs when someone actually asks for the new value.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::effect::ReactiveEffect;
use super::runtime::{track_effects, trigger_effects, Dep};
use super::signal::{Ref, RefKind, RefLike};
use crate::value::Value;

type Getter = Rc<dyn Fn() -> Value>;
type Setter = Rc<dyn Fn(Value)>;

/// Getter and optional setter for [`computed_with`].
pub struct ComputedOptions {
    pub get: Getter,
    pub set: Option<Setter>,
}

impl ComputedOptions {
    pub fn new<G, R>(get: G) -> Self
    where
        G: Fn() -> R + 'static,
        R: Into<Value>,
    {
        Self {
            get: Rc::new(move || get().into()),
            set: None,
        }
    }

    pub fn setter<S>(mut self, set: S) -> Self
    where
        S: Fn(Value) + 'static,
    {
        self.set = Some(Rc::new(set));
        self
    }
}

struct ComputedInner {
    value: RefCell<Value>,
    dirty: Cell<bool>,
    dep: Dep,
    effect: ReactiveEffect,
    setter: Option<Setter>,
}

impl Drop for ComputedInner {
    fn drop(&mut self) {
        self.effect.stop();
    }
}

/// A cached derived value.
///
/// # Example
///
/// ```rust
/// use trellis_core::reactive::{computed, create_ref};
/// use trellis_core::Value;
///
/// let count = create_ref(2);
/// let count_clone = count.clone();
/// let doubled = computed(move || count_clone.get().as_f64().unwrap_or_default() * 2.0);
///
/// assert_eq!(doubled.get(), Value::Number(4.0));
/// count.set(5);
/// assert_eq!(doubled.get(), Value::Number(10.0));
/// ```
#[derive(Clone)]
pub struct Computed(Rc<ComputedInner>);

impl Computed {
    fn from_options(options: ComputedOptions) -> Self {
        let getter = options.get;
        let setter = options.set;

        let inner = Rc::new_cyclic(|weak: &Weak<ComputedInner>| {
            let weak = weak.clone();
            let effect = ReactiveEffect::with_scheduler(
                move || getter(),
                Rc::new(move |_: &ReactiveEffect| {
                    let Some(inner) = weak.upgrade() else {
                        return;
                    };
                    if !inner.dirty.get() {
                        inner.dirty.set(true);
                        trigger_effects(&inner.dep);
                    }
                }),
            );

            ComputedInner {
                value: RefCell::new(Value::Null),
                dirty: Cell::new(true),
                dep: Dep::new(),
                effect,
                setter,
            }
        });

        Self(inner)
    }

    /// Current value, recomputing if a dependency changed since the last
    /// read.
    pub fn get(&self) -> Value {
        track_effects(&self.0.dep);
        self.refresh();
        self.0.value.borrow().clone()
    }

    /// Current value without subscribing the running effect.
    pub fn get_untracked(&self) -> Value {
        self.refresh();
        self.0.value.borrow().clone()
    }

    fn refresh(&self) {
        if self.0.dirty.replace(false) {
            let value = self.0.effect.run();
            let previous = self.0.value.replace(value);
            drop(previous);
        }
    }

    /// Forward to the setter, or warn if there is none.
    pub fn set(&self, value: impl Into<Value>) {
        match &self.0.setter {
            Some(setter) => setter(value.into()),
            None => tracing::warn!("write operation failed: computed value is readonly"),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.0.dirty.get()
    }

    /// The effect that runs the getter.
    pub fn effect(&self) -> &ReactiveEffect {
        &self.0.effect
    }

    /// Number of effects reading this value.
    pub fn dependent_count(&self) -> usize {
        self.0.dep.len()
    }
}

impl RefLike for Computed {
    fn get(&self) -> Value {
        Computed::get(self)
    }

    fn get_untracked(&self) -> Value {
        Computed::get_untracked(self)
    }

    fn set(&self, value: Value) {
        Computed::set(self, value)
    }

    fn kind(&self) -> RefKind {
        RefKind::Computed
    }
}

impl From<Computed> for Ref {
    fn from(computed: Computed) -> Self {
        Ref::from_impl(Rc::new(computed))
    }
}

impl From<Computed> for Value {
    fn from(computed: Computed) -> Self {
        Value::Ref(computed.into())
    }
}

impl std::fmt::Debug for Computed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computed")
            .field("dirty", &self.0.dirty.get())
            .field("value", &*self.0.value.borrow())
            .finish()
    }
}

/// A readonly computed value.
pub fn computed<G, R>(getter: G) -> Computed
where
    G: Fn() -> R + 'static,
    R: Into<Value>,
{
    Computed::from_options(ComputedOptions::new(getter))
}

/// A computed value with an explicit getter and setter.
pub fn computed_with(options: ComputedOptions) -> Computed {
    Computed::from_options(options)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
