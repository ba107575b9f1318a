//! Effect Implementation
//!
//! A [`ReactiveEffect`] wraps a function and re-runs it (or hands it to a
//! scheduler) whenever something it read changes.
//!
//! # How Effects Work
//!
//! 1. Running an effect first removes it from every dep it joined during the
//!    previous run, then enters a [`ReactiveContext`] so reads made by the
//!    function subscribe it again. Dependencies therefore always reflect the
//!    latest run only.
//!
//! 2. When a dependency changes, the runtime either runs the effect directly
//!    or, if the effect has a scheduler, calls the scheduler with it. Computed
//!    values, watchers and component renders all use schedulers.
//!
//! 3. A stopped effect leaves all of its deps and is never triggered again.
//!    Running a stopped effect calls the function without tracking.
//!
//! Effects are single-threaded: they live in `Rc`s and the tracking context
//! is thread-local.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use super::context::ReactiveContext;
use super::runtime::Dep;
use super::subscriber::EffectId;
use crate::value::Value;

/// Scheduler invoked instead of running the effect when it is triggered.
pub type Scheduler = Rc<dyn Fn(&ReactiveEffect)>;

/// Options for [`effect`].
#[derive(Clone, Default)]
pub struct EffectOptions {
    /// Do not run on creation.
    pub lazy: bool,
    pub scheduler: Option<Scheduler>,
}

struct EffectInner {
    id: EffectId,
    run: Box<dyn Fn() -> Value>,
    scheduler: Option<Scheduler>,
    active: Cell<bool>,
    deps: RefCell<SmallVec<[Dep; 4]>>,
    run_count: Cell<usize>,
}

/// A side-effecting computation that re-runs when its dependencies change.
///
/// # Example
///
/// ```rust
/// use trellis_core::reactive::{create_ref, ReactiveEffect};
///
/// let count = create_ref(0);
/// let seen = std::rc::Rc::new(std::cell::Cell::new(0.0));
///
/// let seen_clone = seen.clone();
/// let count_clone = count.clone();
/// let _effect = ReactiveEffect::new(move || {
///     seen_clone.set(count_clone.get().as_f64().unwrap_or_default());
/// });
///
/// count.set(5);
/// assert_eq!(seen.get(), 5.0);
/// ```
#[derive(Clone)]
pub struct ReactiveEffect(Rc<EffectInner>);

impl ReactiveEffect {
    /// Create an effect and run it once to collect its dependencies.
    pub fn new<F, R>(f: F) -> Self
    where
        F: Fn() -> R + 'static,
        R: Into<Value>,
    {
        let effect = Self::build(f, None);
        effect.run();
        effect
    }

    /// Create an effect without running it.
    pub fn lazy<F, R>(f: F) -> Self
    where
        F: Fn() -> R + 'static,
        R: Into<Value>,
    {
        Self::build(f, None)
    }

    /// Create an effect with a scheduler, without running it.
    pub fn with_scheduler<F, R>(f: F, scheduler: Scheduler) -> Self
    where
        F: Fn() -> R + 'static,
        R: Into<Value>,
    {
        Self::build(f, Some(scheduler))
    }

    fn build<F, R>(f: F, scheduler: Option<Scheduler>) -> Self
    where
        F: Fn() -> R + 'static,
        R: Into<Value>,
    {
        Self(Rc::new(EffectInner {
            id: EffectId::new(),
            run: Box::new(move || f().into()),
            scheduler,
            active: Cell::new(true),
            deps: RefCell::new(SmallVec::new()),
            run_count: Cell::new(0),
        }))
    }

    pub fn id(&self) -> EffectId {
        self.0.id
    }

    pub fn scheduler(&self) -> Option<Scheduler> {
        self.0.scheduler.clone()
    }

    /// Run the function, re-collecting dependencies.
    pub fn run(&self) -> Value {
        self.0.run_count.set(self.0.run_count.get() + 1);

        if !self.0.active.get() {
            return (self.0.run)();
        }

        let _ctx = ReactiveContext::enter(self.clone());
        self.cleanup();
        (self.0.run)()
    }

    /// Leave every dep and never run from a trigger again. Idempotent.
    pub fn stop(&self) {
        if self.0.active.replace(false) {
            self.cleanup();
        }
    }

    pub fn is_active(&self) -> bool {
        self.0.active.get()
    }

    /// Number of times the function has run.
    pub fn run_count(&self) -> usize {
        self.0.run_count.get()
    }

    /// Number of deps the effect is subscribed to.
    pub fn dependency_count(&self) -> usize {
        self.0.deps.borrow().len()
    }

    pub fn ptr_eq(&self, other: &ReactiveEffect) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn record_dep(&self, dep: Dep) {
        self.0.deps.borrow_mut().push(dep);
    }

    fn cleanup(&self) {
        let deps = std::mem::take(&mut *self.0.deps.borrow_mut());
        for dep in deps.iter() {
            dep.remove(self.0.id);
        }
    }
}

impl fmt::Debug for ReactiveEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveEffect")
            .field("id", &self.0.id)
            .field("active", &self.0.active.get())
            .field("run_count", &self.0.run_count.get())
            .finish()
    }
}

/// Create an effect from a function and options.
///
/// Unless `options.lazy` is set the function runs immediately.
pub fn effect<F, R>(f: F, options: EffectOptions) -> ReactiveEffect
where
    F: Fn() -> R + 'static,
    R: Into<Value>,
{
    let effect = ReactiveEffect::build(f, options.scheduler);
    if !options.lazy {
        effect.run();
    }
    effect
}

/// Stop an effect.
pub fn stop(effect: &ReactiveEffect) {
    effect.stop();
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{reactive, runtime};
    use serde_json::json;

    #[test]
    fn effect_runs_immediately() {
        let counter = Rc::new(Cell::new(0));
        let counter_clone = counter.clone();

        let effect = ReactiveEffect::new(move || {
            counter_clone.set(counter_clone.get() + 1);
        });

        assert_eq!(counter.get(), 1);
        assert_eq!(effect.run_count(), 1);
    }

    #[test]
    fn lazy_effect_does_not_run() {
        let counter = Rc::new(Cell::new(0));
        let counter_clone = counter.clone();

        let effect = effect(
            move || counter_clone.set(counter_clone.get() + 1),
            EffectOptions {
                lazy: true,
                ..Default::default()
            },
        );

        assert_eq!(counter.get(), 0);

        effect.run();
        assert_eq!(counter.get(), 1);
    }

    #[test]
    fn dependencies_reflect_latest_run() {
        let state = reactive(json!({"flag": true, "a": 1, "b": 2}));
        let target = state.as_reactive().unwrap().raw().id();

        let state_clone = state.clone();
        let effect = ReactiveEffect::new(move || {
            if state_clone.get("flag").truthy() {
                state_clone.get("a");
            } else {
                state_clone.get("b");
            }
        });

        assert_eq!(runtime::subscriber_count(target, "a"), 1);
        assert_eq!(runtime::subscriber_count(target, "b"), 0);

        state.set("flag", false);

        // The branch switched, so "a" is no longer a dependency
        assert_eq!(runtime::subscriber_count(target, "a"), 0);
        assert_eq!(runtime::subscriber_count(target, "b"), 1);
        assert_eq!(effect.dependency_count(), 2);
    }

    #[test]
    fn scheduler_replaces_direct_run() {
        let state = reactive(json!({"n": 0}));
        let scheduled = Rc::new(Cell::new(0));

        let scheduled_clone = scheduled.clone();
        let state_clone = state.clone();
        let effect = effect(
            move || state_clone.get("n"),
            EffectOptions {
                lazy: false,
                scheduler: Some(Rc::new(move |_: &ReactiveEffect| {
                    scheduled_clone.set(scheduled_clone.get() + 1)
                })),
            },
        );

        state.set("n", 1);
        state.set("n", 2);

        assert_eq!(scheduled.get(), 2);
        // Scheduler took over, the function ran only on creation
        assert_eq!(effect.run_count(), 1);
    }

    #[test]
    fn stopped_effect_is_not_triggered() {
        let state = reactive(json!({"n": 0}));
        let counter = Rc::new(Cell::new(0));

        let counter_clone = counter.clone();
        let state_clone = state.clone();
        let effect = ReactiveEffect::new(move || {
            state_clone.get("n");
            counter_clone.set(counter_clone.get() + 1);
        });

        effect.stop();
        effect.stop();
        state.set("n", 1);

        assert_eq!(counter.get(), 1);
        assert!(!effect.is_active());
        assert_eq!(effect.dependency_count(), 0);
    }

    #[test]
    fn nested_effects_track_independently() {
        let state = reactive(json!({"outer": 0, "inner": 0}));
        let outer_runs = Rc::new(Cell::new(0));
        let inner_runs = Rc::new(Cell::new(0));
        let inner_slot: Rc<RefCell<Option<ReactiveEffect>>> = Rc::new(RefCell::new(None));

        let _outer = {
            let state = state.clone();
            let outer_runs = outer_runs.clone();
            let inner_runs = inner_runs.clone();
            let inner_slot = inner_slot.clone();
            ReactiveEffect::new(move || {
                outer_runs.set(outer_runs.get() + 1);
                let inner = {
                    let state = state.clone();
                    let inner_runs = inner_runs.clone();
                    ReactiveEffect::new(move || {
                        inner_runs.set(inner_runs.get() + 1);
                        state.get("inner");
                    })
                };
                if let Some(previous) = inner_slot.borrow_mut().replace(inner) {
                    previous.stop();
                }
                // Read after the inner effect finished: belongs to the outer effect
                state.get("outer");
            })
        };

        assert_eq!((outer_runs.get(), inner_runs.get()), (1, 1));

        state.set("inner", 1);
        assert_eq!((outer_runs.get(), inner_runs.get()), (1, 2));

        state.set("outer", 1);
        assert_eq!((outer_runs.get(), inner_runs.get()), (2, 3));
    }
}
