//! Reactive Runtime
//!
//! The runtime owns the dependency table that connects reactive objects to the
//! effects that read them.
//!
//! # How It Works
//!
//! 1. The table maps an object identity to a per-key [`Dep`]: the ordered set
//!    of effects that read that key.
//!
//! 2. When a tracked read happens inside a running effect, [`track`] adds the
//!    effect to the key's dep and records the dep on the effect, so the effect
//!    can unsubscribe itself before its next run.
//!
//! 3. When a key is written, [`trigger`] snapshots the dep and notifies each
//!    effect: through its scheduler if it has one, otherwise by running it
//!    synchronously. The effect that is currently running is skipped, so an
//!    effect that writes what it reads does not recurse.
//!
//! Refs and computed values own a standalone [`Dep`] and use
//! [`track_effects`]/[`trigger_effects`] directly.
//!
//! # Lifetime
//!
//! Deps hold their effects strongly. Entries for an object are released when
//! the object itself is dropped ([`release_target`]), and an effect leaves all
//! of its deps when it is stopped or re-run.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::context::ReactiveContext;
use super::effect::ReactiveEffect;
use super::subscriber::EffectId;
use crate::value::ObjectId;

/// The set of effects subscribed to one reactive location.
#[derive(Clone, Default)]
pub struct Dep(Rc<RefCell<IndexMap<EffectId, ReactiveEffect>>>);

impl Dep {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    pub fn contains(&self, id: EffectId) -> bool {
        self.0.borrow().contains_key(&id)
    }

    fn insert(&self, effect: ReactiveEffect) {
        self.0.borrow_mut().insert(effect.id(), effect);
    }

    pub(crate) fn remove(&self, id: EffectId) {
        let removed = self.0.borrow_mut().shift_remove(&id);
        drop(removed);
    }

    /// Subscribers in subscription order.
    pub fn snapshot(&self) -> Vec<ReactiveEffect> {
        self.0.borrow().values().cloned().collect()
    }

    pub fn ptr_eq(&self, other: &Dep) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(map) => f.debug_set().entries(map.keys()).finish(),
            Err(_) => f.write_str("Dep(<borrowed>)"),
        }
    }
}

type KeyToDep = HashMap<String, Dep>;

thread_local! {
    static TARGET_MAP: RefCell<HashMap<ObjectId, KeyToDep>> = RefCell::new(HashMap::new());
}

/// Record that the running effect read `key` of `target`.
///
/// No-op when no effect is running or tracking is paused.
pub fn track(target: ObjectId, key: &str) {
    if !ReactiveContext::is_tracking() {
        return;
    }

    let dep = TARGET_MAP.with(|map| {
        map.borrow_mut()
            .entry(target)
            .or_default()
            .entry(key.to_string())
            .or_default()
            .clone()
    });
    track_effects(&dep);
}

/// Subscribe the running effect to `dep`.
pub fn track_effects(dep: &Dep) {
    if !ReactiveContext::is_tracking() {
        return;
    }
    let Some(effect) = ReactiveContext::current_effect() else {
        return;
    };

    if !dep.contains(effect.id()) {
        dep.insert(effect.clone());
        effect.record_dep(dep.clone());
    }
}

/// Notify the effects that read `key` of `target`.
pub fn trigger(target: ObjectId, key: &str) {
    let dep = TARGET_MAP.with(|map| {
        map.borrow()
            .get(&target)
            .and_then(|deps| deps.get(key))
            .cloned()
    });

    if let Some(dep) = dep {
        tracing::trace!(target = target.raw(), key, subscribers = dep.len(), "trigger");
        trigger_effects(&dep);
    }
}

/// Notify every effect in `dep`.
///
/// Iterates over a snapshot, so effects that re-subscribe while running do
/// not extend the current pass.
pub fn trigger_effects(dep: &Dep) {
    let running = ReactiveContext::current_effect_id();

    for effect in dep.snapshot() {
        if Some(effect.id()) == running || !effect.is_active() {
            continue;
        }
        match effect.scheduler() {
            Some(scheduler) => scheduler(&effect),
            None => {
                effect.run();
            }
        }
    }
}

/// Drop every dep recorded for `target`.
///
/// Called when the object is dropped. Skipped silently if the table is
/// busy or already torn down.
pub(crate) fn release_target(target: ObjectId) {
    let removed = TARGET_MAP
        .try_with(|map| {
            map.try_borrow_mut()
                .ok()
                .and_then(|mut map| map.remove(&target))
        })
        .ok()
        .flatten();
    drop(removed);
}

/// Number of effects subscribed to `key` of `target`.
pub fn subscriber_count(target: ObjectId, key: &str) -> usize {
    TARGET_MAP.with(|map| {
        map.borrow()
            .get(&target)
            .and_then(|deps| deps.get(key))
            .map_or(0, Dep::len)
    })
}

/// Number of objects with at least one recorded dep.
pub fn tracked_target_count() -> usize {
    TARGET_MAP.with(|map| map.borrow().len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Object;
    use std::cell::Cell;

    #[test]
    fn track_outside_effect_is_noop() {
        let target = Object::new();
        track(target.id(), "a");
        assert_eq!(subscriber_count(target.id(), "a"), 0);
    }

    #[test]
    fn trigger_runs_subscribers_in_order() {
        let target = Object::new();
        let id = target.id();
        let log = Rc::new(RefCell::new(Vec::new()));

        let first = {
            let log = log.clone();
            ReactiveEffect::new(move || {
                track(id, "a");
                log.borrow_mut().push("first");
            })
        };
        let second = {
            let log = log.clone();
            ReactiveEffect::new(move || {
                track(id, "a");
                log.borrow_mut().push("second");
            })
        };

        log.borrow_mut().clear();
        trigger(id, "a");
        assert_eq!(*log.borrow(), vec!["first", "second"]);
        assert_eq!(subscriber_count(id, "a"), 2);

        first.stop();
        second.stop();
        assert_eq!(subscriber_count(id, "a"), 0);
    }

    #[test]
    fn trigger_skips_running_effect() {
        let target = Object::new();
        let id = target.id();
        let runs = Rc::new(Cell::new(0));

        let runs_clone = runs.clone();
        let _effect = ReactiveEffect::new(move || {
            track(id, "n");
            runs_clone.set(runs_clone.get() + 1);
            // Writing what we read must not recurse
            trigger(id, "n");
        });

        assert_eq!(runs.get(), 1);
        trigger(id, "n");
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn dropping_object_releases_its_deps() {
        let target = Object::new();
        let id = target.id();
        let effect = ReactiveEffect::new(move || track(id, "k"));
        assert_eq!(subscriber_count(id, "k"), 1);

        drop(target);
        assert_eq!(subscriber_count(id, "k"), 0);
        effect.stop();
    }
}
