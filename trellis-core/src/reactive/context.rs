//! Reactive Context
//!
//! The reactive context tracks which effect is currently running and whether
//! reads should be recorded as dependencies.
//!
//! # Implementation
//!
//! A thread-local stack holds the running effects. Entering an effect pushes
//! it and turns tracking on; the guard returned by [`ReactiveContext::enter`]
//! pops it and restores the previous tracking flag when dropped, so nested
//! effects hand control back to their enclosing effect even if they panic.
//!
//! Tracking can be suspended without leaving the effect through
//! [`pause_tracking`] or [`untracked`]. Lifecycle hooks run this way so a hook
//! that reads state does not subscribe the surrounding render effect.

use std::cell::{Cell, RefCell};

use super::effect::ReactiveEffect;
use super::subscriber::EffectId;

thread_local! {
    static EFFECT_STACK: RefCell<Vec<ReactiveEffect>> = const { RefCell::new(Vec::new()) };
    static SHOULD_TRACK: Cell<bool> = const { Cell::new(true) };
}

/// Guard that pops the running effect when dropped.
pub struct ReactiveContext {
    effect_id: EffectId,
    previous_should_track: bool,
}

impl ReactiveContext {
    /// Enter the context of `effect`.
    ///
    /// Until the returned guard drops, tracked reads subscribe `effect`.
    pub fn enter(effect: ReactiveEffect) -> Self {
        let effect_id = effect.id();
        EFFECT_STACK.with(|stack| stack.borrow_mut().push(effect));
        let previous_should_track = SHOULD_TRACK.with(|flag| flag.replace(true));

        Self {
            effect_id,
            previous_should_track,
        }
    }

    /// Check if any effect is running.
    pub fn is_active() -> bool {
        EFFECT_STACK.with(|stack| !stack.borrow().is_empty())
    }

    /// The innermost running effect, if any.
    pub fn current_effect() -> Option<ReactiveEffect> {
        EFFECT_STACK.with(|stack| stack.borrow().last().cloned())
    }

    /// Id of the innermost running effect.
    pub fn current_effect_id() -> Option<EffectId> {
        EFFECT_STACK.with(|stack| stack.borrow().last().map(|effect| effect.id()))
    }

    /// Whether a read right now would be recorded.
    pub fn is_tracking() -> bool {
        SHOULD_TRACK.with(Cell::get) && Self::is_active()
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        let popped = EFFECT_STACK.with(|stack| stack.borrow_mut().pop());
        SHOULD_TRACK.with(|flag| flag.set(self.previous_should_track));

        if let Some(effect) = popped {
            debug_assert_eq!(
                effect.id(),
                self.effect_id,
                "ReactiveContext mismatch: expected {:?}, got {:?}",
                self.effect_id,
                effect.id()
            );
        }
    }
}

/// Guard returned by [`pause_tracking`].
pub struct TrackingPause {
    previous: bool,
}

impl Drop for TrackingPause {
    fn drop(&mut self) {
        SHOULD_TRACK.with(|flag| flag.set(self.previous));
    }
}

/// Stop recording dependencies until the guard drops.
pub fn pause_tracking() -> TrackingPause {
    TrackingPause {
        previous: SHOULD_TRACK.with(|flag| flag.replace(false)),
    }
}

/// Run `f` without recording any dependencies.
pub fn untracked<T>(f: impl FnOnce() -> T) -> T {
    let _pause = pause_tracking();
    f()
}
