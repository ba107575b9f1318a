//! Reactive Primitives
//!
//! This module implements the reactivity engine: dependency tracking,
//! effects, reactive views over objects, refs, computed values and watchers.
//!
//! # Concepts
//!
//! ## Effects
//!
//! A [`ReactiveEffect`] runs a function and remembers every reactive location
//! the function read. When one of those locations is written, the effect is
//! re-run or handed to its scheduler.
//!
//! ## Reactive objects
//!
//! [`reactive`] wraps an [`Object`](crate::Object) in a [`Reactive`] view.
//! Property reads through the view are tracked; writes and deletes trigger
//! the effects that read the affected key.
//!
//! ## Refs and computed values
//!
//! A [`Ref`] is a single reactive cell. A [`Computed`] is a ref whose value is
//! derived from other reactive state and cached until an input changes.
//!
//! ## Watchers
//!
//! [`watch`] calls a callback with new and old values when a source changes;
//! [`watch_effect`] re-runs a function when anything it read changes.
//!
//! # Implementation Notes
//!
//! The engine is single-threaded. The running effect lives on a thread-local
//! stack and the dependency table is a thread-local map from object identity
//! and key to the set of subscribed effects.

mod context;
mod effect;
mod memo;
mod proxy;
pub(crate) mod runtime;
mod signal;
mod subscriber;
mod watch;

pub use context::{pause_tracking, untracked, ReactiveContext, TrackingPause};
pub use effect::{effect, stop, EffectOptions, ReactiveEffect, Scheduler};
pub use memo::{computed, computed_with, Computed, ComputedOptions};
pub use proxy::{
    is_proxy, is_reactive, is_readonly, reactive, readonly, shallow_reactive, shallow_readonly,
    to_raw, ProxyKind, Reactive,
};
pub(crate) use proxy::to_reactive;
pub use runtime::{
    subscriber_count, track, track_effects, tracked_target_count, trigger, trigger_effects, Dep,
};
pub use signal::{
    create_ref, is_ref, proxy_refs, ref_object, shallow_ref, to_ref, to_refs, unref, ProxyRefs,
    Ref, RefKind, RefLike,
};
pub use subscriber::EffectId;
pub use watch::{traverse, watch, watch_effect, OnCleanup, WatchHandle, WatchOptions, WatchSource};
