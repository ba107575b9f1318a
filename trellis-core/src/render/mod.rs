//! Rendering: virtual nodes, components and the renderer.
//!
//! # How Rendering Works
//!
//! 1. Components describe their UI as a tree of [`VNode`]s, built with [`h`]
//!    or compiled from a template.
//! 2. The [`Renderer`] mounts the tree through a platform's
//!    [`RendererOptions`] and remembers it.
//! 3. Each component renders inside its own reactive effect. When state it
//!    read changes, the effect is queued and the next flush re-renders the
//!    component and patches only what changed.
//!
//! [`create_app`] wraps all of this behind a root component and a mount
//! target.

mod app;
mod component;
mod emit;
mod inject;
mod lifecycle;
mod options;
mod props;
mod renderer;
mod scheduler;
mod shape;
mod slots;
mod vnode;

pub use app::{create_app, App, AppConfig, AppContext, MountTarget, Plugin};
pub use component::{
    define_component, get_current_instance, Component, ComponentInstance, ComponentOptions,
    ComponentProxy, DataFn, FunctionalComponent, RenderFn, SetupContext, SetupFn, SetupResult,
    WeakProxy,
};
pub use emit::Emitter;
pub(crate) use emit::{camelize, capitalize};
pub use inject::{inject, inject_or, inject_with, provide};
pub use lifecycle::{
    on_before_mount, on_before_unmount, on_before_update, on_mounted, on_unmounted, on_updated,
    Hook, LifecycleHook,
};
pub use options::{NodeHandle, RendererOptions};
pub use renderer::{create_renderer, Renderer};
pub use scheduler::{
    clear_microtask_handler, flush_jobs, has_pending_jobs, invalidate_job, next_tick,
    pending_job_count, queue_job, set_microtask_handler, MicrotaskHandler,
};
pub use shape::ShapeFlags;
pub use slots::{render_slot, Slots};
pub use vnode::{
    comment_vnode, create_vnode, fragment, h, is_same_vnode_type, keyed_fragment,
    normalize_children_to_array, normalize_class, normalize_style, text_vnode, Children,
    IntoProps, Key, Props, RawSlots, SlotContent, SlotFn, VNode, VNodeType, WeakVNode,
};
