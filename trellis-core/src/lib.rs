//! Trellis Core
//!
//! This crate provides the core runtime for the Trellis reactive UI framework.
//! It implements:
//!
//! - Reactive primitives (reactive objects, refs, computed values, effects, watchers)
//! - Virtual DOM with a keyed children diff
//! - Components with props, slots, events, lifecycle hooks and provide/inject
//! - A job queue that batches component updates
//! - A template compiler producing render functions
//!
//! Rendering is platform-agnostic: the renderer drives a host through the
//! [`RendererOptions`] trait. The [`host`] module ships an in-memory DOM that
//! implements it.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: Dependency tracking, effects, reactive views and refs
//! - `render`: VNodes, components, the renderer, scheduler and apps
//! - `compiler`: Template parsing and interpretation
//! - `host`: In-memory host nodes for tests and headless rendering
//! - `value`: The dynamic [`Value`] type components and templates exchange
//!
//! Everything is single-threaded: reactive state, instances and the job
//! queue live on the thread that created them.
//!
//! # Error Handling
//!
//! Misuse (writing to a readonly view, calling a lifecycle hook outside
//! `setup`, injecting a missing key) is logged through `tracing` and
//! degrades to a no-op. Operations a caller can act on return a
//! [`Result`] with a [`TrellisError`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::rc::Rc;
//! use trellis_core::host::MemoryDom;
//! use trellis_core::render::{create_renderer, define_component, next_tick, ComponentOptions};
//!
//! let counter = define_component(
//!     ComponentOptions::new()
//!         .data(|| serde_json::json!({ "count": 0 }))
//!         .template(r#"<button @click="count += 1">{{ count }}</button>"#),
//! );
//!
//! let dom = Rc::new(MemoryDom::new());
//! let container = dom.create_container("app");
//! let app = create_renderer(dom.clone()).create_app(counter, None);
//! app.mount("#app")?;
//!
//! let button = dom.children(container)[0];
//! dom.dispatch(button, "click", &[]);
//! next_tick().await;
//! assert_eq!(dom.inner_html(container), "<button>1</button>");
//! ```

pub mod compiler;
pub mod error;
pub mod host;
pub mod reactive;
pub mod render;
pub mod value;

pub use compiler::{compile, compile_to_function, CompilerOptions};
pub use error::{AppError, CompileError, Result, TrellisError, ValueError};
pub use reactive::{
    computed, create_ref, effect, reactive, readonly, watch, watch_effect, Computed, Reactive,
    ReactiveEffect, Ref,
};
pub use render::{
    create_app, create_renderer, define_component, h, next_tick, App, Component,
    ComponentOptions, RendererOptions, VNode,
};
pub use value::{Function, Object, Value};
