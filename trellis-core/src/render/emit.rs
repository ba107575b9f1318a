//! Component events.
//!
//! A child emits `event`; the parent listens by passing an `on<Event>` prop.
//! `emit("item-click")` finds `onItem-click` first, then `onItemClick`.

use std::fmt;
use std::rc::Weak;

use super::component::{ComponentInstance, InstanceInner};
use crate::value::{Function, Value};

/// Emits events on behalf of one instance.
#[derive(Clone)]
pub struct Emitter {
    instance: Weak<InstanceInner>,
}

impl Emitter {
    pub(crate) fn new(instance: &ComponentInstance) -> Self {
        Self {
            instance: instance.downgrade(),
        }
    }

    /// Call the parent's handler for `event` with `args`. Does nothing if
    /// the instance is gone or no handler was passed.
    pub fn emit(&self, event: &str, args: &[Value]) {
        let Some(instance) = ComponentInstance::upgrade(&self.instance) else {
            tracing::debug!(event, "emit on a dropped instance");
            return;
        };

        let handler = instance.vnode().and_then(|vnode| {
            handler_names(event)
                .iter()
                .find_map(|name| vnode.prop(name).cloned())
        });

        match handler {
            Some(Value::Function(handler)) => {
                handler.call(args);
            }
            Some(other) => tracing::warn!(
                event,
                value_type = other.type_name(),
                "event handler is not a function"
            ),
            None => tracing::trace!(event, uid = instance.uid(), "no handler for emitted event"),
        }
    }

    /// `$emit` for templates: the first argument is the event name.
    pub fn as_function(&self) -> Function {
        let emitter = self.clone();
        Function::new(move |args: &[Value]| {
            match args.split_first() {
                Some((event, rest)) => emitter.emit(&event.to_display_string(), rest),
                None => tracing::warn!("$emit called without an event name"),
            }
            Value::Null
        })
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("alive", &(self.instance.strong_count() > 0))
            .finish()
    }
}

fn handler_names(event: &str) -> Vec<String> {
    let direct = format!("on{}", capitalize(event));
    let camel = format!("on{}", capitalize(&camelize(event)));
    if direct == camel {
        vec![direct]
    } else {
        vec![direct, camel]
    }
}

/// `foo-bar` to `fooBar`.
pub(crate) fn camelize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut upper = false;
    for c in s.chars() {
        if c == '-' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    // A trailing dash stays
    if upper {
        out.push('-');
    }
    out
}

/// Uppercase the first character.
pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
