//! Applications.
//!
//! An [`App`] ties a root component to a renderer and carries state shared
//! by every component in its tree: registered components, app-level
//! provides and [`AppConfig`].

use std::cell::{Ref as CellRef, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::Deserialize;

use super::component::{Component, ComponentInstance};
use super::options::NodeHandle;
use super::renderer::Renderer;
use super::vnode::{create_vnode, Props, VNode};
use crate::compiler::CompilerOptions;
use crate::error::AppError;
use crate::value::Value;

/// App-wide settings.
///
/// Deserializes from JSON, with missing fields taking their defaults:
///
/// ```rust,ignore
/// let config: AppConfig = serde_json::from_str(r#"{"global_properties": {"version": "1.0"}}"#)?;
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Names every component proxy can resolve, consulted last.
    pub global_properties: IndexMap<String, Value>,
    /// Options for compiling component templates.
    pub compiler_options: CompilerOptions,
}

/// State shared by every instance of one app.
#[derive(Default)]
pub struct AppContext {
    provides: RefCell<IndexMap<String, Value>>,
    components: RefCell<IndexMap<String, Component>>,
    config: RefCell<AppConfig>,
}

impl AppContext {
    pub fn config(&self) -> CellRef<'_, AppConfig> {
        self.config.borrow()
    }

    pub(crate) fn config_mut(&self) -> RefMut<'_, AppConfig> {
        self.config.borrow_mut()
    }

    pub fn global_property(&self, key: &str) -> Option<Value> {
        self.config.borrow().global_properties.get(key).cloned()
    }

    /// Globally registered component.
    pub fn component(&self, name: &str) -> Option<Component> {
        self.components.borrow().get(name).cloned()
    }

    /// Value provided at the app level.
    pub fn provided(&self, key: &str) -> Option<Value> {
        self.provides.borrow().get(key).cloned()
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("provides", &self.provides.borrow().keys().collect::<Vec<_>>())
            .field("components", &self.components.borrow().keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Extends an app: registers components, provides values, edits config.
pub trait Plugin {
    fn install(&self, app: &App, options: &Value);
}

impl<F> Plugin for F
where
    F: Fn(&App, &Value),
{
    fn install(&self, app: &App, options: &Value) {
        self(app, options)
    }
}

/// What to mount into.
#[derive(Debug, Clone)]
pub enum MountTarget {
    Selector(String),
    Node(NodeHandle),
}

impl From<&str> for MountTarget {
    fn from(selector: &str) -> Self {
        MountTarget::Selector(selector.to_string())
    }
}

impl From<String> for MountTarget {
    fn from(selector: String) -> Self {
        MountTarget::Selector(selector)
    }
}

impl From<NodeHandle> for MountTarget {
    fn from(node: NodeHandle) -> Self {
        MountTarget::Node(node)
    }
}

/// An application instance.
pub struct App {
    renderer: Renderer,
    context: Rc<AppContext>,
    root: Component,
    root_props: Option<Props>,
    mounted: RefCell<Option<(NodeHandle, VNode)>>,
}

/// Create an app rendering `root` through `renderer`.
pub fn create_app(renderer: &Renderer, root: Component, props: Option<Props>) -> App {
    App {
        renderer: renderer.clone(),
        context: Rc::new(AppContext::default()),
        root,
        root_props: props,
        mounted: RefCell::new(None),
    }
}

impl App {
    /// Mount the root component into `target`, replacing the container's
    /// content.
    pub fn mount(&self, target: impl Into<MountTarget>) -> Result<(), AppError> {
        if self.mounted.borrow().is_some() {
            return Err(AppError::AlreadyMounted);
        }

        let container = match target.into() {
            MountTarget::Node(node) => node,
            MountTarget::Selector(selector) => self
                .renderer
                .host()
                .query_selector(&selector)
                .ok_or(AppError::ContainerNotFound(selector))?,
        };

        tracing::debug!(container = ?container, root = ?self.root, "mounting app");
        self.renderer.host().set_element_text(container, "");

        let vnode = create_vnode(self.root.clone(), self.root_props.clone(), ());
        self.renderer
            .render_with_context(Some(&vnode), container, &self.context);
        *self.mounted.borrow_mut() = Some((container, vnode));
        Ok(())
    }

    /// Unmount the root component.
    pub fn unmount(&self) -> Result<(), AppError> {
        let Some((container, _vnode)) = self.mounted.borrow_mut().take() else {
            return Err(AppError::NotMounted);
        };
        tracing::debug!(container = ?container, "unmounting app");
        self.renderer
            .render_with_context(None, container, &self.context);
        Ok(())
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.borrow().is_some()
    }

    /// Provide a value to every component of the app.
    pub fn provide(&self, key: impl Into<String>, value: impl Into<Value>) -> &Self {
        let previous = self
            .context
            .provides
            .borrow_mut()
            .insert(key.into(), value.into());
        drop(previous);
        self
    }

    /// Register a component for templates of the whole app.
    pub fn component(&self, name: impl Into<String>, component: Component) -> &Self {
        let name = name.into();
        tracing::trace!(name = %name, "registering component");
        self.context
            .components
            .borrow_mut()
            .insert(name, component);
        self
    }

    pub fn get_component(&self, name: &str) -> Option<Component> {
        self.context.component(name)
    }

    pub fn use_plugin(&self, plugin: impl Plugin, options: impl Into<Value>) -> &Self {
        plugin.install(self, &options.into());
        self
    }

    pub fn config(&self) -> CellRef<'_, AppConfig> {
        self.context.config()
    }

    pub fn config_mut(&self) -> RefMut<'_, AppConfig> {
        self.context.config_mut()
    }

    pub fn context(&self) -> &Rc<AppContext> {
        &self.context
    }

    /// Instance of the mounted root component.
    pub fn root_instance(&self) -> Option<ComponentInstance> {
        self.mounted
            .borrow()
            .as_ref()
            .and_then(|(_, vnode)| vnode.component())
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("root", &self.root)
            .field("mounted", &self.is_mounted())
            .finish()
    }
}
