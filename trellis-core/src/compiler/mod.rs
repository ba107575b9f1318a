//! Template compiler.
//!
//! Turns an HTML-like template into a render function:
//!
//! ```rust,ignore
//! let render = compile_to_function("<p>{{ count }}</p>", &CompilerOptions::default());
//! let vnode = render(&proxy);
//! ```
//!
//! # Supported Syntax
//!
//! - elements, text, `{{ expression }}` interpolation (delimiters are
//!   configurable) and `<!-- comments -->` (kept when `comments` is set)
//! - `:prop` / `v-bind:prop`, `v-bind="object"`, `@event` / `v-on:event`
//! - `v-if` / `v-else-if` / `v-else`, `v-for="(item, index) in source"`
//! - `<slot name="...">` outlets with fallback content, and `#name` /
//!   `v-slot:name="params"` on a component's `<template>` children
//! - `<template>` grouping, and any registered component by tag
//!
//! Expressions are parsed at compile time; see [`Expr`].

mod ast;
mod expr;
mod interpret;
mod parse;

use std::rc::Rc;

use serde::Deserialize;

pub use ast::{Directive, ElementNode, ForExpr, PropNode, Template, TemplateNode};
pub use expr::{parse_expression, BinaryOp, Expr, Literal, UnaryOp};
pub use interpret::render_template;

use crate::error::CompileError;
use crate::render::{comment_vnode, ComponentProxy, RenderFn};

/// How whitespace-only text between tags is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Whitespace {
    /// Drop whitespace between tags and collapse runs inside text.
    #[default]
    Condense,
    /// Keep text exactly as written.
    Preserve,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Open and close delimiters of interpolations.
    pub delimiters: (String, String),
    pub whitespace: Whitespace,
    /// Keep template comments as comment nodes.
    pub comments: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            delimiters: ("{{".to_string(), "}}".to_string()),
            whitespace: Whitespace::Condense,
            comments: false,
        }
    }
}

/// Parse a template.
pub fn compile(template: &str, options: &CompilerOptions) -> Result<Template, CompileError> {
    let parsed = parse::parse(template, options)?;
    tracing::trace!(nodes = parsed.children.len(), "compiled template");
    Ok(parsed)
}

/// Compile a template into a render function.
///
/// A template that fails to compile is logged and renders an empty comment.
pub fn compile_to_function(template: &str, options: &CompilerOptions) -> RenderFn {
    match compile(template, options) {
        Ok(template) => {
            let template = Rc::new(template);
            Rc::new(move |proxy: &ComponentProxy| render_template(&template, proxy))
        }
        Err(err) => {
            tracing::error!(error = %err, "template compilation failed");
            Rc::new(|_: &ComponentProxy| comment_vnode(""))
        }
    }
}
