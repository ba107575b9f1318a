//! Template AST.

use std::rc::Rc;

use super::expr::Expr;

/// A parsed template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub children: Rc<[TemplateNode]>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    Element(ElementNode),
    Text(String),
    Interpolation(Expr),
    Comment(String),
}

impl TemplateNode {
    pub fn is_element(&self) -> bool {
        matches!(self, TemplateNode::Element(_))
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            TemplateNode::Element(el) => Some(el),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    pub tag: String,
    pub props: Vec<PropNode>,
    pub children: Rc<[TemplateNode]>,
}

/// One attribute of an element, as written.
#[derive(Debug, Clone, PartialEq)]
pub enum PropNode {
    /// `name` or `name="value"`.
    Attribute { name: String, value: Option<String> },
    Directive(Directive),
}

/// `v-for` target: `item in list`, `(item, index) in list`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForExpr {
    pub value: String,
    pub index: Option<String>,
    pub source: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// `:name="exp"` / `v-bind:name="exp"`.
    Bind { arg: String, exp: Expr },
    /// `v-bind="object"`: every entry becomes a prop.
    BindObject(Expr),
    /// `@event="handler"` / `v-on:event="handler"`.
    On {
        event: String,
        handler: Rc<Expr>,
        modifiers: Vec<String>,
    },
    If(Expr),
    ElseIf(Expr),
    Else,
    For(ForExpr),
    /// `#name="params"` / `v-slot:name="params"` on a component or a
    /// `<template>` inside one.
    Slot { name: String, params: Option<String> },
    /// Anything else is kept but ignored when rendering.
    Unknown {
        name: String,
        arg: Option<String>,
        value: Option<String>,
    },
}

impl ElementNode {
    pub fn directives(&self) -> impl Iterator<Item = &Directive> {
        self.props.iter().filter_map(|prop| match prop {
            PropNode::Directive(directive) => Some(directive),
            PropNode::Attribute { .. } => None,
        })
    }

    /// Value of a static attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.props.iter().find_map(|prop| match prop {
            PropNode::Attribute { name: n, value } if n == name => Some(value.as_deref().unwrap_or("")),
            _ => None,
        })
    }

    pub fn if_condition(&self) -> Option<&Expr> {
        self.directives().find_map(|d| match d {
            Directive::If(exp) => Some(exp),
            _ => None,
        })
    }

    /// `v-else-if` condition, or `Some(None)` for a plain `v-else`.
    pub fn else_branch(&self) -> Option<Option<&Expr>> {
        self.directives().find_map(|d| match d {
            Directive::ElseIf(exp) => Some(Some(exp)),
            Directive::Else => Some(None),
            _ => None,
        })
    }

    pub fn for_expr(&self) -> Option<&ForExpr> {
        self.directives().find_map(|d| match d {
            Directive::For(for_expr) => Some(for_expr),
            _ => None,
        })
    }

    pub fn slot_directive(&self) -> Option<(&str, Option<&str>)> {
        self.directives().find_map(|d| match d {
            Directive::Slot { name, params } => Some((name.as_str(), params.as_deref())),
            _ => None,
        })
    }

    pub fn is_template(&self) -> bool {
        self.tag == "template"
    }
}
