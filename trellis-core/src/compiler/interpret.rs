//! Rendering a parsed template.
//!
//! A compiled template is a render function that walks the AST on every
//! render, reading names through the component proxy. Reads made while
//! walking are tracked by the component's render effect like any other
//! render function.

use std::cmp::Ordering;
use std::rc::Rc;

use super::ast::{Directive, ElementNode, ForExpr, PropNode, Template, TemplateNode};
use super::expr::{BinaryOp, Expr, Literal, UnaryOp};
use crate::reactive::unref;
use crate::render::{
    camelize, capitalize, comment_vnode, create_vnode, fragment, normalize_class, text_vnode,
    Children, Component, ComponentProxy, Props, RawSlots, SlotContent, VNode, VNodeType,
};
use crate::value::{Function, Object, Value};

/// Tags never resolved as components.
const NATIVE_TAGS: &[&str] = &[
    "a", "abbr", "address", "area", "article", "aside", "audio", "b", "base", "blockquote",
    "body", "br", "button", "canvas", "caption", "code", "col", "colgroup", "dd", "details",
    "dialog", "div", "dl", "dt", "em", "embed", "fieldset", "figcaption", "figure", "footer",
    "form", "h1", "h2", "h3", "h4", "h5", "h6", "head", "header", "hr", "html", "i", "iframe",
    "img", "input", "label", "legend", "li", "link", "main", "meta", "nav", "ol", "optgroup",
    "option", "p", "pre", "section", "select", "small", "source", "span", "strong", "sub",
    "summary", "sup", "table", "tbody", "td", "textarea", "tfoot", "th", "thead", "title", "tr",
    "track", "u", "ul", "video",
];

/// Render `template` for the component behind `proxy`.
///
/// One root node is returned as is, several are wrapped in a fragment, and an
/// empty template renders a comment.
pub fn render_template(template: &Template, proxy: &ComponentProxy) -> VNode {
    let mut nodes = Interpreter { proxy }.children(&template.children, &Scope::default());
    match nodes.len() {
        0 => comment_vnode(""),
        1 => nodes.swap_remove(0),
        _ => fragment(nodes),
    }
}

// ----------------------------------------------------------------------------
// Scope
// ----------------------------------------------------------------------------

/// Names bound by `v-for` and slot parameters, innermost first.
#[derive(Clone, Default)]
struct Scope(Option<Rc<Binding>>);

struct Binding {
    name: String,
    value: Value,
    parent: Scope,
}

impl Scope {
    fn with(&self, name: &str, value: Value) -> Scope {
        Scope(Some(Rc::new(Binding {
            name: name.to_string(),
            value,
            parent: self.clone(),
        })))
    }

    fn lookup(&self, name: &str) -> Option<Value> {
        let mut current = self.0.as_ref();
        while let Some(binding) = current {
            if binding.name == name {
                return Some(binding.value.clone());
            }
            current = binding.parent.0.as_ref();
        }
        None
    }
}

/// How a slot binds the props it receives.
enum SlotParams {
    /// `#item="props"`
    Alias(String),
    /// `#item="{ row, index: i }"`
    Destructure(Vec<(String, String)>),
}

impl SlotParams {
    fn parse(source: &str) -> SlotParams {
        let source = source.trim();
        match source.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(fields) => SlotParams::Destructure(
                fields
                    .split(',')
                    .map(str::trim)
                    .filter(|field| !field.is_empty())
                    .map(|field| match field.split_once(':') {
                        Some((key, alias)) => (key.trim().to_string(), alias.trim().to_string()),
                        None => (field.to_string(), field.to_string()),
                    })
                    .collect(),
            ),
            None => SlotParams::Alias(source.to_string()),
        }
    }

    fn bind(&self, scope: &Scope, props: &Value) -> Scope {
        match self {
            SlotParams::Alias(name) => scope.with(name, props.clone()),
            SlotParams::Destructure(fields) => fields
                .iter()
                .fold(scope.clone(), |scope, (key, alias)| scope.with(alias, props.get(key))),
        }
    }
}

// ----------------------------------------------------------------------------
// Nodes
// ----------------------------------------------------------------------------

struct Interpreter<'a> {
    proxy: &'a ComponentProxy,
}

impl Interpreter<'_> {
    fn children(&self, nodes: &[TemplateNode], scope: &Scope) -> Vec<VNode> {
        let mut out = Vec::with_capacity(nodes.len());
        let mut i = 0;

        while i < nodes.len() {
            let node = &nodes[i];
            i += 1;

            let Some(el) = node.as_element() else {
                out.push(self.leaf(node, scope));
                continue;
            };

            if let Some(condition) = el.if_condition() {
                let mut chosen = self.eval(condition, scope).truthy().then_some(el);
                while let Some((next, branch)) = next_branch(nodes, i) {
                    i = next;
                    if chosen.is_none() {
                        let taken = match branch.else_branch() {
                            Some(Some(condition)) => self.eval(condition, scope).truthy(),
                            _ => true,
                        };
                        if taken {
                            chosen = Some(branch);
                        }
                    }
                }
                match chosen {
                    Some(branch) => out.push(self.element_or_list(branch, scope)),
                    None => out.push(comment_vnode("v-if")),
                }
            } else if el.else_branch().is_some() {
                tracing::warn!(tag = %el.tag, "v-else has no adjacent v-if");
            } else {
                out.push(self.element_or_list(el, scope));
            }
        }

        out
    }

    fn leaf(&self, node: &TemplateNode, scope: &Scope) -> VNode {
        match node {
            TemplateNode::Text(text) => text_vnode(text.clone()),
            TemplateNode::Interpolation(expr) => text_vnode(self.eval(expr, scope).to_display_string()),
            TemplateNode::Comment(text) => comment_vnode(text.clone()),
            TemplateNode::Element(el) => self.element(el, scope),
        }
    }

    fn element_or_list(&self, el: &ElementNode, scope: &Scope) -> VNode {
        match el.for_expr() {
            Some(for_expr) => self.list(el, for_expr, scope),
            None => self.element(el, scope),
        }
    }

    fn list(&self, el: &ElementNode, for_expr: &ForExpr, scope: &Scope) -> VNode {
        let source = self.eval(&for_expr.source, scope);
        let nodes = iterate(&source)
            .into_iter()
            .map(|(value, index)| {
                let mut inner = scope.with(&for_expr.value, value);
                if let Some(name) = &for_expr.index {
                    inner = inner.with(name, index);
                }
                self.element(el, &inner)
            })
            .collect();
        fragment(nodes)
    }

    fn element(&self, el: &ElementNode, scope: &Scope) -> VNode {
        match el.tag.as_str() {
            "slot" => return self.slot_outlet(el, scope),
            "template" => return fragment(self.children(&el.children, scope)),
            _ => {}
        }

        let props = self.props(el, scope);
        if let Some(component) = self.resolve_component(&el.tag) {
            let slots = self.component_slots(el, scope);
            let children = if slots.is_empty() {
                Children::None
            } else {
                Children::Slots(slots)
            };
            return create_vnode(component, props, children);
        }

        let children = self.children(&el.children, scope);
        create_vnode(el.tag.as_str(), props, element_children(children))
    }

    fn resolve_component(&self, tag: &str) -> Option<Component> {
        if NATIVE_TAGS.contains(&tag) {
            return None;
        }
        let component = self.proxy.resolve_component(tag);
        if component.is_none() && (tag.contains('-') || tag.starts_with(char::is_uppercase)) {
            tracing::warn!(tag, "failed to resolve component");
        }
        component
    }

    fn props(&self, el: &ElementNode, scope: &Scope) -> Option<Props> {
        let mut props = Props::new();

        for prop in &el.props {
            match prop {
                PropNode::Attribute { name, value } => {
                    props.insert(name.clone(), Value::from(value.clone().unwrap_or_default()));
                }
                PropNode::Directive(Directive::Bind { arg, exp }) => {
                    let value = self.eval(exp, scope);
                    if arg == "class" {
                        merge_class(&mut props, &value);
                    } else {
                        props.insert(arg.clone(), value);
                    }
                }
                PropNode::Directive(Directive::BindObject(exp)) => {
                    props.extend(entries(&self.eval(exp, scope)));
                }
                PropNode::Directive(Directive::On { event, handler, .. }) => {
                    let key = format!("on{}", capitalize(&camelize(event)));
                    props.insert(key, Value::Function(self.handler(handler, scope)));
                }
                PropNode::Directive(_) => {}
            }
        }

        (!props.is_empty()).then_some(props)
    }

    /// Event handler closure. A path (`select`, `store.reset`) names the
    /// function to call with the event arguments; anything else is a
    /// statement run with `$event` bound to the first argument.
    fn handler(&self, handler: &Rc<Expr>, scope: &Scope) -> Function {
        let proxy = self.proxy.downgrade();
        let handler = Rc::clone(handler);
        let scope = scope.clone();

        Function::new(move |args: &[Value]| {
            let Some(proxy) = proxy.upgrade() else {
                return Value::Null;
            };
            let interpreter = Interpreter { proxy: &proxy };

            if handler.is_path() {
                match interpreter.eval(&handler, &scope) {
                    Value::Function(f) => f.call(args),
                    other => {
                        tracing::warn!(value_type = other.type_name(), "event handler is not a function");
                        Value::Null
                    }
                }
            } else {
                let event = args.first().cloned().unwrap_or_default();
                interpreter.eval(&handler, &scope.with("$event", event))
            }
        })
    }

    /// `<slot>`: the parent's content for that slot, or the fallback
    /// children when the parent passed none.
    fn slot_outlet(&self, el: &ElementNode, scope: &Scope) -> VNode {
        let mut name = el.attribute("name").unwrap_or("default").to_string();
        let slot_props = Object::new();

        for prop in &el.props {
            match prop {
                PropNode::Attribute { name: key, .. } if key == "name" => {}
                PropNode::Attribute { name: key, value } => {
                    slot_props.set(key, Value::from(value.clone().unwrap_or_default()));
                }
                PropNode::Directive(Directive::Bind { arg, exp }) if arg == "name" => {
                    name = self.eval(exp, scope).to_display_string();
                }
                PropNode::Directive(Directive::Bind { arg, exp }) => {
                    slot_props.set(arg, self.eval(exp, scope));
                }
                PropNode::Directive(Directive::BindObject(exp)) => {
                    for (key, value) in entries(&self.eval(exp, scope)) {
                        slot_props.set(&key, value);
                    }
                }
                PropNode::Directive(_) => {}
            }
        }

        let slots = self.proxy.slots();
        let nodes = if slots.has(&name) {
            slots.render(&name, &Value::Object(slot_props))
        } else {
            self.children(&el.children, scope)
        };
        fragment(nodes)
    }

    /// Children of a component tag as slot content. `<template #name>`
    /// children fill named slots; everything else fills the default slot.
    fn component_slots(&self, el: &ElementNode, scope: &Scope) -> RawSlots {
        let mut slots = RawSlots::new();

        let is_named = |node: &TemplateNode| {
            node.as_element()
                .map_or(false, |child| child.is_template() && child.slot_directive().is_some())
        };

        let default_nodes: Rc<[TemplateNode]> = if el.children.iter().any(is_named) {
            for child in el.children.iter().filter_map(TemplateNode::as_element) {
                if let (true, Some((name, params))) = (child.is_template(), child.slot_directive()) {
                    let content = self.slot_content(child.children.clone(), params, scope);
                    slots.insert(name.to_string(), content);
                }
            }
            el.children.iter().filter(|n| !is_named(*n)).cloned().collect()
        } else {
            el.children.clone()
        };

        let has_default = default_nodes
            .iter()
            .any(|node| !matches!(node, TemplateNode::Text(text) if text.trim().is_empty()));
        if has_default && !slots.contains_key("default") {
            let params = el
                .slot_directive()
                .filter(|(name, _)| *name == "default")
                .and_then(|(_, params)| params);
            slots.insert("default".to_string(), self.slot_content(default_nodes, params, scope));
        }

        slots
    }

    fn slot_content(&self, nodes: Rc<[TemplateNode]>, params: Option<&str>, scope: &Scope) -> SlotContent {
        let proxy = self.proxy.downgrade();
        let params = params.map(SlotParams::parse);
        let scope = scope.clone();

        SlotContent::scoped(move |props: &Value| {
            let Some(proxy) = proxy.upgrade() else {
                return Vec::new();
            };
            let scope = match &params {
                Some(params) => params.bind(&scope, props),
                None => scope.clone(),
            };
            Interpreter { proxy: &proxy }.children(&nodes, &scope)
        })
    }

    // ------------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------------

    fn eval(&self, expr: &Expr, scope: &Scope) -> Value {
        match expr {
            Expr::Literal(literal) => literal_value(literal),
            Expr::Ident(name) => scope.lookup(name).unwrap_or_else(|| self.proxy.get(name)),
            Expr::Member(object, key) => self.eval(object, scope).get(key),
            Expr::Index(object, index) => {
                let key = property_key(&self.eval(index, scope));
                self.eval(object, scope).get(&key)
            }
            Expr::Call(callee, args) => {
                let args: Vec<Value> = args.iter().map(|arg| self.eval(arg, scope)).collect();
                match unref(&self.eval(callee, scope)) {
                    Value::Function(f) => f.call(&args),
                    other => {
                        tracing::warn!(value_type = other.type_name(), "called value is not a function");
                        Value::Null
                    }
                }
            }
            Expr::Unary(op, operand) => {
                let value = self.eval(operand, scope);
                match op {
                    UnaryOp::Not => Value::Bool(!value.truthy()),
                    UnaryOp::Neg => Value::Number(-to_number(&value)),
                    UnaryOp::Plus => Value::Number(to_number(&value)),
                }
            }
            Expr::Binary(BinaryOp::And, left, right) => {
                let left = self.eval(left, scope);
                if left.truthy() {
                    self.eval(right, scope)
                } else {
                    left
                }
            }
            Expr::Binary(BinaryOp::Or, left, right) => {
                let left = self.eval(left, scope);
                if left.truthy() {
                    left
                } else {
                    self.eval(right, scope)
                }
            }
            Expr::Binary(op, left, right) => {
                binary(*op, &self.eval(left, scope), &self.eval(right, scope))
            }
            Expr::Conditional(test, then, otherwise) => {
                if self.eval(test, scope).truthy() {
                    self.eval(then, scope)
                } else {
                    self.eval(otherwise, scope)
                }
            }
            Expr::Assign(target, value) => {
                let value = self.eval(value, scope);
                self.assign(target, value.clone(), scope);
                value
            }
            Expr::Array(items) => Value::Object(Object::list(
                items.iter().map(|item| self.eval(item, scope)).collect(),
            )),
            Expr::Object(fields) => Value::Object(Object::from_entries(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), self.eval(value, scope))),
            )),
        }
    }

    fn assign(&self, target: &Expr, value: Value, scope: &Scope) {
        match target {
            Expr::Ident(name) if scope.lookup(name).is_some() => {
                tracing::warn!(name = %name, "cannot assign to a loop or slot variable");
            }
            Expr::Ident(name) => {
                self.proxy.set(name, value);
            }
            Expr::Member(object, key) => {
                self.eval(object, scope).set(key, value);
            }
            Expr::Index(object, index) => {
                let key = property_key(&self.eval(index, scope));
                self.eval(object, scope).set(&key, value);
            }
            other => tracing::warn!(expression = ?other, "invalid assignment target"),
        }
    }
}

/// The next `v-else-if`/`v-else` sibling at or after `from`, skipping
/// whitespace-only text.
fn next_branch(nodes: &[TemplateNode], from: usize) -> Option<(usize, &ElementNode)> {
    let mut i = from;
    while let Some(node) = nodes.get(i) {
        match node {
            TemplateNode::Text(text) if text.trim().is_empty() => i += 1,
            TemplateNode::Element(el) if el.else_branch().is_some() => return Some((i + 1, el)),
            _ => return None,
        }
    }
    None
}

/// Element children: a single text child when every node is text.
fn element_children(children: Vec<VNode>) -> Children {
    if children.is_empty() {
        return Children::None;
    }
    let all_text = children
        .iter()
        .all(|child| *child.node_type() == VNodeType::Text);
    if !all_text {
        return Children::Array(children);
    }
    let text: String = children
        .iter()
        .filter_map(|child| child.children().as_text())
        .collect();
    Children::Text(text.into())
}

fn merge_class(props: &mut Props, value: &Value) {
    let dynamic = normalize_class(value);
    let merged = match props.get("class").map(normalize_class) {
        Some(existing) if !existing.is_empty() && !dynamic.is_empty() => {
            format!("{} {}", existing, dynamic)
        }
        Some(existing) if dynamic.is_empty() => existing,
        _ => dynamic,
    };
    props.insert("class".to_string(), Value::from(merged));
}

/// `(item, index)` pairs for `v-for`: list elements with their positions,
/// map values with their keys, `1..=n` for a number, characters of a string.
fn iterate(source: &Value) -> Vec<(Value, Value)> {
    match source {
        Value::Null => Vec::new(),
        Value::Number(n) => (0..n.max(0.0) as i64)
            .map(|i| (Value::from(i + 1), Value::from(i)))
            .collect(),
        Value::Str(s) => s
            .chars()
            .enumerate()
            .map(|(i, c)| (Value::from(c.to_string()), Value::from(i as i64)))
            .collect(),
        Value::Reactive(view) if view.raw().is_list() => view
            .values()
            .into_iter()
            .enumerate()
            .map(|(i, item)| (item, Value::from(i as i64)))
            .collect(),
        Value::Reactive(view) => {
            // len() subscribes to the entry count
            view.len();
            view.keys()
                .into_iter()
                .map(|key| (view.get(&key), Value::from(key)))
                .collect()
        }
        Value::Object(object) if object.is_list() => object
            .values()
            .into_iter()
            .enumerate()
            .map(|(i, item)| (item, Value::from(i as i64)))
            .collect(),
        Value::Object(object) => object
            .entries()
            .into_iter()
            .map(|(key, value)| (value, Value::from(key)))
            .collect(),
        Value::Ref(r) => iterate(&r.get()),
        other => {
            tracing::warn!(value_type = other.type_name(), "v-for source is not iterable");
            Vec::new()
        }
    }
}

/// Entries of an object-like value, for `v-bind="object"`.
fn entries(value: &Value) -> Vec<(String, Value)> {
    match value {
        Value::Object(object) => object.entries(),
        Value::Reactive(view) => view
            .keys()
            .into_iter()
            .map(|key| {
                let value = view.get(&key);
                (key, value)
            })
            .collect(),
        Value::Ref(r) => entries(&r.get()),
        Value::Null => Vec::new(),
        other => {
            tracing::warn!(value_type = other.type_name(), "v-bind expects an object");
            Vec::new()
        }
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Number(n) => Value::Number(*n),
        Literal::Str(s) => Value::Str(s.clone()),
    }
}

fn property_key(value: &Value) -> String {
    match unref(value) {
        Value::Number(n) if n.fract() == 0.0 => format!("{}", n as i64),
        other => other.to_display_string(),
    }
}

fn to_number(value: &Value) -> f64 {
    match unref(value) {
        Value::Null => 0.0,
        Value::Bool(b) => f64::from(u8::from(b)),
        Value::Number(n) => n,
        Value::Str(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse().unwrap_or(f64::NAN)
            }
        }
        _ => f64::NAN,
    }
}

fn strict_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a == b,
        _ => left.same_value(right),
    }
}

fn loose_equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(_), Value::Str(_))
        | (Value::Str(_), Value::Number(_))
        | (Value::Bool(_), _)
        | (_, Value::Bool(_)) => to_number(left) == to_number(right),
        _ => strict_equals(left, right),
    }
}

fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => to_number(left).partial_cmp(&to_number(right)),
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    let (left, right) = (unref(left), unref(right));
    match op {
        BinaryOp::Add => match (&left, &right) {
            (Value::Str(_), _) | (_, Value::Str(_)) => Value::from(format!(
                "{}{}",
                left.to_display_string(),
                right.to_display_string()
            )),
            _ => Value::Number(to_number(&left) + to_number(&right)),
        },
        BinaryOp::Sub => Value::Number(to_number(&left) - to_number(&right)),
        BinaryOp::Mul => Value::Number(to_number(&left) * to_number(&right)),
        BinaryOp::Div => Value::Number(to_number(&left) / to_number(&right)),
        BinaryOp::Rem => Value::Number(to_number(&left) % to_number(&right)),
        BinaryOp::Eq => Value::Bool(loose_equals(&left, &right)),
        BinaryOp::NotEq => Value::Bool(!loose_equals(&left, &right)),
        BinaryOp::StrictEq => Value::Bool(strict_equals(&left, &right)),
        BinaryOp::StrictNotEq => Value::Bool(!strict_equals(&left, &right)),
        BinaryOp::Lt => Value::Bool(compare(&left, &right) == Some(Ordering::Less)),
        BinaryOp::LtEq => Value::Bool(matches!(
            compare(&left, &right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::Gt => Value::Bool(compare(&left, &right) == Some(Ordering::Greater)),
        BinaryOp::GtEq => Value::Bool(matches!(
            compare(&left, &right),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOp::And => {
            if left.truthy() {
                right
            } else {
                left
            }
        }
        BinaryOp::Or => {
            if left.truthy() {
                left
            } else {
                right
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_shadows_outer_bindings() {
        let outer = Scope::default().with("item", Value::from(1));
        let inner = outer.with("item", Value::from(2)).with("i", Value::from(0));
        assert_eq!(inner.lookup("item"), Some(Value::from(2)));
        assert_eq!(outer.lookup("item"), Some(Value::from(1)));
        assert_eq!(inner.lookup("missing"), None);
    }

    #[test]
    fn slot_params_alias_and_destructure() {
        let props = Value::Object(Object::from_entries([("row", 7), ("index", 1)]));

        let scope = SlotParams::parse("slotProps").bind(&Scope::default(), &props);
        assert_eq!(scope.lookup("slotProps").map(|p| p.get("row")), Some(Value::from(7)));

        let scope = SlotParams::parse("{ row, index: i }").bind(&Scope::default(), &props);
        assert_eq!(scope.lookup("row"), Some(Value::from(7)));
        assert_eq!(scope.lookup("i"), Some(Value::from(1)));
    }

    #[test]
    fn operators_follow_template_semantics() {
        assert_eq!(binary(BinaryOp::Add, &Value::from("n="), &Value::from(2)), Value::from("n=2"));
        assert_eq!(binary(BinaryOp::Add, &Value::from(1), &Value::from(true)), Value::from(2));
        assert_eq!(binary(BinaryOp::Eq, &Value::from("3"), &Value::from(3)), Value::Bool(true));
        assert_eq!(binary(BinaryOp::StrictEq, &Value::from("3"), &Value::from(3)), Value::Bool(false));
        assert_eq!(binary(BinaryOp::Lt, &Value::from("a"), &Value::from("b")), Value::Bool(true));
        assert_eq!(binary(BinaryOp::GtEq, &Value::from(2), &Value::from(2)), Value::Bool(true));
        assert_eq!(binary(BinaryOp::Rem, &Value::from(7), &Value::from(4)), Value::from(3));
    }

    #[test]
    fn iterate_covers_lists_maps_and_ranges() {
        let list = Value::from(vec![Value::from("a"), Value::from("b")]);
        let pairs = iterate(&list);
        assert_eq!(pairs[1], (Value::from("b"), Value::from(1)));

        let map = Value::Object(Object::from_entries([("x", 1)]));
        assert_eq!(iterate(&map), vec![(Value::from(1), Value::from("x"))]);

        let range = iterate(&Value::from(3));
        assert_eq!(range.iter().map(|(v, _)| v.clone()).collect::<Vec<_>>(), [1, 2, 3].map(Value::from));
    }

    #[test]
    fn class_bindings_merge_with_static_class() {
        let mut props = Props::new();
        props.insert("class".into(), Value::from("btn"));
        merge_class(&mut props, &Value::Object(Object::from_entries([("active", true), ("hidden", false)])));
        assert_eq!(props.get("class"), Some(&Value::from("btn active")));
    }
}
