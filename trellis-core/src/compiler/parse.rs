//! Template parser.
//!
//! A recursive descent over the source with a stack of open tags. An element
//! whose end tag never shows up is reported with a warning and parsing backs
//! up to its start tag; everything from there on at that level is dropped. An
//! end tag that starts like the open element's but names another element is
//! an error.

use std::rc::Rc;

use super::ast::{Directive, ElementNode, ForExpr, PropNode, Template, TemplateNode};
use super::expr::parse_expression;
use super::{CompilerOptions, Whitespace};
use crate::error::CompileError;

/// Elements that never have children or an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub(crate) fn parse(source: &str, options: &CompilerOptions) -> Result<Template, CompileError> {
    let mut parser = Parser {
        source,
        pos: 0,
        options,
        stack: Vec::new(),
    };
    let children = parser.parse_children()?;
    if parser.pos < source.len() {
        tracing::warn!(offset = parser.pos, "ignoring unparsed template content");
    }
    Ok(Template {
        children: children.into(),
    })
}

struct Parser<'a> {
    source: &'a str,
    pos: usize,
    options: &'a CompilerOptions,
    stack: Vec<String>,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn advance(&mut self, len: usize) {
        self.pos = (self.pos + len).min(self.source.len());
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.advance(rest.len() - trimmed.len());
    }

    fn open_delimiter(&self) -> &'a str {
        &self.options.delimiters.0
    }

    fn close_delimiter(&self) -> &'a str {
        &self.options.delimiters.1
    }

    fn at_end(&self) -> bool {
        let rest = self.rest();
        if rest.is_empty() {
            return true;
        }
        match self.stack.last() {
            Some(tag) => rest
                .strip_prefix("</")
                .map_or(false, |after| after.starts_with(tag.as_str())),
            None => false,
        }
    }

    fn parse_children(&mut self) -> Result<Vec<TemplateNode>, CompileError> {
        let mut nodes = Vec::new();

        while !self.at_end() {
            let rest = self.rest();

            if rest.starts_with("</") {
                if self.stack.is_empty() {
                    tracing::warn!(offset = self.pos, "unexpected end tag");
                }
                break;
            } else if rest.starts_with(self.open_delimiter()) {
                nodes.push(self.parse_interpolation()?);
            } else if rest.starts_with("<!--") {
                if let Some(comment) = self.parse_comment() {
                    nodes.push(comment);
                }
            } else if starts_element(rest) {
                match self.parse_element()? {
                    Some(element) => nodes.push(element),
                    None => break,
                }
            } else {
                nodes.push(self.parse_text());
            }
        }

        Ok(match self.options.whitespace {
            Whitespace::Condense => condense_whitespace(nodes),
            Whitespace::Preserve => nodes,
        })
    }

    fn parse_interpolation(&mut self) -> Result<TemplateNode, CompileError> {
        let start = self.pos;
        let open = self.open_delimiter();
        let close = self.close_delimiter();

        let inner = &self.rest()[open.len()..];
        let Some(end) = inner.find(close) else {
            return Err(CompileError::UnterminatedInterpolation {
                offset: start,
                delimiter: close.to_string(),
            });
        };

        let expr = parse_expression(inner[..end].trim())?;
        self.advance(open.len() + end + close.len());
        Ok(TemplateNode::Interpolation(expr))
    }

    fn parse_comment(&mut self) -> Option<TemplateNode> {
        let inner = &self.rest()[4..];
        let (content, consumed) = match inner.find("-->") {
            Some(end) => (&inner[..end], 4 + end + 3),
            None => {
                tracing::warn!(offset = self.pos, "unterminated comment");
                (inner, 4 + inner.len())
            }
        };
        self.advance(consumed);
        self.options
            .comments
            .then(|| TemplateNode::Comment(content.to_string()))
    }

    /// Text runs up to the next tag or interpolation.
    fn parse_text(&mut self) -> TemplateNode {
        let rest = self.rest();
        // A `<` that opens nothing is literal text
        let skip = if rest.starts_with('<') { 1 } else { 0 };
        let mut end = rest.len();
        if let Some(i) = rest[skip..].find('<') {
            end = end.min(skip + i);
        }
        if let Some(i) = rest[skip..].find(self.open_delimiter()) {
            end = end.min(skip + i);
        }

        let text = decode_entities(&rest[..end]);
        self.advance(end);
        TemplateNode::Text(text)
    }

    fn parse_element(&mut self) -> Result<Option<TemplateNode>, CompileError> {
        let start = self.pos;
        let (tag, props, self_closing) = self.parse_start_tag()?;

        if self_closing || VOID_ELEMENTS.contains(&tag.as_str()) {
            return Ok(Some(TemplateNode::Element(ElementNode {
                tag,
                props,
                children: Rc::from(Vec::new()),
            })));
        }

        self.stack.push(tag.clone());
        let children = self.parse_children()?;
        self.stack.pop();

        let has_end_tag = self
            .rest()
            .strip_prefix("</")
            .map_or(false, |after| after.starts_with(tag.as_str()));
        if !has_end_tag {
            tracing::warn!(tag = %tag, offset = start, "element is missing its end tag");
            self.pos = start;
            return Ok(None);
        }
        self.parse_end_tag(&tag)?;

        Ok(Some(TemplateNode::Element(ElementNode {
            tag,
            props,
            children: children.into(),
        })))
    }

    fn parse_start_tag(&mut self) -> Result<(String, Vec<PropNode>, bool), CompileError> {
        self.advance(1);
        let tag = take_name(self.rest());
        self.advance(tag.len());

        let mut props = Vec::new();
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                tracing::warn!(tag, offset = self.pos, "unexpected end of template in start tag");
                return Ok((tag.to_string(), props, true));
            }
            if rest.starts_with("/>") {
                self.advance(2);
                return Ok((tag.to_string(), props, true));
            }
            if rest.starts_with('>') {
                self.advance(1);
                return Ok((tag.to_string(), props, false));
            }
            props.push(self.parse_attribute()?);
        }
    }

    fn parse_attribute(&mut self) -> Result<PropNode, CompileError> {
        let start = self.pos;
        let rest = self.rest();
        if rest.starts_with('/') {
            return Err(CompileError::InvalidAttributeName { offset: start });
        }

        let name_len = rest
            .find(|c: char| c.is_whitespace() || matches!(c, '/' | '>' | '='))
            .unwrap_or(rest.len());
        let name = &rest[..name_len];
        if name.is_empty() {
            return Err(CompileError::InvalidAttributeName { offset: start });
        }
        self.advance(name_len);

        self.skip_whitespace();
        let value = if self.rest().starts_with('=') {
            self.advance(1);
            self.skip_whitespace();
            Some(self.parse_attribute_value()?)
        } else {
            None
        };

        if is_directive(name) {
            parse_directive(name, value).map(PropNode::Directive)
        } else {
            Ok(PropNode::Attribute {
                name: name.to_string(),
                value: value.map(|v| decode_entities(&v)),
            })
        }
    }

    fn parse_attribute_value(&mut self) -> Result<String, CompileError> {
        let start = self.pos;
        let rest = self.rest();

        if let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') {
            let inner = &rest[1..];
            let Some(end) = inner.find(quote) else {
                return Err(CompileError::UnterminatedAttributeValue { offset: start });
            };
            let value = inner[..end].to_string();
            self.advance(end + 2);
            return Ok(value);
        }

        let end = rest
            .find(|c: char| c.is_whitespace() || c == '>')
            .unwrap_or(rest.len());
        self.advance(end);
        Ok(rest[..end].to_string())
    }

    fn parse_end_tag(&mut self, expected: &str) -> Result<(), CompileError> {
        let start = self.pos;
        self.advance(2);
        let found = take_name(self.rest());
        if found != expected {
            return Err(CompileError::MismatchedEndTag {
                expected: expected.to_string(),
                found: found.to_string(),
                offset: start,
            });
        }
        self.advance(found.len());
        self.skip_whitespace();

        if !self.rest().starts_with('>') {
            return Err(CompileError::UnclosedEndTag {
                tag: expected.to_string(),
                offset: start,
            });
        }
        self.advance(1);
        Ok(())
    }
}

fn starts_element(rest: &str) -> bool {
    let mut chars = rest.chars();
    chars.next() == Some('<') && chars.next().map_or(false, |c| c.is_ascii_alphabetic())
}

fn take_name(rest: &str) -> &str {
    let end = rest
        .find(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .unwrap_or(rest.len());
    &rest[..end]
}

fn is_directive(name: &str) -> bool {
    name.starts_with("v-") || name.starts_with(':') || name.starts_with('@') || name.starts_with('#')
}

fn parse_directive(name: &str, value: Option<String>) -> Result<Directive, CompileError> {
    let (directive, arg) = if let Some(arg) = name.strip_prefix(':') {
        ("bind", Some(arg))
    } else if let Some(arg) = name.strip_prefix('@') {
        ("on", Some(arg))
    } else if let Some(arg) = name.strip_prefix('#') {
        ("slot", Some(arg))
    } else {
        let body = &name[2..];
        match body.split_once(':') {
            Some((directive, arg)) => (directive, Some(arg)),
            None => (body, None),
        }
    };

    // Modifiers trail whichever part comes last
    let (directive, arg, modifiers) = match arg {
        Some(arg) => {
            let mut parts = arg.split('.');
            let arg = parts.next().unwrap_or_default();
            (directive, Some(arg), parts.map(str::to_string).collect::<Vec<_>>())
        }
        None => {
            let mut parts = directive.split('.');
            let directive = parts.next().unwrap_or_default();
            (directive, None, parts.map(str::to_string).collect())
        }
    };

    let required = |value: Option<String>| {
        value
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| CompileError::InvalidExpression {
                expression: String::new(),
                message: format!("v-{} requires a value", directive),
            })
    };

    let parsed = match (directive, arg) {
        ("bind", Some(arg)) => Directive::Bind {
            arg: arg.to_string(),
            exp: parse_expression(&required(value)?)?,
        },
        ("bind", None) => Directive::BindObject(parse_expression(&required(value)?)?),
        ("on", Some(event)) => Directive::On {
            event: event.to_string(),
            handler: Rc::new(parse_expression(&required(value)?)?),
            modifiers,
        },
        ("if", _) => Directive::If(parse_expression(&required(value)?)?),
        ("else-if", _) => Directive::ElseIf(parse_expression(&required(value)?)?),
        ("else", _) => Directive::Else,
        ("for", _) => Directive::For(parse_for(&required(value)?)?),
        ("slot", arg) => Directive::Slot {
            name: arg.filter(|a| !a.is_empty()).unwrap_or("default").to_string(),
            params: value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()),
        },
        (other, arg) => {
            tracing::warn!(directive = other, "unsupported directive is ignored");
            Directive::Unknown {
                name: other.to_string(),
                arg: arg.map(str::to_string),
                value,
            }
        }
    };
    Ok(parsed)
}

/// `item in list`, `(item, index) in list` or `item of list`.
fn parse_for(source: &str) -> Result<ForExpr, CompileError> {
    let invalid = |message: &str| CompileError::InvalidExpression {
        expression: source.to_string(),
        message: message.to_string(),
    };

    let (alias, list) = source
        .split_once(" in ")
        .or_else(|| source.split_once(" of "))
        .ok_or_else(|| invalid("v-for expects `alias in source`"))?;

    let alias = alias.trim();
    let alias = alias
        .strip_prefix('(')
        .and_then(|a| a.strip_suffix(')'))
        .unwrap_or(alias);
    let mut names = alias.split(',').map(str::trim);

    let value = names.next().unwrap_or_default();
    if !is_identifier(value) {
        return Err(invalid("v-for alias must be an identifier"));
    }
    let index = match names.next() {
        Some(index) if is_identifier(index) => Some(index.to_string()),
        Some(_) => return Err(invalid("v-for index must be an identifier")),
        None => None,
    };

    Ok(ForExpr {
        value: value.to_string(),
        index,
        source: parse_expression(list.trim())?,
    })
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .map_or(false, |c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}

/// Drop whitespace-only text at the edges, next to comments, or between
/// elements when it spans lines; shrink the rest to single spaces.
fn condense_whitespace(nodes: Vec<TemplateNode>) -> Vec<TemplateNode> {
    let last = nodes.len().saturating_sub(1);
    let mut kept = Vec::with_capacity(nodes.len());

    for (i, node) in nodes.iter().enumerate() {
        let TemplateNode::Text(text) = node else {
            kept.push(node.clone());
            continue;
        };

        if !text.chars().all(char::is_whitespace) {
            kept.push(TemplateNode::Text(collapse_whitespace(text)));
            continue;
        }

        let prev = i.checked_sub(1).and_then(|p| nodes.get(p));
        let next = nodes.get(i + 1);
        let is_comment = |n: Option<&TemplateNode>| matches!(n, Some(TemplateNode::Comment(_)));
        let is_element = |n: Option<&TemplateNode>| matches!(n, Some(TemplateNode::Element(_)));

        let drop = i == 0
            || i == last
            || is_comment(prev)
            || is_comment(next)
            || (is_element(prev) && is_element(next) && text.contains('\n'));
        if !drop {
            kept.push(TemplateNode::Text(" ".to_string()));
        }
    }

    kept
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() && c != '\u{a0}' {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::expr::Expr;

    fn parse_default(source: &str) -> Result<Template, CompileError> {
        parse(source, &CompilerOptions::default())
    }

    fn element(node: &TemplateNode) -> &ElementNode {
        node.as_element().expect("expected an element")
    }

    #[test]
    fn nested_elements_and_text() {
        let template = parse_default("<div id=\"app\"><p>hello</p><br/><input disabled></div>").unwrap();
        assert_eq!(template.children.len(), 1);

        let div = element(&template.children[0]);
        assert_eq!(div.tag, "div");
        assert_eq!(div.attribute("id"), Some("app"));

        let tags: Vec<_> = div.children.iter().map(|n| element(n).tag.as_str()).collect();
        assert_eq!(tags, ["p", "br", "input"]);
        assert_eq!(element(&div.children[2]).attribute("disabled"), Some(""));
        assert_eq!(element(&div.children[0]).children[0], TemplateNode::Text("hello".into()));
    }

    #[test]
    fn interpolation_splits_text() {
        let template = parse_default("<p>Count: {{ count }}!</p>").unwrap();
        let p = element(&template.children[0]);
        assert_eq!(
            &p.children[..],
            &[
                TemplateNode::Text("Count: ".into()),
                TemplateNode::Interpolation(Expr::Ident("count".into())),
                TemplateNode::Text("!".into()),
            ]
        );
    }

    #[test]
    fn custom_delimiters() {
        let options = CompilerOptions {
            delimiters: ("[[".into(), "]]".into()),
            ..CompilerOptions::default()
        };
        let template = parse("<p>{{ raw }} [[ name ]]</p>", &options).unwrap();
        let p = element(&template.children[0]);
        assert_eq!(p.children[0], TemplateNode::Text("{{ raw }} ".into()));
        assert_eq!(p.children[1], TemplateNode::Interpolation(Expr::Ident("name".into())));
    }

    #[test]
    fn directives_and_shorthands() {
        let template = parse_default(
            r#"<li v-for="(item, i) in items" :key="item.id" @click.stop="select(item)" v-if="show" v-focus>x</li>"#,
        )
        .unwrap();
        let li = element(&template.children[0]);
        let directives: Vec<_> = li.directives().collect();
        assert_eq!(directives.len(), 5);

        let for_expr = li.for_expr().unwrap();
        assert_eq!(for_expr.value, "item");
        assert_eq!(for_expr.index.as_deref(), Some("i"));
        assert_eq!(for_expr.source, Expr::Ident("items".into()));

        assert!(matches!(directives[1], Directive::Bind { arg, .. } if arg == "key"));
        assert!(matches!(
            directives[2],
            Directive::On { event, modifiers, .. } if event == "click" && modifiers == &["stop".to_string()]
        ));
        assert!(li.if_condition().is_some());
        assert!(matches!(directives[4], Directive::Unknown { name, .. } if name == "focus"));
    }

    #[test]
    fn whitespace_condense_and_preserve() {
        let source = "<ul>\n  <li>a</li>\n  <li>b</li>\n</ul>\n<p>  x   y  </p> <b>z</b>";

        let condensed = parse_default(source).unwrap();
        let ul = element(&condensed.children[0]);
        assert_eq!(ul.children.len(), 2);
        assert_eq!(element(&condensed.children[1]).children[0], TemplateNode::Text(" x y ".into()));
        // same-line space between elements survives as one space
        assert_eq!(condensed.children[2], TemplateNode::Text(" ".into()));

        let options = CompilerOptions {
            whitespace: Whitespace::Preserve,
            ..CompilerOptions::default()
        };
        let preserved = parse(source, &options).unwrap();
        assert_eq!(element(&preserved.children[0]).children.len(), 5);
    }

    #[test]
    fn comments_are_kept_only_when_enabled() {
        let source = "<div><!-- note --><span></span></div>";
        let dropped = parse_default(source).unwrap();
        assert_eq!(element(&dropped.children[0]).children.len(), 1);

        let options = CompilerOptions {
            comments: true,
            ..CompilerOptions::default()
        };
        let kept = parse(source, &options).unwrap();
        assert_eq!(
            element(&kept.children[0]).children[0],
            TemplateNode::Comment(" note ".into())
        );
    }

    #[test]
    fn missing_end_tag_backs_up() {
        let template = parse_default("<p>ok</p><div><span>text</div>").unwrap();
        // the unclosed <span> stops its level, which leaves <div> unclosed too
        assert_eq!(template.children.len(), 1);
        assert_eq!(element(&template.children[0]).tag, "p");
    }

    #[test]
    fn malformed_templates_are_errors() {
        assert!(matches!(
            parse_default("<p>{{ count </p>"),
            Err(CompileError::UnterminatedInterpolation { offset: 3, .. })
        ));
        assert!(matches!(
            parse_default("<div class=\"open></div>"),
            Err(CompileError::UnterminatedAttributeValue { .. })
        ));
        assert!(matches!(
            parse_default("<div></divx>"),
            Err(CompileError::MismatchedEndTag { expected, found, .. }) if expected == "div" && found == "divx"
        ));
        assert!(matches!(
            parse_default("<div></div"),
            Err(CompileError::UnclosedEndTag { tag, .. }) if tag == "div"
        ));
        assert!(matches!(
            parse_default("<div / x></div>"),
            Err(CompileError::InvalidAttributeName { .. })
        ));
        assert!(matches!(
            parse_default("<p :title=\"a +\"></p>"),
            Err(CompileError::InvalidExpression { .. })
        ));
    }

    #[test]
    fn stray_less_than_is_text() {
        let template = parse_default("<p>1 < 2</p>").unwrap();
        let p = element(&template.children[0]);
        let text: String = p
            .children
            .iter()
            .map(|n| match n {
                TemplateNode::Text(t) => t.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(text, "1 < 2");
    }

    #[test]
    fn slot_directives() {
        let template =
            parse_default(r#"<template #item="{ row }"></template><template v-slot></template>"#)
                .unwrap();
        let first = element(&template.children[0]);
        assert_eq!(first.slot_directive(), Some(("item", Some("{ row }"))));
        let second = element(&template.children[1]);
        assert_eq!(second.slot_directive(), Some(("default", None)));
    }
}
