//! Template expressions.
//!
//! A small expression language covering what templates bind: literals,
//! names and member access, calls, unary and binary operators, the
//! conditional operator, array/object literals and assignment (for event
//! handlers). Parsing is a Pratt parser over a flat token list.

use std::rc::Rc;

use crate::error::CompileError;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Ident(String),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
    Assign(Box<Expr>, Box<Expr>),
    Array(Vec<Expr>),
    Object(Vec<(String, Expr)>),
}

impl Expr {
    /// A name or a chain of member accesses, e.g. `user.profile.name`.
    pub fn is_path(&self) -> bool {
        match self {
            Expr::Ident(_) => true,
            Expr::Member(object, _) => object.is_path(),
            Expr::Index(object, _) => object.is_path(),
            _ => false,
        }
    }
}

/// Parse a template expression.
pub fn parse_expression(source: &str) -> Result<Expr, CompileError> {
    let invalid = |message: String| CompileError::InvalidExpression {
        expression: source.to_string(),
        message,
    };

    let tokens = tokenize(source).map_err(invalid)?;
    if tokens.is_empty() {
        return Err(invalid("empty expression".to_string()));
    }

    let mut parser = ExprParser { tokens, pos: 0 };
    let expr = parser.expression(0).map_err(invalid)?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(invalid(format!("unexpected token {}", token))),
    }
}

// ----------------------------------------------------------------------------
// Tokens
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Punct(&'static str),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Str(s) => write!(f, "{:?}", s),
            Token::Ident(name) => write!(f, "`{}`", name),
            Token::Punct(p) => write!(f, "`{}`", p),
        }
    }
}

/// Longest first.
const PUNCTUATORS: &[&str] = &[
    "===", "!==", "==", "!=", "<=", ">=", "&&", "||", "+=", "-=", "<", ">", "+", "-", "*", "/",
    "%", "!", "?", ":", "(", ")", "[", "]", "{", "}", ".", ",", "=",
];

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_ident_part(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn tokenize(source: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c.is_ascii_digit() {
            let mut end = start;
            let mut seen_dot = false;
            while let Some(&(i, d)) = chars.peek() {
                if d.is_ascii_digit() || (d == '.' && !seen_dot) {
                    seen_dot |= d == '.';
                    end = i + d.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let text = &source[start..end];
            let number = text
                .parse::<f64>()
                .map_err(|_| format!("invalid number literal {}", text))?;
            tokens.push(Token::Number(number));
            continue;
        }

        if c == '\'' || c == '"' {
            chars.next();
            let mut text = String::new();
            let mut closed = false;
            while let Some((_, d)) = chars.next() {
                match d {
                    '\\' => match chars.next() {
                        Some((_, 'n')) => text.push('\n'),
                        Some((_, 't')) => text.push('\t'),
                        Some((_, other)) => text.push(other),
                        None => break,
                    },
                    d if d == c => {
                        closed = true;
                        break;
                    }
                    d => text.push(d),
                }
            }
            if !closed {
                return Err("unterminated string literal".to_string());
            }
            tokens.push(Token::Str(text));
            continue;
        }

        if is_ident_start(c) {
            let mut end = start;
            while let Some(&(i, d)) = chars.peek() {
                if is_ident_part(d) {
                    end = i + d.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Ident(source[start..end].to_string()));
            continue;
        }

        let rest = &source[start..];
        let Some(punct) = PUNCTUATORS.iter().find(|p| rest.starts_with(**p)) else {
            return Err(format!("unexpected character {:?}", c));
        };
        for _ in 0..punct.len() {
            chars.next();
        }
        tokens.push(Token::Punct(*punct));
    }

    Ok(tokens)
}

// ----------------------------------------------------------------------------
// Parser
// ----------------------------------------------------------------------------

const PREFIX_BP: u8 = 17;
const POSTFIX_BP: u8 = 19;

fn infix_binding_power(op: &str) -> Option<(u8, u8)> {
    let bp = match op {
        "=" | "+=" | "-=" => (2, 1),
        "?" => (4, 3),
        "||" => (5, 6),
        "&&" => (7, 8),
        "==" | "!=" | "===" | "!==" => (9, 10),
        "<" | "<=" | ">" | ">=" => (11, 12),
        "+" | "-" => (13, 14),
        "*" | "/" | "%" => (15, 16),
        _ => return None,
    };
    Some(bp)
}

fn binary_op(op: &str) -> Option<BinaryOp> {
    let op = match op {
        "||" => BinaryOp::Or,
        "&&" => BinaryOp::And,
        "==" => BinaryOp::Eq,
        "!=" => BinaryOp::NotEq,
        "===" => BinaryOp::StrictEq,
        "!==" => BinaryOp::StrictNotEq,
        "<" => BinaryOp::Lt,
        "<=" => BinaryOp::LtEq,
        ">" => BinaryOp::Gt,
        ">=" => BinaryOp::GtEq,
        "+" => BinaryOp::Add,
        "-" => BinaryOp::Sub,
        "*" => BinaryOp::Mul,
        "/" => BinaryOp::Div,
        "%" => BinaryOp::Rem,
        _ => return None,
    };
    Some(op)
}

struct ExprParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek_punct(&self) -> Option<&'static str> {
        match self.peek() {
            Some(Token::Punct(p)) => Some(*p),
            _ => None,
        }
    }

    fn eat(&mut self, punct: &str) -> bool {
        if self.peek_punct() == Some(punct) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, punct: &str) -> Result<(), String> {
        if self.eat(punct) {
            Ok(())
        } else {
            match self.peek() {
                Some(token) => Err(format!("expected `{}`, found {}", punct, token)),
                None => Err(format!("expected `{}`, found end of expression", punct)),
            }
        }
    }

    fn expression(&mut self, min_bp: u8) -> Result<Expr, String> {
        let mut lhs = self.prefix()?;

        loop {
            let Some(op) = self.peek_punct() else { break };

            if matches!(op, "." | "[" | "(") {
                if POSTFIX_BP < min_bp {
                    break;
                }
                self.pos += 1;
                lhs = self.postfix(lhs, op)?;
                continue;
            }

            let Some((left_bp, right_bp)) = infix_binding_power(op) else { break };
            if left_bp < min_bp {
                break;
            }
            self.pos += 1;

            lhs = match op {
                "?" => {
                    let then = self.expression(0)?;
                    self.expect(":")?;
                    let otherwise = self.expression(right_bp)?;
                    Expr::Conditional(Box::new(lhs), Box::new(then), Box::new(otherwise))
                }
                "=" | "+=" | "-=" => {
                    if !lhs.is_path() {
                        return Err("invalid assignment target".to_string());
                    }
                    let rhs = self.expression(right_bp)?;
                    let value = match op {
                        "+=" => Expr::Binary(BinaryOp::Add, Box::new(lhs.clone()), Box::new(rhs)),
                        "-=" => Expr::Binary(BinaryOp::Sub, Box::new(lhs.clone()), Box::new(rhs)),
                        _ => rhs,
                    };
                    Expr::Assign(Box::new(lhs), Box::new(value))
                }
                _ => {
                    let rhs = self.expression(right_bp)?;
                    let op = binary_op(op).ok_or_else(|| format!("unknown operator `{}`", op))?;
                    Expr::Binary(op, Box::new(lhs), Box::new(rhs))
                }
            };
        }

        Ok(lhs)
    }

    fn prefix(&mut self) -> Result<Expr, String> {
        let Some(token) = self.next() else {
            return Err("unexpected end of expression".to_string());
        };

        match token {
            Token::Number(n) => Ok(Expr::Literal(Literal::Number(n))),
            Token::Str(s) => Ok(Expr::Literal(Literal::Str(s.into()))),
            Token::Ident(name) => Ok(match name.as_str() {
                "true" => Expr::Literal(Literal::Bool(true)),
                "false" => Expr::Literal(Literal::Bool(false)),
                "null" | "undefined" => Expr::Literal(Literal::Null),
                _ => Expr::Ident(name),
            }),
            Token::Punct("(") => {
                let inner = self.expression(0)?;
                self.expect(")")?;
                Ok(inner)
            }
            Token::Punct("!") => Ok(Expr::Unary(UnaryOp::Not, Box::new(self.expression(PREFIX_BP)?))),
            Token::Punct("-") => Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.expression(PREFIX_BP)?))),
            Token::Punct("+") => Ok(Expr::Unary(UnaryOp::Plus, Box::new(self.expression(PREFIX_BP)?))),
            Token::Punct("[") => {
                let items = self.list("]")?;
                Ok(Expr::Array(items))
            }
            Token::Punct("{") => self.object(),
            other => Err(format!("unexpected token {}", other)),
        }
    }

    fn postfix(&mut self, lhs: Expr, op: &str) -> Result<Expr, String> {
        match op {
            "." => match self.next() {
                Some(Token::Ident(name)) => Ok(Expr::Member(Box::new(lhs), name)),
                Some(other) => Err(format!("expected property name, found {}", other)),
                None => Err("expected property name after `.`".to_string()),
            },
            "[" => {
                let index = self.expression(0)?;
                self.expect("]")?;
                Ok(Expr::Index(Box::new(lhs), Box::new(index)))
            }
            _ => {
                let args = self.list(")")?;
                Ok(Expr::Call(Box::new(lhs), args))
            }
        }
    }

    /// Comma separated expressions up to `close`; trailing comma allowed.
    fn list(&mut self, close: &str) -> Result<Vec<Expr>, String> {
        let mut items = Vec::new();
        while !self.eat(close) {
            items.push(self.expression(0)?);
            if !self.eat(",") {
                self.expect(close)?;
                break;
            }
        }
        Ok(items)
    }

    fn object(&mut self) -> Result<Expr, String> {
        let mut entries = Vec::new();
        while !self.eat("}") {
            let key = match self.next() {
                Some(Token::Ident(name)) => name,
                Some(Token::Str(s)) => s,
                Some(Token::Number(n)) => Literal::Number(n).to_key(),
                Some(other) => return Err(format!("expected object key, found {}", other)),
                None => return Err("unterminated object literal".to_string()),
            };

            let value = if self.eat(":") {
                self.expression(0)?
            } else {
                Expr::Ident(key.clone())
            };
            entries.push((key, value));

            if !self.eat(",") {
                self.expect("}")?;
                break;
            }
        }
        Ok(Expr::Object(entries))
    }
}

impl Literal {
    fn to_key(&self) -> String {
        match self {
            Literal::Number(n) if n.fract() == 0.0 => format!("{}", *n as i64),
            Literal::Number(n) => n.to_string(),
            Literal::Str(s) => s.to_string(),
            Literal::Bool(b) => b.to_string(),
            Literal::Null => "null".to_string(),
        }
    }
}
