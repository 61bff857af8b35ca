//! A flat token view over one attribute expression.
//!
//! `hcl-edit` hands out a tree; the identification scanner wants a
//! sequence. [`expression_tokens`] walks the tree in source order and
//! keeps the byte span of every string literal so it can be edited in
//! place.

use crate::error::{Result, TfbumpError};
use hcl_edit::Span;
use hcl_edit::expr::{Expression, ObjectKey};
use hcl_edit::parser::parse_body;
use hcl_edit::structure::Structure;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    /// A plain string literal, without template interpolations.
    QuotedLit,
    /// Structural punctuation: brackets, braces, `=` and `,`.
    Punct,
    /// Any other expression, kept opaque.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Identifier name, literal value or punctuation; empty for `Other`.
    pub text: String,
    /// Byte range in the parsed source, when the parser recorded one.
    pub span: Option<Range<usize>>,
}

impl Token {
    fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            span: None,
        }
    }

    fn punct(text: &str) -> Self {
        Self::new(TokenKind::Punct, text)
    }
}

/// Flattens `expr` into tokens in source order.
pub fn expression_tokens(expr: &Expression) -> Vec<Token> {
    let mut tokens = Vec::new();
    push_expression(expr, &mut tokens);
    tokens
}

fn push_expression(expr: &Expression, tokens: &mut Vec<Token>) {
    match expr {
        Expression::String(value) => tokens.push(Token {
            kind: TokenKind::QuotedLit,
            text: value.as_str().to_string(),
            span: value.span(),
        }),
        Expression::Variable(ident) => tokens.push(Token {
            kind: TokenKind::Ident,
            text: ident.as_str().to_string(),
            span: ident.span(),
        }),
        Expression::Array(array) => {
            tokens.push(Token::punct("["));
            for (index, element) in array.iter().enumerate() {
                if index > 0 {
                    tokens.push(Token::punct(","));
                }
                push_expression(element, tokens);
            }
            tokens.push(Token::punct("]"));
        }
        Expression::Object(object) => {
            tokens.push(Token::punct("{"));
            for (index, (key, value)) in object.iter().enumerate() {
                if index > 0 {
                    tokens.push(Token::punct(","));
                }
                match key {
                    ObjectKey::Ident(ident) => tokens.push(Token {
                        kind: TokenKind::Ident,
                        text: ident.as_str().to_string(),
                        span: ident.span(),
                    }),
                    ObjectKey::Expression(key) => push_expression(key, tokens),
                }
                tokens.push(Token::punct("="));
                push_expression(value.expr(), tokens);
            }
            tokens.push(Token::punct("}"));
        }
        _ => tokens.push(Token {
            kind: TokenKind::Other,
            text: String::new(),
            span: expr.span(),
        }),
    }
}

/// Encodes `value` as a quoted HCL string literal, escapes included.
///
/// The literal is parsed back and must decode to exactly `value`;
/// anything that would turn into a template or leak out of its quotes is
/// rejected.
pub fn quoted_literal(value: &str) -> Result<String> {
    let mut literal = String::with_capacity(value.len() + 2);
    literal.push('"');
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => literal.push_str("\\\\"),
            '"' => literal.push_str("\\\""),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            '\t' => literal.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                literal.push(ch);
                literal.push(ch);
            }
            _ => literal.push(ch),
        }
    }
    literal.push('"');

    let body = parse_body(&format!("v = {literal}\n")).ok();
    let decoded = body.as_ref().and_then(|body| match body.iter().next() {
        Some(Structure::Attribute(attr)) => match &attr.value {
            Expression::String(decoded) => Some(decoded.as_str()),
            _ => None,
        },
        _ => None,
    });
    if decoded == Some(value) {
        Ok(literal)
    } else {
        Err(TfbumpError::RejectedEdit(format!(
            "value '{value}' would not stay a single string literal"
        )))
    }
}
