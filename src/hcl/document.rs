use crate::error::{Result, TfbumpError};
use crate::hcl::token::{Token, TokenKind, expression_tokens, quoted_literal};
use hcl_edit::Span;
use hcl_edit::parser::parse_body;
use hcl_edit::structure::{Attribute, Block, BlockLabel, Body, Structure};
use std::ops::Range;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{line}:{column}: {message}")]
pub struct SyntaxError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl From<hcl_edit::parser::Error> for SyntaxError {
    fn from(err: hcl_edit::parser::Error) -> Self {
        Self {
            line: err.location().line(),
            column: err.location().column(),
            message: err.message().to_string(),
        }
    }
}

/// Handle to a top-level block.
///
/// A handle is only valid for the document generation it was taken from;
/// any edit bumps the generation and invalidates every outstanding handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockId {
    index: usize,
    generation: u64,
}

/// An HCL file held as its exact source text plus the `hcl-edit` tree
/// parsed from it. Edits splice the source and reparse, so bytes outside
/// an edited range never change.
#[derive(Debug, Clone)]
pub struct Document {
    source: String,
    body: Body,
    generation: u64,
    dirty: bool,
}

impl Document {
    pub fn parse(src: &str) -> std::result::Result<Self, SyntaxError> {
        let body = parse_body(src)?;
        Ok(Self {
            source: src.to_string(),
            body,
            generation: 0,
            dirty: false,
        })
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Top-level blocks of the given type, in file order.
    pub fn blocks(&self, block_type: &str) -> Vec<BlockId> {
        self.body
            .iter()
            .enumerate()
            .filter(|(_, structure)| match structure {
                Structure::Block(block) => block.ident.as_str() == block_type,
                Structure::Attribute(_) => false,
            })
            .map(|(index, _)| BlockId {
                index,
                generation: self.generation,
            })
            .collect()
    }

    pub fn block(&self, id: BlockId) -> Result<&Block> {
        if id.generation != self.generation {
            return Err(TfbumpError::StaleReference);
        }
        match self.body.iter().nth(id.index) {
            Some(Structure::Block(block)) => Ok(block),
            _ => Err(TfbumpError::StaleReference),
        }
    }

    pub fn labels(&self, id: BlockId) -> Result<Vec<String>> {
        Ok(self
            .block(id)?
            .labels
            .iter()
            .map(|label| match label {
                BlockLabel::Ident(ident) => ident.as_str().to_string(),
                BlockLabel::String(value) => value.as_str().to_string(),
            })
            .collect())
    }

    /// Value of the first string literal in the attribute's expression.
    ///
    /// Returns `None` when the attribute is absent or its expression has no
    /// plain string literal. An empty string literal yields `Some("")`.
    pub fn attribute_value(&self, id: BlockId, name: &str) -> Result<Option<String>> {
        Ok(self.attribute_tokens(id, name)?.and_then(|tokens| {
            tokens
                .into_iter()
                .find(|t| t.kind == TokenKind::QuotedLit)
                .map(|t| t.text)
        }))
    }

    /// The attribute's value expression as a flat token list.
    ///
    /// `QuotedLit` spans cover the literal including its quotes, so a
    /// replacement from [`quoted_literal`] can be spliced over them as-is.
    pub fn attribute_tokens(&self, id: BlockId, name: &str) -> Result<Option<Vec<Token>>> {
        let block = self.block(id)?;
        Ok(find_attribute(block, name).map(|attr| {
            let mut tokens = expression_tokens(&attr.value);
            for token in &mut tokens {
                if token.kind == TokenKind::QuotedLit {
                    token.span = token
                        .span
                        .take()
                        .and_then(|span| quoted_range(&self.source, &span));
                }
            }
            tokens
        }))
    }

    /// Sets `name = "value"` on the block, replacing the existing value
    /// expression or adding a new attribute line before the closing brace.
    /// Single-line blocks are expanded so the new line gets its own indent.
    pub fn set_string_attribute(&mut self, id: BlockId, name: &str, value: &str) -> Result<()> {
        let literal = quoted_literal(value)?;
        let block = self.block(id)?;

        if let Some(attr) = find_attribute(block, name) {
            let span = attr
                .value
                .span()
                .map(|span| value_range(&self.source, span))
                .ok_or_else(|| unlocated(name))?;
            return self.replace_span(span, literal);
        }

        let span = block.span().ok_or_else(|| unlocated("block"))?;
        let open = open_brace(&self.source, &span).ok_or_else(|| unlocated("block body"))?;
        let close = self.source[span.clone()]
            .rfind('}')
            .map(|offset| span.start + offset)
            .filter(|&close| close > open)
            .ok_or_else(|| unlocated("block body"))?;
        let outer = indent_of(&self.source, span.start);
        let line = format!("{name} = {literal}");
        let inner = &self.source[open + 1..close];

        let (range, text) = if inner.contains('\n') {
            let indent = block
                .body
                .iter()
                .filter_map(|structure| structure.span())
                .find(|span| line_start(&self.source, span.start) > open)
                .map(|span| indent_of(&self.source, span.start))
                .unwrap_or_else(|| format!("{outer}  "));
            let close_line = line_start(&self.source, close);
            if self.source[close_line..close].trim().is_empty() {
                (close_line..close_line, format!("{indent}{line}\n"))
            } else {
                (close..close, format!("\n{indent}{line}\n{outer}"))
            }
        } else {
            let indent = format!("{outer}  ");
            let mut text = String::from("\n");
            let existing = inner.trim();
            if !existing.is_empty() {
                text.push_str(&format!("{indent}{existing}\n"));
            }
            text.push_str(&format!("{indent}{line}\n{outer}"));
            (open + 1..close, text)
        };
        self.replace_span(range, text)
    }

    pub fn replace_span(&mut self, span: Range<usize>, replacement: impl Into<String>) -> Result<()> {
        self.replace_spans(vec![(span, replacement.into())])
    }

    /// Splices every replacement into the source and reparses it.
    ///
    /// Spans are byte ranges of the current source and must not overlap.
    /// The edit is rolled back and rejected if the result no longer parses.
    pub fn replace_spans(&mut self, mut edits: Vec<(Range<usize>, String)>) -> Result<()> {
        edits.sort_by_key(|(span, _)| std::cmp::Reverse(span.start));
        let mut limit = self.source.len();
        for (span, _) in &edits {
            if span.start > span.end
                || span.end > limit
                || !self.source.is_char_boundary(span.start)
                || !self.source.is_char_boundary(span.end)
            {
                return Err(TfbumpError::RejectedEdit(format!(
                    "span {}..{} is out of bounds or overlaps another edit",
                    span.start, span.end
                )));
            }
            limit = span.start;
        }

        let mut source = self.source.clone();
        for (span, replacement) in edits {
            source.replace_range(span, &replacement);
        }
        let body = parse_body(&source).map_err(|e| {
            TfbumpError::RejectedEdit(format!(
                "edit would leave an invalid document: {}",
                SyntaxError::from(e)
            ))
        })?;

        self.source = source;
        self.body = body;
        self.generation += 1;
        self.dirty = true;
        Ok(())
    }

    /// Exact source text, including any edits.
    pub fn serialize(&self) -> String {
        self.source.clone()
    }

    /// Source text normalized by the `hcl` formatter. Comments are not
    /// carried over.
    pub fn formatted(&self) -> Result<String> {
        let body: hcl::Body =
            hcl::parse(&self.source).map_err(|e| TfbumpError::Format(e.to_string()))?;
        hcl::format::to_string(&body).map_err(|e| TfbumpError::Format(e.to_string()))
    }
}

fn find_attribute<'b>(block: &'b Block, name: &str) -> Option<&'b Attribute> {
    block.body.iter().find_map(|structure| match structure {
        Structure::Attribute(attr) if attr.key.as_str() == name => Some(attr),
        _ => None,
    })
}

fn unlocated(what: &str) -> TfbumpError {
    TfbumpError::RejectedEdit(format!("no source position for '{what}'"))
}

/// Widens or narrows a string span to exactly `"..."`, quotes included.
fn quoted_range(source: &str, span: &Range<usize>) -> Option<Range<usize>> {
    let bytes = source.as_bytes();
    let start = if bytes.get(span.start) == Some(&b'"') {
        span.start
    } else if span.start > 0 && bytes[span.start - 1] == b'"' {
        span.start - 1
    } else {
        return None;
    };
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(start..i + 1),
            b'\n' => return None,
            _ => i += 1,
        }
    }
    None
}

/// The value text of an expression span, without surrounding whitespace.
fn value_range(source: &str, span: Range<usize>) -> Range<usize> {
    if let Some(quoted) = quoted_range(source, &span) {
        return quoted;
    }
    let text = &source[span.clone()];
    let start = span.start + (text.len() - text.trim_start().len());
    let end = span.end - (text.len() - text.trim_end().len());
    start..end.max(start)
}

/// First `{` of a block span that is not inside a quoted label.
fn open_brace(source: &str, span: &Range<usize>) -> Option<usize> {
    let bytes = &source.as_bytes()[span.clone()];
    let mut quoted = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if quoted => i += 1,
            b'"' => quoted = !quoted,
            b'{' if !quoted => return Some(span.start + i),
            _ => {}
        }
        i += 1;
    }
    None
}

fn line_start(source: &str, pos: usize) -> usize {
    source[..pos].rfind('\n').map_or(0, |i| i + 1)
}

fn indent_of(source: &str, pos: usize) -> String {
    source[line_start(source, pos)..]
        .chars()
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect()
}
