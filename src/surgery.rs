//! In-place edits of `key = "value"` pairs living inside one attribute's
//! expression, such as the `user_agent` attribute of the `awscc` provider:
//!
//! ```hcl
//! user_agent = [{
//!   product_name    = "terraform-awscc-label"
//!   product_version = "0.1.0"
//!   comment         = "V1/AWS-D69B4015/376222271"
//! }]
//! ```
//!
//! The scanner works on the flat token list of one attribute, so it does
//! not depend on how the enclosing document models expressions.

use crate::error::{Result, TfbumpError};
use crate::hcl::token::{Token, TokenKind, quoted_literal};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

/// Keys of the client identification micro-syntax that may be edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IdentificationKey {
    ProductName,
    ProductVersion,
    Comment,
}

impl IdentificationKey {
    pub const ALL: [IdentificationKey; 3] = [
        IdentificationKey::ProductName,
        IdentificationKey::ProductVersion,
        IdentificationKey::Comment,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IdentificationKey::ProductName => "product_name",
            IdentificationKey::ProductVersion => "product_version",
            IdentificationKey::Comment => "comment",
        }
    }

    pub fn from_ident(ident: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == ident)
    }
}

impl fmt::Display for IdentificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An identifier followed by a quoted literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValuePair {
    pub key: String,
    /// Index of the `QuotedLit` token within the scanned slice.
    pub index: usize,
    pub value: String,
}

/// Finds every identifier immediately followed by a quoted literal.
///
/// Only `=` or `:` may sit between the two. Any other token drops the
/// pending identifier, so `name = upper("x")` or `a = [b, "x"]` never
/// produce a pair.
pub fn scan_pairs(tokens: &[Token]) -> Vec<KeyValuePair> {
    let mut pairs = Vec::new();
    let mut pending: Option<&Token> = None;

    for (index, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::Ident => pending = Some(token),
            TokenKind::Punct if token.text == "=" || token.text == ":" => {}
            TokenKind::QuotedLit => {
                if let Some(ident) = pending.take() {
                    pairs.push(KeyValuePair {
                        key: ident.text.clone(),
                        index,
                        value: token.text.clone(),
                    });
                }
            }
            _ => pending = None,
        }
    }
    pairs
}

/// Location and current value of one recognized key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentificationSubvalue {
    pub index: usize,
    pub value: String,
}

/// The identification literal of one provider, ready for surgical edits.
#[derive(Debug, Clone)]
pub struct IdentificationLiteral {
    original: Vec<Token>,
    subvalues: BTreeMap<IdentificationKey, IdentificationSubvalue>,
    replacements: BTreeMap<usize, String>,
}

impl IdentificationLiteral {
    /// Scans the attribute's tokens. When a key repeats, the last
    /// occurrence wins.
    pub fn scan(tokens: &[Token]) -> Self {
        let mut subvalues = BTreeMap::new();
        for pair in scan_pairs(tokens) {
            if let Some(key) = IdentificationKey::from_ident(&pair.key) {
                subvalues.insert(
                    key,
                    IdentificationSubvalue {
                        index: pair.index,
                        value: pair.value,
                    },
                );
            }
        }
        Self {
            original: tokens.to_vec(),
            subvalues,
            replacements: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: IdentificationKey) -> Option<&IdentificationSubvalue> {
        self.subvalues.get(&key)
    }

    /// Replaces the value of `key`. Returns `Ok(false)` when the value is
    /// already current.
    pub fn set(&mut self, key: IdentificationKey, value: &str) -> Result<bool> {
        let Some(subvalue) = self.subvalues.get_mut(&key) else {
            return Err(TfbumpError::RejectedEdit(format!(
                "'{key}' is not present in the literal"
            )));
        };
        if subvalue.value == value {
            return Ok(false);
        }

        let literal = quoted_literal(value)?;
        if self.original[subvalue.index].span.is_none() {
            return Err(TfbumpError::RejectedEdit(format!(
                "'{key}' has no source position"
            )));
        }

        subvalue.value = value.to_string();
        self.replacements.insert(subvalue.index, literal);
        Ok(true)
    }

    /// Source edits for every changed literal: the span of the original
    /// quoted literal and its replacement text.
    pub fn edits(&self) -> Vec<(Range<usize>, String)> {
        self.replacements
            .iter()
            .filter_map(|(&index, literal)| {
                self.original[index]
                    .span
                    .clone()
                    .map(|span| (span, literal.clone()))
            })
            .collect()
    }
}
