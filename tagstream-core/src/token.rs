//! Tokens - transient lexical units passed from tokenizer to node builder.

use crate::span::{Location, Span};

/// Lexical unit kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `<name` - raw is the (case-folded) tag name.
    TagOpen,
    /// Attribute name inside a start tag.
    AttributeName,
    /// Attribute value, quotes stripped, entities not yet decoded.
    AttributeValue,
    /// `>` ending a start tag.
    TagOpenEnd,
    /// `/>` ending a start tag.
    TagSelfClose,
    /// `</name>` - raw is the (case-folded) tag name.
    TagClose,
    /// A run of character data with no `&` in it.
    Text,
    /// `&name;` - raw is `name` without `&` and `;`.
    EntityReference,
    /// Comment body.
    Comment,
    /// CDATA section body.
    Cdata,
    /// Processing instruction, raw is everything between `<?` and `?>`.
    ProcessingInstruction,
    /// Doctype body after `<!DOCTYPE`.
    Doctype,
}

/// A completed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub raw: String,
    pub span: Span,
    /// Where the token began.
    pub location: Location,
}

impl Token {
    pub fn new(kind: TokenKind, raw: impl Into<String>, span: Span, location: Location) -> Self {
        Self {
            kind,
            raw: raw.into(),
            span,
            location,
        }
    }

    /// A token with no text (`TagOpenEnd`, `TagSelfClose`).
    pub fn marker(kind: TokenKind, span: Span, location: Location) -> Self {
        Self::new(kind, String::new(), span, location)
    }
}
