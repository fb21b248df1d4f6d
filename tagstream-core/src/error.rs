//! Diagnostics and errors.
//!
//! Malformed input never aborts a parse. The tokenizer and node builder
//! record a [`Diagnostic`] and keep going; the diagnostic is forwarded to the
//! `error` event. Only when no `error` handler is registered does a
//! diagnostic come back to the caller as [`Error::Diagnostic`].

use std::fmt;

use strum_macros::{Display, IntoStaticStr};
use thiserror::Error;

use crate::event::EventKind;
use crate::span::{Location, Span};

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiagnosticKind {
    /// The character has no valid transition in the current state.
    UnexpectedCharacter,
    /// Input ended in the middle of a token.
    UnterminatedToken,
    /// A close tag does not match the innermost open element.
    MismatchedCloseTag,
    /// Input ended with elements still open.
    UnexpectedEndOfInput,
    /// `&name;` with a name that is neither known nor a valid numeric reference.
    UnknownEntity,
    /// The same attribute name appears twice on one element.
    DuplicateAttribute,
    /// The byte stream is not valid UTF-8.
    InvalidEncoding,
}

/// A non-fatal problem found in the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message} at {location}")]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Span,
    pub location: Location,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, span: Span, location: Location) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
            location,
        }
    }

    /// Byte offset where the problem starts.
    pub fn offset(&self) -> usize {
        self.span.start
    }
}

/// Error type returned by event handlers.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by [`Parser::feed`](crate::Parser::feed) and
/// [`Parser::close`](crate::Parser::close).
#[derive(Debug, Error)]
pub enum Error {
    /// A diagnostic was raised and no `error` handler is registered.
    #[error(transparent)]
    Diagnostic(Diagnostic),

    /// A registered handler returned an error.
    #[error("{event} handler failed: {source}")]
    Handler {
        event: EventKind,
        #[source]
        source: HandlerError,
    },

    /// The parser has already been closed.
    #[error("parser is closed")]
    Closed,
}

impl Error {
    /// The diagnostic, if this error is one.
    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Error::Diagnostic(d) => Some(d),
            _ => None,
        }
    }
}

/// Structural errors from tree mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TreeError {
    /// The node would become its own ancestor, or the parent cannot hold children.
    #[error("node {child} cannot be inserted under {parent}")]
    HierarchyRequest { parent: NodeRef, child: NodeRef },
    /// The reference node is not a child of the given parent.
    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeRef, child: NodeRef },
    /// The id does not belong to this document.
    #[error("node {0} does not exist")]
    InvalidNode(NodeRef),
}

/// Raw node index carried in [`TreeError`] messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRef(pub u32);

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
