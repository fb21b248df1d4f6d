//! tagstream core parser
//!
//! Streaming, error-tolerant parser for XML-like markup. Input arrives in
//! chunks of any size, and listeners receive SAX-style events as nodes
//! complete. The tree is built only if asked for, and can then be walked and
//! edited in place.
//!
//! # Architecture
//!
//! - **charclass.rs** - Code point classification with a per-instance cache
//! - **tokenizer.rs** - UTF-8 chunk decoding and the lexical state machine
//! - **entities.rs** - Named and numeric entity references
//! - **builder.rs** - Ancestry stack, tokens to events (and tree nodes)
//! - **dispatch.rs** - Handler registry and ordered event delivery
//! - **parser.rs** - `Parser` facade and `ParserOptions`
//! - **tree.rs** - Arena `Document`, navigation handles, mutation
//! - **walk.rs** - Depth-first walker with skip/remove/replace/stop
//! - **serialize.rs** - Tree back to markup
//! - **span.rs** - Span/Location types
//!
//! # Example
//!
//! ```
//! use tagstream_core::{Document, ParserOptions};
//!
//! let (doc, diagnostics) = Document::parse_recovering("<p>one<p>two", ParserOptions::default());
//! assert_eq!(diagnostics.len(), 1);
//! assert_eq!(doc.to_markup(), "<p>one<p>two</p></p>");
//! ```

pub mod builder;
pub mod charclass;
pub mod dispatch;
pub mod entities;
pub mod error;
pub mod event;
pub mod parser;
pub mod serialize;
pub mod span;
pub mod token;
pub mod tokenizer;
pub mod tree;
pub mod walk;

pub use charclass::{classify, CharClass, Classifier};
pub use error::{Diagnostic, DiagnosticKind, Error, HandlerError, TreeError};
pub use event::{Event, EventKind};
pub use parser::{Parser, ParserOptions};
pub use span::{Location, Span};
pub use token::{Token, TokenKind};
pub use tokenizer::{LexState, Tokenizer};
pub use tree::{Attribute, Document, ElementView, Node, NodeId, NodeKind};
pub use walk::{walk, FnVisitor, Visit, Visitor, WalkContext};
