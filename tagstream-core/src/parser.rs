//! Streaming parser facade.
//!
//! ```
//! use std::cell::RefCell;
//! use tagstream_core::{Event, EventKind, Parser, ParserOptions};
//!
//! let names = RefCell::new(Vec::new());
//! let mut parser = Parser::new(ParserOptions::default());
//! parser.on(EventKind::OpenTag, |event| {
//!     if let Event::OpenTag { name, .. } = event {
//!         names.borrow_mut().push(name.clone());
//!     }
//!     Ok(())
//! });
//! parser.feed("<a><b").unwrap().feed("/></a>").unwrap();
//! parser.close().unwrap();
//! assert_eq!(*names.borrow(), ["a", "b"]);
//! ```
//!
//! # Errors
//!
//! Malformed input never stops the parser: every problem becomes a
//! [`Diagnostic`] delivered to the `error` handler. If no `error` handler is
//! registered, `feed`/`close` return the diagnostic as
//! [`Error::Diagnostic`] instead. A failing handler is reported as
//! [`Error::Handler`]. After either, the parser is still usable; the next
//! call delivers the events that were queued behind the failure before it
//! reads new input.

use crate::builder::NodeBuilder;
use crate::dispatch::Dispatcher;
use crate::error::{Diagnostic, Error, HandlerError};
use crate::event::{Event, EventKind};
use crate::span::Location;
use crate::tokenizer::{LexState, Tokenizer};
use crate::tree::Document;

/// Parser configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase", default)
)]
pub struct ParserOptions {
    /// Fold tag and attribute names to lowercase.
    pub case_insensitive_names: bool,
    /// Collapse whitespace runs in text to a single space and drop text that
    /// is only whitespace.
    pub normalize_whitespace_text: bool,
    /// On a mismatched close tag, close open elements down to the matching
    /// one. When off, the close tag is dropped.
    pub recover_from_mismatched_tags: bool,
    /// Trim leading and trailing whitespace from text.
    pub trim_text: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            case_insensitive_names: false,
            normalize_whitespace_text: false,
            recover_from_mismatched_tags: true,
            trim_text: false,
        }
    }
}

impl ParserOptions {
    pub fn case_insensitive_names(mut self, on: bool) -> Self {
        self.case_insensitive_names = on;
        self
    }

    pub fn normalize_whitespace_text(mut self, on: bool) -> Self {
        self.normalize_whitespace_text = on;
        self
    }

    pub fn recover_from_mismatched_tags(mut self, on: bool) -> Self {
        self.recover_from_mismatched_tags = on;
        self
    }

    pub fn trim_text(mut self, on: bool) -> Self {
        self.trim_text = on;
        self
    }
}

/// Streaming parser. `'h` bounds what registered handlers may borrow.
#[derive(Debug)]
pub struct Parser<'h> {
    options: ParserOptions,
    tokenizer: Tokenizer,
    builder: NodeBuilder,
    dispatcher: Dispatcher<'h>,
    /// `close()` has run the end-of-input steps.
    finishing: bool,
    /// `close()` has delivered everything.
    closed: bool,
}

impl<'h> Parser<'h> {
    /// A parser that reports events only.
    pub fn new(options: ParserOptions) -> Self {
        let builder = NodeBuilder::new(options.clone());
        Self::with_builder(options, builder)
    }

    /// A parser that also builds a [`Document`].
    pub fn with_tree(options: ParserOptions) -> Self {
        let builder = NodeBuilder::with_tree(options.clone());
        Self::with_builder(options, builder)
    }

    fn with_builder(options: ParserOptions, builder: NodeBuilder) -> Self {
        Self {
            tokenizer: Tokenizer::new(options.case_insensitive_names),
            builder,
            dispatcher: Dispatcher::new(),
            options,
            finishing: false,
            closed: false,
        }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Register `handler` for `kind`, replacing any previous one.
    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> &mut Self
    where
        F: FnMut(&Event) -> Result<(), HandlerError> + 'h,
    {
        self.dispatcher.on(kind, handler);
        self
    }

    /// Remove the handler for `kind`.
    pub fn off(&mut self, kind: EventKind) -> &mut Self {
        self.dispatcher.off(kind);
        self
    }

    /// Feed the next chunk of input. An empty chunk is a no-op.
    pub fn feed(&mut self, chunk: impl AsRef<[u8]>) -> Result<&mut Self, Error> {
        if self.finishing {
            return Err(Error::Closed);
        }
        self.tokenizer.push(chunk.as_ref());
        self.pump()?;
        Ok(self)
    }

    /// Signal end of input.
    ///
    /// Flushes the pending token, closes every open element (reporting
    /// `UnexpectedEndOfInput` if there were any) and emits `end`.
    pub fn close(&mut self) -> Result<(), Error> {
        if self.closed {
            return Err(Error::Closed);
        }
        self.pump()?;
        if !self.finishing {
            self.finishing = true;
            self.tokenizer.finish(&mut self.builder);
            self.builder.finish(self.tokenizer.location());
        }
        self.forward();
        self.dispatcher.drain()?;
        self.closed = true;
        Ok(())
    }

    /// Deliver queued events, then keep consuming buffered input.
    fn pump(&mut self) -> Result<(), Error> {
        loop {
            self.forward();
            self.dispatcher.drain()?;
            if !self.tokenizer.step(&mut self.builder) {
                return Ok(());
            }
        }
    }

    fn forward(&mut self) {
        for event in self.builder.take_events() {
            self.dispatcher.enqueue(event);
        }
    }

    /// Every diagnostic raised so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.dispatcher.diagnostics()
    }

    /// Current lexical state.
    pub fn state(&self) -> LexState {
        self.tokenizer.state()
    }

    /// Position of the next code point to be read.
    pub fn location(&self) -> Location {
        self.tokenizer.location()
    }

    /// Number of open elements.
    pub fn depth(&self) -> usize {
        self.builder.depth()
    }

    /// Names of the open elements, outermost first.
    pub fn open_elements(&self) -> impl Iterator<Item = &str> {
        self.builder.open_elements()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The tree built so far, for parsers made with [`with_tree`](Self::with_tree).
    pub fn document(&self) -> Option<&Document> {
        self.builder.document()
    }

    /// Mutable access to the tree built so far, e.g. to [`walk`](crate::walk)
    /// it between two [`feed`](Self::feed) calls.
    ///
    /// Elements still open keep receiving the nodes parsed after this call,
    /// wherever they are in the tree by then. An open element that was
    /// detached keeps growing outside the document.
    pub fn document_mut(&mut self) -> Option<&mut Document> {
        self.builder.document_mut()
    }

    pub fn into_document(self) -> Option<Document> {
        self.builder.into_document()
    }

    /// The tree (if any) and every diagnostic.
    pub fn into_parts(self) -> (Option<Document>, Vec<Diagnostic>) {
        (self.builder.into_document(), self.dispatcher.into_diagnostics())
    }
}
