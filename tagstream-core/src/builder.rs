//! Node builder: tokens in, events out.
//!
//! Keeps the ancestry stack of open elements and turns the tokenizer's flat
//! token stream into balanced [`Event`]s, optionally mirroring them into a
//! [`Document`]. Each token is fully applied (stack, tree, queued events)
//! before anything is dispatched.

use std::mem;

use crate::charclass::{classify_char, CharClass};
use crate::entities;
use crate::error::{Diagnostic, DiagnosticKind};
use crate::event::Event;
use crate::parser::ParserOptions;
use crate::span::{Location, Span};
use crate::token::{Token, TokenKind};
use crate::tokenizer::TokenSink;
use crate::tree::{Attribute, Document, NodeId, NodeKind};

/// An element on the ancestry stack.
#[derive(Debug)]
struct OpenElement {
    name: String,
    node: Option<NodeId>,
}

/// A start tag whose `>` has not been seen yet.
#[derive(Debug)]
struct PendingTag {
    name: String,
    attributes: Vec<Attribute>,
    span: Span,
    /// Attribute name waiting for its value.
    attr: Option<(String, Span, Location)>,
}

/// Character data collected across text and entity tokens.
#[derive(Debug)]
struct PendingText {
    content: String,
    span: Span,
}

#[derive(Debug)]
pub struct NodeBuilder {
    options: ParserOptions,
    stack: Vec<OpenElement>,
    pending: Option<PendingTag>,
    text: Option<PendingText>,
    events: Vec<Event>,
    document: Option<Document>,
}

impl NodeBuilder {
    /// A builder that only produces events.
    pub fn new(options: ParserOptions) -> Self {
        Self {
            options,
            stack: Vec::new(),
            pending: None,
            text: None,
            events: Vec::new(),
            document: None,
        }
    }

    /// A builder that also materializes a [`Document`].
    pub fn with_tree(options: ParserOptions) -> Self {
        Self {
            document: Some(Document::new()),
            ..Self::new(options)
        }
    }

    /// Number of open elements.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Names of the open elements, outermost first.
    pub fn open_elements(&self) -> impl Iterator<Item = &str> {
        self.stack.iter().map(|e| e.name.as_str())
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// The open elements stay the append targets for what follows, even if
    /// they are detached or moved.
    pub fn document_mut(&mut self) -> Option<&mut Document> {
        self.document.as_mut()
    }

    pub fn into_document(self) -> Option<Document> {
        self.document
    }

    /// Take the events produced so far.
    pub fn take_events(&mut self) -> Vec<Event> {
        mem::take(&mut self.events)
    }

    /// Apply one token.
    pub fn accept(&mut self, token: Token) {
        let Token {
            kind,
            raw,
            span,
            location,
        } = token;
        match kind {
            TokenKind::Text => self.push_text(&raw, span),
            TokenKind::EntityReference => match entities::resolve(&raw) {
                Some(value) => self.push_text(&value, span),
                None => {
                    self.report(Diagnostic::new(
                        DiagnosticKind::UnknownEntity,
                        format!("unknown entity `&{raw};` kept as text"),
                        span,
                        location,
                    ));
                    self.push_text(&format!("&{raw};"), span);
                }
            },
            TokenKind::Cdata => {
                self.flush_text();
                self.append_leaf(NodeKind::Text(raw.clone()));
                self.events.push(Event::Cdata { content: raw, span });
            }
            TokenKind::Comment => {
                self.flush_text();
                self.append_leaf(NodeKind::Comment(raw.clone()));
                self.events.push(Event::Comment { content: raw, span });
            }
            TokenKind::ProcessingInstruction => {
                self.flush_text();
                let (target, body) = split_instruction(&raw);
                self.events.push(Event::ProcessingInstruction {
                    target: target.to_string(),
                    body: body.to_string(),
                    span,
                });
            }
            TokenKind::Doctype => {
                self.flush_text();
                self.events.push(Event::Doctype { content: raw, span });
            }
            TokenKind::TagOpen => {
                self.flush_text();
                self.events.push(Event::OpenTagStart {
                    name: raw.clone(),
                    span,
                });
                self.pending = Some(PendingTag {
                    name: raw,
                    attributes: Vec::new(),
                    span,
                    attr: None,
                });
            }
            TokenKind::AttributeName => {
                if let Some(tag) = self.pending.as_mut() {
                    tag.attr = Some((raw, span, location));
                }
            }
            TokenKind::AttributeValue => self.add_attribute(raw, span, location),
            TokenKind::TagOpenEnd => self.open_element(false, span),
            TokenKind::TagSelfClose => self.open_element(true, span),
            TokenKind::TagClose => {
                self.flush_text();
                self.close_element(raw, span, location);
            }
        }
    }

    /// Record a diagnostic as an `error` event.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        log::debug!(target: "tagstream::builder", "{diagnostic}");
        self.events.push(Event::Error(diagnostic));
    }

    /// End of input: flush text, close whatever is still open, emit `end`.
    pub fn finish(&mut self, at: Location) {
        self.flush_text();
        if self.pending.is_some() {
            self.open_element(false, Span::point(at.offset));
        }
        if !self.stack.is_empty() {
            let open: Vec<String> = self.stack.iter().map(|e| format!("<{}>", e.name)).collect();
            self.report(Diagnostic::new(
                DiagnosticKind::UnexpectedEndOfInput,
                format!("input ended with unclosed {}", open.join(", ")),
                Span::point(at.offset),
                at,
            ));
            while let Some(element) = self.stack.pop() {
                self.events.push(Event::CloseTag {
                    name: element.name,
                    span: Span::point(at.offset),
                });
            }
        }
        self.events.push(Event::End);
    }

    fn push_text(&mut self, s: &str, span: Span) {
        match self.text.as_mut() {
            Some(text) => {
                text.content.push_str(s);
                text.span = text.span.join(span);
            }
            None => {
                self.text = Some(PendingText {
                    content: s.to_string(),
                    span,
                });
            }
        }
    }

    fn flush_text(&mut self) {
        let Some(PendingText { content, span }) = self.text.take() else {
            return;
        };
        let Some(content) = self.shape_text(content) else {
            return;
        };
        // Whitespace between top-level nodes carries nothing.
        if self.stack.is_empty() && is_blank(&content) {
            return;
        }
        self.append_leaf(NodeKind::Text(content.clone()));
        self.events.push(Event::Text { content, span });
    }

    /// Apply the trim and normalize options. `None` drops the text.
    fn shape_text(&self, content: String) -> Option<String> {
        let mut content = content;
        if self.options.trim_text {
            let trimmed = content.trim_matches(is_whitespace);
            if trimmed.len() != content.len() {
                content = trimmed.to_string();
            }
        }
        if self.options.normalize_whitespace_text {
            if is_blank(&content) {
                return None;
            }
            content = collapse_whitespace(&content);
        }
        if content.is_empty() {
            None
        } else {
            Some(content)
        }
    }

    fn add_attribute(&mut self, raw: String, span: Span, location: Location) {
        let Some(mut tag) = self.pending.take() else {
            return;
        };
        let Some((name, name_span, name_location)) = tag.attr.take() else {
            self.pending = Some(tag);
            return;
        };

        let mut unknown = Vec::new();
        let value = entities::decode_value(&raw, |range, entity| {
            unknown.push((range, entity.to_string()));
        })
        .into_owned();
        for (range, entity) in unknown {
            // Offsets are exact for quoted values, which are copied verbatim.
            let entity_span = Span::new(span.start + range.start, span.start + range.end);
            self.report(Diagnostic::new(
                DiagnosticKind::UnknownEntity,
                format!("unknown entity `&{entity};` kept as text"),
                entity_span,
                location,
            ));
        }

        if tag.attributes.iter().any(|a| a.name == name) {
            self.report(Diagnostic::new(
                DiagnosticKind::DuplicateAttribute,
                format!("duplicate attribute `{name}` on <{}>; first value kept", tag.name),
                name_span,
                name_location,
            ));
        } else {
            self.events.push(Event::Attribute {
                name: name.clone(),
                value: value.clone(),
                span: name_span.join(span),
            });
            tag.attributes.push(Attribute { name, value });
        }
        self.pending = Some(tag);
    }

    fn open_element(&mut self, self_closing: bool, end: Span) {
        let Some(tag) = self.pending.take() else {
            return;
        };
        let span = tag.span.join(end);
        let parent = self.stack.last().and_then(|e| e.node);
        let node = self.document.as_mut().map(|doc| {
            let parent = parent.unwrap_or(doc.root_id());
            doc.append_new(
                parent,
                NodeKind::Element {
                    name: tag.name.clone(),
                    attributes: tag.attributes.clone(),
                    self_closing,
                },
            )
        });

        self.events.push(Event::OpenTag {
            name: tag.name.clone(),
            attributes: tag.attributes,
            self_closing,
            span,
        });
        if self_closing {
            self.events.push(Event::CloseTag { name: tag.name, span });
        } else {
            self.stack.push(OpenElement { name: tag.name, node });
        }
    }

    fn close_element(&mut self, name: String, span: Span, location: Location) {
        let expected = match self.stack.last() {
            Some(top) if top.name == name => {
                self.stack.pop();
                self.events.push(Event::CloseTag { name, span });
                return;
            }
            Some(top) => format!("expected </{}>, found </{name}>", top.name),
            None => format!("found </{name}> with no open element"),
        };
        self.report(Diagnostic::new(
            DiagnosticKind::MismatchedCloseTag,
            expected,
            span,
            location,
        ));
        if !self.options.recover_from_mismatched_tags {
            log::debug!(target: "tagstream::builder", "dropping </{name}>");
            return;
        }
        // Auto-close down to the matching element, or everything if none matches.
        while let Some(element) = self.stack.pop() {
            let matched = element.name == name;
            log::debug!(target: "tagstream::builder", "auto-closing <{}>", element.name);
            self.events.push(Event::CloseTag {
                name: element.name,
                span,
            });
            if matched {
                break;
            }
        }
    }

    fn append_leaf(&mut self, kind: NodeKind) {
        let parent = self.stack.last().and_then(|e| e.node);
        if let Some(doc) = self.document.as_mut() {
            let parent = parent.unwrap_or(doc.root_id());
            doc.append_new(parent, kind);
        }
    }
}

impl TokenSink for NodeBuilder {
    fn token(&mut self, token: Token) {
        self.accept(token);
    }

    fn diagnostic(&mut self, diagnostic: Diagnostic) {
        self.report(diagnostic);
    }
}

fn is_whitespace(c: char) -> bool {
    classify_char(c) == CharClass::Whitespace
}

fn is_blank(s: &str) -> bool {
    s.chars().all(is_whitespace)
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_space = false;
    for c in s.chars() {
        if is_whitespace(c) {
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

/// `xml version="1.0"` -> (`xml`, `version="1.0"`)
fn split_instruction(raw: &str) -> (&str, &str) {
    let raw = raw.trim_start_matches(is_whitespace);
    match raw.find(is_whitespace) {
        Some(i) => (&raw[..i], raw[i..].trim_matches(is_whitespace)),
        None => (raw, ""),
    }
}
