//! Streaming tokenizer.
//!
//! Bytes go in through [`Tokenizer::push`] in chunks of any size. Complete
//! UTF-8 sequences are decoded into a pending buffer; a sequence cut by a
//! chunk boundary waits in `carry` for the next chunk. [`Tokenizer::step`]
//! then advances the state machine by one code point, or by a whole run of
//! plain text found with `memchr`, and hands finished tokens to a
//! [`TokenSink`].
//!
//! The machine never stops on bad input. A character with no valid
//! transition produces an `UnexpectedCharacter` diagnostic; a start tag that
//! was already begun is completed as written, and the machine goes back to
//! text and reconsumes the character.
//!
//! # States
//!
//! ```text
//! Initial ─▶ InText ─'<'─▶ InTagOpen ─name─▶ InTagName ─ws─▶ InTagBody ─name─▶ InAttributeName
//!              │ ▲            │  │  │             │  '>'          │ '/'          │ '='   │ ws
//!             '&' │           │  │  └'!'▶ InMarkupDeclaration ─▶ InComment | InCdata | InDoctype
//!              ▼  │';'        │  └'?'▶ InProcessingInstruction
//!           InEntity          └'/'▶ InTagClose ─ws─▶ AfterTagCloseName
//! ```

use std::collections::VecDeque;
use std::mem;

use memchr::memchr2;
use strum_macros::{Display, IntoStaticStr};

use crate::charclass::{CharClass, Classifier};
use crate::error::{Diagnostic, DiagnosticKind};
use crate::span::{Location, Span};
use crate::token::{Token, TokenKind};

const BOM: char = '\u{FEFF}';
const REPLACEMENT: char = '\u{FFFD}';

/// Lexical state of the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
pub enum LexState {
    /// Nothing consumed yet.
    Initial,
    InText,
    /// After `&` in text.
    InEntity,
    /// After `<`.
    InTagOpen,
    /// After `<!`, deciding between comment, CDATA and doctype.
    InMarkupDeclaration,
    InComment,
    InCdata,
    InDoctype,
    InProcessingInstruction,
    InTagName,
    /// Inside a start tag, between attributes.
    InTagBody,
    InAttributeName,
    /// Whitespace after an attribute name, before `=` or the next attribute.
    AfterAttributeName,
    /// After `=`.
    BeforeAttributeValue,
    /// Inside a value; `quote` is the active quote, `None` when unquoted.
    InAttributeValue { quote: Option<char> },
    /// After `/` in a start tag.
    InSelfClosingTag,
    /// After `</`.
    InTagClose,
    AfterTagCloseName,
}

/// Receives tokenizer output.
pub trait TokenSink {
    fn token(&mut self, token: Token);
    fn diagnostic(&mut self, diagnostic: Diagnostic);
}

/// Tokenizer output collected in order, for callers that only want tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lexeme {
    Token(Token),
    Diagnostic(Diagnostic),
}

impl TokenSink for Vec<Lexeme> {
    fn token(&mut self, token: Token) {
        self.push(Lexeme::Token(token));
    }

    fn diagnostic(&mut self, diagnostic: Diagnostic) {
        self.push(Lexeme::Diagnostic(diagnostic));
    }
}

/// Tokenize a complete input in one call.
pub fn tokenize(input: &str, case_insensitive_names: bool) -> Vec<Lexeme> {
    let mut out = Vec::new();
    let mut tokenizer = Tokenizer::new(case_insensitive_names);
    tokenizer.push(input.as_bytes());
    tokenizer.finish(&mut out);
    out
}

enum Step {
    Next,
    Reconsume,
}

/// Character-level state machine with its own input buffer.
#[derive(Debug)]
pub struct Tokenizer {
    state: LexState,
    classifier: Classifier,
    case_insensitive: bool,

    /// Decoded input not yet consumed starts at `cursor`.
    input: String,
    cursor: usize,
    /// Trailing bytes of an incomplete UTF-8 sequence.
    carry: Vec<u8>,
    /// Stream offsets of U+FFFD characters inserted for invalid bytes.
    invalid: VecDeque<usize>,
    /// Total decoded bytes pushed so far.
    decoded: usize,
    /// Position of the next code point to consume.
    loc: Location,

    /// Raw text of the token being accumulated.
    buf: String,
    /// Where the pending token started.
    start: Location,
    /// Folded name of the last attribute, for valueless attributes.
    attr_name: String,
    /// A `TagOpen` was emitted and its `>` has not been seen yet.
    tag_open: bool,
    doctype_depth: u32,
    doctype_quote: Option<char>,
}

impl Tokenizer {
    pub fn new(case_insensitive_names: bool) -> Self {
        Self {
            state: LexState::Initial,
            classifier: Classifier::new(),
            case_insensitive: case_insensitive_names,
            input: String::new(),
            cursor: 0,
            carry: Vec::new(),
            invalid: VecDeque::new(),
            decoded: 0,
            loc: Location::default(),
            buf: String::new(),
            start: Location::default(),
            attr_name: String::new(),
            tag_open: false,
            doctype_depth: 0,
            doctype_quote: None,
        }
    }

    pub fn state(&self) -> LexState {
        self.state
    }

    /// Position of the next code point to be consumed.
    pub fn location(&self) -> Location {
        self.loc
    }

    /// Raw text of the token currently being accumulated.
    pub fn pending_token(&self) -> &str {
        &self.buf
    }

    /// True when every decoded code point has been consumed.
    pub fn is_drained(&self) -> bool {
        self.cursor >= self.input.len()
    }

    /// Append a chunk of bytes. Nothing is consumed until [`step`](Self::step).
    pub fn push(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }
        if self.cursor > 0 {
            self.input.drain(..self.cursor);
            self.cursor = 0;
        }

        let joined: Vec<u8>;
        let mut rest: &[u8] = if self.carry.is_empty() {
            chunk
        } else {
            let mut bytes = mem::take(&mut self.carry);
            bytes.extend_from_slice(chunk);
            joined = bytes;
            &joined
        };

        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    self.push_decoded(text);
                    break;
                }
                Err(e) => {
                    let (valid, tail) = rest.split_at(e.valid_up_to());
                    self.push_decoded(std::str::from_utf8(valid).unwrap_or_default());
                    match e.error_len() {
                        None => {
                            self.carry = tail.to_vec();
                            break;
                        }
                        Some(len) => {
                            self.invalid.push_back(self.decoded);
                            self.push_decoded("\u{FFFD}");
                            rest = &tail[len..];
                        }
                    }
                }
            }
        }
    }

    fn push_decoded(&mut self, text: &str) {
        self.input.push_str(text);
        self.decoded += text.len();
    }

    /// Consume the next code point, or the next run of plain text.
    ///
    /// Returns `false` once the buffered input is exhausted.
    pub fn step<S: TokenSink>(&mut self, sink: &mut S) -> bool {
        let rest = &self.input[self.cursor..];
        let Some(c) = rest.chars().next() else {
            self.input.clear();
            self.cursor = 0;
            return false;
        };

        if self.state == LexState::InText && c != '<' && c != '&' {
            let limit = match self.invalid.front() {
                Some(&offset) => offset - self.loc.offset,
                None => rest.len(),
            };
            let run_len = memchr2(b'<', b'&', &rest.as_bytes()[..limit]).unwrap_or(limit);
            if run_len > 0 {
                let run = &rest[..run_len];
                if self.buf.is_empty() {
                    self.start = self.loc;
                }
                self.buf.push_str(run);
                self.loc.advance_str(run);
                self.cursor += run_len;
                return true;
            }
        }

        self.cursor += c.len_utf8();
        let at = self.loc;
        self.loc.advance(c);
        if c == REPLACEMENT && self.invalid.front() == Some(&at.offset) {
            self.invalid.pop_front();
            sink.diagnostic(Diagnostic::new(
                DiagnosticKind::InvalidEncoding,
                "invalid UTF-8 sequence replaced with U+FFFD",
                char_span(c, at),
                at,
            ));
        }
        while let Step::Reconsume = self.transition(c, at, sink) {}
        true
    }

    /// Consume everything buffered.
    pub fn run<S: TokenSink>(&mut self, sink: &mut S) {
        while self.step(sink) {}
    }

    /// Signal end of input: consume what is left and flush the pending token.
    ///
    /// A token cut off by the end of input is reported as `UnterminatedToken`
    /// and completed with whatever was read.
    pub fn finish<S: TokenSink>(&mut self, sink: &mut S) {
        if !self.carry.is_empty() {
            self.carry.clear();
            self.invalid.push_back(self.decoded);
            self.push_decoded("\u{FFFD}");
        }
        self.run(sink);

        let end = self.loc.offset;
        match self.state {
            LexState::Initial | LexState::InText => {}
            LexState::InEntity => {
                self.unterminated(sink, "an entity reference");
                self.buf.insert(0, '&');
            }
            LexState::InTagOpen => {
                self.unterminated(sink, "a tag");
                self.buf.push('<');
            }
            LexState::InMarkupDeclaration => {
                self.unterminated(sink, "a markup declaration");
                self.buf.insert_str(0, "<!");
            }
            LexState::InComment => {
                self.unterminated(sink, "a comment");
                self.emit_buf(sink, TokenKind::Comment, Span::new(self.start.offset, end));
            }
            LexState::InCdata => {
                self.unterminated(sink, "a CDATA section");
                self.emit_buf(sink, TokenKind::Cdata, Span::new(self.start.offset, end));
            }
            LexState::InProcessingInstruction => {
                self.unterminated(sink, "a processing instruction");
                self.emit_buf(sink, TokenKind::ProcessingInstruction, Span::new(self.start.offset, end));
            }
            LexState::InDoctype => {
                self.unterminated(sink, "a doctype declaration");
                let body = self.buf.trim().to_string();
                self.buf.clear();
                self.emit(sink, TokenKind::Doctype, body, Span::new(self.start.offset, end));
            }
            LexState::InTagName => {
                self.unterminated(sink, "a start tag");
                self.emit_tag_open(sink, end);
                self.end_start_tag(sink, TokenKind::TagOpenEnd, Span::point(end));
            }
            LexState::InTagBody => {
                self.unterminated(sink, "a start tag");
                self.end_start_tag(sink, TokenKind::TagOpenEnd, Span::point(end));
            }
            LexState::InSelfClosingTag => {
                self.unterminated(sink, "a start tag");
                self.end_start_tag(sink, TokenKind::TagSelfClose, Span::point(end));
            }
            LexState::InAttributeName => {
                self.unterminated(sink, "a start tag");
                self.emit_attr_name(sink, end);
                self.emit_valueless(sink, end);
                self.end_start_tag(sink, TokenKind::TagOpenEnd, Span::point(end));
            }
            LexState::AfterAttributeName => {
                self.unterminated(sink, "a start tag");
                self.emit_valueless(sink, end);
                self.end_start_tag(sink, TokenKind::TagOpenEnd, Span::point(end));
            }
            LexState::BeforeAttributeValue => {
                self.unterminated(sink, "an attribute value");
                self.emit(sink, TokenKind::AttributeValue, String::new(), Span::point(end));
                self.end_start_tag(sink, TokenKind::TagOpenEnd, Span::point(end));
            }
            LexState::InAttributeValue { quote } => {
                let what = if quote.is_some() {
                    "a quoted attribute value"
                } else {
                    "an attribute value"
                };
                self.unterminated(sink, what);
                // The value runs to the end of input.
                self.emit_buf(sink, TokenKind::AttributeValue, Span::new(self.start.offset, end));
                self.end_start_tag(sink, TokenKind::TagOpenEnd, Span::point(end));
            }
            LexState::InTagClose if self.buf.is_empty() => {
                self.unterminated(sink, "a close tag");
                self.buf.push_str("</");
            }
            LexState::InTagClose | LexState::AfterTagCloseName => {
                self.unterminated(sink, "a close tag");
                self.emit_tag_close(sink, Span::new(self.start.offset, end));
            }
        }
        self.flush_text(sink, end);
        self.state = LexState::InText;
    }

    fn transition<S: TokenSink>(&mut self, c: char, at: Location, sink: &mut S) -> Step {
        let class = self.classifier.classify(c);
        match self.state {
            LexState::Initial => {
                self.state = LexState::InText;
                if c == BOM && at.offset == 0 {
                    return Step::Next;
                }
                Step::Reconsume
            }

            LexState::InText => {
                match class {
                    CharClass::OpenBracket => {
                        self.flush_text(sink, at.offset);
                        self.start = at;
                        self.set_state(LexState::InTagOpen);
                    }
                    CharClass::Ampersand => {
                        self.flush_text(sink, at.offset);
                        self.start = at;
                        self.set_state(LexState::InEntity);
                    }
                    _ => {
                        if self.buf.is_empty() {
                            self.start = at;
                        }
                        self.buf.push(c);
                    }
                }
                Step::Next
            }

            LexState::InEntity => {
                if c == ';' {
                    if self.buf.is_empty() {
                        self.diagnose(sink, DiagnosticKind::UnexpectedCharacter, "empty entity reference `&;`", Span::new(self.start.offset, at.offset + 1), at);
                        self.buf.push_str("&;");
                    } else {
                        self.emit_buf(sink, TokenKind::EntityReference, Span::new(self.start.offset, at.offset + 1));
                    }
                    self.set_state(LexState::InText);
                    Step::Next
                } else if c == '#' || class.is_name_char() {
                    self.buf.push(c);
                    Step::Next
                } else {
                    self.diagnose(sink, DiagnosticKind::UnexpectedCharacter, format!("unexpected {c:?} in entity reference; `&` kept as text"), char_span(c, at), at);
                    self.buf.insert(0, '&');
                    self.set_state(LexState::InText);
                    Step::Reconsume
                }
            }

            LexState::InTagOpen => match c {
                '/' => {
                    self.set_state(LexState::InTagClose);
                    Step::Next
                }
                '!' => {
                    self.set_state(LexState::InMarkupDeclaration);
                    Step::Next
                }
                '?' => {
                    self.set_state(LexState::InProcessingInstruction);
                    Step::Next
                }
                _ if class == CharClass::NameStart => {
                    self.buf.push(c);
                    self.set_state(LexState::InTagName);
                    Step::Next
                }
                _ => {
                    self.diagnose(sink, DiagnosticKind::UnexpectedCharacter, format!("unexpected {c:?} after `<`; `<` kept as text"), char_span(c, at), at);
                    self.buf.push('<');
                    self.set_state(LexState::InText);
                    Step::Reconsume
                }
            },

            LexState::InMarkupDeclaration => {
                self.buf.push(c);
                if self.buf == "--" {
                    self.buf.clear();
                    self.set_state(LexState::InComment);
                } else if self.buf == "[CDATA[" {
                    self.buf.clear();
                    self.set_state(LexState::InCdata);
                } else if self.buf.eq_ignore_ascii_case("DOCTYPE") {
                    self.buf.clear();
                    self.doctype_depth = 0;
                    self.doctype_quote = None;
                    self.set_state(LexState::InDoctype);
                } else if !is_declaration_prefix(&self.buf) {
                    self.buf.pop();
                    self.diagnose(sink, DiagnosticKind::UnexpectedCharacter, format!("unexpected {c:?} in markup declaration; kept as text"), char_span(c, at), at);
                    self.buf.insert_str(0, "<!");
                    self.set_state(LexState::InText);
                    return Step::Reconsume;
                }
                Step::Next
            }

            LexState::InComment => {
                self.buf.push(c);
                if self.buf.ends_with("-->") {
                    self.buf.truncate(self.buf.len() - 3);
                    self.emit_buf(sink, TokenKind::Comment, Span::new(self.start.offset, at.offset + 1));
                    self.set_state(LexState::InText);
                }
                Step::Next
            }

            LexState::InCdata => {
                self.buf.push(c);
                if self.buf.ends_with("]]>") {
                    self.buf.truncate(self.buf.len() - 3);
                    self.emit_buf(sink, TokenKind::Cdata, Span::new(self.start.offset, at.offset + 1));
                    self.set_state(LexState::InText);
                }
                Step::Next
            }

            LexState::InProcessingInstruction => {
                self.buf.push(c);
                if self.buf.ends_with("?>") {
                    self.buf.truncate(self.buf.len() - 2);
                    self.emit_buf(sink, TokenKind::ProcessingInstruction, Span::new(self.start.offset, at.offset + 1));
                    self.set_state(LexState::InText);
                }
                Step::Next
            }

            LexState::InDoctype => {
                match (self.doctype_quote, c) {
                    (Some(q), _) if c == q => self.doctype_quote = None,
                    (Some(_), _) => {}
                    (None, '"' | '\'') => self.doctype_quote = Some(c),
                    (None, '[') => self.doctype_depth += 1,
                    (None, ']') => self.doctype_depth = self.doctype_depth.saturating_sub(1),
                    (None, '>') if self.doctype_depth == 0 => {
                        let body = self.buf.trim().to_string();
                        self.buf.clear();
                        self.emit(sink, TokenKind::Doctype, body, Span::new(self.start.offset, at.offset + 1));
                        self.set_state(LexState::InText);
                        return Step::Next;
                    }
                    _ => {}
                }
                self.buf.push(c);
                Step::Next
            }

            LexState::InTagName => {
                if class.is_name_char() {
                    self.buf.push(c);
                    return Step::Next;
                }
                self.emit_tag_open(sink, at.offset);
                match (class, c) {
                    (CharClass::Whitespace, _) => {
                        self.set_state(LexState::InTagBody);
                        Step::Next
                    }
                    (CharClass::CloseBracket, _) => {
                        self.end_start_tag(sink, TokenKind::TagOpenEnd, char_span(c, at));
                        Step::Next
                    }
                    (_, '/') => {
                        self.set_state(LexState::InSelfClosingTag);
                        Step::Next
                    }
                    _ => self.recover(sink, c, at),
                }
            }

            LexState::InTagBody => match (class, c) {
                (CharClass::Whitespace, _) => Step::Next,
                (CharClass::CloseBracket, _) => {
                    self.end_start_tag(sink, TokenKind::TagOpenEnd, char_span(c, at));
                    Step::Next
                }
                (_, '/') => {
                    self.set_state(LexState::InSelfClosingTag);
                    Step::Next
                }
                (CharClass::NameStart, _) => {
                    self.start = at;
                    self.buf.push(c);
                    self.set_state(LexState::InAttributeName);
                    Step::Next
                }
                _ => self.recover(sink, c, at),
            },

            LexState::InAttributeName => {
                if class.is_name_char() {
                    self.buf.push(c);
                    return Step::Next;
                }
                self.emit_attr_name(sink, at.offset);
                match (class, c) {
                    (_, '=') => {
                        self.set_state(LexState::BeforeAttributeValue);
                        Step::Next
                    }
                    (CharClass::Whitespace, _) => {
                        self.set_state(LexState::AfterAttributeName);
                        Step::Next
                    }
                    (CharClass::CloseBracket, _) => {
                        self.emit_valueless(sink, at.offset);
                        self.end_start_tag(sink, TokenKind::TagOpenEnd, char_span(c, at));
                        Step::Next
                    }
                    (_, '/') => {
                        self.emit_valueless(sink, at.offset);
                        self.set_state(LexState::InSelfClosingTag);
                        Step::Next
                    }
                    _ => {
                        self.emit_valueless(sink, at.offset);
                        self.recover(sink, c, at)
                    }
                }
            }

            LexState::AfterAttributeName => match (class, c) {
                (CharClass::Whitespace, _) => Step::Next,
                (_, '=') => {
                    self.set_state(LexState::BeforeAttributeValue);
                    Step::Next
                }
                (CharClass::CloseBracket, _) => {
                    self.emit_valueless(sink, at.offset);
                    self.end_start_tag(sink, TokenKind::TagOpenEnd, char_span(c, at));
                    Step::Next
                }
                (_, '/') => {
                    self.emit_valueless(sink, at.offset);
                    self.set_state(LexState::InSelfClosingTag);
                    Step::Next
                }
                (CharClass::NameStart, _) => {
                    self.emit_valueless(sink, at.offset);
                    self.start = at;
                    self.buf.push(c);
                    self.set_state(LexState::InAttributeName);
                    Step::Next
                }
                _ => {
                    self.emit_valueless(sink, at.offset);
                    self.recover(sink, c, at)
                }
            },

            LexState::BeforeAttributeValue => match class {
                CharClass::Whitespace => Step::Next,
                CharClass::Quote => {
                    self.start = self.loc;
                    self.set_state(LexState::InAttributeValue { quote: Some(c) });
                    Step::Next
                }
                CharClass::CloseBracket => {
                    self.diagnose(sink, DiagnosticKind::UnexpectedCharacter, format!("missing value for attribute `{}`", self.attr_name), char_span(c, at), at);
                    self.emit(sink, TokenKind::AttributeValue, String::new(), Span::point(at.offset));
                    self.end_start_tag(sink, TokenKind::TagOpenEnd, char_span(c, at));
                    Step::Next
                }
                _ => {
                    self.start = at;
                    self.buf.push(c);
                    self.set_state(LexState::InAttributeValue { quote: None });
                    Step::Next
                }
            },

            LexState::InAttributeValue { quote: Some(q) } => {
                if c == q {
                    self.emit_buf(sink, TokenKind::AttributeValue, Span::new(self.start.offset, at.offset));
                    self.set_state(LexState::InTagBody);
                } else {
                    self.buf.push(c);
                }
                Step::Next
            }

            LexState::InAttributeValue { quote: None } => {
                match class {
                    CharClass::Whitespace => {
                        self.emit_buf(sink, TokenKind::AttributeValue, Span::new(self.start.offset, at.offset));
                        self.set_state(LexState::InTagBody);
                    }
                    CharClass::CloseBracket => {
                        self.emit_buf(sink, TokenKind::AttributeValue, Span::new(self.start.offset, at.offset));
                        self.end_start_tag(sink, TokenKind::TagOpenEnd, char_span(c, at));
                    }
                    _ => self.buf.push(c),
                }
                Step::Next
            }

            LexState::InSelfClosingTag => {
                if class == CharClass::CloseBracket {
                    // `/` was the previous byte.
                    self.end_start_tag(sink, TokenKind::TagSelfClose, Span::new(at.offset - 1, at.offset + 1));
                    Step::Next
                } else {
                    self.recover(sink, c, at)
                }
            }

            LexState::InTagClose if self.buf.is_empty() => {
                if class == CharClass::NameStart {
                    self.buf.push(c);
                    Step::Next
                } else if class == CharClass::CloseBracket {
                    self.diagnose(sink, DiagnosticKind::UnexpectedCharacter, "empty close tag `</>` kept as text", Span::new(self.start.offset, at.offset + 1), at);
                    self.buf.push_str("</>");
                    self.set_state(LexState::InText);
                    Step::Next
                } else {
                    self.diagnose(sink, DiagnosticKind::UnexpectedCharacter, format!("unexpected {c:?} after `</`; kept as text"), char_span(c, at), at);
                    self.buf.push_str("</");
                    self.set_state(LexState::InText);
                    Step::Reconsume
                }
            }

            LexState::InTagClose => match class {
                _ if class.is_name_char() => {
                    self.buf.push(c);
                    Step::Next
                }
                CharClass::Whitespace => {
                    self.set_state(LexState::AfterTagCloseName);
                    Step::Next
                }
                CharClass::CloseBracket => {
                    self.emit_tag_close(sink, Span::new(self.start.offset, at.offset + 1));
                    self.set_state(LexState::InText);
                    Step::Next
                }
                _ => self.recover_close(sink, c, at),
            },

            LexState::AfterTagCloseName => match class {
                CharClass::Whitespace => Step::Next,
                CharClass::CloseBracket => {
                    self.emit_tag_close(sink, Span::new(self.start.offset, at.offset + 1));
                    self.set_state(LexState::InText);
                    Step::Next
                }
                _ => self.recover_close(sink, c, at),
            },
        }
    }

    /// Unexpected character inside a start tag: complete the tag as written,
    /// then reconsume as text.
    fn recover<S: TokenSink>(&mut self, sink: &mut S, c: char, at: Location) -> Step {
        let message = format!("unexpected {c:?} in {}; tag closed, resuming as text", self.state);
        self.diagnose(sink, DiagnosticKind::UnexpectedCharacter, message, char_span(c, at), at);
        if self.tag_open {
            self.end_start_tag(sink, TokenKind::TagOpenEnd, Span::point(at.offset));
        }
        self.set_state(LexState::InText);
        Step::Reconsume
    }

    fn recover_close<S: TokenSink>(&mut self, sink: &mut S, c: char, at: Location) -> Step {
        let message = format!("unexpected {c:?} in close tag; tag closed, resuming as text");
        self.diagnose(sink, DiagnosticKind::UnexpectedCharacter, message, char_span(c, at), at);
        self.emit_tag_close(sink, Span::new(self.start.offset, at.offset));
        self.set_state(LexState::InText);
        Step::Reconsume
    }

    #[inline]
    fn set_state(&mut self, state: LexState) {
        log::trace!(target: "tagstream::tokenizer", "state {} -> {} at {}", self.state, state, self.loc.offset);
        self.state = state;
    }

    fn fold(&self, name: String) -> String {
        if self.case_insensitive {
            name.to_lowercase()
        } else {
            name
        }
    }

    fn emit<S: TokenSink>(&mut self, sink: &mut S, kind: TokenKind, raw: String, span: Span) {
        let token = Token::new(kind, raw, span, self.start);
        log::trace!(target: "tagstream::tokenizer", "emit token: {token:?}");
        sink.token(token);
    }

    fn emit_buf<S: TokenSink>(&mut self, sink: &mut S, kind: TokenKind, span: Span) {
        let raw = mem::take(&mut self.buf);
        self.emit(sink, kind, raw, span);
    }

    fn flush_text<S: TokenSink>(&mut self, sink: &mut S, end: usize) {
        if !self.buf.is_empty() {
            self.emit_buf(sink, TokenKind::Text, Span::new(self.start.offset, end));
        }
    }

    fn emit_tag_open<S: TokenSink>(&mut self, sink: &mut S, end: usize) {
        let raw = mem::take(&mut self.buf);
        let name = self.fold(raw);
        self.emit(sink, TokenKind::TagOpen, name, Span::new(self.start.offset, end));
        self.tag_open = true;
    }

    fn emit_tag_close<S: TokenSink>(&mut self, sink: &mut S, span: Span) {
        let raw = mem::take(&mut self.buf);
        let name = self.fold(raw);
        self.emit(sink, TokenKind::TagClose, name, span);
    }

    fn emit_attr_name<S: TokenSink>(&mut self, sink: &mut S, end: usize) {
        let raw = mem::take(&mut self.buf);
        let name = self.fold(raw);
        self.attr_name.clone_from(&name);
        self.emit(sink, TokenKind::AttributeName, name, Span::new(self.start.offset, end));
    }

    /// `<input disabled>`: the value is the attribute's own name.
    fn emit_valueless<S: TokenSink>(&mut self, sink: &mut S, at: usize) {
        let value = self.attr_name.clone();
        self.emit(sink, TokenKind::AttributeValue, value, Span::point(at));
    }

    fn end_start_tag<S: TokenSink>(&mut self, sink: &mut S, kind: TokenKind, span: Span) {
        self.emit(sink, kind, String::new(), span);
        self.tag_open = false;
        self.set_state(LexState::InText);
    }

    fn diagnose<S: TokenSink>(
        &mut self,
        sink: &mut S,
        kind: DiagnosticKind,
        message: impl Into<String>,
        span: Span,
        at: Location,
    ) {
        let diagnostic = Diagnostic::new(kind, message, span, at);
        log::debug!(target: "tagstream::tokenizer", "{diagnostic}");
        sink.diagnostic(diagnostic);
    }

    fn unterminated<S: TokenSink>(&mut self, sink: &mut S, what: &str) {
        let at = self.loc;
        let span = Span::new(self.start.offset, at.offset);
        self.diagnose(sink, DiagnosticKind::UnterminatedToken, format!("input ended inside {what}"), span, at);
    }
}

#[inline]
fn char_span(c: char, at: Location) -> Span {
    Span::new(at.offset, at.offset + c.len_utf8())
}

/// Could `s` still grow into `--`, `[CDATA[` or `DOCTYPE`?
fn is_declaration_prefix(s: &str) -> bool {
    "--".starts_with(s)
        || "[CDATA[".starts_with(s)
        || "DOCTYPE".get(..s.len()).is_some_and(|p| p.eq_ignore_ascii_case(s))
}
