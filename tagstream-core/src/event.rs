//! Parser events - what the dispatcher hands to registered handlers.
//!
//! SAX-style: events fire as nodes complete, in document order. Structure is
//! represented by `OpenTag`/`CloseTag` pairs; every `OpenTag` is eventually
//! matched by exactly one `CloseTag`, including self-closing elements and
//! elements closed by recovery.
//!
//! For `<a href="x">hi</a>`:
//! ```text
//! OpenTagStart("a")
//! Attribute("href", "x")
//! OpenTag("a", [href="x"])
//! Text("hi")
//! CloseTag("a")
//! ```

use strum_macros::{Display, EnumCount, EnumIter, EnumString, IntoStaticStr};

use crate::error::Diagnostic;
use crate::span::Span;
use crate::tree::Attribute;

/// Event names handlers register under.
///
/// Parses from the bare name (`"opentag"`) or the callback-style name
/// (`"onopentag"`), case-insensitively.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, EnumIter, EnumCount,
)]
#[strum(ascii_case_insensitive)]
pub enum EventKind {
    #[strum(to_string = "opentagstart", serialize = "onopentagstart")]
    OpenTagStart,
    #[strum(to_string = "attribute", serialize = "onattribute")]
    Attribute,
    #[strum(to_string = "opentag", serialize = "onopentag")]
    OpenTag,
    #[strum(to_string = "closetag", serialize = "onclosetag")]
    CloseTag,
    #[strum(to_string = "text", serialize = "ontext")]
    Text,
    #[strum(to_string = "comment", serialize = "oncomment")]
    Comment,
    #[strum(to_string = "cdata", serialize = "oncdata")]
    Cdata,
    #[strum(to_string = "processinginstruction", serialize = "onprocessinginstruction")]
    ProcessingInstruction,
    #[strum(to_string = "doctype", serialize = "ondoctype")]
    Doctype,
    #[strum(to_string = "error", serialize = "onerror")]
    Error,
    #[strum(to_string = "end", serialize = "onend")]
    End,
}

impl EventKind {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// A parser event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Start tag name read; attributes follow.
    OpenTagStart { name: String, span: Span },

    /// One attribute of the pending start tag, entity-decoded.
    Attribute { name: String, value: String, span: Span },

    /// Start tag complete; the element is now the innermost open element.
    OpenTag {
        name: String,
        attributes: Vec<Attribute>,
        self_closing: bool,
        span: Span,
    },

    /// Element closed, by its close tag, by `/>`, or by recovery.
    CloseTag { name: String, span: Span },

    /// Character data with entity references decoded.
    Text { content: String, span: Span },

    /// `<!-- content -->`
    Comment { content: String, span: Span },

    /// `<![CDATA[ content ]]>`
    Cdata { content: String, span: Span },

    /// `<?target body?>`
    ProcessingInstruction { target: String, body: String, span: Span },

    /// `<!DOCTYPE content>`
    Doctype { content: String, span: Span },

    /// A diagnostic was raised.
    Error(Diagnostic),

    /// `close()` finished and every element is closed.
    End,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::OpenTagStart { .. } => EventKind::OpenTagStart,
            Event::Attribute { .. } => EventKind::Attribute,
            Event::OpenTag { .. } => EventKind::OpenTag,
            Event::CloseTag { .. } => EventKind::CloseTag,
            Event::Text { .. } => EventKind::Text,
            Event::Comment { .. } => EventKind::Comment,
            Event::Cdata { .. } => EventKind::Cdata,
            Event::ProcessingInstruction { .. } => EventKind::ProcessingInstruction,
            Event::Doctype { .. } => EventKind::Doctype,
            Event::Error(_) => EventKind::Error,
            Event::End => EventKind::End,
        }
    }

    /// Source span, if the event has one.
    pub fn span(&self) -> Option<Span> {
        match self {
            Event::OpenTagStart { span, .. }
            | Event::Attribute { span, .. }
            | Event::OpenTag { span, .. }
            | Event::CloseTag { span, .. }
            | Event::Text { span, .. }
            | Event::Comment { span, .. }
            | Event::Cdata { span, .. }
            | Event::ProcessingInstruction { span, .. }
            | Event::Doctype { span, .. } => Some(*span),
            Event::Error(d) => Some(d.span),
            Event::End => None,
        }
    }

    /// Element name for tag events.
    pub fn name(&self) -> Option<&str> {
        match self {
            Event::OpenTagStart { name, .. }
            | Event::OpenTag { name, .. }
            | Event::CloseTag { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Event::Error(_))
    }
}
