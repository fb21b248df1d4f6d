//! Source positions.
//!
//! Offsets are byte offsets into the decoded input stream, counted across
//! every chunk fed to the parser. Lines and columns are for humans and
//! start at 1; columns count code points, not bytes.

use std::fmt;
use std::ops::Range;

/// A half-open byte range `start..end` in the input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Zero-width span at `offset`.
    #[inline]
    pub fn point(offset: usize) -> Self {
        Self { start: offset, end: offset }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`.
    pub fn join(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Line/column position of a single code point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Location {
    /// Byte offset in the input stream.
    pub offset: usize,
    /// 1-based line number.
    pub line: u32,
    /// 1-based column, in code points.
    pub column: u32,
}

impl Location {
    pub fn new(offset: usize, line: u32, column: u32) -> Self {
        Self { offset, line, column }
    }

    /// Position of the next code point after `c`.
    #[inline]
    pub(crate) fn advance(&mut self, c: char) {
        self.offset += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    /// Advance over a run of text in one step.
    pub(crate) fn advance_str(&mut self, text: &str) {
        self.offset += text.len();
        let bytes = text.as_bytes();
        match memchr::memrchr(b'\n', bytes) {
            Some(last_nl) => {
                self.line += memchr::memchr_iter(b'\n', bytes).count() as u32;
                self.column = 1 + text[last_nl + 1..].chars().count() as u32;
            }
            None => self.column += text.chars().count() as u32,
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self { offset: 0, line: 1, column: 1 }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_basics() {
        let span = Span::new(3, 8);
        assert_eq!(span.len(), 5);
        assert!(!span.is_empty());
        assert!(Span::point(4).is_empty());
        assert_eq!(span.join(Span::new(1, 4)), Span::new(1, 8));
        assert_eq!(span.to_string(), "3..8");
    }

    #[test]
    fn test_location_advance_matches_advance_str() {
        let text = "ab\ncdé\n\nxyz";
        let mut by_char = Location::default();
        for c in text.chars() {
            by_char.advance(c);
        }
        let mut by_run = Location::default();
        by_run.advance_str(text);
        assert_eq!(by_char, by_run);
        assert_eq!(by_run.line, 4);
        assert_eq!(by_run.column, 4);
        assert_eq!(by_run.offset, text.len());
    }
}
