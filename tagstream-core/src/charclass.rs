//! Character classification.
//!
//! Every code point maps to exactly one [`CharClass`]. The state machine
//! drives its transitions from the class plus the current state, and only
//! looks at the concrete character for the handful of punctuation marks the
//! classes lump into [`CharClass::Other`] (`/`, `=`, `!`, `?`).
//!
//! Name characters follow XML 1.0 (fifth edition) `NameStartChar` and
//! `NameChar`.

use std::collections::HashMap;

/// Semantic class of a single code point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharClass {
    /// May start a tag or attribute name.
    NameStart,
    /// May continue a name but not start one (digits, `-`, `.`, combining marks).
    NameChar,
    /// Space, tab, carriage return, line feed.
    Whitespace,
    /// `"` or `'`.
    Quote,
    /// `<`
    OpenBracket,
    /// `>`
    CloseBracket,
    /// `&`
    Ampersand,
    Other,
}

impl CharClass {
    /// True for both name-start and name-continue characters.
    #[inline]
    pub fn is_name_char(self) -> bool {
        matches!(self, CharClass::NameStart | CharClass::NameChar)
    }
}

/// Classify a code point. Total over `0..=0x10FFFF`; surrogates and values
/// past the Unicode range classify as [`CharClass::Other`].
pub fn classify(code_point: u32) -> CharClass {
    match char::from_u32(code_point) {
        Some(c) => classify_char(c),
        None => CharClass::Other,
    }
}

/// Classify a `char`.
#[inline]
pub fn classify_char(c: char) -> CharClass {
    if c.is_ascii() {
        ASCII_TABLE[c as usize]
    } else {
        classify_non_ascii(c)
    }
}

fn classify_non_ascii(c: char) -> CharClass {
    if is_name_start_non_ascii(c) {
        CharClass::NameStart
    } else if matches!(c, '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}') {
        CharClass::NameChar
    } else {
        CharClass::Other
    }
}

fn is_name_start_non_ascii(c: char) -> bool {
    matches!(c,
        '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

const fn build_ascii_table() -> [CharClass; 128] {
    let mut table = [CharClass::Other; 128];
    let mut i = 0;
    while i < 128 {
        let b = i as u8;
        table[i] = match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'_' | b':' => CharClass::NameStart,
            b'0'..=b'9' | b'-' | b'.' => CharClass::NameChar,
            b' ' | b'\t' | b'\r' | b'\n' => CharClass::Whitespace,
            b'"' | b'\'' => CharClass::Quote,
            b'<' => CharClass::OpenBracket,
            b'>' => CharClass::CloseBracket,
            b'&' => CharClass::Ampersand,
            _ => CharClass::Other,
        };
        i += 1;
    }
    table
}

static ASCII_TABLE: [CharClass; 128] = build_ascii_table();

/// Per-tokenizer classifier.
///
/// ASCII goes through the static table; non-ASCII results are memoized in a
/// cache owned by this instance, filled on first use.
#[derive(Debug, Default)]
pub struct Classifier {
    cache: HashMap<char, CharClass>,
}

impl Classifier {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn classify(&mut self, c: char) -> CharClass {
        if c.is_ascii() {
            return ASCII_TABLE[c as usize];
        }
        *self.cache.entry(c).or_insert_with(|| classify_non_ascii(c))
    }

    /// Number of memoized non-ASCII code points.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}
