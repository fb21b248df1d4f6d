//! Entity references: `&amp;`, `&#169;`, `&#xA9;`.
//!
//! Named entities come from a compile-time table: the five XML entities plus
//! the HTML names that show up in hand-written markup.

use std::borrow::Cow;
use std::ops::Range;

use memchr::memchr;
use phf::phf_map;

use crate::charclass::classify_char;

static NAMED: phf::Map<&'static str, &'static str> = phf_map! {
    // XML
    "amp" => "&",
    "lt" => "<",
    "gt" => ">",
    "quot" => "\"",
    "apos" => "'",
    // HTML
    "nbsp" => "\u{A0}",
    "iexcl" => "\u{A1}",
    "cent" => "\u{A2}",
    "pound" => "\u{A3}",
    "yen" => "\u{A5}",
    "sect" => "\u{A7}",
    "copy" => "\u{A9}",
    "laquo" => "\u{AB}",
    "not" => "\u{AC}",
    "shy" => "\u{AD}",
    "reg" => "\u{AE}",
    "deg" => "\u{B0}",
    "plusmn" => "\u{B1}",
    "micro" => "\u{B5}",
    "para" => "\u{B6}",
    "middot" => "\u{B7}",
    "raquo" => "\u{BB}",
    "frac12" => "\u{BD}",
    "iquest" => "\u{BF}",
    "times" => "\u{D7}",
    "divide" => "\u{F7}",
    "ndash" => "\u{2013}",
    "mdash" => "\u{2014}",
    "lsquo" => "\u{2018}",
    "rsquo" => "\u{2019}",
    "ldquo" => "\u{201C}",
    "rdquo" => "\u{201D}",
    "bull" => "\u{2022}",
    "hellip" => "\u{2026}",
    "prime" => "\u{2032}",
    "euro" => "\u{20AC}",
    "trade" => "\u{2122}",
    "larr" => "\u{2190}",
    "uarr" => "\u{2191}",
    "rarr" => "\u{2192}",
    "darr" => "\u{2193}",
    "harr" => "\u{2194}",
    "minus" => "\u{2212}",
    "infin" => "\u{221E}",
    "ne" => "\u{2260}",
    "le" => "\u{2264}",
    "ge" => "\u{2265}",
};

/// Resolve the name between `&` and `;`.
///
/// Named lookups try the exact spelling first, then lowercase.
/// Numeric references must be non-empty, in range and not NUL or a
/// surrogate.
pub fn resolve(name: &str) -> Option<Cow<'static, str>> {
    if let Some(digits) = name.strip_prefix('#') {
        return resolve_numeric(digits).map(|c| Cow::Owned(c.to_string()));
    }
    if let Some(value) = NAMED.get(name) {
        return Some(Cow::Borrowed(*value));
    }
    if name.bytes().any(|b| b.is_ascii_uppercase()) {
        return NAMED.get(name.to_ascii_lowercase().as_str()).map(|v| Cow::Borrowed(*v));
    }
    None
}

fn resolve_numeric(digits: &str) -> Option<char> {
    let (digits, radix) = match digits.strip_prefix(['x', 'X']) {
        Some(hex) => (hex, 16),
        None => (digits, 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let value = u32::from_str_radix(digits, radix).ok()?;
    if value == 0 {
        return None;
    }
    char::from_u32(value)
}

/// True for characters allowed between `&` and `;`.
#[inline]
pub fn is_entity_char(c: char) -> bool {
    c == '#' || classify_char(c).is_name_char()
}

/// Decode every well-formed reference in an attribute value.
///
/// A `&` that does not start `&name;` stays literal. Well-formed references
/// with unknown names stay literal too and are reported through `on_unknown`
/// with their byte range in `raw` (including `&` and `;`).
pub fn decode_value<'a>(raw: &'a str, mut on_unknown: impl FnMut(Range<usize>, &str)) -> Cow<'a, str> {
    let bytes = raw.as_bytes();
    let Some(first) = memchr(b'&', bytes) else {
        return Cow::Borrowed(raw);
    };

    let mut out = String::with_capacity(raw.len());
    out.push_str(&raw[..first]);
    let mut i = first;
    while i < bytes.len() {
        // bytes[i] == b'&'
        let rest = &raw[i + 1..];
        let name_len = rest
            .char_indices()
            .find(|&(_, c)| !is_entity_char(c))
            .map_or(rest.len(), |(idx, _)| idx);
        let name = &rest[..name_len];
        let terminated = rest[name_len..].starts_with(';');

        let next_start = if terminated && !name.is_empty() {
            let end = i + 1 + name_len + 1;
            match resolve(name) {
                Some(value) => out.push_str(&value),
                None => {
                    on_unknown(i..end, name);
                    out.push_str(&raw[i..end]);
                }
            }
            end
        } else {
            out.push('&');
            i + 1
        };

        match memchr(b'&', &bytes[next_start..]) {
            Some(rel) => {
                out.push_str(&raw[next_start..next_start + rel]);
                i = next_start + rel;
            }
            None => {
                out.push_str(&raw[next_start..]);
                break;
            }
        }
    }
    Cow::Owned(out)
}
