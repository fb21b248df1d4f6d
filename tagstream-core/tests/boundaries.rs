//! Boundary tests: chunk splitting and end of input
//!
//! Tests that the parser handles:
//! 1. Input split into two chunks at every byte offset, including offsets
//!    inside multi-byte characters
//! 2. Input fed one byte at a time
//! 3. End of input at every byte offset (unterminated constructs)
//!
//! These tests catch issues like:
//! - Text runs emitted in pieces when a chunk ends mid-run
//! - Lost or duplicated bytes of a split UTF-8 sequence
//! - Names or attribute values cut in two by a chunk boundary

mod common;

use common::{collect_events, load_fixtures_by_name};
use pretty_assertions::assert_eq;
use tagstream_core::{Document, Parser, ParserOptions};

const SAMPLES: &[&str] = &[
    "<a><b/></a>",
    "<a><b></a>",
    "<p class=\"x y\" id='z' hidden>one &amp; two&#33;</p>",
    "<?xml version=\"1.0\"?><!DOCTYPE r [<!ENTITY e \"v\">]><r><!-- c --><![CDATA[<&>]]></r>",
    "<données lang=\"fr\">été — “quoted” 😀</données>",
    "\u{FEFF}<root>\n  <item n=1/>\n  <item n=2/>\n</root>\n",
    "<a>fish & chips < 3</a>",
    "<a x=\"unterminated",
    "<a><!-- never closed",
    "<x></x y><z",
];

fn whole(input: &[u8]) -> Vec<String> {
    collect_events(&[input], ParserOptions::default())
}

fn tree_markup(chunks: &[&[u8]]) -> String {
    let mut parser = Parser::with_tree(ParserOptions::default());
    parser.on(tagstream_core::EventKind::Error, |_| Ok(()));
    for &chunk in chunks {
        parser.feed(chunk).unwrap();
    }
    parser.close().unwrap();
    parser.into_document().unwrap_or_default().to_markup()
}

#[test]
fn test_every_two_chunk_split() {
    for input in SAMPLES {
        let bytes = input.as_bytes();
        let expected = whole(bytes);
        for at in 0..=bytes.len() {
            let (head, tail) = bytes.split_at(at);
            let actual = collect_events(&[head, tail], ParserOptions::default());
            assert_eq!(actual, expected, "input {input:?} split at byte {at}");
        }
    }
}

#[test]
fn test_byte_at_a_time() {
    for input in SAMPLES {
        let bytes = input.as_bytes();
        let chunks: Vec<&[u8]> = bytes.chunks(1).collect();
        assert_eq!(collect_events(&chunks, ParserOptions::default()), whole(bytes), "input {input:?}");
    }
}

#[test]
fn test_tree_is_chunk_invariant() {
    for input in SAMPLES {
        let bytes = input.as_bytes();
        let expected = tree_markup(&[bytes]);
        for size in [1, 2, 3, 5, 8] {
            let chunks: Vec<&[u8]> = bytes.chunks(size).collect();
            assert_eq!(tree_markup(&chunks), expected, "input {input:?} in chunks of {size}");
        }
    }
}

#[test]
fn test_fixtures_split_everywhere() {
    for name in ["elements", "attributes", "text", "markup", "recovery", "options"] {
        for case in load_fixtures_by_name(name) {
            let bytes = case.input.as_bytes();
            let options = case.options.to_options();
            let expected = collect_events(&[bytes], options.clone());
            for at in 0..=bytes.len() {
                let (head, tail) = bytes.split_at(at);
                let actual = collect_events(&[head, tail], options.clone());
                assert_eq!(actual, expected, "{}::{} split at byte {}", name, case.id, at);
            }
        }
    }
}

#[test]
fn test_eof_at_every_position_never_panics() {
    for input in SAMPLES {
        let bytes = input.as_bytes();
        for end in 0..=bytes.len() {
            let events = whole(&bytes[..end]);
            let opens = events.iter().filter(|e| e.starts_with("opentag ")).count();
            let closes = events.iter().filter(|e| e.starts_with("closetag ")).count();
            assert_eq!(opens, closes, "input {:?} cut at byte {}", input, end);
        }
    }
}

#[test]
fn test_multibyte_split_inside_name_and_value() {
    // "é" is two bytes; split between them in a tag name and in a value.
    let input = "<é a=\"é\">é</é>".as_bytes();
    let expected = whole(input);
    assert_eq!(expected, vec![
        "opentag \"é a=\\\"é\\\"\"",
        "text \"é\"",
        "closetag \"é\"",
    ]);
    let splits = [2, 8, 12];
    for at in splits {
        assert!(std::str::from_utf8(&input[..at]).is_err(), "byte {at} should be inside a character");
        let (head, tail) = input.split_at(at);
        assert_eq!(collect_events(&[head, tail], ParserOptions::default()), expected);
    }
}

#[test]
fn test_recovering_parse_of_truncated_input() {
    let (doc, diagnostics) = Document::parse_recovering("<a><b>text", ParserOptions::default());
    assert_eq!(doc.to_markup(), "<a><b>text</b></a>");
    assert_eq!(diagnostics.len(), 1);
}
