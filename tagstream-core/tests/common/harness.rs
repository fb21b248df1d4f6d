//! Test harness: run fixtures through the parser and compare event streams.

use std::cell::RefCell;

use strum::IntoEnumIterator;
use tagstream_core::{Event, EventKind, Parser, ParserOptions};

use super::generators::Gen;
use super::loader::{ExpectedEvent, TestCase};

/// Result of running a test case.
#[derive(Debug)]
pub struct TestResult {
    pub passed: bool,
    pub input: String,
    pub expected: Vec<String>,
    pub actual: Vec<String>,
    pub chunks: Option<Vec<Vec<u8>>>,
    pub seed: Option<u64>,
}

impl TestResult {
    pub fn print_failure(&self, id: &str) {
        eprintln!("\n=== FAILED: {} ===", id);
        eprintln!("Input:\n{:?}", self.input);
        if let Some(chunks) = &self.chunks {
            let shown: Vec<String> = chunks.iter().map(|c| format!("{:?}", String::from_utf8_lossy(c))).collect();
            eprintln!("Chunks: [{}]", shown.join(", "));
        }
        if let Some(seed) = self.seed {
            eprintln!("Seed: {} (set TAGSTREAM_TEST_SEED={} to reproduce)", seed, seed);
        }
        eprintln!("\nExpected:");
        for e in &self.expected {
            eprintln!("  {}", e);
        }
        eprintln!("\nActual:");
        for e in &self.actual {
            eprintln!("  {}", e);
        }
    }
}

/// Format an event for comparison. Spans are ignored.
///
/// `opentagstart`, `attribute` and `end` are left out: they are implied by
/// `opentag` and by the end of the list.
pub fn format_event(event: &Event) -> Option<String> {
    let line = match event {
        Event::OpenTagStart { .. } | Event::Attribute { .. } | Event::End => return None,
        Event::OpenTag { name, attributes, .. } => {
            let mut content = name.clone();
            for attr in attributes {
                content.push_str(&format!(" {}=\"{}\"", attr.name, attr.value));
            }
            format!("opentag {:?}", content)
        }
        Event::CloseTag { name, .. } => format!("closetag {:?}", name),
        Event::Text { content, .. } => format!("text {:?}", content),
        Event::Comment { content, .. } => format!("comment {:?}", content),
        Event::Cdata { content, .. } => format!("cdata {:?}", content),
        Event::ProcessingInstruction { target, body, .. } => {
            let content = if body.is_empty() {
                target.clone()
            } else {
                format!("{} {}", target, body)
            };
            format!("processinginstruction {:?}", content)
        }
        Event::Doctype { content, .. } => format!("doctype {:?}", content),
        Event::Error(diagnostic) => format!("error {:?}", format!("{:?}", diagnostic.kind)),
    };
    Some(line)
}

fn format_expected(event: &ExpectedEvent) -> String {
    match event {
        ExpectedEvent::Bare(name) => name.clone(),
        ExpectedEvent::WithContent(name, content) => format!("{} {:?}", name, content),
    }
}

/// Feed `chunks` to a fresh parser with a handler on every event, and
/// return the formatted events.
pub fn collect_events(chunks: &[&[u8]], options: ParserOptions) -> Vec<String> {
    let events = RefCell::new(Vec::new());
    let mut parser = Parser::new(options);
    for kind in EventKind::iter() {
        parser.on(kind, |event| {
            if let Some(line) = format_event(event) {
                events.borrow_mut().push(line);
            }
            Ok(())
        });
    }
    for &chunk in chunks {
        parser.feed(chunk).expect("error handler is registered");
    }
    parser.close().expect("error handler is registered");
    drop(parser);
    events.into_inner()
}

/// Run a test case with the whole input as one chunk.
pub fn run_test(case: &TestCase) -> TestResult {
    let expected: Vec<String> = case.events.iter().map(format_expected).collect();
    let actual = collect_events(&[case.input.as_bytes()], case.options.to_options());
    TestResult {
        passed: actual == expected,
        input: case.input.clone(),
        expected,
        actual,
        chunks: None,
        seed: None,
    }
}

/// Run a test case split into random chunks.
///
/// Chunking must not change anything observable, so this is an exact match
/// against the fixture's events.
pub fn run_with_variations(case: &TestCase, gen: &mut Gen) -> TestResult {
    let expected: Vec<String> = case.events.iter().map(format_expected).collect();
    let chunks = gen.chunks(case.input.as_bytes());
    let actual = collect_events(&chunks, case.options.to_options());
    TestResult {
        passed: actual == expected,
        input: case.input.clone(),
        expected,
        actual,
        chunks: Some(chunks.iter().map(|c| c.to_vec()).collect()),
        seed: Some(gen.seed),
    }
}
