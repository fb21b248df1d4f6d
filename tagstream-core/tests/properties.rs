//! Property-based tests for the tagstream parser
//!
//! These tests verify structural invariants that must hold for ANY input,
//! not just carefully crafted examples. proptest generates random inputs and
//! shrinks failures to minimal cases.

mod common;

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use common::collect_events;
use proptest::prelude::*;
use tagstream_core::{walk, Document, FnVisitor, NodeId, NodeKind, ParserOptions};

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 100,
        max_shrink_iters: 100,
        timeout: 1000,
        ..ProptestConfig::default()
    }
}

// =============================================================================
// Test Helpers
// =============================================================================

/// A well-formed markup fragment.
#[derive(Debug, Clone)]
enum Frag {
    Text(String),
    Comment(String),
    Element {
        name: String,
        attributes: BTreeMap<String, String>,
        children: Vec<Frag>,
    },
}

fn escape(s: &str, quote: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' if !quote => out.push_str("&gt;"),
            '"' if quote => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn render(frags: &[Frag], out: &mut String) {
    for frag in frags {
        match frag {
            Frag::Text(text) => out.push_str(&escape(text, false)),
            Frag::Comment(text) => out.push_str(&format!("<!--{text}-->")),
            Frag::Element {
                name,
                attributes,
                children,
            } => {
                out.push('<');
                out.push_str(name);
                for (key, value) in attributes {
                    out.push_str(&format!(" {}=\"{}\"", key, escape(value, true)));
                }
                if children.is_empty() {
                    out.push_str("/>");
                } else {
                    out.push('>');
                    render(children, out);
                    out.push_str(&format!("</{name}>"));
                }
            }
        }
    }
}

fn frag_strategy() -> impl Strategy<Value = Frag> {
    let leaf = prop_oneof![
        // At least one letter: whitespace-only text between top-level nodes
        // is dropped by the parser.
        3 => "[a-zA-Z0-9 .,é<>&\"'\n]{0,6}[a-z][a-zA-Z0-9 .,é<>&\"'\n]{0,6}".prop_map(Frag::Text),
        1 => "[a-z ]{0,8}".prop_map(Frag::Comment),
    ];
    leaf.prop_recursive(4, 32, 5, |inner| {
        (
            "[a-z][a-z0-9]{0,4}",
            prop::collection::btree_map("[a-z][a-z0-9]{0,3}", "[a-z0-9 &<>\"']{0,6}", 0..3),
            prop::collection::vec(inner, 0..5),
        )
            .prop_map(|(name, attributes, children)| Frag::Element {
                name,
                attributes,
                children,
            })
    })
}

fn document_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(frag_strategy(), 0..4).prop_map(|frags| {
        let mut out = String::new();
        render(&frags, &mut out);
        out
    })
}

fn parse(input: &str) -> Document {
    let (doc, diagnostics) = Document::parse_recovering(input, ParserOptions::default());
    assert!(diagnostics.is_empty(), "unexpected diagnostics for {input:?}: {diagnostics:?}");
    doc
}

/// Structural shape of a subtree: kinds, names, attributes, child order.
fn shape(doc: &Document, id: NodeId, out: &mut String) {
    match doc.kind(id) {
        Some(NodeKind::Document) => out.push('#'),
        Some(NodeKind::Element { name, attributes, .. }) => {
            out.push_str(&format!("({name}"));
            for attr in attributes {
                out.push_str(&format!(" {}={:?}", attr.name, attr.value));
            }
        }
        Some(NodeKind::Text(text)) => out.push_str(&format!("{text:?}")),
        Some(NodeKind::Comment(text)) => out.push_str(&format!("<!{text:?}>")),
        None => out.push('?'),
    }
    for &child in doc.children_of(id) {
        out.push(' ');
        shape(doc, child, out);
    }
    if matches!(doc.kind(id), Some(NodeKind::Element { .. })) {
        out.push(')');
    }
}

fn shape_of(doc: &Document) -> String {
    let mut out = String::new();
    shape(doc, doc.root_id(), &mut out);
    out
}

/// (is_enter, node) for every walker callback.
fn walk_log(doc: &mut Document) -> Vec<(bool, NodeId)> {
    let log = RefCell::new(Vec::new());
    let root = doc.root_id();
    walk(
        doc,
        root,
        &mut FnVisitor::new(
            |_, visit| log.borrow_mut().push((true, visit.node)),
            |_, visit| log.borrow_mut().push((false, visit.node)),
        ),
    )
    .unwrap();
    log.into_inner()
}

fn count_nodes(doc: &Document, id: NodeId) -> usize {
    1 + doc.children_of(id).iter().map(|&c| count_nodes(doc, c)).sum::<usize>()
}

// =============================================================================
// Property: Parser Never Panics
// =============================================================================

proptest! {
    #![proptest_config(config())]

    /// The parser must never panic on any input, valid or invalid.
    #[test]
    fn parser_never_panics(input in prop::collection::vec(any::<u8>(), 0..1000)) {
        let _ = collect_events(&[input.as_slice()], ParserOptions::default());
    }

    /// Markup-heavy input reaches far more states than random bytes.
    #[test]
    fn parser_never_panics_markup(input in "[a-z<>/!?=&;#x\"' \\-\\[\\]\n]{0,300}") {
        let _ = collect_events(&[input.as_bytes()], ParserOptions::default());
        let _ = Document::parse_recovering(&input, ParserOptions::default().case_insensitive_names(true));
    }
}

// =============================================================================
// Property: Structural Balance
// =============================================================================

proptest! {
    #![proptest_config(config())]

    /// Every opentag is matched by exactly one closetag, and closes never
    /// outnumber opens at any point.
    #[test]
    fn open_and_close_are_balanced(input in "[a-c<>/=\" ]{0,200}") {
        let events = collect_events(&[input.as_bytes()], ParserOptions::default());
        let mut depth: i64 = 0;
        for event in &events {
            if event.starts_with("opentag ") {
                depth += 1;
            } else if event.starts_with("closetag ") {
                depth -= 1;
                prop_assert!(depth >= 0, "closetag without opentag in {:?}", events);
            }
        }
        prop_assert_eq!(depth, 0);
    }

    /// The same holds without mismatch recovery.
    #[test]
    fn balanced_without_recovery(input in "[a-c<>/ ]{0,200}") {
        let options = ParserOptions::default().recover_from_mismatched_tags(false);
        let events = collect_events(&[input.as_bytes()], options);
        let opens = events.iter().filter(|e| e.starts_with("opentag ")).count();
        let closes = events.iter().filter(|e| e.starts_with("closetag ")).count();
        prop_assert_eq!(opens, closes);
    }
}

// =============================================================================
// Property: Chunk-Split Invariance
// =============================================================================

proptest! {
    #![proptest_config(config())]

    /// Splitting the input anywhere, even inside a character, changes nothing.
    #[test]
    fn chunk_split_invariance(
        input in "[a-zé😀<>/!?=&;#\"' \\-\\[\\]]{0,120}",
        cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..6),
    ) {
        let bytes = input.as_bytes();
        let mut points: Vec<usize> = cuts.iter().map(|i| i.index(bytes.len() + 1)).collect();
        points.sort_unstable();
        let mut chunks = Vec::new();
        let mut start = 0;
        for at in points {
            chunks.push(&bytes[start..at]);
            start = at;
        }
        chunks.push(&bytes[start..]);

        let whole = collect_events(&[bytes], ParserOptions::default());
        let split = collect_events(&chunks, ParserOptions::default());
        prop_assert_eq!(split, whole);
    }
}

// =============================================================================
// Property: Walker
// =============================================================================

proptest! {
    #![proptest_config(config())]

    /// Every node is entered once and left once; a node is left only after
    /// all of its children were left, and entered before any of them.
    #[test]
    fn walker_visits_every_node_once(input in document_strategy()) {
        let mut doc = parse(&input);
        let log = walk_log(&mut doc);

        let mut entered = HashMap::new();
        let mut left = HashMap::new();
        for (position, &(is_enter, node)) in log.iter().enumerate() {
            let seen = if is_enter { &mut entered } else { &mut left };
            prop_assert!(seen.insert(node, position).is_none(), "{:?} visited twice", node);
        }
        let total = count_nodes(&doc, doc.root_id());
        prop_assert_eq!(entered.len(), total);
        prop_assert_eq!(left.len(), total);

        for (&node, &leave_at) in &left {
            prop_assert!(entered[&node] < leave_at);
            for child in doc.children_of(node) {
                prop_assert!(entered[&node] < entered[child]);
                prop_assert!(left[child] < leave_at);
            }
        }
    }

    /// Walking an unmodified tree twice yields the same visitation sequence.
    #[test]
    fn walk_is_idempotent(input in document_strategy()) {
        let mut doc = parse(&input);
        let first = walk_log(&mut doc);
        let second = walk_log(&mut doc);
        prop_assert_eq!(first, second);
    }
}

// =============================================================================
// Property: Round Trip
// =============================================================================

proptest! {
    #![proptest_config(config())]

    /// Serializing a parsed tree and parsing it again gives the same structure.
    #[test]
    fn serialize_then_parse_round_trips(input in document_strategy()) {
        let doc = parse(&input);
        let markup = doc.to_markup();
        let reparsed = parse(&markup);
        prop_assert_eq!(shape_of(&reparsed), shape_of(&doc));
        prop_assert_eq!(reparsed.to_markup(), markup);
    }

    /// Well-formed generated input already is in serialized form, except for
    /// quoting and escaping choices, so it survives one round unchanged.
    #[test]
    fn generated_markup_is_stable(input in document_strategy()) {
        let doc = parse(&input);
        prop_assert_eq!(doc.to_markup(), input);
    }
}
