//! Parse stdin into a tree, drop comments, print it back as markup.

use std::io::Read;

use tagstream_core::{walk, Document, FnVisitor, NodeKind, ParserOptions};

fn main() {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input).unwrap();

    let (mut doc, diagnostics) = Document::parse_recovering(&input, ParserOptions::default());
    for diagnostic in &diagnostics {
        eprintln!("{}", diagnostic);
    }

    let root = doc.root_id();
    walk(
        &mut doc,
        root,
        &mut FnVisitor::on_enter(|cx, visit| {
            if matches!(cx.document().kind(visit.node), Some(NodeKind::Comment(_))) {
                cx.remove();
            }
        }),
    )
    .unwrap();

    println!("{}", doc.to_markup());
}
