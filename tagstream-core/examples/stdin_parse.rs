//! Stream stdin through the parser in 4 KiB chunks and print every event.

use std::io::Read;

use strum::IntoEnumIterator;
use tagstream_core::{EventKind, Parser, ParserOptions};

fn main() {
    let mut parser = Parser::new(ParserOptions::default());
    for kind in EventKind::iter() {
        parser.on(kind, |event| {
            eprintln!("EVENT: {:?}", event);
            Ok(())
        });
    }

    let mut stdin = std::io::stdin().lock();
    let mut buf = [0u8; 4096];
    loop {
        let n = stdin.read(&mut buf).unwrap();
        if n == 0 {
            break;
        }
        parser.feed(&buf[..n]).unwrap();
    }
    parser.close().unwrap();
}
