#![allow(dead_code)]

use jindo_syntax::{File, SyntaxError, format, parse_collect, parse_str};

pub fn parse_ok(src: &str) -> File {
    parse_str("test.jd", src)
        .unwrap_or_else(|e| panic!("parse failed: {e}\n--- source ---\n{src}"))
}

/// Parses with a handler and returns the tree and every diagnostic.
pub fn parse_all(src: &str) -> (File, Vec<SyntaxError>) {
    let (result, errors) = parse_collect("test.jd", src);
    let file = result.unwrap_or_else(|e| panic!("fatal: {e}\n--- source ---\n{src}"));
    (file, errors)
}

/// Diagnostic messages without positions.
pub fn messages(src: &str) -> Vec<String> {
    parse_all(src).1.into_iter().map(|e| e.msg).collect()
}

/// Formats `src`, re-parses the output and asserts the second formatting
/// is identical to the first.
pub fn assert_idempotent(src: &str) -> String {
    let once = format(&parse_ok(src));
    let reparsed = parse_str("test.jd", &once).unwrap_or_else(|e| {
        panic!(
            "failed to re-parse formatted output: {e}\n\
             --- formatted ---\n{once}"
        )
    });
    let twice = format(&reparsed);
    assert_eq!(
        once, twice,
        "formatting is not idempotent:\n--- first ---\n{once}\n--- second ---\n{twice}"
    );
    once
}
