#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use streamjson_core::scanner::{Scanner, TokenKind};

/// Fuzz input: a candidate document plus a handful of byte offsets used to
/// cut it into chunks at arbitrary (not necessarily char-boundary) points.
#[derive(Debug, Arbitrary)]
struct FuzzInput {
    text: String,
    cuts: Vec<u8>,
}

fn split_at_char_boundaries(text: &str, cuts: &[u8]) -> Vec<&str> {
    let len = text.len();
    if len == 0 {
        return Vec::new();
    }
    let mut points: Vec<usize> = cuts
        .iter()
        .map(|&c| {
            let mut p = (c as usize) % (len + 1);
            while p < len && !text.is_char_boundary(p) {
                p += 1;
            }
            p
        })
        .collect();
    points.push(0);
    points.push(len);
    points.sort_unstable();
    points.dedup();

    let mut out = Vec::with_capacity(points.len());
    for w in points.windows(2) {
        out.push(&text[w[0]..w[1]]);
    }
    out
}

fn scan_kinds(chunks: &[&str]) -> Vec<TokenKind> {
    let mut scanner = Scanner::new();
    let mut kinds = Vec::new();
    for chunk in chunks {
        for tok in scanner.scan(Some(chunk)) {
            kinds.push(tok.kind);
        }
    }
    for tok in scanner.scan(None) {
        kinds.push(tok.kind);
    }
    kinds
}

fuzz_target!(|input: FuzzInput| {
    // The scanner's contract is that it never fails on any input; this target
    // exists to let libfuzzer try to disprove that, and to check split
    // invariance (chunking never changes the resulting token kind sequence).
    let whole = scan_kinds(&[input.text.as_str()]);

    let chunks = split_at_char_boundaries(&input.text, &input.cuts);
    let split = scan_kinds(&chunks);

    assert_eq!(
        whole, split,
        "chunking changed the token sequence for {:?} (cuts: {:?})",
        input.text, input.cuts
    );

    // A second end-of-stream call must never panic or resurrect a token.
    let mut scanner = Scanner::new();
    for chunk in &chunks {
        scanner.scan(Some(chunk));
    }
    scanner.scan(None);
    assert!(scanner.scan(None).is_empty());
});
