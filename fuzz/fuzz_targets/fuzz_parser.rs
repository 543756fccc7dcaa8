#![no_main]

use std::cell::RefCell;
use std::rc::Rc;

use arbitrary::Arbitrary;
use futures_util::stream;
use libfuzzer_sys::fuzz_target;
use streamjson_core::{Schema, visit};

#[derive(Debug, Arbitrary)]
struct FuzzInput {
    text: String,
    cuts: Vec<u8>,
}

fn split_at_char_boundaries(text: &str, cuts: &[u8]) -> Vec<String> {
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

    points
        .windows(2)
        .map(|w| text[w[0]..w[1]].to_string())
        .collect()
}

fuzz_target!(|input: FuzzInput| {
    // `visit` must never panic, regardless of how the document is chunked or
    // whether it is even valid JSON; it must only ever return Ok or a
    // well-formed Err.
    let chunks = split_at_char_boundaries(&input.text, &input.cuts);
    let count = Rc::new(RefCell::new(0usize));
    let count2 = count.clone();
    let schema = Schema::leaf(move |_value| {
        let count = count2.clone();
        async move {
            *count.borrow_mut() += 1;
            Ok(())
        }
    });

    let rt = match tokio::runtime::Builder::new_current_thread().build() {
        Ok(rt) => rt,
        Err(_) => return,
    };
    rt.block_on(async {
        let source = stream::iter(chunks.into_iter().map(Ok::<_, std::convert::Infallible>));
        let _ = visit::<_, std::convert::Infallible>(source, &schema).await;
    });
});
