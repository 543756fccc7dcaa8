//! `json-extract <path>` reads a JSON document from stdin and prints every
//! value matched by `<path>` (a dotted path, `*` for "every array element"),
//! one per line, as it is found — without ever materializing the document.
//!
//! ```text
//! $ curl -s https://example.com/big.json | json-extract 'results.*.id'
//! ```

use std::process::ExitCode;

use json_extract::{Selector, extract};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    env_logger::init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: json-extract <dotted.path.with.*.for.arrays>");
        return ExitCode::FAILURE;
    };
    let Some(selector) = Selector::parse(&path) else {
        eprintln!("empty selector path");
        return ExitCode::FAILURE;
    };

    match extract(tokio::io::stdin(), 8192, &selector).await {
        Ok(values) => {
            for value in values {
                println!("{value}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("json-extract: {err}");
            ExitCode::FAILURE
        }
    }
}
