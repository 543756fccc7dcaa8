//! An incremental JSON scanner and a selective visitor that walks a runtime
//! [`Schema`] alongside it, materializing only the substructures the schema
//! selects and skipping the rest in constant memory.
//!
//! ```
//! # use streamjson_core::{visit, Schema};
//! # use futures_util::stream;
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let schema = Schema::array(Schema::leaf(|v| async move {
//!     println!("{v}");
//!     Ok(())
//! }));
//! let source = stream::iter([Ok::<_, std::convert::Infallible>("[1,2,3]".to_string())]);
//! visit::<_, std::convert::Infallible>(source, &schema).await.unwrap();
//! # }
//! ```
//!
//! Data flow: chunks arrive, the [`scanner`] turns them into tokens, the
//! [`buffered`] stream pairs those tokens with a selectable capture window,
//! and the [`visitor`] automaton walks a [`Schema`] against them, buffering
//! only what a callback will see and skipping the rest.
#![cfg_attr(feature = "docs", doc = simple_mermaid::mermaid!("../docs/diagrams/pipeline.mmd"))]

#![deny(
    unsafe_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

pub mod buffered;
pub mod config;
pub mod error;
pub mod scanner;
pub mod schema;
pub mod visitor;

pub use buffered::{BufferedTokenStream, StreamError};
pub use config::{LexerCapacityHint, RecursionGuard, VisitConfig};
pub use error::{CallbackError, SyntaxError, VisitError};
pub use scanner::{Scanner, Token, TokenKind};
pub use schema::{BoxFuture, Schema};
pub use visitor::{visit, visit_with_config};
