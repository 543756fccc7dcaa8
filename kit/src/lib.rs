//! Facade crate: re-exports [`streamjson_core`] under the `streamjson` name.

#![deny(
    unsafe_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]
pub use streamjson_core::*;
