#![deny(
    unsafe_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]

//! Field-extraction demo for `streamjson`.
//!
//! Illustrates the one thing the core crate deliberately stays out of:
//! turning a real byte source (here, anything implementing
//! `tokio::io::AsyncRead`) into the chunk stream `streamjson::visit` expects,
//! and describing which part of a document to pull out as a small path
//! language instead of writing a [`streamjson::Schema`] by hand.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use futures_util::stream::{self, Stream};
use tokio::io::{AsyncRead, AsyncReadExt};

use streamjson::{Schema, VisitConfig, VisitError};

/// A path into a JSON document: which arrays to descend into, which object
/// keys to follow, and where a value should be materialized.
///
/// Mirrors the three schema shapes `streamjson::Schema` itself has, but as a
/// plain data description a caller can build from a dotted path like
/// `"results.*.id"` (see [`Selector::parse`]) rather than nested closures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Materialize the value found here.
    Leaf,
    /// Descend into every element of an array.
    Array(Box<Selector>),
    /// Descend into one object key.
    Field(String, Box<Selector>),
}

impl Selector {
    /// Parses a dotted path such as `"items.*.id"` into a [`Selector`]:
    /// `*` descends into an array, any other segment is an object key, and
    /// the final segment is the leaf.
    ///
    /// Returns `None` for an empty path.
    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
        Self::from_segments(&segments)
    }

    fn from_segments(segments: &[&str]) -> Option<Self> {
        match segments.split_first() {
            None => Some(Selector::Leaf),
            Some((&"*", rest)) => Some(Selector::Array(Box::new(Self::from_segments(rest)?))),
            Some((&field, rest)) => Some(Selector::Field(
                field.to_string(),
                Box::new(Self::from_segments(rest)?),
            )),
        }
    }

    fn into_schema(&self, sink: Rc<RefCell<Vec<serde_json::Value>>>) -> Schema<'static> {
        match self {
            Selector::Leaf => Schema::leaf(move |value| {
                let sink = sink.clone();
                async move {
                    sink.borrow_mut().push(value);
                    Ok(())
                }
            }),
            Selector::Array(inner) => Schema::array(inner.into_schema(sink)),
            Selector::Field(name, inner) => {
                Schema::object([(name.clone(), inner.into_schema(sink))])
            }
        }
    }
}

/// Errors surfaced by [`extract`].
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The document didn't match `selector`, failed to parse, or the
    /// reader itself errored mid-stream.
    #[error("{0}")]
    Visit(#[from] VisitError<io::Error>),
}

/// Runs `selector` against the bytes read from `reader`, returning every
/// matched value in document order.
///
/// `chunk_size` is the read buffer size; it has no effect on correctness
/// (streamjson's tokenizer handles arbitrary chunk boundaries) only on how
/// often the reader is polled.
pub async fn extract<R>(
    reader: R,
    chunk_size: usize,
    selector: &Selector,
) -> Result<Vec<serde_json::Value>, ExtractError>
where
    R: AsyncRead + Unpin,
{
    extract_with_config(reader, chunk_size, selector, VisitConfig::default()).await
}

/// As [`extract`], but with an explicit [`VisitConfig`] (e.g. to bound the
/// buffered-byte budget when the source is untrusted).
pub async fn extract_with_config<R>(
    reader: R,
    chunk_size: usize,
    selector: &Selector,
    config: VisitConfig,
) -> Result<Vec<serde_json::Value>, ExtractError>
where
    R: AsyncRead + Unpin,
{
    let sink = Rc::new(RefCell::new(Vec::new()));
    let schema = selector.into_schema(sink.clone());
    let source = chunk_stream(reader, chunk_size);
    streamjson::visit_with_config(source, &schema, config).await?;
    let values = Rc::try_unwrap(sink)
        .map(RefCell::into_inner)
        .unwrap_or_else(|shared| shared.borrow().clone());
    Ok(values)
}

/// Turns an [`AsyncRead`] into the `Stream<Item = Result<String, io::Error>>`
/// `streamjson::visit` expects, reading up to `chunk_size` bytes at a time.
///
/// A read may land mid-codepoint; any incomplete trailing UTF-8 sequence is
/// held back and prefixed onto the next read rather than yielded, so every
/// chunk handed downstream is a valid `&str`.
pub fn chunk_stream<R>(reader: R, chunk_size: usize) -> impl Stream<Item = Result<String, io::Error>>
where
    R: AsyncRead + Unpin,
{
    let chunk_size = chunk_size.max(1);
    stream::unfold(Some((reader, Vec::new())), move |state| async move {
        let (mut reader, mut pending) = state?;
        let mut buf = vec![0u8; chunk_size];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) => {
                    if pending.is_empty() {
                        return None;
                    }
                    let err = io::Error::new(
                        io::ErrorKind::InvalidData,
                        "stream ended mid-codepoint",
                    );
                    return Some((Err(err), None));
                }
                Ok(n) => {
                    pending.extend_from_slice(&buf[..n]);
                    match std::str::from_utf8(&pending) {
                        Ok(s) => {
                            let chunk = s.to_string();
                            return Some((Ok(chunk), Some((reader, Vec::new()))));
                        }
                        Err(e) => {
                            let valid_to = e.valid_up_to();
                            if valid_to == 0 {
                                // Not enough bytes yet to decode even one codepoint; read more.
                                continue;
                            }
                            let rest = pending.split_off(valid_to);
                            let chunk = String::from_utf8(pending)
                                .unwrap_or_else(|_| String::new());
                            return Some((Ok(chunk), Some((reader, rest))));
                        }
                    }
                }
                Err(e) => return Some((Err(e), None)),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_selector_path() {
        assert_eq!(Selector::parse(""), Some(Selector::Leaf));
        assert_eq!(
            Selector::parse("items.*.id"),
            Some(Selector::Field(
                "items".to_string(),
                Box::new(Selector::Array(Box::new(Selector::Field(
                    "id".to_string(),
                    Box::new(Selector::Leaf)
                ))))
            ))
        );
    }

    #[tokio::test]
    async fn extracts_one_field_per_array_element() {
        let doc = br#"[{"id":1,"skip":"aaaa"},{"id":2,"skip":"bbbb"}]"#;
        let selector = Selector::parse("*.id").unwrap();
        let values = extract(&doc[..], 5, &selector).await.unwrap();
        assert_eq!(values, vec![serde_json::json!(1), serde_json::json!(2)]);
    }

    #[tokio::test]
    async fn extracts_nested_field_path() {
        let doc = br#"{"results":[{"user":{"name":"Ada"}},{"user":{"name":"Grace"}}]}"#;
        let selector = Selector::parse("results.*.user.name").unwrap();
        let values = extract(&doc[..], 7, &selector).await.unwrap();
        assert_eq!(values, vec![serde_json::json!("Ada"), serde_json::json!("Grace")]);
    }

    #[tokio::test]
    async fn chunk_reads_split_a_multibyte_character() {
        // "café" has a 2-byte UTF-8 character; force 1-byte reads across it.
        let doc = "\"caf\u{e9}\"".as_bytes().to_vec();
        let selector = Selector::Leaf;
        let values = extract(&doc[..], 1, &selector).await.unwrap();
        assert_eq!(values, vec![serde_json::json!("café")]);
    }

    #[tokio::test]
    async fn unselected_keys_never_reach_the_sink() {
        let doc = br#"{"keep":1,"drop":[1,2,3,4,5,6,7,8,9,10]}"#;
        let selector = Selector::parse("keep").unwrap();
        let values = extract(&doc[..], 64, &selector).await.unwrap();
        assert_eq!(values, vec![serde_json::json!(1)]);
    }
}
