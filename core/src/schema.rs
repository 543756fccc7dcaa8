//! The visitor schema: a recursive description of which substructures of an
//! incoming document to materialize, and which to skip.
//!
//! A schema is a runtime value, not a compile-time shape — unspecified object
//! keys are always skipped, and there is no "strict" mode that rejects
//! documents with extra keys.

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;

use crate::error::CallbackError;

/// A leaf callback's future, boxed so [`Schema::Leaf`] can hold heterogeneous
/// closures. Not `Send`: the visitor drives one schema on one task at a time
/// (see the concurrency model in the crate docs).
pub type BoxFuture<'a> = Pin<Box<dyn Future<Output = Result<(), CallbackError>> + 'a>>;

/// A recursive description of what to do with each part of an incoming
/// document.
///
/// Construct nodes with [`Schema::leaf`], [`Schema::array`], and
/// [`Schema::object`]; pass the root to [`crate::visitor::visit`].
pub enum Schema<'a> {
    /// Materialize the current value wholly and hand it to a callback.
    ///
    /// Wrapped in a `RefCell` so the visitor can navigate the schema tree
    /// through plain shared references while still calling a `FnMut`.
    Leaf(RefCell<Box<dyn FnMut(serde_json::Value) -> BoxFuture<'a> + 'a>>),

    /// Descend into every element of an array, applying the inner schema to each.
    Array(Box<Schema<'a>>),

    /// Descend into an object, applying a per-key schema. Keys absent from
    /// the map are skipped without buffering their values.
    Object(Vec<(String, Schema<'a>)>),
}

impl<'a> Schema<'a> {
    /// Wraps a callback invoked with the fully parsed value at this position.
    ///
    /// The callback may be `async`; its future is polled to completion
    /// before the visitor requests the next token.
    pub fn leaf<F, Fut>(mut callback: F) -> Self
    where
        F: FnMut(serde_json::Value) -> Fut + 'a,
        Fut: Future<Output = Result<(), CallbackError>> + 'a,
    {
        Schema::Leaf(RefCell::new(Box::new(move |value| {
            Box::pin(callback(value)) as BoxFuture<'a>
        })))
    }

    /// Descends into every element of an array using `inner` as each
    /// element's schema.
    pub fn array(inner: Schema<'a>) -> Self {
        Schema::Array(Box::new(inner))
    }

    /// Descends into an object, dispatching each named key to its schema.
    /// Keys not present in `entries` are skipped entirely — their values are
    /// never buffered.
    pub fn object<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, Schema<'a>)>,
    {
        Schema::Object(entries.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_closure_is_boxed_and_callable() {
        let calls = RefCell::new(0usize);
        let schema = Schema::leaf(|_v| {
            *calls.borrow_mut() += 1;
            async { Ok(()) }
        });
        match &schema {
            Schema::Leaf(cb) => {
                let fut = (*cb.borrow_mut())(serde_json::Value::Null);
                drop(fut);
            }
            _ => panic!("expected leaf"),
        }
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn object_entries_preserve_order() {
        let schema = Schema::object([
            ("a".to_string(), Schema::leaf(|_| async { Ok(()) })),
            ("b".to_string(), Schema::leaf(|_| async { Ok(()) })),
        ]);
        match schema {
            Schema::Object(entries) => {
                assert_eq!(entries[0].0, "a");
                assert_eq!(entries[1].0, "b");
            }
            _ => panic!("expected object"),
        }
    }
}
