//! Error types for the streaming scanner and visitor.
//!
//! The core crate is `no_std`-capable apart from its use of `alloc`-backed
//! collections, so these types implement `core::fmt::Display` by hand rather
//! than deriving from `thiserror` (reserved for the `std`-only demo crates).

use core::fmt;

/// Error raised while driving [`crate::visitor::visit`].
///
/// `E` is the upstream chunk source's own error type; it is threaded through
/// unchanged so callers can match on it without an extra conversion.
#[derive(Debug)]
pub enum VisitError<E> {
    /// The document did not match the token the schema expected at the
    /// current frame (e.g. an object where an array was expected, a missing
    /// `:`, or unbalanced delimiters).
    Syntax(SyntaxError),

    /// A buffered value failed to parse as a complete JSON text.
    Lexical(serde_json::Error),

    /// The upstream chunk producer returned an error.
    Upstream(E),

    /// A user callback returned an error.
    Callback(CallbackError),

    /// Schema recursion depth exceeded [`crate::config::VisitConfig::max_schema_depth`].
    RecursionLimitExceeded {
        /// Stack depth at the point the limit was hit.
        depth: usize,
        /// The configured limit.
        limit: usize,
    },

    /// The buffered-bytes budget exceeded [`crate::config::VisitConfig::max_buffer_bytes`].
    BufferOverflow {
        /// Buffered byte count at the point the limit was hit.
        current: usize,
        /// The configured limit.
        max: usize,
    },
}

/// A syntax error: the token stream diverged from what the schema expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxError {
    /// Expected `begin-array` but got something else (or end-of-stream).
    ExpectedArray,
    /// Expected `begin-object` but got something else (or end-of-stream).
    ExpectedObject,
    /// Expected `name-separator` (`:`) but got something else.
    ExpectedColon,
    /// Expected an object key (an atom) but got something else.
    ExpectedKey,
    /// Expected `end-array`, `value-separator`, or a value, but got something else.
    UnexpectedInArray,
    /// Expected `end-object`, `value-separator`, or a key, but got something else.
    UnexpectedInObject,
    /// A value's nesting closed more times than it opened.
    UnbalancedDelimiters,
    /// The token stream ended before the schema-described value completed.
    UnexpectedEndOfStream,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxError::ExpectedArray => write!(f, "expected `[`"),
            SyntaxError::ExpectedObject => write!(f, "expected `{{`"),
            SyntaxError::ExpectedColon => write!(f, "expected `:`"),
            SyntaxError::ExpectedKey => write!(f, "expected an object key"),
            SyntaxError::UnexpectedInArray => {
                write!(f, "expected `]`, `,`, or a value inside an array")
            }
            SyntaxError::UnexpectedInObject => {
                write!(f, "expected `}}`, `,`, or a key inside an object")
            }
            SyntaxError::UnbalancedDelimiters => write!(f, "unbalanced `{{}}`/`[]`"),
            SyntaxError::UnexpectedEndOfStream => {
                write!(f, "input ended before the expected value completed")
            }
        }
    }
}

/// Error raised by a user-supplied leaf callback.
///
/// Carries the callback's error message; the visitor does not attempt to
/// interpret it beyond propagating it to the caller of [`crate::visitor::visit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackError(pub String);

impl fmt::Display for CallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "callback error: {}", self.0)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CallbackError {}

impl<E: fmt::Display> fmt::Display for VisitError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisitError::Syntax(e) => write!(f, "syntax error: {}", e),
            VisitError::Lexical(e) => write!(f, "lexical error: {}", e),
            VisitError::Upstream(e) => write!(f, "upstream error: {}", e),
            VisitError::Callback(e) => write!(f, "{}", e),
            VisitError::RecursionLimitExceeded { depth, limit } => write!(
                f,
                "schema recursion limit exceeded: depth {} > limit {}",
                depth, limit
            ),
            VisitError::BufferOverflow { current, max } => {
                write!(f, "buffer size {} exceeds maximum {}", current, max)
            }
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug + fmt::Display> std::error::Error for VisitError<E> {}

impl<E> From<SyntaxError> for VisitError<E> {
    fn from(e: SyntaxError) -> Self {
        VisitError::Syntax(e)
    }
}

impl<E> From<CallbackError> for VisitError<E> {
    fn from(e: CallbackError) -> Self {
        VisitError::Callback(e)
    }
}
