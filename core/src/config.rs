//! Configuration for the streaming visitor: resource limits and capacity hints.
//!
//! Following the pattern established by `serde_json`, [`VisitConfig`] bounds
//! schema recursion depth so a schema paired with a pathologically nested
//! document cannot grow the frame stack without limit. [`LexerCapacityHint`]
//! lets callers pre-size the scanner and buffered-stream internals when the
//! expected chunk size is known ahead of time.

/// Configuration for [`crate::visitor::visit_with_config`].
///
/// # Default values
///
/// | Setting | Default | Rationale |
/// |---|---|---|
/// | `max_schema_depth` | 128 | Matches `serde_json`'s recursion default |
/// | `max_buffer_bytes` | `usize::MAX` | No limit by default |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VisitConfig {
    /// Maximum depth of the visitor's frame stack.
    ///
    /// Each array/object descent pushes a frame; exceeding this limit raises
    /// [`crate::error::VisitError::RecursionLimitExceeded`] instead of
    /// growing the stack without bound.
    pub max_schema_depth: usize,

    /// Maximum number of bytes the buffered token stream may retain at once
    /// across its saved-chunk list and current buffering window.
    ///
    /// Exceeding this raises [`crate::error::VisitError::BufferOverflow`].
    pub max_buffer_bytes: usize,

    /// Capacity hints for the scanner and buffered stream.
    pub lexer_hint: LexerCapacityHint,
}

impl Default for VisitConfig {
    /// - `max_schema_depth`: 128
    /// - `max_buffer_bytes`: `usize::MAX`
    /// - `lexer_hint`: [`LexerCapacityHint::medium`]
    #[inline]
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl VisitConfig {
    /// Default configuration, usable in const contexts.
    pub const DEFAULT: Self = Self {
        max_schema_depth: 128,
        max_buffer_bytes: usize::MAX,
        lexer_hint: LexerCapacityHint::MEDIUM,
    };

    /// Creates a new configuration with default values.
    #[inline]
    pub const fn new() -> Self {
        Self::DEFAULT
    }

    /// Sets the maximum schema recursion depth.
    ///
    /// Use `usize::MAX` to disable the limit; only do so for trusted schemas
    /// paired with trusted documents, since deeply nested input can still
    /// overflow the native call stack even though this struct no longer
    /// rejects it.
    #[inline]
    pub const fn with_max_schema_depth(mut self, depth: usize) -> Self {
        self.max_schema_depth = depth;
        self
    }

    /// Sets the maximum buffered-bytes budget.
    #[inline]
    pub const fn with_max_buffer_bytes(mut self, bytes: usize) -> Self {
        self.max_buffer_bytes = bytes;
        self
    }

    /// Sets the capacity hint used to pre-size internal buffers.
    #[inline]
    pub const fn with_lexer_hint(mut self, hint: LexerCapacityHint) -> Self {
        self.lexer_hint = hint;
        self
    }
}

/// Hints for pre-allocating buffers in the scanner and buffered token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LexerCapacityHint {
    /// Expected capacity, in bytes, for the pending-token/buffer-window scratch space.
    pub buffer_capacity: usize,
    /// Expected number of tokens produced per chunk (used to pre-size token vectors).
    pub tokens_per_chunk: usize,
}

impl LexerCapacityHint {
    const MEDIUM: Self = Self {
        buffer_capacity: 4096,
        tokens_per_chunk: 256,
    };

    /// Hints optimized for small inputs (<1KB).
    pub const fn small() -> Self {
        Self {
            buffer_capacity: 256,
            tokens_per_chunk: 32,
        }
    }

    /// Hints optimized for medium inputs (1KB-64KB). This is the default.
    pub const fn medium() -> Self {
        Self::MEDIUM
    }

    /// Hints optimized for large inputs (>64KB).
    pub const fn large() -> Self {
        Self {
            buffer_capacity: 65536,
            tokens_per_chunk: 2048,
        }
    }

    /// Derives hints from an expected chunk size.
    ///
    /// Estimates roughly one token per 4 bytes, a conservative ratio for
    /// typical JSON documents.
    pub const fn from_chunk_size(chunk_size: usize) -> Self {
        Self {
            buffer_capacity: chunk_size,
            tokens_per_chunk: chunk_size / 4,
        }
    }
}

impl Default for LexerCapacityHint {
    fn default() -> Self {
        Self::MEDIUM
    }
}

/// Tracks visitor frame-stack depth against [`VisitConfig::max_schema_depth`].
///
/// A lightweight counter the visitor increments on every frame push and
/// decrements on every pop; pairs with `VisitConfig` to enforce the limit.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecursionGuard {
    depth: usize,
}

impl RecursionGuard {
    /// Creates a new guard at depth 0.
    #[inline]
    pub const fn new() -> Self {
        Self { depth: 0 }
    }

    /// Current depth.
    #[inline]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Enter a nested frame, incrementing depth.
    ///
    /// Returns `Err((depth, limit))` if the new depth would exceed `limit`;
    /// the caller wraps this into [`crate::error::VisitError::RecursionLimitExceeded`].
    #[inline]
    pub fn enter(&mut self, limit: usize) -> Result<(), (usize, usize)> {
        self.depth = self.depth.saturating_add(1);
        if self.depth > limit {
            Err((self.depth, limit))
        } else {
            Ok(())
        }
    }

    /// Exit a nested frame, decrementing depth (saturating at 0).
    #[inline]
    pub fn exit(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
