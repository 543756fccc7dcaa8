//! The buffered token stream: wraps a [`Scanner`] around an asynchronous
//! chunk producer, exposing it as a [`futures_core::Stream`] of token kinds
//! plus a selectable capture window for recovering the literal source text
//! spanned by any run of tokens.
//!
//! Runtime-agnostic: suspension is expressed as explicit `Poll::Pending` on
//! the upstream chunk stream, not a runtime-specific channel.

use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::config::VisitConfig;
use crate::scanner::{Scanner, Token, TokenKind};

/// Errors raised by [`BufferedTokenStream`] itself, as distinct from the
/// upstream chunk producer's own error type `E`.
#[derive(Debug)]
pub enum StreamError<E> {
    /// The upstream chunk producer returned an error.
    Upstream(E),
    /// The saved-chunks list plus the active capture window exceeded
    /// [`VisitConfig::max_buffer_bytes`].
    BufferOverflow {
        /// Size in bytes at the point the limit was hit.
        current: usize,
        /// The configured limit.
        max: usize,
    },
}

impl<E: fmt::Display> fmt::Display for StreamError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::Upstream(e) => write!(f, "upstream error: {e}"),
            StreamError::BufferOverflow { current, max } => {
                write!(f, "buffer size {current} exceeds maximum {max}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl<E: fmt::Debug + fmt::Display> std::error::Error for StreamError<E> {}

/// Wraps an asynchronous producer of text chunks (`S: Stream<Item =
/// Result<String, E>>`) as a stream of [`TokenKind`]s, with a capture window
/// controlled by [`BufferedTokenStream::buffer`] / [`BufferedTokenStream::flush`].
///
/// `S` must be `Unpin`; wrap non-`Unpin` sources in `Box::pin` first (they
/// implement `Stream` too, satisfying this bound).
pub struct BufferedTokenStream<S> {
    source: S,
    scanner: Scanner,
    queued: VecDeque<Token>,
    current_chunk: String,
    /// First position, in `current_chunk`, still covered by the capture window.
    start: usize,
    /// One past the last token-aligned position consumed so far, in `current_chunk`.
    end: usize,
    /// Chunk suffixes carried forward from before `current_chunk`, oldest first.
    saved: Vec<String>,
    buffering: bool,
    /// The end position of the most recently yielded token, not yet applied
    /// to `start`. Applying this one call late is what lets a consumer call
    /// `buffer()` upon receiving a token and still have that same token
    /// included in the capture window.
    deferred_advance: Option<usize>,
    max_buffer_bytes: usize,
}

impl<S> BufferedTokenStream<S> {
    /// Wraps `source` with default configuration.
    pub fn new(source: S) -> Self {
        Self::with_config(source, VisitConfig::default())
    }

    /// Wraps `source`, pre-sizing internal buffers and applying resource
    /// limits from `config`.
    pub fn with_config(source: S, config: VisitConfig) -> Self {
        Self {
            source,
            scanner: Scanner::with_capacity_hint(config.lexer_hint),
            queued: VecDeque::with_capacity(config.lexer_hint.tokens_per_chunk),
            current_chunk: String::new(),
            start: 0,
            end: 0,
            saved: Vec::new(),
            buffering: false,
            deferred_advance: None,
            max_buffer_bytes: config.max_buffer_bytes,
        }
    }

    /// From the next yielded token onward, retain the raw source text
    /// spanned by yielded tokens. The token that was yielded immediately
    /// before this call is also included (see [`Self::deferred_advance`]).
    pub fn buffer(&mut self) {
        self.buffering = true;
    }

    /// Returns the concatenated retained material from the start of the
    /// capture window through the most recently yielded token, clears the
    /// window, and stops buffering.
    pub fn flush(&mut self) -> String {
        let mut out = String::with_capacity(
            self.saved.iter().map(String::len).sum::<usize>() + self.end.saturating_sub(self.start),
        );
        for piece in self.saved.drain(..) {
            out.push_str(&piece);
        }
        out.push_str(&self.current_chunk[self.start..self.end]);
        self.buffering = false;
        self.start = self.end;
        self.deferred_advance = None;
        out
    }

    fn apply_deferred_advance(&mut self) {
        if !self.buffering {
            if let Some(prev_end) = self.deferred_advance.take() {
                self.saved.clear();
                self.start = prev_end;
            }
        }
    }

    fn record_token(&mut self, tok: Token) {
        self.apply_deferred_advance();
        self.end = tok.end;
        self.deferred_advance = Some(tok.end);
    }

    /// Size of the capture window currently reachable through an active
    /// `buffer()` call — `0` whenever nothing is being captured, so ordinary
    /// chunks passing through skipped subtrees never count against the budget.
    fn window_bytes(&self) -> usize {
        if !self.buffering {
            return 0;
        }
        self.saved.iter().map(String::len).sum::<usize>() + self.end.saturating_sub(self.start)
    }

    fn check_budget<E>(&self) -> Result<(), StreamError<E>> {
        let current = self.window_bytes();
        if current > self.max_buffer_bytes {
            log::warn!("buffered stream: capture window {current} bytes exceeds budget {}", self.max_buffer_bytes);
            Err(StreamError::BufferOverflow {
                current,
                max: self.max_buffer_bytes,
            })
        } else {
            Ok(())
        }
    }
}

impl<S, E> Stream for BufferedTokenStream<S>
where
    S: Stream<Item = Result<String, E>> + Unpin,
{
    type Item = Result<TokenKind, StreamError<E>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if let Some(tok) = this.queued.pop_front() {
                this.record_token(tok);
                if let Err(e) = this.check_budget() {
                    return Poll::Ready(Some(Err(e)));
                }
                return Poll::Ready(Some(Ok(tok.kind)));
            }

            if this.scanner.is_finished() {
                return Poll::Ready(None);
            }

            match Pin::new(&mut this.source).poll_next(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(None) => {
                    log::debug!("buffered stream: upstream exhausted, flushing scanner");
                    let tokens = this.scanner.scan(None);
                    if tokens.is_empty() {
                        return Poll::Ready(None);
                    }
                    this.queued.extend(tokens);
                }
                Poll::Ready(Some(Err(e))) => {
                    log::warn!("buffered stream: upstream chunk producer errored");
                    return Poll::Ready(Some(Err(StreamError::Upstream(e))));
                }
                Poll::Ready(Some(Ok(chunk))) => {
                    log::debug!("buffered stream: received chunk of {} bytes", chunk.len());
                    this.apply_deferred_advance();
                    if this.start < this.current_chunk.len() {
                        let suffix = this.current_chunk[this.start..].to_string();
                        this.saved.push(suffix);
                    }
                    this.current_chunk = chunk;
                    this.start = 0;
                    this.end = 0;
                    if let Err(e) = this.check_budget() {
                        return Poll::Ready(Some(Err(e)));
                    }
                    let tokens = this.scanner.scan(Some(&this.current_chunk));
                    log::trace!("buffered stream: chunk yielded {} token(s)", tokens.len());
                    this.queued.extend(tokens);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream::{self, StreamExt};

    fn source(
        chunks: Vec<&'static str>,
    ) -> impl Stream<Item = Result<String, std::convert::Infallible>> + Unpin {
        stream::iter(chunks.into_iter().map(|s| Ok(s.to_string())))
    }

    #[tokio::test]
    async fn yields_token_kinds_in_order() {
        let mut stream = BufferedTokenStream::new(source(vec!["{\"foo\":", "\"bar\"}"]));
        let mut kinds = Vec::new();
        while let Some(kind) = stream.next().await {
            kinds.push(kind.unwrap());
        }
        assert_eq!(
            kinds,
            vec![
                TokenKind::BeginObject,
                TokenKind::Atom,
                TokenKind::NameSeparator,
                TokenKind::Atom,
                TokenKind::EndObject,
            ]
        );
    }

    #[tokio::test]
    async fn buffer_then_flush_reconstructs_whole_document() {
        let mut stream = BufferedTokenStream::new(source(vec!["{\"foo\":", "\"bar\"}"]));
        stream.buffer();
        let mut count = 0;
        while stream.next().await.is_some() {
            count += 1;
        }
        assert_eq!(count, 5);
        let flushed = stream.flush();
        assert_eq!(flushed, "{\"foo\":\"bar\"}");
    }

    #[tokio::test]
    async fn buffer_called_after_receiving_a_token_still_includes_it() {
        // Simulates the visitor's pattern: pull a token, discover we need to
        // buffer starting with it, call buffer(), keep pulling, then flush.
        let mut stream = BufferedTokenStream::new(source(vec!["[\"value\"]"]));
        assert_eq!(stream.next().await.unwrap().unwrap(), TokenKind::BeginArray);
        assert_eq!(stream.next().await.unwrap().unwrap(), TokenKind::Atom);
        stream.buffer();
        let flushed = stream.flush();
        assert_eq!(flushed, "\"value\"");
    }

    #[tokio::test]
    async fn buffer_window_spans_chunk_boundary() {
        let mut stream = BufferedTokenStream::new(source(vec!["\"Hel", "lo\""]));
        stream.buffer();
        assert_eq!(stream.next().await.unwrap().unwrap(), TokenKind::Atom);
        let flushed = stream.flush();
        assert_eq!(flushed, "\"Hello\"");
    }

    #[tokio::test]
    async fn not_buffering_keeps_window_empty_between_tokens() {
        let mut stream = BufferedTokenStream::new(source(vec!["[1,2,3]"]));
        for _ in 0..7 {
            stream.next().await.unwrap().unwrap();
        }
        assert_eq!(stream.saved.len(), 0);
    }

    #[tokio::test]
    async fn buffer_overflow_is_reported() {
        let config = VisitConfig::new().with_max_buffer_bytes(4);
        let mut stream =
            BufferedTokenStream::with_config(source(vec!["\"too long for the budget\""]), config);
        stream.buffer();
        let mut saw_overflow = false;
        while let Some(item) = stream.next().await {
            if let Err(StreamError::BufferOverflow { .. }) = item {
                saw_overflow = true;
                break;
            }
        }
        assert!(saw_overflow);
    }

    #[tokio::test]
    async fn budget_only_bounds_the_active_capture_window() {
        // A tiny budget must not reject a document whose oversized parts are
        // never buffered — the limit bounds selected subtrees, not raw chunk
        // throughput.
        let config = VisitConfig::new().with_max_buffer_bytes(4);
        let mut stream = BufferedTokenStream::with_config(
            source(vec!["\"this value is never buffered because nothing calls buffer()\""]),
            config,
        );
        while let Some(item) = stream.next().await {
            item.unwrap();
        }
    }
}
