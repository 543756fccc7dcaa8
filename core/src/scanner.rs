//! The chunk-spanning tokenizer.
//!
//! [`Scanner`] is a hand-written byte-oriented state machine rather than a
//! `logos`-style regex lexer: every structural byte and whitespace byte it
//! must recognize is single-byte ASCII, and UTF-8 continuation/lead bytes
//! (`0x80..=0xFF`) never collide with those classes, so the scanner can index
//! into `chunk.as_bytes()` directly without decoding. It never slices the
//! input itself — it only ever reports byte offsets — so it cannot panic on
//! a non-char-boundary index.
//!
//! The scanner never fails: every byte sequence is classifiable into one of
//! the token kinds below or into "still pending, more input needed". Lexical
//! validity of atoms (is `1foo` really a number?) is delegated to whichever
//! whole-value JSON parser later consumes the buffered text.

use crate::config::LexerCapacityHint;

/// The seven structural/atomic token kinds the scanner recognizes.
///
/// The atom kind does not distinguish strings from numbers, booleans, or
/// `null`; that distinction is left to the whole-value parser invoked later
/// on the buffered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
pub enum TokenKind {
    /// `{`
    BeginObject,
    /// `}`
    EndObject,
    /// `[`
    BeginArray,
    /// `]`
    EndArray,
    /// `:`
    NameSeparator,
    /// `,`
    ValueSeparator,
    /// A string, number, `true`, `false`, or `null`.
    Atom,
}

impl TokenKind {
    /// `true` for `{`/`[`, which increase nesting depth by one.
    #[inline]
    pub const fn opens(self) -> bool {
        matches!(self, TokenKind::BeginObject | TokenKind::BeginArray)
    }

    /// `true` for `}`/`]`, which decrease nesting depth by one.
    #[inline]
    pub const fn closes(self) -> bool {
        matches!(self, TokenKind::EndObject | TokenKind::EndArray)
    }
}

/// A single recognized token: its kind, and the exclusive end position in
/// whichever chunk was delivered to the [`Scanner::scan`] call that reported
/// it. The start position is not carried — reconstructing spans across
/// chunk boundaries is [`crate::buffered::BufferedTokenStream`]'s job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
pub struct Token {
    /// The token's kind.
    pub kind: TokenKind,
    /// Exclusive end offset, in bytes, within the chunk that completed it.
    pub end: usize,
}

/// What kind of unfinished token the scanner is carrying across chunk calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Continuation {
    /// Inside an open string atom (past the opening `"`, no closing `"` seen yet).
    StringCont,
    /// Inside a bare atom (number/`true`/`false`/`null`) with no delimiter seen yet.
    BareAtomCont,
}

enum StringScan {
    Complete(usize),
    Pending { trailing_backslash: bool },
}

enum BareAtomScan {
    Complete(usize),
    Pending,
}

/// Scans a string's content starting at `start` (the index just past the
/// opening `"`, or a resumption point within it). Escapes (`\X`) consume the
/// backslash and exactly one following byte without reinterpreting it, so an
/// escaped quote or backslash never terminates or restarts the scan.
fn scan_string(bytes: &[u8], mut i: usize) -> StringScan {
    let len = bytes.len();
    while i < len {
        match bytes[i] {
            b'\\' => {
                if i + 1 < len {
                    i += 2;
                } else {
                    return StringScan::Pending {
                        trailing_backslash: true,
                    };
                }
            }
            b'"' => return StringScan::Complete(i + 1),
            _ => i += 1,
        }
    }
    StringScan::Pending {
        trailing_backslash: false,
    }
}

/// `true` for bytes that are not whitespace, not a structural symbol, and
/// not `"` — i.e. bytes a bare atom (number/`true`/`false`/`null`) may contain.
#[inline]
fn is_bare_atom_byte(b: u8) -> bool {
    !matches!(
        b,
        b' ' | b'\t' | b'\r' | b'\n' | b'{' | b'}' | b'[' | b']' | b',' | b':' | b'"'
    )
}

/// Scans a bare atom starting at `start`. Per the scanner's contract, a bare
/// atom that runs to the end of the chunk is always reported as still
/// pending, even if its content happens to already be a complete number —
/// a following chunk might extend it.
fn scan_bare_atom(bytes: &[u8], mut i: usize) -> BareAtomScan {
    let len = bytes.len();
    while i < len && is_bare_atom_byte(bytes[i]) {
        i += 1;
    }
    if i < len {
        BareAtomScan::Complete(i)
    } else {
        BareAtomScan::Pending
    }
}

/// A stateful, chunk-spanning JSON tokenizer.
///
/// Construct one with [`Scanner::new`], feed it chunks with [`Scanner::scan`],
/// and finish the stream by calling `scan(None)` once.
///
/// # Example
///
/// ```
/// use streamjson_core::scanner::{Scanner, TokenKind};
///
/// let mut scanner = Scanner::new();
/// let tokens = scanner.scan(Some("{\"key\":"));
/// assert_eq!(tokens.len(), 1);
/// assert_eq!(tokens[0].kind, TokenKind::BeginObject);
///
/// let tokens = scanner.scan(Some(" \"value\"}"));
/// let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
/// assert_eq!(
///     kinds,
///     vec![
///         TokenKind::Atom,
///         TokenKind::NameSeparator,
///         TokenKind::Atom,
///         TokenKind::EndObject,
///     ]
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Scanner {
    pending: Option<Continuation>,
    /// Leading bytes of the next chunk to pass over verbatim (carries a
    /// dangling escape across the boundary).
    skip: usize,
    /// The pending token's end-index as of the most recent chunk it touched;
    /// this is what gets reported if end-of-stream arrives while it is still
    /// open.
    pending_end: usize,
    finished: bool,
    hint: LexerCapacityHint,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}

impl Scanner {
    /// Creates a fresh scanner with default capacity hints.
    pub fn new() -> Self {
        Self::with_capacity_hint(LexerCapacityHint::default())
    }

    /// Creates a fresh scanner, pre-sizing its per-call token buffer
    /// according to `hint`.
    pub fn with_capacity_hint(hint: LexerCapacityHint) -> Self {
        Self {
            pending: None,
            skip: 0,
            pending_end: 0,
            finished: false,
            hint,
        }
    }

    /// Returns `true` once the end-of-stream sentinel has been processed.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Feeds one text chunk (`Some(chunk)`) or the end-of-stream sentinel
    /// (`None`), returning the tokens newly completed by this call.
    ///
    /// Calling with `None` flushes any pending token — an unterminated atom
    /// is treated as completed at the logical end of input. Subsequent calls
    /// with `None` return no tokens.
    pub fn scan(&mut self, chunk: Option<&str>) -> Vec<Token> {
        match chunk {
            Some(chunk) => self.feed(chunk),
            None => self.finish(),
        }
    }

    fn finish(&mut self) -> Vec<Token> {
        if self.finished {
            return Vec::new();
        }
        self.finished = true;
        if self.pending.take().is_some() {
            log::trace!("scanner: flushing pending token at end-of-stream");
            vec![Token {
                kind: TokenKind::Atom,
                end: self.pending_end,
            }]
        } else {
            Vec::new()
        }
    }

    fn feed(&mut self, chunk: &str) -> Vec<Token> {
        let bytes = chunk.as_bytes();
        let len = bytes.len();
        let mut tokens = Vec::with_capacity(self.hint.tokens_per_chunk.min(len.max(1)));
        let mut pos = 0usize;

        if self.skip > 0 {
            if self.skip >= len {
                self.skip -= len;
                self.pending_end = len;
                return tokens;
            }
            pos = self.skip;
            self.skip = 0;
        }

        if let Some(cont) = self.pending {
            match cont {
                Continuation::StringCont => match scan_string(bytes, pos) {
                    StringScan::Complete(end) => {
                        tokens.push(Token {
                            kind: TokenKind::Atom,
                            end,
                        });
                        self.pending = None;
                        pos = end;
                    }
                    StringScan::Pending { trailing_backslash } => {
                        if trailing_backslash {
                            self.skip = 1;
                        }
                        self.pending_end = len;
                        return tokens;
                    }
                },
                Continuation::BareAtomCont => match scan_bare_atom(bytes, pos) {
                    BareAtomScan::Complete(end) => {
                        tokens.push(Token {
                            kind: TokenKind::Atom,
                            end,
                        });
                        self.pending = None;
                        pos = end;
                    }
                    BareAtomScan::Pending => {
                        self.pending_end = len;
                        return tokens;
                    }
                },
            }
        }

        while pos < len {
            let b = bytes[pos];
            match b {
                b' ' | b'\t' | b'\r' | b'\n' => pos += 1,
                b'{' => {
                    pos += 1;
                    tokens.push(Token {
                        kind: TokenKind::BeginObject,
                        end: pos,
                    });
                }
                b'}' => {
                    pos += 1;
                    tokens.push(Token {
                        kind: TokenKind::EndObject,
                        end: pos,
                    });
                }
                b'[' => {
                    pos += 1;
                    tokens.push(Token {
                        kind: TokenKind::BeginArray,
                        end: pos,
                    });
                }
                b']' => {
                    pos += 1;
                    tokens.push(Token {
                        kind: TokenKind::EndArray,
                        end: pos,
                    });
                }
                b':' => {
                    pos += 1;
                    tokens.push(Token {
                        kind: TokenKind::NameSeparator,
                        end: pos,
                    });
                }
                b',' => {
                    pos += 1;
                    tokens.push(Token {
                        kind: TokenKind::ValueSeparator,
                        end: pos,
                    });
                }
                b'"' => match scan_string(bytes, pos + 1) {
                    StringScan::Complete(end) => {
                        tokens.push(Token {
                            kind: TokenKind::Atom,
                            end,
                        });
                        pos = end;
                    }
                    StringScan::Pending { trailing_backslash } => {
                        self.pending = Some(Continuation::StringCont);
                        if trailing_backslash {
                            self.skip = 1;
                        }
                        self.pending_end = len;
                        return tokens;
                    }
                },
                _ => match scan_bare_atom(bytes, pos) {
                    BareAtomScan::Complete(end) => {
                        tokens.push(Token {
                            kind: TokenKind::Atom,
                            end,
                        });
                        pos = end;
                    }
                    BareAtomScan::Pending => {
                        self.pending = Some(Continuation::BareAtomCont);
                        self.pending_end = len;
                        return tokens;
                    }
                },
            }
        }

        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn split_object_across_chunks() {
        let mut s = Scanner::new();
        let t1 = s.scan(Some("{\"key\":"));
        assert_eq!(
            t1,
            vec![
                Token {
                    kind: TokenKind::BeginObject,
                    end: 1
                },
                Token {
                    kind: TokenKind::Atom,
                    end: 6
                },
                Token {
                    kind: TokenKind::NameSeparator,
                    end: 7
                },
            ]
        );
        let t2 = s.scan(Some(" \"value\"}"));
        assert_eq!(
            t2,
            vec![
                Token {
                    kind: TokenKind::Atom,
                    end: 8
                },
                Token {
                    kind: TokenKind::EndObject,
                    end: 9
                },
            ]
        );
    }

    #[test]
    fn string_split_mid_content() {
        let mut s = Scanner::new();
        assert!(s.scan(Some("\"Hello")).is_empty());
        let tokens = s.scan(Some(" World\""));
        assert_eq!(
            tokens,
            vec![Token {
                kind: TokenKind::Atom,
                end: 7
            }]
        );
    }

    #[test]
    fn dangling_escape_eats_next_chunk_verbatim() {
        let mut s = Scanner::new();
        // chunk1 = `"\` (open quote, then a lone backslash)
        assert!(s.scan(Some("\"\\")).is_empty());
        // chunk2 = `"` — consumed verbatim as the escaped character, not as a closer
        assert!(s.scan(Some("\"")).is_empty());
        assert!(!s.is_finished());
        let tokens = s.scan(None);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Atom);
        // a second end-of-stream call yields nothing
        assert!(s.scan(None).is_empty());
    }

    #[test]
    fn bare_atoms_split_by_whitespace() {
        let mut s = Scanner::new();
        let tokens = s.scan(Some("1 2"));
        // "2" is still pending: a bare atom at chunk end is always pending.
        assert_eq!(
            tokens,
            vec![Token {
                kind: TokenKind::Atom,
                end: 1
            }]
        );
        let tail = s.scan(None);
        assert_eq!(
            tail,
            vec![Token {
                kind: TokenKind::Atom,
                end: 3
            }]
        );
    }

    #[test]
    fn bare_atom_split_mid_token() {
        let mut s = Scanner::new();
        assert!(s.scan(Some("tr")).is_empty());
        let tokens = s.scan(Some("ue,"));
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::Atom, TokenKind::ValueSeparator]
        );
    }

    #[test]
    fn invalid_atom_is_not_rejected_by_the_scanner() {
        // "1foo" is lexically invalid JSON but the scanner only recognizes
        // atom *spans*; validity is the whole-value parser's job.
        let mut s = Scanner::new();
        let tokens = s.scan(Some("1foo "));
        assert_eq!(
            tokens,
            vec![Token {
                kind: TokenKind::Atom,
                end: 4
            }]
        );
    }

    #[test]
    fn whitespace_ignored_between_tokens() {
        let mut s = Scanner::new();
        let tokens = s.scan(Some("  {  }  "));
        assert_eq!(
            kinds(&tokens),
            vec![TokenKind::BeginObject, TokenKind::EndObject]
        );
    }

    #[test]
    fn escape_inside_single_chunk_does_not_terminate_string() {
        let mut s = Scanner::new();
        let tokens = s.scan(Some(r#""a\"b""#));
        assert_eq!(
            tokens,
            vec![Token {
                kind: TokenKind::Atom,
                end: 6
            }]
        );
    }

    #[test]
    fn empty_document_produces_no_tokens() {
        let mut s = Scanner::new();
        assert!(s.scan(None).is_empty());
        assert!(s.is_finished());
    }

    #[test]
    fn split_invariance_across_arbitrary_chunk_boundaries() {
        let doc = r#"{"a": [1, 2.5, "x\"y", null, true, false], "b": {"c": "d"}}"#;
        let whole = {
            let mut s = Scanner::new();
            let mut out = s.scan(Some(doc));
            out.extend(s.scan(None));
            out
        };
        for split in 0..=doc.len() {
            if !doc.is_char_boundary(split) {
                continue;
            }
            let (a, b) = doc.split_at(split);
            let mut s = Scanner::new();
            let mut out = s.scan(Some(a));
            out.extend(s.scan(Some(b)));
            out.extend(s.scan(None));
            assert_eq!(out.len(), whole.len(), "split at {split}");
            for (got, want) in out.iter().zip(whole.iter()) {
                assert_eq!(got.kind, want.kind, "split at {split}");
            }
        }
    }
}
