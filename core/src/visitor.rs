//! The selective visitor driver: a push-down automaton that walks a
//! [`Schema`] in lockstep with an incoming token stream, buffering only the
//! bytes belonging to currently-selected subtrees and invoking user
//! callbacks with fully parsed values while cheaply skipping the rest.

use std::cell::RefCell;

use futures_core::Stream;
use futures_util::StreamExt;

use crate::buffered::{BufferedTokenStream, StreamError};
use crate::config::{RecursionGuard, VisitConfig};
use crate::error::{SyntaxError, VisitError};
use crate::scanner::TokenKind;
use crate::schema::{BoxFuture, Schema};

type LeafCb<'a> = RefCell<Box<dyn FnMut(serde_json::Value) -> BoxFuture<'a> + 'a>>;
type ObjectMap<'a> = [(String, Schema<'a>)];

/// One element of the visitor's frame stack.
///
/// Frames borrow schema nodes read-only (`&'a ...`), so array-inner and
/// object-value start-states are cheap, reusable templates: pushing a frame
/// never clones a `Schema`, only wraps a fresh reference to it.
enum Frame<'a> {
    /// Assembling a complete value (from `cb`'s schema node) to hand to its callback.
    ValueBuffering { cb: &'a LeafCb<'a>, depth: u32 },
    /// Discarding a complete value without materializing it.
    ValueSkipping { depth: u32 },
    /// Expects `begin-array`.
    ArrayPreBegin(&'a Schema<'a>),
    /// Just saw `begin-array`; the next token decides whether the array is
    /// empty or whether an element's start-state must be pushed.
    ArrayPostBegin(&'a Schema<'a>),
    /// Inside an element; expects `end-array` or `value-separator`.
    ArrayPostValue(&'a Schema<'a>),
    /// An empty array's closing `end-array` is assumed and consumed unconditionally.
    ArrayPreEnd,
    /// Expects `begin-object`.
    ObjectPreBegin(&'a ObjectMap<'a>),
    /// Just saw `begin-object`; expects `end-object` or a key atom.
    ObjectPostBegin(&'a ObjectMap<'a>),
    /// Expects a key atom (after a preceding `value-separator`).
    ObjectPreKey(&'a ObjectMap<'a>),
    /// A key was parsed; expects `name-separator` before pushing `value_start`.
    ObjectPostKey(Box<Frame<'a>>),
    /// Inside a value; expects `end-object` or `value-separator`.
    ObjectPostValue(&'a ObjectMap<'a>),
}

/// Converts a schema node into the initial frame for traversing it. Cheap
/// and side-effect-free: callable any number of times against the same
/// schema reference without mutating or cloning it.
fn start_frame<'a>(schema: &'a Schema<'a>) -> Frame<'a> {
    match schema {
        Schema::Leaf(cb) => Frame::ValueBuffering { cb, depth: 0 },
        Schema::Array(inner) => Frame::ArrayPreBegin(inner),
        Schema::Object(entries) => Frame::ObjectPreBegin(entries.as_slice()),
    }
}

fn apply_delta<E>(depth: &mut u32, token: TokenKind) -> Result<(), VisitError<E>> {
    match token {
        TokenKind::BeginObject | TokenKind::BeginArray => *depth += 1,
        TokenKind::EndObject | TokenKind::EndArray => {
            if *depth == 0 {
                log::warn!("visitor: closing delimiter with no matching open at local depth 0");
                return Err(SyntaxError::UnbalancedDelimiters.into());
            }
            *depth -= 1;
        }
        _ => {}
    }
    Ok(())
}

fn push_frame<'a, E>(
    stack: &mut Vec<Frame<'a>>,
    guard: &mut RecursionGuard,
    config: &VisitConfig,
    frame: Frame<'a>,
) -> Result<(), VisitError<E>> {
    guard
        .enter(config.max_schema_depth)
        .map_err(|(depth, limit)| VisitError::RecursionLimitExceeded { depth, limit })?;
    stack.push(frame);
    Ok(())
}

fn pop_frame<'a>(stack: &mut Vec<Frame<'a>>, guard: &mut RecursionGuard) -> Option<Frame<'a>> {
    let frame = stack.pop();
    if frame.is_some() {
        guard.exit();
    }
    frame
}

fn stream_err_to_visit<E>(e: StreamError<E>) -> VisitError<E> {
    match e {
        StreamError::Upstream(e) => VisitError::Upstream(e),
        StreamError::BufferOverflow { current, max } => VisitError::BufferOverflow { current, max },
    }
}

/// Drives `schema` over `source` to completion using [`VisitConfig::default`].
///
/// Equivalent to [`visit_with_config`] with default resource limits.
pub async fn visit<'s, S, E>(source: S, schema: &'s Schema<'s>) -> Result<(), VisitError<E>>
where
    S: Stream<Item = Result<String, E>> + Unpin,
{
    visit_with_config(source, schema, VisitConfig::default()).await
}

/// Drives `schema` over `source`, an asynchronous producer of text chunks,
/// until either the top-level value completes or the source is exhausted.
///
/// User callbacks are awaited before the next token is requested, so
/// callback invocations and their side effects occur in strict document
/// order with no interleaving.
pub async fn visit_with_config<'s, S, E>(
    source: S,
    schema: &'s Schema<'s>,
    config: VisitConfig,
) -> Result<(), VisitError<E>>
where
    S: Stream<Item = Result<String, E>> + Unpin,
{
    let mut stream = BufferedTokenStream::with_config(source, config);
    let mut guard = RecursionGuard::new();
    let mut stack: Vec<Frame<'s>> = Vec::new();
    push_frame(&mut stack, &mut guard, &config, start_frame(schema))?;

    while !stack.is_empty() {
        let Some(token) = stream.next().await.transpose().map_err(stream_err_to_visit)? else {
            break;
        };

        // `ArrayPostBegin` decides, from the very next token, whether the
        // array is empty or whether an element must be descended into; if
        // the latter, the same token is then re-dispatched against the
        // freshly pushed element frame.
        loop {
            let Some(Frame::ArrayPostBegin(inner)) = stack.last() else {
                break;
            };
            let inner = *inner;
            let Some(top) = stack.last_mut() else {
                unreachable!("ArrayPostBegin just matched on this same stack")
            };
            if token == TokenKind::EndArray {
                *top = Frame::ArrayPreEnd;
            } else {
                *top = Frame::ArrayPostValue(inner);
                push_frame(&mut stack, &mut guard, &config, start_frame(inner))?;
            }
        }

        dispatch(&mut stack, &mut guard, &config, token, &mut stream).await?;
    }

    if !stack.is_empty() {
        log::warn!("visitor: input exhausted with {} frame(s) still open", stack.len());
        return Err(SyntaxError::UnexpectedEndOfStream.into());
    }
    Ok(())
}

async fn dispatch<'a, S, E>(
    stack: &mut Vec<Frame<'a>>,
    guard: &mut RecursionGuard,
    config: &VisitConfig,
    token: TokenKind,
    stream: &mut BufferedTokenStream<S>,
) -> Result<(), VisitError<E>>
where
    S: Stream<Item = Result<String, E>> + Unpin,
{
    let Some(top) = stack.last_mut() else {
        unreachable!("dispatch is only called while the frame stack is non-empty")
    };
    match top {
        Frame::ValueBuffering { depth, .. } => {
            if *depth == 0 {
                stream.buffer();
            }
            apply_delta(depth, token)?;
            if *depth == 0 {
                let text = stream.flush();
                let value: serde_json::Value =
                    serde_json::from_str(&text).map_err(VisitError::Lexical)?;
                let Some(Frame::ValueBuffering { cb, .. }) = pop_frame(stack, guard) else {
                    unreachable!("top frame checked above")
                };
                log::trace!("visitor: invoking leaf callback");
                let fut = (*cb.borrow_mut())(value);
                fut.await.map_err(VisitError::from)?;
            }
        }
        Frame::ValueSkipping { depth } => {
            apply_delta(depth, token)?;
            if *depth == 0 {
                pop_frame(stack, guard);
            }
        }
        Frame::ArrayPreBegin(inner) => {
            if token != TokenKind::BeginArray {
                log::warn!("visitor: expected `[`, got {token:?}");
                return Err(SyntaxError::ExpectedArray.into());
            }
            let inner = *inner;
            pop_frame(stack, guard);
            push_frame(stack, guard, config, Frame::ArrayPostBegin(inner))?;
        }
        Frame::ArrayPostBegin(_) => {
            unreachable!("ArrayPostBegin is resolved by the pre-processing loop in visit_with_config")
        }
        Frame::ArrayPostValue(inner) => {
            let inner = *inner;
            match token {
                TokenKind::EndArray => {
                    pop_frame(stack, guard);
                }
                TokenKind::ValueSeparator => {
                    push_frame(stack, guard, config, start_frame(inner))?;
                }
                _ => {
                    log::warn!("visitor: expected `]` or `,` inside array, got {token:?}");
                    return Err(SyntaxError::UnexpectedInArray.into());
                }
            }
        }
        Frame::ArrayPreEnd => {
            pop_frame(stack, guard);
        }
        Frame::ObjectPreBegin(map) => {
            if token != TokenKind::BeginObject {
                log::warn!("visitor: expected `{{`, got {token:?}");
                return Err(SyntaxError::ExpectedObject.into());
            }
            let map = *map;
            pop_frame(stack, guard);
            push_frame(stack, guard, config, Frame::ObjectPostBegin(map))?;
        }
        Frame::ObjectPostBegin(map) => {
            if token == TokenKind::EndObject {
                pop_frame(stack, guard);
            } else if token == TokenKind::Atom {
                let map = *map;
                handle_object_key(stack, guard, config, map, stream)?;
            } else {
                log::warn!("visitor: expected `}}` or a key inside object, got {token:?}");
                return Err(SyntaxError::UnexpectedInObject.into());
            }
        }
        Frame::ObjectPreKey(map) => {
            if token != TokenKind::Atom {
                log::warn!("visitor: expected an object key, got {token:?}");
                return Err(SyntaxError::ExpectedKey.into());
            }
            let map = *map;
            handle_object_key(stack, guard, config, map, stream)?;
        }
        Frame::ObjectPostKey(_) => {
            if token != TokenKind::NameSeparator {
                log::warn!("visitor: expected `:`, got {token:?}");
                return Err(SyntaxError::ExpectedColon.into());
            }
            let Some(Frame::ObjectPostKey(value_start)) = pop_frame(stack, guard) else {
                unreachable!("top frame checked above")
            };
            push_frame(stack, guard, config, *value_start)?;
        }
        Frame::ObjectPostValue(map) => {
            let map = *map;
            match token {
                TokenKind::EndObject => {
                    pop_frame(stack, guard);
                }
                TokenKind::ValueSeparator => {
                    *top = Frame::ObjectPreKey(map);
                }
                _ => {
                    log::warn!("visitor: expected `}}` or `,` inside object, got {token:?}");
                    return Err(SyntaxError::UnexpectedInObject.into());
                }
            }
        }
    }
    Ok(())
}

/// Parses the just-received atom token as an object key (via the same
/// buffer/flush path used for leaf values, with `depth` never leaving 0),
/// looks it up in `map`, and pushes the resulting value's start-state behind
/// an `ObjectPostKey` frame awaiting the `:` that must follow. Mutates the
/// current top frame to `ObjectPostValue(map)`.
fn handle_object_key<'a, S, E>(
    stack: &mut Vec<Frame<'a>>,
    guard: &mut RecursionGuard,
    config: &VisitConfig,
    map: &'a ObjectMap<'a>,
    stream: &mut BufferedTokenStream<S>,
) -> Result<(), VisitError<E>>
where
    S: Stream<Item = Result<String, E>> + Unpin,
{
    stream.buffer();
    let text = stream.flush();
    let key: String = serde_json::from_str(&text).map_err(VisitError::Lexical)?;

    let value_start = match map.iter().find(|(k, _)| *k == key) {
        Some((_, schema)) => start_frame(schema),
        None => {
            log::trace!("visitor: skipping unselected key {key:?}");
            Frame::ValueSkipping { depth: 0 }
        }
    };

    let Some(top) = stack.last_mut() else {
        unreachable!("handle_object_key is only called while the frame stack is non-empty")
    };
    *top = Frame::ObjectPostValue(map);
    push_frame(stack, guard, config, Frame::ObjectPostKey(Box::new(value_start)))
}
