//! Provides a generic parser for newline-delimited JSON streams returned by
//! the Ollama API.
//!
//! The parser turns a byte stream into one decoded element per line. What an
//! element is, and when the stream is over, is decided per endpoint by a
//! [`FrameDecoder`] (see [`crate::stream`]).

use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use serde_json::Value;

use crate::{Error, Result};

/// What a decoded line means for the stream.
#[derive(Debug, PartialEq)]
pub enum Frame<T> {
    /// Yield `T`; more lines follow.
    Item(T),
    /// Yield `T`, then end the stream.
    Last(T),
    /// End the stream without yielding anything for this line.
    End,
}

/// Turns one parsed JSON line into a [`Frame`].
pub trait FrameDecoder {
    type Item;

    fn decode(line: Value) -> Result<Frame<Self::Item>>;
}

/// Reads the `done` sentinel of a stream object. Absent means `false`.
pub fn is_done(value: &Value) -> bool {
    value.get("done").and_then(Value::as_bool).unwrap_or(false)
}

/// Generic newline-delimited JSON streaming parser.
///
/// - `S` is the underlying stream that yields `Result<Bytes>`
/// - `D` is the endpoint decoder that maps each line to a [`Frame`]
///
/// Lines are decoded one at a time, only when the consumer polls. Blank lines
/// are skipped and a final line without a trailing newline is still decoded.
/// The stream is fused: after the end frame, any error, or an input that
/// closes before the end frame, it yields `None` forever and the underlying
/// byte stream has been dropped.
pub struct NdjsonParser<S, D>
where
    S: Stream<Item = Result<Bytes>> + Send + Unpin,
    D: FrameDecoder,
{
    inner: Option<S>,
    buffer: Vec<u8>,
    finished: bool,
    _marker: PhantomData<fn() -> D>,
}

impl<S, D> NdjsonParser<S, D>
where
    S: Stream<Item = Result<Bytes>> + Send + Unpin,
    D: FrameDecoder,
{
    pub fn new(stream: S) -> Self {
        Self {
            inner: Some(stream),
            buffer: Vec::new(),
            finished: false,
            _marker: PhantomData,
        }
    }

    /// Takes the next complete, non-blank line out of the buffer.
    fn next_line(&mut self) -> Option<Vec<u8>> {
        loop {
            let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;
            let line = self.buffer.drain(..=newline_pos).collect::<Vec<u8>>();
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return Some(line);
        }
    }

    fn decode_line(line: &[u8]) -> Result<Frame<D::Item>> {
        let value: Value = serde_json::from_slice(line).map_err(|e| {
            Error::MalformedResponse(format!(
                "invalid JSON line {:?}: {}",
                String::from_utf8_lossy(line).trim(),
                e
            ))
        })?;

        if let Some(message) = value.get("error").and_then(Value::as_str) {
            return Err(Error::Server(message.to_string()));
        }

        D::decode(value)
    }

    /// Stops the stream and releases the byte source.
    fn finish(&mut self) {
        self.finished = true;
        self.inner = None;
        self.buffer.clear();
    }
}

impl<S, D> Stream for NdjsonParser<S, D>
where
    S: Stream<Item = Result<Bytes>> + Send + Unpin,
    D: FrameDecoder,
{
    type Item = Result<D::Item>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // every field is Unpin, so the pinned reference can be unwrapped
        let this = self.get_mut();

        loop {
            if this.finished {
                return Poll::Ready(None);
            }

            // 1. Decode a buffered line before reading more bytes
            if let Some(line) = this.next_line() {
                return match Self::decode_line(&line) {
                    Ok(Frame::Item(item)) => Poll::Ready(Some(Ok(item))),
                    Ok(Frame::Last(item)) => {
                        this.finish();
                        Poll::Ready(Some(Ok(item)))
                    }
                    Ok(Frame::End) => {
                        this.finish();
                        Poll::Ready(None)
                    }
                    Err(e) => {
                        this.finish();
                        Poll::Ready(Some(Err(e)))
                    }
                };
            }

            // 2. No complete line: read more, or flush what is left once input ended
            let Some(inner) = this.inner.as_mut() else {
                if this.buffer.iter().any(|b| !b.is_ascii_whitespace()) {
                    this.buffer.push(b'\n');
                    continue;
                }
                this.finish();
                return Poll::Ready(Some(Err(Error::MalformedResponse(
                    "stream closed before the done marker".to_string(),
                ))));
            };

            match Pin::new(inner).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => this.buffer.extend_from_slice(&bytes),
                Poll::Ready(Some(Err(e))) => {
                    this.finish();
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => this.inner = None,
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
