use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::{stream, Stream, StreamExt};
use ollama_bridge::parser::{is_done, Frame, FrameDecoder, NdjsonParser};
use ollama_bridge::{Error, Result};
use serde_json::Value;

/// Yields ids, ends on an object with `"stop": true`, yielding its id too.
struct IdFrames;

impl FrameDecoder for IdFrames {
    type Item = u64;

    fn decode(line: Value) -> Result<Frame<u64>> {
        let id = line
            .get("id")
            .and_then(Value::as_u64)
            .ok_or_else(|| Error::MalformedResponse("missing id".to_string()))?;
        if line.get("stop").and_then(Value::as_bool).unwrap_or(false) {
            Ok(Frame::Last(id))
        } else {
            Ok(Frame::Item(id))
        }
    }
}

/// Byte stream that counts how often it is polled and flags when it is dropped.
struct TrackedStream {
    chunks: std::vec::IntoIter<Bytes>,
    polls: Arc<AtomicUsize>,
    dropped: Arc<AtomicBool>,
}

impl TrackedStream {
    fn new(chunks: Vec<&str>) -> (Self, Arc<AtomicUsize>, Arc<AtomicBool>) {
        let polls = Arc::new(AtomicUsize::new(0));
        let dropped = Arc::new(AtomicBool::new(false));
        let stream = Self {
            chunks: chunks
                .into_iter()
                .map(|c| Bytes::from(c.to_string()))
                .collect::<Vec<_>>()
                .into_iter(),
            polls: polls.clone(),
            dropped: dropped.clone(),
        };
        (stream, polls, dropped)
    }
}

impl Stream for TrackedStream {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        Poll::Ready(self.chunks.next().map(Ok))
    }
}

impl Drop for TrackedStream {
    fn drop(&mut self) {
        self.dropped.store(true, Ordering::SeqCst);
    }
}

// --- Helper for creating a mock byte stream ---

fn mock_byte_stream(chunks: Vec<&str>) -> impl Stream<Item = Result<Bytes>> + Send + Unpin {
    stream::iter(
        chunks
            .into_iter()
            .map(|s| Ok(Bytes::from(s.to_string())))
            .collect::<Vec<Result<Bytes>>>(),
    )
}

#[tokio::test]
async fn test_custom_decoder_last_frame() {
    let stream = mock_byte_stream(vec![
        "{\"id\": 1}\n{\"id\": 2}\n",
        "{\"id\": 3, \"stop\": true}\n{\"id\": 4}\n",
    ]);
    let ids = NdjsonParser::<_, IdFrames>::new(stream)
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect::<Result<Vec<_>>>()
        .unwrap();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_lines_are_decoded_on_demand() {
    let (source, polls, _) = TrackedStream::new(vec![
        "{\"id\": 1}\n",
        "{\"id\": 2}\n",
        "{\"id\": 3, \"stop\": true}\n",
    ]);
    let mut parser = NdjsonParser::<_, IdFrames>::new(source);

    assert_eq!(polls.load(Ordering::SeqCst), 0);
    assert_eq!(parser.next().await.unwrap().unwrap(), 1);
    assert_eq!(polls.load(Ordering::SeqCst), 1);
    assert_eq!(parser.next().await.unwrap().unwrap(), 2);
    assert_eq!(polls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_buffered_lines_do_not_read_ahead() {
    let (source, polls, _) = TrackedStream::new(vec!["{\"id\": 1}\n{\"id\": 2}\n", "{\"id\": 3}\n"]);
    let mut parser = NdjsonParser::<_, IdFrames>::new(source);

    assert_eq!(parser.next().await.unwrap().unwrap(), 1);
    assert_eq!(parser.next().await.unwrap().unwrap(), 2);
    assert_eq!(polls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_source_released_after_last_frame() {
    let (source, _, dropped) = TrackedStream::new(vec![
        "{\"id\": 1, \"stop\": true}\n",
        "{\"id\": 2}\n",
    ]);
    let mut parser = NdjsonParser::<_, IdFrames>::new(source);

    assert_eq!(parser.next().await.unwrap().unwrap(), 1);
    assert!(dropped.load(Ordering::SeqCst));
    assert!(parser.next().await.is_none());
}

#[tokio::test]
async fn test_source_released_when_abandoned() {
    let (source, _, dropped) = TrackedStream::new(vec!["{\"id\": 1}\n", "{\"id\": 2}\n"]);
    let mut parser = NdjsonParser::<_, IdFrames>::new(source);

    assert_eq!(parser.next().await.unwrap().unwrap(), 1);
    assert!(!dropped.load(Ordering::SeqCst));
    drop(parser);
    assert!(dropped.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_source_released_after_error() {
    let (source, _, dropped) = TrackedStream::new(vec!["{\"nope\": 1}\n", "{\"id\": 2}\n"]);
    let mut parser = NdjsonParser::<_, IdFrames>::new(source);

    assert!(matches!(
        parser.next().await,
        Some(Err(Error::MalformedResponse(_)))
    ));
    assert!(dropped.load(Ordering::SeqCst));
    assert!(parser.next().await.is_none());
}

#[test]
fn test_is_done_defaults_to_false() {
    assert!(is_done(&serde_json::json!({"done": true})));
    assert!(!is_done(&serde_json::json!({"done": false})));
    assert!(!is_done(&serde_json::json!({"response": "x"})));
    assert!(!is_done(&serde_json::json!({"done": "yes"})));
}
