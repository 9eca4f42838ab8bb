use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::stream::{self};
use futures::StreamExt;
use tracing::instrument;

use crate::transport::{status_error, ByteStream, Transport};
use crate::types::{Endpoint, HttpRequest, HttpResponse};
use crate::{Error, Result};

#[derive(Debug, Clone)]
enum MockReply {
    Body { status: u16, body: Bytes },
    Chunks(Vec<Bytes>),
    Timeout(Duration),
    ConnectionError(String),
}

/// A mock implementation of the [`Transport`] trait for testing purposes.
///
/// Replies are queued per [`Endpoint`] and consumed in order, one per request,
/// by both the streaming and the non-streaming call. Every request is recorded
/// so tests can inspect what would have been sent.
#[derive(Clone, Default)]
pub struct MockTransport {
    replies: Arc<Mutex<HashMap<Endpoint, VecDeque<MockReply>>>>,
    sent: Arc<Mutex<Vec<HttpRequest>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockTransport {
    /// Creates a new, empty [`MockTransport`].
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, endpoint: Endpoint, reply: MockReply) -> Self {
        lock(&self.replies)
            .entry(endpoint)
            .or_default()
            .push_back(reply);
        self
    }

    /// Queues a complete response with the given status and body.
    pub fn with_response(self, endpoint: Endpoint, status: u16, body: impl Into<Bytes>) -> Self {
        self.push(
            endpoint,
            MockReply::Body {
                status,
                body: body.into(),
            },
        )
    }

    /// Queues a `200` response delivered as the given raw chunks, exactly as split.
    pub fn with_stream_chunks<B: Into<Bytes>>(self, endpoint: Endpoint, chunks: Vec<B>) -> Self {
        self.push(
            endpoint,
            MockReply::Chunks(chunks.into_iter().map(Into::into).collect()),
        )
    }

    /// Queues a `200` response delivering each string as one newline-terminated chunk.
    pub fn with_ndjson_lines<S: AsRef<str>>(self, endpoint: Endpoint, lines: Vec<S>) -> Self {
        let chunks = lines
            .iter()
            .map(|line| Bytes::from(format!("{}\n", line.as_ref())))
            .collect::<Vec<_>>();
        self.with_stream_chunks(endpoint, chunks)
    }

    /// Queues a request that fails with [`Error::Timeout`].
    pub fn with_timeout(self, endpoint: Endpoint, after: Duration) -> Self {
        self.push(endpoint, MockReply::Timeout(after))
    }

    /// Queues a request that fails to connect with the given transport error text.
    pub fn with_connection_error(self, endpoint: Endpoint, message: impl Into<String>) -> Self {
        self.push(endpoint, MockReply::ConnectionError(message.into()))
    }

    /// Returns every request received so far, oldest first.
    pub fn sent_requests(&self) -> Vec<HttpRequest> {
        lock(&self.sent).clone()
    }

    fn next_reply(&self, request: HttpRequest) -> Result<(Endpoint, MockReply)> {
        let endpoint = request.endpoint;
        lock(&self.sent).push(request);
        let reply = lock(&self.replies)
            .get_mut(&endpoint)
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| {
                Error::ServiceUnavailable(format!(
                    "no mock reply configured for {}",
                    endpoint.path()
                ))
            })?;
        Ok((endpoint, reply))
    }
}

#[async_trait]
impl Transport for MockTransport {
    /// Mocks sending a non-streaming HTTP request.
    ///
    /// Chunked replies are concatenated into one body.
    #[instrument(skip(self, request), fields(endpoint = request.endpoint.name()))]
    async fn send_http_request(&self, request: HttpRequest) -> Result<HttpResponse> {
        match self.next_reply(request)? {
            (endpoint, MockReply::Body { status, body }) => {
                if !(200..300).contains(&status) {
                    return Err(status_error(endpoint, status, &body));
                }
                Ok(HttpResponse {
                    status,
                    body: Some(body),
                })
            }
            (_, MockReply::Chunks(chunks)) => {
                let mut body = BytesMut::new();
                for chunk in chunks {
                    body.extend_from_slice(&chunk);
                }
                Ok(HttpResponse {
                    status: 200,
                    body: Some(body.freeze()),
                })
            }
            (_, MockReply::Timeout(after)) => Err(Error::Timeout(after)),
            (_, MockReply::ConnectionError(message)) => Err(Error::ServiceUnavailable(message)),
        }
    }

    /// Mocks sending a streaming HTTP request.
    ///
    /// A complete-body reply is delivered as a single chunk.
    #[instrument(skip(self, request), fields(endpoint = request.endpoint.name()))]
    async fn send_http_stream_request(&self, request: HttpRequest) -> Result<ByteStream> {
        match self.next_reply(request)? {
            (endpoint, MockReply::Body { status, body }) => {
                if !(200..300).contains(&status) {
                    return Err(status_error(endpoint, status, &body));
                }
                Ok(stream::iter(vec![Ok(body)]).boxed())
            }
            (_, MockReply::Chunks(chunks)) => Ok(stream::iter(chunks).map(Ok).boxed()),
            (_, MockReply::Timeout(after)) => Err(Error::Timeout(after)),
            (_, MockReply::ConnectionError(message)) => Err(Error::ServiceUnavailable(message)),
        }
    }
}
