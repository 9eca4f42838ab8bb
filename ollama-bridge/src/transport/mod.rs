use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::types::{Endpoint, HttpRequest, HttpResponse, OllamaError};
use crate::{Error, Result};

mod mock_transport;
mod reqwest_transport;

pub use mock_transport::MockTransport;
pub use reqwest_transport::ReqwestTransport;

/// Raw response body chunks of a streaming request.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Moves requests to the serving process and bytes back.
///
/// Implementations must report a connection failure or a non-2xx status as
/// [`Error::ServiceUnavailable`], and a request whose initial response does
/// not arrive in time as [`Error::Timeout`].
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Sends a non-streaming HTTP request and returns the full response.
    async fn send_http_request(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// Sends a streaming HTTP request and returns a stream of response bytes.
    async fn send_http_stream_request(&self, request: HttpRequest) -> Result<ByteStream>;
}

/// Builds the error for a non-2xx reply, preferring the server's own
/// `{"error": ...}` text over the raw body.
pub fn status_error(endpoint: Endpoint, status: u16, body: &[u8]) -> Error {
    let detail = match serde_json::from_slice::<OllamaError>(body) {
        Ok(err) => err.error,
        Err(_) => String::from_utf8_lossy(body).trim().to_string(),
    };
    if detail.is_empty() {
        Error::ServiceUnavailable(format!("HTTP {} from {}", status, endpoint.path()))
    } else {
        Error::ServiceUnavailable(format!(
            "HTTP {} from {}: {}",
            status,
            endpoint.path(),
            detail
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_prefers_server_text() {
        let err = status_error(
            Endpoint::Chat,
            404,
            br#"{"error":"model 'nope' not found, try pulling it first"}"#,
        );
        assert_eq!(
            err.to_string(),
            "Service unavailable: HTTP 404 from /api/chat: model 'nope' not found, try pulling it first"
        );
    }

    #[test]
    fn status_error_with_plain_or_empty_body() {
        let err = status_error(Endpoint::Tags, 502, b"Bad Gateway\n");
        assert_eq!(
            err.to_string(),
            "Service unavailable: HTTP 502 from /api/tags: Bad Gateway"
        );
        let err = status_error(Endpoint::Generate, 500, b"");
        assert_eq!(err.to_string(), "Service unavailable: HTTP 500 from /api/generate");
    }
}
