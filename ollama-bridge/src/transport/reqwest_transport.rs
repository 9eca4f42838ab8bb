use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tracing::{debug, instrument};

use crate::config::Endpoints;
use crate::transport::{status_error, ByteStream, Transport};
use crate::types::{HttpRequest, HttpResponse, HttpVerb};
use crate::{Error, Result};

/// A [`Transport`] implementation that uses the `reqwest` crate for making HTTP requests.
///
/// This is the default transport used by [`OllamaClient`](crate::OllamaClient) if no custom transport
/// is provided. The request timeout bounds the wait for the response head
/// only, so a long-running stream is never cut off once it has started.
pub struct ReqwestTransport {
    client: Client,
    endpoints: Endpoints,
    request_timeout: Duration,
}

impl ReqwestTransport {
    /// Creates a new `ReqwestTransport`.
    ///
    /// # Arguments
    ///
    /// * `endpoints` - The resolved endpoint URLs of the serving process.
    /// * `request_timeout` - Bound on connecting and on waiting for the response head.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Client`] if the `reqwest` client cannot be built.
    pub fn new(endpoints: Endpoints, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(request_timeout)
            .build()
            .map_err(|e| Error::Client(e.to_string()))?;
        Ok(Self {
            client,
            endpoints,
            request_timeout,
        })
    }

    /// Helper to build and send a reqwest request, handling common logic.
    async fn build_and_send_request(&self, request: HttpRequest) -> Result<reqwest::Response> {
        let url = self.endpoints.url(request.endpoint).clone();

        let mut request_builder = match request.verb {
            HttpVerb::GET => self.client.get(url),
            HttpVerb::POST => self.client.post(url),
        };

        if let Some(body) = &request.body {
            request_builder = request_builder.json(body);
        }

        let response = tokio::time::timeout(self.request_timeout, request_builder.send())
            .await
            .map_err(|_| Error::Timeout(self.request_timeout))?
            .map_err(|e| transport_error(e, self.request_timeout))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(status_error(request.endpoint, status.as_u16(), &body));
        }

        debug!(endpoint = request.endpoint.name(), status = status.as_u16(), "response received");
        Ok(response)
    }
}

/// Maps a reqwest failure, keeping the whole cause chain in the message.
fn transport_error(err: reqwest::Error, request_timeout: Duration) -> Error {
    if err.is_timeout() {
        return Error::Timeout(request_timeout);
    }
    let mut message = err.to_string();
    let mut source = std::error::Error::source(&err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    Error::ServiceUnavailable(message)
}

#[async_trait]
impl Transport for ReqwestTransport {
    /// Sends a non-streaming HTTP request using `reqwest`.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::ServiceUnavailable`] if the request fails or the body cannot be read,
    /// and an [`Error::Timeout`] if no response arrives in time.
    #[instrument(skip(self, request), fields(endpoint = request.endpoint.name()))]
    async fn send_http_request(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self.build_and_send_request(request).await?;
        let status = response.status().as_u16();
        let response_bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, self.request_timeout))?;
        Ok(HttpResponse {
            status,
            body: Some(response_bytes),
        })
    }

    /// Sends a streaming HTTP request using `reqwest` and returns a stream of response bytes.
    ///
    /// # Errors
    ///
    /// Same as [`ReqwestTransport::send_http_request`] for establishing the stream; read
    /// failures after that are yielded by the stream itself.
    #[instrument(skip(self, request), fields(endpoint = request.endpoint.name()))]
    async fn send_http_stream_request(&self, request: HttpRequest) -> Result<ByteStream> {
        let response = self.build_and_send_request(request).await?;
        let request_timeout = self.request_timeout;
        let stream = response
            .bytes_stream()
            .map(move |item| item.map_err(|e| transport_error(e, request_timeout)))
            .boxed();
        Ok(stream)
    }
}
