use futures::stream::unfold;
use futures::StreamExt;

#[cfg(feature = "metrics")]
use metrics::counter;
use tracing::{debug, info, instrument, warn};

use crate::builder::OllamaClientBuilder;
use crate::stream::{ChatStreamParser, GenerateStreamParser};
use crate::types::chat::{ChatBody, ChatRequest, ChatResponse, ChatStream};
use crate::types::generate::{GenerateBody, GenerateRequest, GenerateResponse, GenerateStream};
use crate::types::{
    Endpoint, HttpRequest, HttpResponse, ListModelsResponse, ModelDescriptor, OllamaError,
};
use crate::OllamaClient;
use crate::{Error, Result};

impl OllamaClient {
    pub fn builder() -> OllamaClientBuilder {
        OllamaClientBuilder::new()
    }

    /// Token ceiling injected into generate requests that do not set `max_tokens`.
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Lists the models installed on the server.
    ///
    /// # Errors
    ///
    /// [`Error::ServiceUnavailable`] if the server cannot be reached or answers with a
    /// non-2xx status, [`Error::Timeout`] if it does not answer in time, and
    /// [`Error::MalformedResponse`] if the body is not a model list.
    #[instrument(skip(self))]
    pub async fn list_models(&self) -> Result<Vec<ModelDescriptor>> {
        record_request(Endpoint::Tags, "non_streaming");

        let result = async move {
            let request = HttpRequest::new(Endpoint::Tags).get();
            let response = self.transport.send_http_request(request).await?;
            let list = decode_body(response, ListModelsResponse::from_bytes)?;
            Ok::<_, Error>(list.models)
        }
        .await;

        if let Ok(models) = &result {
            info!(count = models.len(), "listed installed models");
        }
        observe(Endpoint::Tags, result)
    }

    /// Generates a completion and returns its full text.
    ///
    /// Waits for the whole response. See [`OllamaClient::list_models`] for errors; a
    /// body without a `response` text is an [`Error::MalformedResponse`].
    #[instrument(skip(self, request), fields(model = %request.model))]
    pub async fn generate(&self, request: GenerateRequest) -> Result<String> {
        record_request(Endpoint::Generate, "non_streaming");

        let result = async move {
            let body = GenerateBody::new(request, false, self.max_tokens);
            let request = HttpRequest::new(Endpoint::Generate).post().body(body)?;
            debug!("sending generate request");

            let response = self.transport.send_http_request(request).await?;
            let generated = decode_body(response, GenerateResponse::from_bytes)?;
            debug!(chars = generated.response.len(), "generate response received");
            Ok::<_, Error>(generated.response)
        }
        .await;

        observe(Endpoint::Generate, result)
    }

    /// Starts a streaming completion.
    ///
    /// The returned stream yields text fragments in arrival order and ends when the
    /// server sends its `done` object. Dropping it early closes the connection.
    /// Errors establishing the stream are returned here; errors after that
    /// (including a connection that closes before `done`) are the stream's last
    /// element.
    #[instrument(skip(self, request), fields(model = %request.model))]
    pub async fn generate_stream(&self, request: GenerateRequest) -> Result<GenerateStream> {
        record_request(Endpoint::Generate, "streaming");

        let result = async move {
            let body = GenerateBody::new(request, true, self.max_tokens);
            let request = HttpRequest::new(Endpoint::Generate).post().body(body)?;
            debug!("sending streaming generate request");

            self.transport.send_http_stream_request(request).await
        }
        .await;

        let byte_stream = observe(Endpoint::Generate, result)?;
        let parser = GenerateStreamParser::new(byte_stream);

        let response_stream = unfold(parser, |mut parser| async move {
            let next = parser.next().await;
            match &next {
                Some(Err(e)) => warn!(error = %e, "generate stream failed"),
                None => debug!("generate stream finished"),
                Some(Ok(_)) => {}
            }
            next.map(|token| (token, parser))
        });

        Ok(GenerateStream {
            inner: Box::pin(response_stream),
        })
    }

    /// Sends a conversation and returns the complete response object.
    ///
    /// See [`OllamaClient::list_models`] for errors; a body that is not a JSON
    /// object is an [`Error::MalformedResponse`].
    #[instrument(skip(self, request), fields(model = %request.model, messages = request.messages.len()))]
    pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        record_request(Endpoint::Chat, "non_streaming");

        let result = async move {
            let request = HttpRequest::new(Endpoint::Chat)
                .post()
                .body(ChatBody::new(request, false))?;
            debug!("sending chat request");

            let response = self.transport.send_http_request(request).await?;
            decode_body(response, ChatResponse::from_bytes)
        }
        .await;

        observe(Endpoint::Chat, result)
    }

    /// Starts a streaming conversation turn.
    ///
    /// The returned stream yields each response object as received; the object
    /// carrying `done: true` is yielded last. Error behaviour matches
    /// [`OllamaClient::generate_stream`].
    #[instrument(skip(self, request), fields(model = %request.model, messages = request.messages.len()))]
    pub async fn chat_stream(&self, request: ChatRequest) -> Result<ChatStream> {
        record_request(Endpoint::Chat, "streaming");

        let result = async move {
            let request = HttpRequest::new(Endpoint::Chat)
                .post()
                .body(ChatBody::new(request, true))?;
            debug!("sending streaming chat request");

            self.transport.send_http_stream_request(request).await
        }
        .await;

        let byte_stream = observe(Endpoint::Chat, result)?;
        let parser = ChatStreamParser::new(byte_stream);

        let response_stream = unfold(parser, |mut parser| async move {
            let next = parser.next().await;
            match &next {
                Some(Err(e)) => warn!(error = %e, "chat stream failed"),
                None => debug!("chat stream finished"),
                Some(Ok(_)) => {}
            }
            next.map(|event| (event, parser))
        });

        Ok(ChatStream {
            inner: Box::pin(response_stream),
        })
    }
}

/// Decodes a complete body, turning an `{"error": ...}` body into [`Error::Server`].
fn decode_body<T>(
    response: HttpResponse,
    parse: impl FnOnce(bytes::Bytes) -> Result<T>,
) -> Result<T> {
    let bytes = response
        .body
        .ok_or_else(|| Error::MalformedResponse("Missing response body".into()))?;

    if let Ok(err) = serde_json::from_slice::<OllamaError>(&bytes) {
        return Err(Error::Server(err.error));
    }

    parse(bytes)
}

fn record_request(endpoint: Endpoint, kind: &'static str) {
    #[cfg(feature = "metrics")]
    counter!("ollama_client.requests_total", "endpoint" => endpoint.name(), "type" => kind)
        .increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = (endpoint, kind);
}

fn observe<T>(endpoint: Endpoint, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        warn!(endpoint = endpoint.name(), error = %e, "request failed");
        #[cfg(feature = "metrics")]
        counter!("ollama_client.errors_total", "endpoint" => endpoint.name()).increment(1);
    }
    result
}
