//! Contains all data structures that are particularly used for Ollama Generate API

use std::pin::Pin;

use crate::types::{Options, MAX_TOKENS_KEY};
use crate::Result;
use futures::Stream;
use ollama_bridge_macros::FromBytes;
use serde::{Deserialize, Serialize};

/// A prompt-completion request.
///
/// The same request drives both [`OllamaClient::generate`](crate::OllamaClient::generate)
/// and [`OllamaClient::generate_stream`](crate::OllamaClient::generate_stream);
/// the client sets the `stream` flag on the wire.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    /// The name of the model to use for generation (e.g., "qwen3:latest").
    pub model: String,
    /// The prompt text.
    pub prompt: String,
    /// Additional generation parameters copied verbatim into the request body.
    pub options: Options,
}

impl GenerateRequest {
    /// Creates a new [`GenerateRequest`] with no extra options.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            options: Options::default(),
        }
    }

    /// Replaces the generation options.
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Sets a single generation option.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.options.insert(key, value);
        self
    }

    /// Sets the token ceiling, overriding the client's default.
    pub fn max_tokens(self, max_tokens: u32) -> Self {
        self.option(MAX_TOKENS_KEY, max_tokens)
    }
}

/// Wire form of a [`GenerateRequest`].
#[derive(Serialize, Debug)]
pub(crate) struct GenerateBody {
    model: String,
    prompt: String,
    stream: bool,
    #[serde(flatten)]
    options: Options,
}

impl GenerateBody {
    /// Builds the body, inserting `default_max_tokens` when the caller did not
    /// set a ceiling.
    pub(crate) fn new(request: GenerateRequest, stream: bool, default_max_tokens: u32) -> Self {
        let mut options = request
            .options
            .without_reserved(&["model", "prompt", "stream"]);
        if !options.contains_key(MAX_TOKENS_KEY) {
            options.insert(MAX_TOKENS_KEY, default_max_tokens);
        }
        Self {
            model: request.model,
            prompt: request.prompt,
            stream,
            options,
        }
    }
}

/// Represents a response from the Ollama API for text generation.
///
/// This struct is used for non-streaming generation responses.
#[derive(Deserialize, Serialize, Default, FromBytes, Debug, Clone)]
pub struct GenerateResponse {
    /// The name of the model that generated the response.
    #[serde(default)]
    pub model: String,
    /// The timestamp when the response was created.
    #[serde(default)]
    pub created_at: String,
    /// The generated text response.
    pub response: String,
    /// Indicates if the generation is complete.
    #[serde(default)]
    pub done: bool,
    /// The reason why the generation finished (e.g., "stop", "length").
    #[serde(default)]
    pub done_reason: Option<String>,
    /// The total duration of the generation process in nanoseconds.
    #[serde(default)]
    pub total_duration: u64,
    /// The duration spent loading the model in nanoseconds.
    #[serde(default)]
    pub load_duration: u64,
    /// The number of tokens in the prompt that were evaluated.
    #[serde(default)]
    pub prompt_eval_count: u64,
    /// The duration spent evaluating the prompt in nanoseconds.
    #[serde(default)]
    pub prompt_eval_duration: u64,
    /// The number of tokens generated.
    #[serde(default)]
    pub eval_count: u64,
    /// The duration spent generating tokens in nanoseconds.
    #[serde(default)]
    pub eval_duration: u64,
}

/// The text fragments of a streaming generation, in arrival order.
///
/// Ends after the server's final `done` object, which contributes no
/// fragment. Dropping the stream releases the connection.
pub struct GenerateStream {
    pub inner: Pin<Box<dyn Stream<Item = Result<String>> + Send>>,
}

impl Stream for GenerateStream {
    type Item = Result<String>;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}
