//! Contains all data structures that are particularly used for Ollama Chat API

use std::pin::Pin;

use crate::types::{Options, Role};
use crate::Result;
use futures::Stream;
use ollama_bridge_macros::FromBytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One turn of a conversation.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// The role of the sender (`System`, `User` or `Assistant`).
    pub role: Role,
    /// The text of the message.
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// A chat request: a model, the conversation so far, and extra options.
///
/// Used by both [`OllamaClient::chat`](crate::OllamaClient::chat) and
/// [`OllamaClient::chat_stream`](crate::OllamaClient::chat_stream).
#[derive(Default, Debug, Clone, PartialEq)]
pub struct ChatRequest {
    /// The name of the model to use for the chat completion.
    pub model: String,
    /// The messages exchanged so far, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Additional generation parameters copied verbatim into the request body.
    pub options: Options,
}

impl ChatRequest {
    /// Creates a new [`ChatRequest`] with no messages.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            options: Options::default(),
        }
    }

    /// Appends a message to the conversation.
    pub fn add_message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// Appends several messages, keeping their order.
    pub fn messages(mut self, messages: impl IntoIterator<Item = ChatMessage>) -> Self {
        self.messages.extend(messages);
        self
    }

    /// Replaces the generation options.
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Sets a single generation option.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key, value);
        self
    }
}

/// Wire form of a [`ChatRequest`].
#[derive(Serialize, Debug)]
pub(crate) struct ChatBody {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(flatten)]
    options: Options,
}

impl ChatBody {
    pub(crate) fn new(request: ChatRequest, stream: bool) -> Self {
        Self {
            model: request.model,
            messages: request.messages,
            stream,
            options: request
                .options
                .without_reserved(&["model", "messages", "stream"]),
        }
    }
}

/// A chat response object exactly as the server sent it.
///
/// Chat responses carry metadata whose shape varies between server versions,
/// so the whole object is kept. The accessors cover the common fields. The
/// same type is used for a one-shot reply and for each element of a
/// [`ChatStream`].
#[derive(Deserialize, Serialize, Default, FromBytes, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct ChatResponse(Map<String, Value>);

impl ChatResponse {
    pub fn model(&self) -> Option<&str> {
        self.0.get("model").and_then(Value::as_str)
    }

    /// The `message` object, if present.
    pub fn message(&self) -> Option<&Map<String, Value>> {
        self.0.get("message").and_then(Value::as_object)
    }

    /// Role of the message, when it is one of the known roles.
    pub fn role(&self) -> Option<Role> {
        self.message()
            .and_then(|m| m.get("role"))
            .and_then(|r| Role::deserialize(r).ok())
    }

    /// Text of the message. For a stream element this is the partial content.
    pub fn content(&self) -> Option<&str> {
        self.message()
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str)
    }

    /// `true` when this object carries the `done` sentinel.
    pub fn is_done(&self) -> bool {
        self.0.get("done").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn done_reason(&self) -> Option<&str> {
        self.0.get("done_reason").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for ChatResponse {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// The raw objects of a streaming chat, in arrival order.
///
/// The final element is the object carrying `done: true`; nothing follows it.
/// Dropping the stream releases the connection.
pub struct ChatStream {
    pub inner: Pin<Box<dyn Stream<Item = Result<ChatResponse>> + Send>>,
}

impl Stream for ChatStream {
    type Item = Result<ChatResponse>;

    fn poll_next(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}
