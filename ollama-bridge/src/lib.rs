//! A client for a locally running Ollama model-serving process.
//!
//! The client speaks the three endpoints a local installation exposes:
//! `/api/tags` for installed models, `/api/generate` for prompt completion
//! and `/api/chat` for conversations. Generate and chat come in a one-shot
//! form and a streaming form that yields results as the server produces
//! them, ending on the server's `done` marker.
//!
//! ```no_run
//! use futures::StreamExt;
//! use ollama_bridge::types::generate::GenerateRequest;
//! use ollama_bridge::OllamaClient;
//!
//! # async fn run() -> ollama_bridge::Result<()> {
//! let client = OllamaClient::builder().build()?;
//! let mut tokens = client
//!     .generate_stream(GenerateRequest::new("qwen3:latest", "Why is the sky blue?"))
//!     .await?;
//! while let Some(token) = tokens.next().await {
//!     print!("{}", token?);
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use self::transport::Transport;

pub mod builder;
pub mod client;
pub mod config;
pub mod parser;
pub mod stream;
pub mod transport;
pub mod types;

pub use config::ClientConfig;

#[derive(Clone)]
pub struct OllamaClient {
    transport: Arc<dyn Transport + Send + Sync>,
    max_tokens: u32,
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Client error: {0}")]
    Client(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Server error: {0}")]
    Server(String),
}

impl Error {
    /// `true` for failures where the same request may succeed later.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::ServiceUnavailable(_) | Error::Timeout(_))
    }
}
