use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use crate::config::ClientConfig;
use crate::transport::{ReqwestTransport, Transport};
use crate::{OllamaClient, Result};

/// A builder for constructing an [`OllamaClient`].
///
/// - Starts from [`ClientConfig::default`]; nothing is read from the environment
///   unless [`ClientConfig::from_env`] is passed to [`OllamaClientBuilder::config`].
/// - Uses `reqwest`-based transport by default - [`ReqwestTransport`].
pub struct OllamaClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport + Send + Sync>>,
}

impl OllamaClientBuilder {
    /// Creates a new [`OllamaClientBuilder`]. This method is called by [`OllamaClient::builder`]
    pub(crate) fn new() -> Self {
        OllamaClientBuilder {
            config: ClientConfig::default(),
            transport: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the base URL of the serving process, e.g. `http://localhost:11434`.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// Sets the bound on the wait for the initial response of each request.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Sets the token ceiling injected into generate requests without one.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Sets a custom transport implementation for the client.
    ///
    /// This allows for using different HTTP clients or mock implementations for testing.
    /// If not set, a `reqwest`-based transport \([`ReqwestTransport`]\) will be used.
    ///
    /// For testing, you can use [`MockTransport`](crate::transport::MockTransport)
    /// or your own mock [`Transport`] implementations.
    pub fn transport(mut self, transport: Arc<dyn Transport + Send + Sync>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the [`OllamaClient`] with the configured options.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Client`](variant@crate::Error::Client) if the base URL is
    /// invalid or if there's an issue initializing [`ReqwestTransport`].
    #[instrument(skip(self), fields(base_url = %self.config.base_url))]
    pub fn build(self) -> Result<OllamaClient> {
        let endpoints = self.config.endpoints()?;

        let transport = match self.transport {
            Some(t) => t,
            None => Arc::new(ReqwestTransport::new(
                endpoints,
                self.config.request_timeout,
            )?),
        };

        Ok(OllamaClient {
            transport,
            max_tokens: self.config.max_tokens,
        })
    }
}
