use bytes::Bytes;
use serde::Serialize;

use crate::{Error, Result};

/// The logical endpoints of the serving process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// `GET /api/tags`, installed models.
    Tags,
    /// `POST /api/generate`, prompt completion.
    Generate,
    /// `POST /api/chat`, conversation turn.
    Chat,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Tags => "/api/tags",
            Endpoint::Generate => "/api/generate",
            Endpoint::Chat => "/api/chat",
        }
    }

    /// Short label used in logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Endpoint::Tags => "tags",
            Endpoint::Generate => "generate",
            Endpoint::Chat => "chat",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub endpoint: Endpoint,
    pub verb: HttpVerb,
    pub body: Option<serde_json::Value>,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVerb {
    #[default]
    GET,
    POST,
}

#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Option<Bytes>,
}

impl HttpRequest {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            verb: HttpVerb::default(),
            body: None,
        }
    }

    pub fn get(mut self) -> Self {
        self.verb = HttpVerb::GET;
        self
    }

    pub fn post(mut self) -> Self {
        self.verb = HttpVerb::POST;
        self
    }

    pub fn body<T: Serialize>(mut self, body: T) -> Result<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| Error::Client(format!("Failed to serialize request body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }
}
