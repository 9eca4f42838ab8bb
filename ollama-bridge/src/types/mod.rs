//! Contains data structures for requests and responses to the Ollama API.
//!
//! This module defines the types used to talk to the serving process:
//! chat messages and responses, generation requests, installed-model
//! descriptors, the free-form generation options map, and the transport-level
//! request/response envelopes.

pub mod chat;
pub mod generate;
mod http;
mod models;
mod shared;

pub use http::*;
pub use models::*;
pub use shared::*;
