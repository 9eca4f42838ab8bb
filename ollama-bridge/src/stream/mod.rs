//! Provides utilities for parsing and handling streaming responses from the Ollama API.
//!
//! This module contains the per-endpoint decoders plugged into
//! [`NdjsonParser`](crate::parser::NdjsonParser): text fragments for
//! generation, raw response objects for chat.

mod chat_stream_parser;
mod generate_stream_parser;

pub use chat_stream_parser::{ChatFrames, ChatStreamParser};
pub use generate_stream_parser::{GenerateFrames, GenerateStreamParser};
