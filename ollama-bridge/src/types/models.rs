use ollama_bridge_macros::FromBytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Represents the response from listing the models installed on the server.
#[derive(Deserialize, Serialize, Default, FromBytes, Debug)]
pub struct ListModelsResponse {
    /// The installed models. An absent list means none are installed.
    #[serde(default)]
    pub models: Vec<ModelDescriptor>,
}

/// Represents a single installed model.
///
/// Only `name` is required. Every other key the server reports that is not
/// modelled here is kept in [`ModelDescriptor::extra`].
#[derive(Deserialize, Serialize, Default, Debug, Clone, PartialEq)]
pub struct ModelDescriptor {
    /// The name and tag of the model (e.g., "qwen3:latest").
    pub name: String,
    /// The size of the model in bytes.
    #[serde(default)]
    pub size: u64,
    /// The timestamp when the model was last modified (ISO 8601 format).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
    /// The digest of the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// Detailed information about the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ModelDetails>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Provides detailed information about an installed model.
#[derive(Deserialize, Serialize, Default, Debug, Clone, PartialEq)]
pub struct ModelDetails {
    #[serde(default)]
    pub parent_model: String,
    /// The format of the model (e.g., "gguf").
    #[serde(default)]
    pub format: String,
    /// The family of the model (e.g., "qwen3").
    #[serde(default)]
    pub family: String,
    /// A list of families the model belongs to.
    #[serde(default)]
    pub families: Option<Vec<String>>,
    /// The parameter size of the model (e.g., "8.2B").
    #[serde(default)]
    pub parameter_size: String,
    /// The quantization level of the model (e.g., "Q4_K_M").
    #[serde(default)]
    pub quantization_level: String,
}
