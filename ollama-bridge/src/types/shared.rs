use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Option key carrying the token ceiling of a generate request.
pub const MAX_TOKENS_KEY: &str = "max_tokens";

#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    #[default]
    User,
    Assistant,
}

/// Error body returned by the serving process, either as a whole response
/// or as one line of a stream.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OllamaError {
    pub error: String,
}

/// Extra generation parameters merged verbatim into the top level of a
/// request body (`temperature`, `stop`, `max_tokens`, `num_ctx`, ...).
///
/// The set of keys the server understands changes independently of this
/// crate, so this is an open JSON map rather than a fixed struct. Insertion
/// order is preserved on the wire.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct Options(Map<String, Value>);

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, replacing any previous value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn temperature(self, temperature: f64) -> Self {
        self.with("temperature", temperature)
    }

    pub fn stop<I, S>(self, sequences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sequences = sequences
            .into_iter()
            .map(|s| Value::String(s.into()))
            .collect::<Vec<_>>();
        self.with("stop", sequences)
    }

    pub fn max_tokens(self, max_tokens: u32) -> Self {
        self.with(MAX_TOKENS_KEY, max_tokens)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Drops keys the request body owns itself, so an option can never
    /// replace the model, the prompt/messages or the stream flag.
    pub(crate) fn without_reserved(mut self, reserved: &[&str]) -> Self {
        for key in reserved {
            if self.0.remove(*key).is_some() {
                tracing::warn!(key = *key, "ignoring option that would overwrite a request field");
            }
        }
        self
    }
}

impl From<Map<String, Value>> for Options {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Options {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
