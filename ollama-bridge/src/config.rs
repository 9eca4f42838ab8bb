//! Client configuration: where the serving process lives, how long to wait
//! for it, and the token ceiling applied to generate requests.

use std::time::Duration;

use reqwest::Url;

use crate::types::Endpoint;
use crate::{Error, Result};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 11434;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

const ENV_HOST: &str = "OLLAMA_HOST";
const ENV_PORT: &str = "OLLAMA_PORT";
const ENV_REQUEST_TIMEOUT: &str = "OLLAMA_REQUEST_TIMEOUT";
const ENV_MAX_TOKENS: &str = "OLLAMA_MAX_TOKENS";

/// Settings fixed for the lifetime of an [`OllamaClient`](crate::OllamaClient).
///
/// [`ClientConfig::default`] never consults the environment. Use
/// [`ClientConfig::from_env`] to opt into `OLLAMA_*` variables.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the serving process, e.g. `http://localhost:11434`.
    /// Endpoint paths are appended to it, so a path prefix is kept.
    pub base_url: String,
    /// Upper bound on the wait for the initial response of every request.
    pub request_timeout: Duration,
    /// Token ceiling injected into generate requests that do not set one.
    pub max_tokens: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: format!("http://{}:{}", DEFAULT_HOST, DEFAULT_PORT),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

impl ClientConfig {
    /// Reads the configuration from the process environment.
    ///
    /// - `OLLAMA_HOST`: a host name, a `host:port` pair or a full URL.
    /// - `OLLAMA_PORT`: port used when `OLLAMA_HOST` does not carry one.
    /// - `OLLAMA_REQUEST_TIMEOUT`: timeout in whole seconds.
    /// - `OLLAMA_MAX_TOKENS`: default token ceiling.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Client`] if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`], but variables are resolved through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match get(ENV_PORT) {
            Some(raw) => parse_var::<u16>(ENV_PORT, &raw)?,
            None => DEFAULT_PORT,
        };

        let base_url = match get(ENV_HOST) {
            Some(host) if host.starts_with("http://") || host.starts_with("https://") => {
                host.trim_end_matches('/').to_string()
            }
            Some(host) => match host.rsplit_once(':') {
                Some((name, explicit)) if explicit.parse::<u16>().is_ok() => {
                    format!("http://{}:{}", name, explicit)
                }
                _ => format!("http://{}:{}", host, port),
            },
            None => format!("http://{}:{}", DEFAULT_HOST, port),
        };

        let request_timeout = match get(ENV_REQUEST_TIMEOUT) {
            Some(raw) => Duration::from_secs(parse_var::<u64>(ENV_REQUEST_TIMEOUT, &raw)?),
            None => DEFAULT_REQUEST_TIMEOUT,
        };

        let max_tokens = match get(ENV_MAX_TOKENS) {
            Some(raw) => parse_var::<u32>(ENV_MAX_TOKENS, &raw)?,
            None => DEFAULT_MAX_TOKENS,
        };

        Ok(Self {
            base_url,
            request_timeout,
            max_tokens,
        })
    }

    /// Resolves the three endpoint URLs against [`ClientConfig::base_url`].
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Client`] if the base URL is not an absolute http(s) URL.
    pub fn endpoints(&self) -> Result<Endpoints> {
        Endpoints::new(&self.base_url)
    }
}

fn parse_var<T>(key: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map_err(|e| Error::Client(format!("Invalid value {:?} for {}: {}", raw, key, e)))
}

/// The three absolute URLs a client talks to. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    tags: Url,
    generate: Url,
    chat: Url,
}

impl Endpoints {
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| Error::Client(format!("Invalid base URL {:?}: {}", base_url, e)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::Client(format!(
                "Invalid base URL {:?}: unsupported scheme {:?}",
                base_url,
                base.scheme()
            )));
        }
        if base.query().is_some() || base.fragment().is_some() {
            return Err(Error::Client(format!(
                "Invalid base URL {:?}: query and fragment are not allowed",
                base_url
            )));
        }

        let root = base.as_str().trim_end_matches('/').to_string();
        let resolve = |endpoint: Endpoint| {
            Url::parse(&format!("{}{}", root, endpoint.path()))
                .map_err(|e| Error::Client(format!("Invalid endpoint URL: {}", e)))
        };

        Ok(Self {
            tags: resolve(Endpoint::Tags)?,
            generate: resolve(Endpoint::Generate)?,
            chat: resolve(Endpoint::Chat)?,
        })
    }

    pub fn url(&self, endpoint: Endpoint) -> &Url {
        match endpoint {
            Endpoint::Tags => &self.tags,
            Endpoint::Generate => &self.generate,
            Endpoint::Chat => &self.chat,
        }
    }
}
