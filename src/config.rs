//! Configuration for the summarisation pipeline.
//!
//! Every knob lives in [`SummarizerConfig`], built via its
//! [`SummarizerConfigBuilder`]. Defaults: 5 MiB upload limit, 15 000-character
//! chunks, OpenRouter with `deepseek/deepseek-r1:free`, 2 000 output tokens
//! at temperature 0.5.

use crate::error::PdfSumError;
use crate::models::DEFAULT_MODEL;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default upload limit: 5 MiB.
pub const DEFAULT_MAX_FILE_BYTES: usize = 5 * 1024 * 1024;

/// Default chunk length in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 15_000;

/// OpenRouter chat-completion endpoint.
pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Environment variable consulted when no key is configured explicitly.
pub const DEFAULT_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

/// Configuration for a [`crate::controller::PipelineController`].
///
/// # Example
/// ```rust
/// use pdfsum::SummarizerConfig;
///
/// let config = SummarizerConfig::builder()
///     .chunk_size(8_000)
///     .model("mistralai/mistral-7b-instruct:free")
///     .build()
///     .unwrap();
/// assert_eq!(config.chunk_size, 8_000);
/// ```
#[derive(Clone)]
pub struct SummarizerConfig {
    /// Largest accepted document in bytes. Default: 5 MiB.
    pub max_file_bytes: usize,

    /// Maximum chunk length in characters. Default: 15 000.
    pub chunk_size: usize,

    /// Model used when the caller does not pick one.
    pub model: String,

    /// Sampling temperature. Default: 0.5.
    pub temperature: f32,

    /// Maximum tokens generated per chunk. Default: 2000.
    pub max_tokens: usize,

    /// Chat-completion endpoint. Default: OpenRouter.
    pub api_url: String,

    /// Explicit API key. Takes precedence over `api_key_env`.
    pub api_key: Option<String>,

    /// Environment variable holding the API key, read at request time.
    pub api_key_env: String,

    /// Sent as `HTTP-Referer` so OpenRouter can attribute the traffic.
    pub app_referer: Option<String>,

    /// Sent as `X-Title`.
    pub app_title: String,

    /// Custom system prompt. If None, uses [`crate::prompts::SUMMARY_SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Per-request timeout for the summarisation endpoint. Default: 120.
    pub api_timeout_secs: u64,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Explicit pdfium library (file or directory). Falls back to
    /// `PDFIUM_LIB_PATH`, then the system library.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`
    /// and the OpenRouter client.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// `edgequake-llm` provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            chunk_size: DEFAULT_CHUNK_SIZE,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.5,
            max_tokens: 2000,
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            app_referer: None,
            app_title: "PDF Summarizer".to_string(),
            system_prompt: None,
            api_timeout_secs: 120,
            download_timeout_secs: 120,
            password: None,
            pdfium_lib_path: None,
            provider: None,
            provider_name: None,
        }
    }
}

impl fmt::Debug for SummarizerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummarizerConfig")
            .field("max_file_bytes", &self.max_file_bytes)
            .field("chunk_size", &self.chunk_size)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_key_env", &self.api_key_env)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("provider_name", &self.provider_name)
            .finish()
    }
}

impl SummarizerConfig {
    /// Create a new builder for `SummarizerConfig`.
    pub fn builder() -> SummarizerConfigBuilder {
        SummarizerConfigBuilder {
            config: Self::default(),
        }
    }

    /// The key to send, if any: the explicit one first, then the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        lookup_api_key(self.api_key.as_deref(), &self.api_key_env)
    }

    /// True when requests go to the built-in OpenRouter client, whose model
    /// ids follow the `vendor/model[:tag]` format.
    pub fn uses_openrouter(&self) -> bool {
        self.provider.is_none() && self.provider_name.is_none()
    }
}

/// An explicit key, else the value of `env_var`; blank keys count as absent.
pub fn lookup_api_key(explicit: Option<&str>, env_var: &str) -> Option<String> {
    explicit
        .map(str::to_string)
        .or_else(|| std::env::var(env_var).ok())
        .filter(|k| !k.trim().is_empty())
}

/// Builder for [`SummarizerConfig`].
#[derive(Debug)]
pub struct SummarizerConfigBuilder {
    config: SummarizerConfig,
}

impl SummarizerConfigBuilder {
    pub fn max_file_bytes(mut self, n: usize) -> Self {
        self.config.max_file_bytes = n;
        self
    }

    pub fn chunk_size(mut self, n: usize) -> Self {
        self.config.chunk_size = n;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t;
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn api_key_env(mut self, var: impl Into<String>) -> Self {
        self.config.api_key_env = var.into();
        self
    }

    pub fn app_referer(mut self, referer: impl Into<String>) -> Self {
        self.config.app_referer = Some(referer.into());
        self
    }

    pub fn app_title(mut self, title: impl Into<String>) -> Self {
        self.config.app_title = title.into();
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SummarizerConfig, PdfSumError> {
        let c = &self.config;
        if c.chunk_size == 0 {
            return Err(PdfSumError::InvalidConfig(
                "Chunk size must be ≥ 1".into(),
            ));
        }
        if c.max_file_bytes == 0 {
            return Err(PdfSumError::InvalidConfig(
                "Maximum file size must be ≥ 1 byte".into(),
            ));
        }
        if !(0.0..=2.0).contains(&c.temperature) {
            return Err(PdfSumError::InvalidConfig(format!(
                "Temperature must be 0.0–2.0, got {}",
                c.temperature
            )));
        }
        if c.api_url.trim().is_empty() {
            return Err(PdfSumError::InvalidConfig("API URL must not be empty".into()));
        }
        if c.uses_openrouter() && !crate::models::is_valid_model_id(&c.model) {
            return Err(PdfSumError::InvalidConfig(format!(
                "Malformed model identifier '{}'",
                c.model
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// What a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    /// One LLM summary per chunk, concatenated. (default)
    #[default]
    Summary,
    /// The extracted text, verbatim.
    Plain,
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputType::Summary => f.write_str("summary"),
            OutputType::Plain => f.write_str("plain"),
        }
    }
}
