//! Chunk summarisation: send one chunk to a chat-completion model.
//!
//! Two backends implement [`Summarizer`]:
//!
//! * [`OpenRouterClient`] posts directly to an OpenAI-compatible
//!   `/chat/completions` endpoint (OpenRouter by default). It owns the full
//!   failure taxonomy: missing key, non-2xx status with body, undecodable
//!   JSON, no choices, empty content.
//! * [`ProviderSummarizer`] routes the same two messages through an
//!   `edgequake-llm` provider, for callers who already run OpenAI,
//!   Anthropic, Gemini or Ollama.
//!
//! Neither backend retries. A failed request surfaces immediately and the
//! controller stops the run.

use crate::config::{lookup_api_key, SummarizerConfig};
use crate::error::{PdfSumError, SummarizeError};
use crate::prompts::{summary_user_prompt, SUMMARY_SYSTEM_PROMPT};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Result of summarising one chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkSummary {
    pub content: String,
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
}

impl ChunkSummary {
    /// A summary with no token accounting.
    pub fn from_text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

/// Turns a chunk of text into a summary using the given model.
///
/// Returns a boxed future so implementations can be stored as
/// `Arc<dyn Summarizer>`.
pub trait Summarizer: Send + Sync {
    fn summarize<'a>(
        &'a self,
        chunk: &'a str,
        model: &'a str,
    ) -> BoxFuture<'a, Result<ChunkSummary, SummarizeError>>;
}

/// Pick the summariser a config asks for.
///
/// 1. A pre-built `edgequake-llm` provider (`config.provider`).
/// 2. A named `edgequake-llm` provider (`config.provider_name`).
/// 3. The built-in OpenRouter client.
pub fn resolve_summarizer(config: &SummarizerConfig) -> Result<Arc<dyn Summarizer>, PdfSumError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::new(ProviderSummarizer::fixed(Arc::clone(provider), config)));
    }

    if let Some(ref name) = config.provider_name {
        return Ok(Arc::new(ProviderSummarizer::named(name.clone(), config)));
    }

    Ok(Arc::new(OpenRouterClient::new(config)?))
}

// ── OpenRouter ───────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<RequestMessage<'a>>,
    max_tokens: usize,
    temperature: f32,
}

#[derive(Serialize)]
struct RequestMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Option<Vec<Choice>>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
}

/// Direct client for an OpenAI-compatible chat-completion endpoint.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    api_key_env: String,
    app_referer: Option<String>,
    app_title: String,
    system_prompt: String,
    max_tokens: usize,
    temperature: f32,
}

impl OpenRouterClient {
    /// Build a client from the config. The API key is not required here; it
    /// is looked up on every request so a missing key fails the first chunk.
    pub fn new(config: &SummarizerConfig) -> Result<Self, PdfSumError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| PdfSumError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            api_key_env: config.api_key_env.clone(),
            app_referer: config.app_referer.clone(),
            app_title: config.app_title.clone(),
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| SUMMARY_SYSTEM_PROMPT.to_string()),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    fn api_key(&self) -> Result<String, SummarizeError> {
        lookup_api_key(self.api_key.as_deref(), &self.api_key_env).ok_or_else(|| {
            SummarizeError::MissingApiKey {
                env_var: self.api_key_env.clone(),
            }
        })
    }

    async fn request(&self, chunk: &str, model: &str) -> Result<ChunkSummary, SummarizeError> {
        let api_key = self.api_key()?;
        let user_prompt = summary_user_prompt(chunk);
        let body = ChatRequest {
            model,
            messages: vec![
                RequestMessage {
                    role: "system",
                    content: &self.system_prompt,
                },
                RequestMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let mut request = self
            .http
            .post(&self.api_url)
            .bearer_auth(api_key)
            .header("X-Title", &self.app_title)
            .json(&body);
        if let Some(ref referer) = self.app_referer {
            request = request.header("HTTP-Referer", referer);
        }

        let start = Instant::now();
        let response = request
            .send()
            .await
            .map_err(|e| SummarizeError::Transport(e.to_string()))?;
        let status = response.status();
        debug!("POST {} → {} in {:?}", self.api_url, status, start.elapsed());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizeError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SummarizeError::Transport(e.to_string()))?;
        let parsed: ChatResponse = serde_json::from_slice(&bytes)
            .map_err(|e| SummarizeError::InvalidResponse(e.to_string()))?;

        let first = parsed
            .choices
            .and_then(|choices| choices.into_iter().next())
            .ok_or(SummarizeError::NoChoices)?;
        let content = first
            .message
            .and_then(|m| m.content)
            .filter(|c| !c.is_empty())
            .ok_or(SummarizeError::EmptyContent)?;

        let (prompt_tokens, completion_tokens) = parsed
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));

        Ok(ChunkSummary {
            content,
            prompt_tokens,
            completion_tokens,
        })
    }
}

impl Summarizer for OpenRouterClient {
    fn summarize<'a>(
        &'a self,
        chunk: &'a str,
        model: &'a str,
    ) -> BoxFuture<'a, Result<ChunkSummary, SummarizeError>> {
        Box::pin(async move {
            debug!("Summarizing {} chars with {}", chunk.chars().count(), model);
            let result = self.request(chunk, model).await;
            if let Err(ref e) = result {
                warn!("Summarization request failed: {}", e);
            }
            result
        })
    }
}

// ── edgequake-llm adapter ────────────────────────────────────────────────

enum ProviderSource {
    Fixed(Arc<dyn LLMProvider>),
    Named(String),
}

/// [`Summarizer`] over an `edgequake-llm` provider.
///
/// A fixed provider answers with whatever model it was built for and
/// ignores the per-run model. A named provider is created per call with the
/// run's model, reading its API key from the usual environment variable.
pub struct ProviderSummarizer {
    source: ProviderSource,
    system_prompt: String,
    options: CompletionOptions,
}

impl ProviderSummarizer {
    pub fn fixed(provider: Arc<dyn LLMProvider>, config: &SummarizerConfig) -> Self {
        Self::with_source(ProviderSource::Fixed(provider), config)
    }

    pub fn named(name: impl Into<String>, config: &SummarizerConfig) -> Self {
        Self::with_source(ProviderSource::Named(name.into()), config)
    }

    fn with_source(source: ProviderSource, config: &SummarizerConfig) -> Self {
        Self {
            source,
            system_prompt: config
                .system_prompt
                .clone()
                .unwrap_or_else(|| SUMMARY_SYSTEM_PROMPT.to_string()),
            options: CompletionOptions {
                temperature: Some(config.temperature),
                max_tokens: Some(config.max_tokens),
                ..Default::default()
            },
        }
    }

    fn provider_label(&self) -> String {
        match &self.source {
            ProviderSource::Fixed(_) => "custom".to_string(),
            ProviderSource::Named(name) => name.clone(),
        }
    }

    fn provider_for(&self, model: &str) -> Result<Arc<dyn LLMProvider>, SummarizeError> {
        match &self.source {
            ProviderSource::Fixed(p) => Ok(Arc::clone(p)),
            ProviderSource::Named(name) => ProviderFactory::create_llm_provider(name, model)
                .map_err(|e| SummarizeError::Provider {
                    provider: name.clone(),
                    detail: format!("{e}"),
                }),
        }
    }
}

impl Summarizer for ProviderSummarizer {
    fn summarize<'a>(
        &'a self,
        chunk: &'a str,
        model: &'a str,
    ) -> BoxFuture<'a, Result<ChunkSummary, SummarizeError>> {
        Box::pin(async move {
            let provider = self.provider_for(model)?;
            let messages = vec![
                ChatMessage::system(self.system_prompt.as_str()),
                ChatMessage::user(summary_user_prompt(chunk)),
            ];

            let response = provider
                .chat(&messages, Some(&self.options))
                .await
                .map_err(|e| SummarizeError::Provider {
                    provider: self.provider_label(),
                    detail: format!("{e}"),
                })?;

            if response.content.is_empty() {
                return Err(SummarizeError::EmptyContent);
            }

            Ok(ChunkSummary {
                content: response.content,
                prompt_tokens: response.prompt_tokens,
                completion_tokens: response.completion_tokens,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(key: Option<&str>) -> OpenRouterClient {
        let mut builder = SummarizerConfig::builder()
            .api_url("http://127.0.0.1:9/never")
            .api_key_env("PDFSUM_TEST_NO_SUCH_KEY");
        if let Some(k) = key {
            builder = builder.api_key(k);
        }
        OpenRouterClient::new(&builder.build().unwrap()).unwrap()
    }

    #[test]
    fn missing_key_fails_before_any_request() {
        let c = client(None);
        let err = tokio_test::block_on(c.summarize("text", "deepseek/deepseek-r1:free"))
            .unwrap_err();
        assert_eq!(
            err,
            SummarizeError::MissingApiKey {
                env_var: "PDFSUM_TEST_NO_SUCH_KEY".into()
            }
        );
    }

    #[test]
    fn request_body_shape() {
        let body = ChatRequest {
            model: "m/x",
            messages: vec![
                RequestMessage { role: "system", content: "sys" },
                RequestMessage { role: "user", content: "usr" },
            ],
            max_tokens: 2000,
            temperature: 0.5,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "m/x");
        assert_eq!(json["max_tokens"], 2000);
        assert_eq!(json["temperature"], 0.5);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "usr");
    }

    #[test]
    fn response_tolerates_missing_fields() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices":null}"#).unwrap();
        assert!(parsed.choices.is_none());
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{}}]}"#).unwrap();
        assert!(parsed.choices.unwrap()[0].message.as_ref().unwrap().content.is_none());
    }

    #[test]
    fn provider_options_follow_config() {
        let config = SummarizerConfig::builder()
            .temperature(0.3)
            .max_tokens(512)
            .build()
            .unwrap();
        let s = ProviderSummarizer::named("openai", &config);
        assert_eq!(s.options.temperature, Some(0.3));
        assert_eq!(s.options.max_tokens, Some(512));
        assert_eq!(s.provider_label(), "openai");
    }
}
