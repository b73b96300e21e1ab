//! Summarization provider abstraction and implementations.
//!
//! Defines the [`Summarizer`] trait and concrete implementations:
//! - **[`PassthroughSummarizer`]** — the no-model fallback: every variant
//!   carries the extracted text unchanged, and chat completion is
//!   unavailable.
//! - **[`OpenAISummarizer`]** — calls an OpenAI-style chat completions API
//!   with retry and backoff, then parses the completion strictly into the
//!   three expected fields.
//!
//! # Provider Selection
//!
//! Use [`create_summarizer`] to instantiate the appropriate provider
//! based on the configuration.
//!
//! # Retry Strategy
//!
//! The OpenAI provider uses exponential backoff for transient errors:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! # Output Validation
//!
//! The model is a black box with no guaranteed output schema. The
//! completion must be a JSON object with exactly the string fields
//! `halfText`, `smallText`, and `bullets` (Markdown code fences around it
//! are tolerated). Anything else is a summarization error — fields are
//! never silently defaulted.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::SummarizerConfig;
use crate::error::LibraryError;
use crate::models::Summary;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Trait for summarization providers.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-4o-mini"`).
    fn model_name(&self) -> &str;

    /// Whether the stored `fullText` column carries the extracted text
    /// itself rather than the blob reference. True only for the
    /// passthrough fallback.
    fn inlines_full_text(&self) -> bool;

    /// Derives the three summary variants from a document's full text.
    async fn summarize(&self, full_text: &str) -> Result<Summary, LibraryError>;

    /// One unconstrained completion call; backs the chat box.
    async fn complete(&self, prompt: &str) -> Result<String, LibraryError>;
}

/// Create the appropriate [`Summarizer`] based on configuration.
///
/// # Errors
///
/// Returns an error for unknown provider names or if the OpenAI provider
/// cannot be initialized (missing model or API key).
pub fn create_summarizer(config: &SummarizerConfig) -> anyhow::Result<Box<dyn Summarizer>> {
    match config.provider.as_str() {
        "passthrough" => Ok(Box::new(PassthroughSummarizer)),
        "openai" => Ok(Box::new(OpenAISummarizer::new(config)?)),
        other => anyhow::bail!("Unknown summarizer provider: {}", other),
    }
}

// ============ Passthrough Provider ============

/// The no-model fallback provider.
///
/// Used when `summarizer.provider = "passthrough"` in the configuration.
/// Every variant carries the document's extracted text unchanged; chat
/// completion always fails with a descriptive error.
pub struct PassthroughSummarizer;

#[async_trait]
impl Summarizer for PassthroughSummarizer {
    fn model_name(&self) -> &str {
        "passthrough"
    }

    fn inlines_full_text(&self) -> bool {
        true
    }

    async fn summarize(&self, full_text: &str) -> Result<Summary, LibraryError> {
        Ok(Summary {
            half_text: full_text.to_string(),
            small_text: full_text.to_string(),
            bullets: full_text.to_string(),
        })
    }

    async fn complete(&self, _prompt: &str) -> Result<String, LibraryError> {
        Err(LibraryError::Summarization(
            "chat requires a model provider (summarizer.provider = \"openai\")".to_string(),
        ))
    }
}

// ============ OpenAI Provider ============

/// Summarization provider using an OpenAI-style chat completions API.
///
/// Calls `POST {base_url}/v1/chat/completions` with the configured model.
/// Requires the `OPENAI_API_KEY` environment variable to be set. A custom
/// `base_url` supports self-hosted gateways exposing the same API.
pub struct OpenAISummarizer {
    model: String,
    base_url: String,
    max_retries: u32,
    timeout_secs: u64,
}

impl OpenAISummarizer {
    /// Create a new OpenAI provider from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `model` is not set in config, or if
    /// `OPENAI_API_KEY` is not in the environment.
    pub fn new(config: &SummarizerConfig) -> anyhow::Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("summarizer.model required for OpenAI provider"))?;

        if std::env::var("OPENAI_API_KEY").is_err() {
            anyhow::bail!("OPENAI_API_KEY environment variable not set");
        }

        Ok(Self {
            model,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            max_retries: config.max_retries,
            timeout_secs: config.timeout_secs,
        })
    }

    /// Send one chat completion request with retry/backoff and return the
    /// completion content.
    async fn chat(&self, prompt: &str) -> Result<String, LibraryError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| LibraryError::Summarization("OPENAI_API_KEY not set".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .map_err(|e| LibraryError::Summarization(e.to_string()))?;

        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
        });

        let url = format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'));
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = client
                .post(&url)
                .header("Authorization", format!("Bearer {}", api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response
                            .json()
                            .await
                            .map_err(|e| LibraryError::Summarization(e.to_string()))?;
                        return extract_content(&json);
                    }

                    // Rate limited or server error — retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(LibraryError::Summarization(format!(
                            "completion API error {}: {}",
                            status, body_text
                        )));
                        continue;
                    }

                    // Client error (not 429) — don't retry
                    let body_text = response.text().await.unwrap_or_default();
                    return Err(LibraryError::Summarization(format!(
                        "completion API error {}: {}",
                        status, body_text
                    )));
                }
                Err(e) => {
                    last_err = Some(LibraryError::Summarization(e.to_string()));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| {
            LibraryError::Summarization("completion failed after retries".to_string())
        }))
    }
}

#[async_trait]
impl Summarizer for OpenAISummarizer {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn inlines_full_text(&self) -> bool {
        false
    }

    async fn summarize(&self, full_text: &str) -> Result<Summary, LibraryError> {
        let content = self.chat(&build_summary_prompt(full_text)).await?;
        parse_summary(&content)
    }

    async fn complete(&self, prompt: &str) -> Result<String, LibraryError> {
        self.chat(prompt).await
    }
}

/// The fixed instructional prompt for deriving the three variants.
fn build_summary_prompt(full_text: &str) -> String {
    format!(
        "Summarize the following document into three versions: one approximately \
         half the original length, one condensed overview, and one as bullet \
         points. Respond with only a JSON object of the form \
         {{\"halfText\": \"...\", \"smallText\": \"...\", \"bullets\": \"...\"}}.\n\n\
         Document:\n{}",
        full_text
    )
}

/// Extract `choices[0].message.content` from a chat completions response.
fn extract_content(json: &serde_json::Value) -> Result<String, LibraryError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            LibraryError::Summarization(
                "invalid completion response: missing choices[0].message.content".to_string(),
            )
        })
}

/// Parse a completion into a [`Summary`], failing closed on any shape
/// mismatch.
pub fn parse_summary(content: &str) -> Result<Summary, LibraryError> {
    let body = strip_code_fences(content);
    serde_json::from_str(body).map_err(|e| {
        LibraryError::Summarization(format!("model output is not the expected JSON shape: {}", e))
    })
}

/// Remove a surrounding Markdown code fence (with optional info string)
/// if present.
fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") up to the first newline
    let body = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => return trimmed,
    };
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}
