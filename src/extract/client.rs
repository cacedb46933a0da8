//! Core `ExpenseExtractor` trait and the Groq-backed implementation.
//!
//! [`GroqExtractor`] calls Groq's OpenAI-compatible `/v1/chat/completions`
//! endpoint with a single user-role message and consumes the first choice's
//! message content. Connection details come from [`ExtractorConfig`];
//! nothing is hardcoded beyond the chat-completions path.
//!
//! Every failure is classified into the closed [`ExtractError`] set
//! immediately after the network call, before any UI branching sees it.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::config::ExtractorConfig;
use crate::extract::prompt::extraction_prompt;

// ---------------------------------------------------------------------------
// ExtractError
// ---------------------------------------------------------------------------

/// Closed classification of extraction failures.
///
/// Classification happens once, right after the provider answers; the rest
/// of the pipeline branches on these variants only and never inspects
/// provider-specific status fields.
#[derive(Debug, Clone, Error)]
pub enum ExtractError {
    /// Provider rate/quota limit hit (HTTP 429).
    #[error("provider rate limit exceeded")]
    RateLimited,

    /// API credential missing, invalid, or not permitted (HTTP 401/403).
    #[error("provider rejected the API credential")]
    Unauthorized,

    /// The model's reply was not the requested JSON object.
    #[error("failed to decode extraction response: {0}")]
    Malformed(String),

    /// Transport failures, unexpected statuses, and empty completions.
    #[error("extraction failed: {0}")]
    Unknown(String),
}

/// Map an unsuccessful HTTP status to an [`ExtractError`].
///
/// `body` is included in the `Unknown` message so the generic alert can show
/// what the provider actually said.
pub fn classify_status(status: u16, body: &str) -> ExtractError {
    match status {
        429 => ExtractError::RateLimited,
        401 | 403 => ExtractError::Unauthorized,
        _ => ExtractError::Unknown(format!("provider returned status {status}: {body}")),
    }
}

// ---------------------------------------------------------------------------
// ExpenseExtractor trait
// ---------------------------------------------------------------------------

/// Async interface for LLM-backed expense extraction.
///
/// Implementors must be `Send + Sync` so a single instance can be shared
/// behind `Arc<dyn ExpenseExtractor>` for the whole session — one client per
/// process, substitutable with a test double.
///
/// # Arguments
/// * `text`  – Non-empty free-text expense description. Callers enforce the
///             empty-input short-circuit before reaching this trait.
/// * `today` – Capture date, handed to the prompt as the date fallback.
///
/// The `Ok` value is the provider's raw reply text; cleanup and decoding
/// happen downstream.
#[async_trait]
pub trait ExpenseExtractor: Send + Sync {
    async fn extract(&self, text: &str, today: NaiveDate) -> Result<String, ExtractError>;
}

// ---------------------------------------------------------------------------
// Chat-completion wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// GroqExtractor
// ---------------------------------------------------------------------------

/// Production extractor backed by Groq's OpenAI-compatible chat API.
///
/// The HTTP client carries no request timeout on purpose: the call
/// completes or fails according to the provider, and the UI stays
/// responsive because the call runs on the async runtime.
pub struct GroqExtractor {
    client: reqwest::Client,
    config: ExtractorConfig,
}

impl GroqExtractor {
    /// Build a `GroqExtractor` from application config.
    ///
    /// Construct this once in `main` and share it; a missing API key is not
    /// an error here — it surfaces as [`ExtractError::Unauthorized`] when
    /// the provider rejects the first call.
    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config: config.clone(),
        }
    }
}

#[async_trait]
impl ExpenseExtractor for GroqExtractor {
    /// Send the extraction prompt for `text` and return the first choice's
    /// message content.
    ///
    /// The `Authorization: Bearer …` header is attached **only** when
    /// `config.api_key` is `Some(key)` and `key` is non-empty.
    async fn extract(&self, text: &str, today: NaiveDate) -> Result<String, ExtractError> {
        let prompt = extraction_prompt(text, today);

        let url = format!("{}/v1/chat/completions", self.config.base_url);

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "user", "content": prompt }
            ],
            "stream": false
        });

        let mut req = self.client.post(&url).json(&body);

        let key = self.config.api_key.as_deref().unwrap_or("");
        if !key.is_empty() {
            req = req.bearer_auth(key);
        }

        let response = req
            .send()
            .await
            .map_err(|e| ExtractError::Unknown(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), &body));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| ExtractError::Unknown(format!("unexpected completion shape: {e}")))?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(ExtractError::Unknown(
                "provider returned an empty completion".into(),
            ));
        }

        log::debug!("extractor: raw reply = {content:?}");
        Ok(content)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
