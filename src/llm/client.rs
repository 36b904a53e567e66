//! Chat-completions client for the remote text-generation service.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::debug;

use crate::config::LlmConfig;
use crate::error::GenerationError;
use crate::llm::retry::retry_with_backoff;

/// Maximum characters of an error body kept in [`GenerationError::Status`].
const MAX_ERROR_BODY: usize = 200;

/// Something that turns a prompt into free text.
///
/// This abstraction allows mocking the remote service in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    stream: bool,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    content: Option<String>,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    timeout: Duration,
    max_attempts: u32,
}

impl ChatCompletionsClient {
    /// Build a client from configuration.
    ///
    /// Fails with [`GenerationError::MissingCredential`] when no API key is set.
    pub fn new(config: &LlmConfig) -> Result<Self, GenerationError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(GenerationError::MissingCredential)?
            .to_string();

        let http = reqwest::Client::builder()
            .build()
            .map_err(GenerationError::Http)?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            top_p: config.top_p,
            timeout: Duration::from_secs(config.timeout_secs),
            max_attempts: config.max_attempts,
        })
    }

    /// Override the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// One request/response exchange, bounded by the configured timeout.
    async fn request_once(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
            stream: false,
        };

        let exchange = async {
            let response = self
                .http
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await
                .map_err(GenerationError::Http)?;
            let status = response.status();
            let body = response.text().await.map_err(GenerationError::Http)?;
            Ok::<_, GenerationError>((status, body))
        };

        let (status, body) = timeout(self.timeout, exchange)
            .await
            .map_err(|_| GenerationError::Timeout(self.timeout))??;

        if !status.is_success() {
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: truncate_chars(body.trim(), MAX_ERROR_BODY).to_string(),
            });
        }

        parse_chat_response(&body)
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        debug!(
            endpoint = %self.endpoint,
            model = %self.model,
            prompt_chars = prompt.len(),
            "Requesting commit message"
        );
        retry_with_backoff(
            self.max_attempts,
            || self.request_once(prompt),
            GenerationError::is_transient,
            |e| GenerationError::RetriesExhausted(Box::new(e)),
        )
        .await
    }
}

/// Extract the generated text from a chat-completions response body.
///
/// Only surrounding whitespace is removed; fences and quotes are left for
/// [`clean_message`].
pub fn parse_chat_response(body: &str) -> Result<String, GenerationError> {
    let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| {
        GenerationError::MalformedResponse(format!(
            "{e}. Response: {}",
            truncate_chars(body, MAX_ERROR_BODY)
        ))
    })?;

    let content = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();

    let message = content.trim();
    if message.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(message.to_string())
}

/// Strip markdown fences and wrapping quotes from generated text.
pub fn clean_message(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // Drop the info string on the opening fence line
        let rest = rest.split_once('\n').map_or("", |(_, body)| body);
        text = rest.trim_end().strip_suffix("```").unwrap_or(rest).trim();
    }

    for quote in ['"', '\'', '`'] {
        if text.len() >= 2 && text.starts_with(quote) && text.ends_with(quote) {
            text = text[1..text.len() - 1].trim();
            break;
        }
    }

    text.to_string()
}

/// Truncate a string to at most `max_chars` characters (Unicode-safe).
fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
