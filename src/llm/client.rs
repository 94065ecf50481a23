use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use super::types::{ApiError, ChatRequest, ChatResponse, Message};
use crate::config::{ApiKey, LlmConfig};

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("completion API rate limit exceeded")]
    RateLimited,

    #[error("completion API quota exhausted: {0}")]
    QuotaExhausted(String),

    #[error("completion API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("model returned an empty completion")]
    EmptyCompletion,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Stateless prompt-in, text-out capability.
/// Implemented by `OpenAiClient` for production; scripted mocks are used in tests.
pub trait CompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(http: Client, config: &LlmConfig, timeout: Duration) -> Self {
        Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: ApiKey::new("test-key"),
            model: "test-model".to_string(),
            base_url: base_url.to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

impl CompletionClient for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose())
            .header("User-Agent", crate::USER_AGENT)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let structured = serde_json::from_str::<ChatResponse>(&text)
                .ok()
                .and_then(|body| body.error);
            let err = classify_api_error(status.as_u16(), structured.as_ref(), &text);
            warn!(error = %err, "completion API error");
            return Err(err);
        }

        let body: ChatResponse = response.json().await?;
        debug!(model = %self.model, prompt_len = prompt.len(), "completion received");

        body.first_content()
            .map(str::to_string)
            .ok_or(CompletionError::EmptyCompletion)
    }
}

fn classify_api_error(status: u16, err: Option<&ApiError>, raw: &str) -> CompletionError {
    let message = match err.and_then(|e| e.message.clone()) {
        Some(m) => m,
        None => {
            let end = raw.floor_char_boundary(200);
            format!("HTTP {status}: {}", &raw[..end])
        }
    };
    let code = err.and_then(|e| e.code.as_deref());

    match (status, code) {
        (_, Some("insufficient_quota")) => CompletionError::QuotaExhausted(message),
        (429, _) => CompletionError::RateLimited,
        _ => CompletionError::Api {
            code: status,
            message,
        },
    }
}
