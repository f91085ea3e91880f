use std::time::{Duration, Instant};

use async_trait::async_trait;
use invchat_core::config::LlmConfig;
use invchat_core::{ChatMessage, ProviderError, TokenUsage, PROVIDER_NAME};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::llm::{CompletionResult, LlmClient};

const MAX_ERROR_BODY_CHARS: usize = 512;

/// Chat-completions client for OpenAI and API-compatible endpoints.
pub struct OpenAiClient {
    http: Client,
    api_key: SecretString,
    endpoint: String,
    timeout_secs: u64,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
    usage: Option<CompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| ProviderError::Transport(error.to_string()))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(
        &self,
        messages: &[ChatMessage],
        model: &str,
    ) -> Result<(String, TokenUsage), ProviderError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&CompletionRequest { model, messages })
            .send()
            .await
            .map_err(|error| self.classify_transport_error(error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let payload: CompletionResponse = response.json().await.map_err(|error| {
            if error.is_timeout() {
                ProviderError::Timeout { timeout_secs: self.timeout_secs }
            } else {
                ProviderError::MalformedResponse(error.to_string())
            }
        })?;

        let choice = payload.choices.into_iter().next().ok_or(ProviderError::EmptyChoices)?;
        let content = choice.message.content.ok_or_else(|| {
            ProviderError::MalformedResponse("first choice has no message content".to_string())
        })?;
        let usage = payload.usage.ok_or_else(|| {
            ProviderError::MalformedResponse("response has no usage block".to_string())
        })?;

        let normalized = TokenUsage::new(usage.prompt_tokens, usage.completion_tokens);
        if normalized.total_tokens != usage.total_tokens {
            warn!(
                event_name = "chat.provider.usage_mismatch",
                reported_total = usage.total_tokens,
                computed_total = normalized.total_tokens,
                "provider total_tokens disagrees with prompt + completion; using the sum"
            );
        }

        Ok((content, normalized))
    }

    fn classify_transport_error(&self, error: reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::Timeout { timeout_secs: self.timeout_secs }
        } else {
            ProviderError::Transport(error.without_url().to_string())
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    fn provider(&self) -> &str {
        PROVIDER_NAME
    }

    async fn complete(&self, messages: &[ChatMessage], model: &str) -> CompletionResult {
        let started = Instant::now();
        let outcome = self.send(messages, model).await;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match outcome {
            Ok((answer, usage)) => CompletionResult::success(answer, usage, latency_ms),
            Err(error) => CompletionResult::failed(error, latency_ms),
        }
    }
}
