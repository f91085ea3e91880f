use async_trait::async_trait;
use invchat_core::{ChatMessage, ProviderError, TokenUsage};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompletionStatus {
    Success,
    Failed(ProviderError),
}

/// Outcome of one completion call. Failures are data, not errors: the latency
/// to failure is still recorded and usage is zeroed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionResult {
    pub answer: String,
    pub usage: TokenUsage,
    pub latency_ms: u64,
    pub status: CompletionStatus,
}

impl CompletionResult {
    pub fn success(answer: impl Into<String>, usage: TokenUsage, latency_ms: u64) -> Self {
        Self { answer: answer.into(), usage, latency_ms, status: CompletionStatus::Success }
    }

    pub fn failed(error: ProviderError, latency_ms: u64) -> Self {
        Self {
            answer: error.user_message().to_string(),
            usage: TokenUsage::zero(),
            latency_ms,
            status: CompletionStatus::Failed(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, CompletionStatus::Success)
    }

    pub fn error(&self) -> Option<&ProviderError> {
        match &self.status {
            CompletionStatus::Success => None,
            CompletionStatus::Failed(error) => Some(error),
        }
    }
}

/// The single suspension point of a chat request. No retries.
#[async_trait]
pub trait LlmClient: Send + Sync {
    fn provider(&self) -> &str;

    async fn complete(&self, messages: &[ChatMessage], model: &str) -> CompletionResult;
}

#[cfg(test)]
mod tests {
    use invchat_core::{ProviderError, TokenUsage};

    use super::CompletionResult;

    #[test]
    fn failed_results_zero_usage_and_keep_latency() {
        let result = CompletionResult::failed(ProviderError::Timeout { timeout_secs: 30 }, 30_004);

        assert!(!result.is_success());
        assert_eq!(result.usage, TokenUsage::zero());
        assert_eq!(result.latency_ms, 30_004);
        assert_eq!(result.error(), Some(&ProviderError::Timeout { timeout_secs: 30 }));
        assert!(result.answer.contains("did not respond in time"));
    }
}
