use thiserror::Error;

/// Failures talking to the hosted completion provider.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    Transport(String),
    #[error("provider request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider response could not be decoded: {0}")]
    MalformedResponse(String),
    #[error("provider response contained no choices")]
    EmptyChoices,
}

impl ProviderError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Transport(_) => "The language model service could not be reached.",
            Self::Timeout { .. } => "The language model service did not respond in time.",
            Self::Status { status, .. } if *status == 401 || *status == 403 => {
                "The language model service rejected the configured credentials."
            }
            Self::Status { status: 429, .. } => {
                "The language model service is rate limiting requests. Please retry shortly."
            }
            Self::Status { .. } => "The language model service returned an error.",
            Self::MalformedResponse(_) | Self::EmptyChoices => {
                "The language model service returned an unreadable response."
            }
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SessionStoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Store(#[from] SessionStoreError),
    #[error("response assembly failed: {0}")]
    Assembly(String),
}

impl ChatError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Provider(error) => error.user_message(),
            Self::Store(_) => "Conversation history is temporarily unavailable. Please retry.",
            Self::Assembly(_) => "An unexpected internal error occurred.",
        }
    }
}
