use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{provider} request timed out")]
    Timeout { provider: String },

    #[error("could not reach {provider}: {message}")]
    Transport { provider: String, message: String },

    #[error("{provider} API error {status}: {body}")]
    Api {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("unusable LLM response: {0}")]
    InvalidResponse(String),

    #[error("{0} is not configured")]
    NotConfigured(String),
}

impl LlmError {
    pub fn from_reqwest(provider: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout {
                provider: provider.to_string(),
            }
        } else if let Some(status) = err.status() {
            LlmError::Api {
                provider: provider.to_string(),
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            LlmError::Transport {
                provider: provider.to_string(),
                message: err.to_string(),
            }
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, LlmError::Api { status: 429, .. })
    }

    /// Timeouts, connection failures, throttling and gateway errors.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Timeout { .. } | LlmError::Transport { .. } => true,
            LlmError::Api { status, .. } => matches!(status, 429 | 502 | 503 | 504),
            LlmError::InvalidResponse(_) | LlmError::NotConfigured(_) => false,
        }
    }
}
