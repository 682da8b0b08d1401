//! Step failure taxonomy.
//!
//! Handlers raise [`StepError`]; the executor is the only place that turns
//! one into a status transition. Classification is structural: each
//! collaborator error knows whether it is transient, so no message text is
//! inspected.
//!
//! ```text
//! Transient  Network | Timeout | RateLimited    → retried while retryCount < 2
//! Terminal   INSUFFICIENT_BALANCE | POLICY_VIOLATION | USER_REJECTED
//!            EXECUTION_FAILED (everything else)
//! ```

use thiserror::Error;
use web3_agent_types::ErrorCode;
use web3_agentic::LlmError;

use crate::chain::ChainError;
use crate::compiler::CompileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientKind {
    Network,
    Timeout,
    RateLimited,
}

impl TransientKind {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            TransientKind::RateLimited => ErrorCode::RateLimit,
            TransientKind::Network | TransientKind::Timeout => ErrorCode::NetworkError,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Transient(TransientKind),
    Terminal(ErrorCode),
}

#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(
        "Insufficient balance. You have {available} {symbol} but tried to spend {requested} {symbol}. (Token: {token})"
    )]
    InsufficientBalance {
        available: String,
        requested: String,
        symbol: String,
        token: String,
    },

    #[error("Policy violation: {0}")]
    PolicyViolation(String),

    #[error("Invalid step parameters: {0}")]
    InvalidParams(String),

    #[error("{0}")]
    NotFound(String),
}

impl StepError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        StepError::InvalidParams(msg.into())
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            StepError::Chain(e) => match e {
                ChainError::UserRejected(_) => ErrorClass::Terminal(ErrorCode::UserRejected),
                ChainError::Timeout { .. } => ErrorClass::Transient(TransientKind::Timeout),
                e if e.is_rate_limited() => ErrorClass::Transient(TransientKind::RateLimited),
                e if e.is_transient() => ErrorClass::Transient(TransientKind::Network),
                _ => ErrorClass::Terminal(ErrorCode::ExecutionFailed),
            },
            StepError::Llm(e) => match e {
                LlmError::Timeout { .. } => ErrorClass::Transient(TransientKind::Timeout),
                e if e.is_rate_limited() => ErrorClass::Transient(TransientKind::RateLimited),
                e if e.is_transient() => ErrorClass::Transient(TransientKind::Network),
                _ => ErrorClass::Terminal(ErrorCode::ExecutionFailed),
            },
            StepError::InsufficientBalance { .. } => {
                ErrorClass::Terminal(ErrorCode::InsufficientBalance)
            }
            StepError::PolicyViolation(_) => ErrorClass::Terminal(ErrorCode::PolicyViolation),
            StepError::Compile(_) | StepError::InvalidParams(_) | StepError::NotFound(_) => {
                ErrorClass::Terminal(ErrorCode::ExecutionFailed)
            }
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self.class(), ErrorClass::Transient(_))
    }
}
