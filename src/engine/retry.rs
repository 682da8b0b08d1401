//! Failure → status transition. The only place a step is marked `failed`.

use serde_json::json;
use web3_agent_types::{ErrorCode, Step, StepStatus, MAX_RETRIES};

use crate::error::{ErrorClass, StepError};

/// What the caller is told after a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    pub message: String,
    /// `Some(true)` only when the step was re-queued for another attempt
    pub should_retry: Option<bool>,
}

/// Applies a handler error to `step`.
///
/// Transient errors re-queue the step while `retryCount < MAX_RETRIES`;
/// the attempt after that fails terminally with `EXECUTION_FAILED`.
pub fn apply_failure(step: &mut Step, err: &StepError) -> FailureReport {
    let raw = err.to_string();
    let retries = step.retries();

    let code = match err.class() {
        ErrorClass::Transient(kind) if retries < MAX_RETRIES => {
            let attempt = retries + 1;
            step.status = StepStatus::Pending;
            step.retry_count = Some(attempt);
            step.can_retry = Some(true);
            step.error_code = Some(kind.error_code());
            tracing::warn!(step = %step.id, ?kind, attempt, error = %raw, "transient failure, re-queued");
            return FailureReport {
                message: format!(
                    "Network issue detected. Retrying step (attempt {attempt}/{MAX_RETRIES})..."
                ),
                should_retry: Some(true),
            };
        }
        ErrorClass::Transient(kind) => {
            tracing::error!(step = %step.id, ?kind, retries, error = %raw, "retry budget exhausted");
            ErrorCode::ExecutionFailed
        }
        ErrorClass::Terminal(code) => {
            if code == ErrorCode::ExecutionFailed {
                tracing::error!(step = %step.id, error = %raw, "step failed");
            } else {
                tracing::warn!(step = %step.id, ?code, error = %raw, "step rejected");
            }
            code
        }
    };

    step.status = StepStatus::Failed;
    step.result = Some(json!({ "error": raw }));
    step.can_retry = Some(false);
    step.error_code = Some(code);

    let message = match (code, err) {
        (ErrorCode::InsufficientBalance, _) => {
            "Insufficient balance. Please add funds to your wallet.".to_string()
        }
        (ErrorCode::PolicyViolation, StepError::PolicyViolation(reason)) => {
            format!("Transaction blocked by policy: {reason}")
        }
        (ErrorCode::UserRejected, _) => "You rejected the transaction.".to_string(),
        _ => format!("Step failed: {raw}"),
    };
    FailureReport {
        message,
        should_retry: None,
    }
}
