//! LLM Client Abstraction
//!
//! Provides a common interface for the language model provider so planners
//! and assistants can be tested against scripted clients.

use async_trait::async_trait;

use crate::error::LlmError;

/// Model families exposed by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistantModel {
    GeneralAssistant,
    SmartContractAuditor,
    SmartContractGenerator,
}

impl AssistantModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssistantModel::GeneralAssistant => "general_assistant",
            AssistantModel::SmartContractAuditor => "smart_contract_auditor",
            AssistantModel::SmartContractGenerator => "smart_contract_generator",
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Single-shot question, returns the model's text answer
    async fn ask(&self, model: AssistantModel, question: &str) -> Result<String, LlmError>;

    fn provider_name(&self) -> &str;
}

/// Stands in when no provider key is configured. Every call fails with
/// [`LlmError::NotConfigured`].
#[derive(Debug, Clone)]
pub struct DisabledClient {
    missing: String,
}

impl DisabledClient {
    pub fn new(missing: impl Into<String>) -> Self {
        Self {
            missing: missing.into(),
        }
    }
}

#[async_trait]
impl LlmClient for DisabledClient {
    async fn ask(&self, _model: AssistantModel, _question: &str) -> Result<String, LlmError> {
        Err(LlmError::NotConfigured(self.missing.clone()))
    }

    fn provider_name(&self) -> &str {
        "disabled"
    }
}
