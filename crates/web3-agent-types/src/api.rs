//! Request/response bodies for `POST /api/agent`.

use serde::{Deserialize, Serialize};

use crate::{Plan, RiskLevel, Step, TxDraft};

/// One agent invocation. `plan` is absent on the first turn of a request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user_address: Option<String>,
    #[serde(default)]
    pub chain_id: Option<u64>,
    #[serde(default)]
    pub plan: Option<Plan>,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    pub plan: Plan,
    /// The step this invocation touched; absent once every step is done
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<Step>,
    pub tx_draft: Option<TxDraft>,
    pub risk_level: RiskLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub should_retry: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Contract the failed lookup was about
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            address: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

/// Body of `POST /api/contracts/generate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateContractRequest {
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of `POST /api/contracts/audit`. One of `address` or `source_code`
/// is required; an explicit source wins.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditContractRequest {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub source_code: Option<String>,
    #[serde(default)]
    pub chain_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub default_chain_id: u64,
    pub planner: String,
}
