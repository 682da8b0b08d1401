//! Shared Plan/Step Types for the Web3 Agent
//!
//! This crate is the SINGLE SOURCE OF TRUTH for every type that crosses the
//! HTTP boundary. The plan is a plain value: the server never stores it, the
//! caller sends it back on every request.
//!
//! ## Boundaries
//!
//! ```text
//! ┌──────────────────┐         ┌──────────────────┐
//! │  Agent Server    │  JSON   │  Wallet UI       │
//! │  (Axum)          │ ◄─────► │  (signs drafts)  │
//! └──────────────────┘         └──────────────────┘
//! ```
//!
//! ## Rules
//!
//! 1. Wire format is camelCase; enum values are snake_case
//! 2. Large integers (wei amounts) travel as decimal strings
//! 3. Optional step fields are omitted, never sent as `null`

pub mod api;
pub mod draft;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use api::*;
pub use draft::TxDraft;

/// Number of automatic retries a step gets for transient failures.
pub const MAX_RETRIES: u32 = 2;

/// Marker in `params.source` pointing the audit at the preceding step's output.
pub const PREV_STEP_RESULT: &str = "prev_step_result";

// ============================================================================
// PLAN
// ============================================================================

/// An ordered list of steps plus the request that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub steps: Vec<Step>,
    #[serde(default)]
    pub original_prompt: String,
}

impl Plan {
    pub fn new(original_prompt: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            steps,
            original_prompt: original_prompt.into(),
        }
    }

    /// Index of the first `pending` step in array order.
    pub fn next_pending_index(&self) -> Option<usize> {
        self.steps
            .iter()
            .position(|s| s.status == StepStatus::Pending)
    }

    pub fn step_index(&self, id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    /// First step of the given type that has completed.
    pub fn completed_of(&self, step_type: StepType) -> Option<&Step> {
        self.steps
            .iter()
            .find(|s| s.step_type == step_type && s.status == StepStatus::Completed)
    }

    /// Returns the first id that appears more than once.
    pub fn duplicate_step_id(&self) -> Option<&str> {
        let mut seen = std::collections::HashSet::new();
        self.steps
            .iter()
            .map(|s| s.id.as_str())
            .find(|id| !seen.insert(*id))
    }
}

// ============================================================================
// STEP
// ============================================================================

/// One unit of agent work.
///
/// `id`, `step_type` and `description` are fixed at plan creation. Everything
/// else is written by the executor, or by the caller when resuming a pause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: String,
    #[serde(rename = "type")]
    pub step_type: StepType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub params: StepParams,
    #[serde(default)]
    pub status: StepStatus,
    /// Handler output, present once completed (or the raw error once failed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    /// Swap only: quoted routes awaiting a choice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<Vec<Route>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_route_id: Option<String>,
    /// Swap only: candidates for an ambiguous input symbol
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_options: Option<Vec<TokenOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub can_retry: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
}

impl Step {
    pub fn new(
        id: impl Into<String>,
        step_type: StepType,
        description: impl Into<String>,
        params: StepParams,
    ) -> Self {
        Self {
            id: id.into(),
            step_type,
            description: description.into(),
            params,
            status: StepStatus::Pending,
            result: None,
            routes: None,
            selected_route_id: None,
            token_options: None,
            retry_count: None,
            can_retry: None,
            error_code: None,
        }
    }

    pub fn retries(&self) -> u32 {
        self.retry_count.unwrap_or(0)
    }
}

/// Closed set of step kinds. Adding one is a compile-time change in the
/// executor's dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    GenerateContract,
    AuditContract,
    DeployContract,
    SwapTokens,
    RouteSelected,
    TransferTokens,
    PortfolioCheck,
    GeneralChat,
}

impl StepType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::GenerateContract => "generate_contract",
            StepType::AuditContract => "audit_contract",
            StepType::DeployContract => "deploy_contract",
            StepType::SwapTokens => "swap_tokens",
            StepType::RouteSelected => "route_selected",
            StepType::TransferTokens => "transfer_tokens",
            StepType::PortfolioCheck => "portfolio_check",
            StepType::GeneralChat => "general_chat",
        }
    }

    /// Lenient parse used for planner output; unknown kinds return `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "generate_contract" => Some(StepType::GenerateContract),
            "audit_contract" => Some(StepType::AuditContract),
            "deploy_contract" => Some(StepType::DeployContract),
            "swap_tokens" => Some(StepType::SwapTokens),
            "route_selected" => Some(StepType::RouteSelected),
            "transfer_tokens" => Some(StepType::TransferTokens),
            "portfolio_check" => Some(StepType::PortfolioCheck),
            "general_chat" => Some(StepType::GeneralChat),
            _ => None,
        }
    }
}

impl std::fmt::Display for StepType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Step state machine.
///
/// ```text
///                 ┌──────────────────────── retry (transient, retryCount < 2)
///                 │                         approval drafted
///                 ▼                         │
///   pending ──► active ──► completed        │
///     ▲           │  ├───► failed           │
///     │           │  ├───► pending_selection ─────┐
///     │           │  └───► pending_token_selection ┤
///     │           └─────────────────────────┘     │
///     └─────────────── caller resumes ────────────┘
/// ```
///
/// `active` only exists inside a single invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    Active,
    Completed,
    Failed,
    PendingSelection,
    PendingTokenSelection,
}

impl StepStatus {
    /// Long-lived pause waiting on the caller.
    pub fn is_paused(&self) -> bool {
        matches!(
            self,
            StepStatus::PendingSelection | StepStatus::PendingTokenSelection
        )
    }
}

// ============================================================================
// PARAMS
// ============================================================================

/// Named step arguments. Members are filled in lazily as resolution proceeds
/// so a resumed step never re-derives them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Audit input: literal source, or [`PREV_STEP_RESULT`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Audit input: on-chain contract address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Swap pair as `[in, out]` symbols or addresses
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_opt_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_in_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_swap_step_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_route_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_name: Option<String>,
    /// Anything the planner attached that we don't model
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Amounts arrive as `"0.5"` or `0.5` depending on who wrote the plan.
fn deserialize_opt_amount<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de;

    struct AmountVisitor;

    impl<'de> de::Visitor<'de> for AmountVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a decimal amount as string or number")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            let v = v.trim();
            Ok((!v.is_empty()).then(|| v.to_string()))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }
    }

    deserializer.deserialize_any(AmountVisitor)
}

// ============================================================================
// SWAP SELECTION
// ============================================================================

/// One candidate execution path for a swap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RouteKind,
    pub provider: String,
    /// e.g. `"312.4521 USDT"`
    pub output_amount: String,
    pub gas_fee: String,
    pub time: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    Best,
    Fastest,
    Cheapest,
}

/// A registry candidate offered when a symbol is ambiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenOption {
    pub symbol: String,
    pub name: String,
    pub address: String,
    pub decimals: u8,
    /// Human-readable balance of the requesting wallet, when it could be read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<String>,
}

// ============================================================================
// RISK / ERRORS
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Audit scores are "higher is safer": < 50 high, 50..80 medium, else low.
    pub fn from_audit_score(score: u32) -> Self {
        match score {
            0..=49 => RiskLevel::High,
            50..=79 => RiskLevel::Medium,
            _ => RiskLevel::Low,
        }
    }
}

/// Stable machine-readable failure codes written onto a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InsufficientBalance,
    PolicyViolation,
    UserRejected,
    ExecutionFailed,
    NetworkError,
    RateLimit,
}
