//! Step handlers, one per [`StepType`].
//!
//! Dispatch is an exhaustive `match`: a new step kind doesn't compile until
//! it has a handler. Handlers may write into their own step's `params`,
//! `routes` and `token_options`; `status` belongs to the executor.

mod chat;
mod contract;
mod portfolio;
mod route;
mod swap;
mod transfer;

use alloy_primitives::Address;
use serde_json::Value;
use web3_agent_types::{ChatTurn, Plan, RiskLevel, StepStatus, StepType, TxDraft};

use super::services::AgentServices;
use crate::chain::ChainContext;
use crate::error::StepError;

/// Per-invocation inputs shared by every handler.
pub struct StepContext<'a> {
    pub services: &'a AgentServices,
    pub chain: ChainContext,
    /// The user's message for this invocation
    pub message: &'a str,
    pub history: &'a [ChatTurn],
}

impl StepContext<'_> {
    pub fn require_user(&self, action: &str) -> Result<Address, StepError> {
        self.chain
            .user
            .ok_or_else(|| StepError::invalid(format!("connect a wallet to {action}")))
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub message: String,
    pub result: Option<Value>,
    pub tx_draft: Option<TxDraft>,
    pub risk_level: RiskLevel,
}

impl Completion {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            result: None,
            tx_draft: None,
            risk_level: RiskLevel::Low,
        }
    }

    pub fn with_result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }

    pub fn with_draft(mut self, draft: TxDraft) -> Self {
        self.tx_draft = Some(draft);
        self
    }

    pub fn with_risk(mut self, risk: RiskLevel) -> Self {
        self.risk_level = risk;
        self
    }
}

/// Why a step is waiting on the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParkReason {
    /// `routes` populated, caller picks one
    RouteSelection,
    /// `token_options` populated, caller fills `params.tokenInAddress`
    TokenSelection,
}

impl ParkReason {
    pub fn status(&self) -> StepStatus {
        match self {
            ParkReason::RouteSelection => StepStatus::PendingSelection,
            ParkReason::TokenSelection => StepStatus::PendingTokenSelection,
        }
    }
}

/// Condition that must hold on chain before a suspended step can finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    TokenApproval { token: Address, spender: Address },
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Completed(Completion),
    /// Long-lived pause; the step keeps a `pending_*` status
    Parked { reason: ParkReason, message: String },
    /// Not finished: returns to `pending` and re-runs once `awaiting` holds.
    /// The draft establishes the precondition.
    Suspended {
        awaiting: Precondition,
        message: String,
        tx_draft: TxDraft,
    },
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Runs `plan.steps[index]`. `route_selected` and the contract steps read
/// (and for `route_selected`, write) sibling steps, so the whole plan is
/// lent out.
pub async fn run_step(
    plan: &mut Plan,
    index: usize,
    ctx: &StepContext<'_>,
) -> Result<StepOutcome, StepError> {
    match plan.steps[index].step_type {
        StepType::GenerateContract => contract::generate(&plan.steps[index], ctx).await,
        StepType::AuditContract => contract::audit(plan, index, ctx).await,
        StepType::DeployContract => contract::deploy(plan, index, ctx).await,
        StepType::SwapTokens => swap::execute(&mut plan.steps[index], ctx).await,
        StepType::RouteSelected => route::apply(plan, index),
        StepType::TransferTokens => transfer::execute(&plan.steps[index], ctx).await,
        StepType::PortfolioCheck => portfolio::execute(ctx).await,
        StepType::GeneralChat => chat::execute(&plan.steps[index], ctx).await,
    }
}
