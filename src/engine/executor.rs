//! Plan Executor
//!
//! `execute()` takes the caller's plan by value, runs the first `pending`
//! step and hands the plan back. Nothing is stored between calls.
//!
//! ## Rules
//!
//! 1. FIFO over `pending` steps only; paused steps don't block later ones
//! 2. One step per call, never chained
//! 3. `active` never leaves this function

use std::sync::Arc;

use tracing::Instrument;
use web3_agent_types::{AgentResponse, ChatTurn, Plan, RiskLevel, Step, StepStatus, TxDraft};

use super::handlers::{run_step, StepContext, StepOutcome};
use super::retry::apply_failure;
use super::services::AgentServices;
use crate::chain::ChainContext;

pub const ALL_STEPS_COMPLETED: &str = "All steps completed.";

#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub message: String,
    pub chain: ChainContext,
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub plan: Plan,
    /// Snapshot of the step this call touched
    pub current_step: Option<Step>,
    pub tx_draft: Option<TxDraft>,
    pub risk_level: RiskLevel,
    pub message: String,
    pub should_retry: Option<bool>,
}

impl ExecutionOutcome {
    fn idle(plan: Plan, current_step: Option<Step>, message: String) -> Self {
        Self {
            plan,
            current_step,
            tx_draft: None,
            risk_level: RiskLevel::Low,
            message,
            should_retry: None,
        }
    }
}

impl From<ExecutionOutcome> for AgentResponse {
    fn from(outcome: ExecutionOutcome) -> Self {
        AgentResponse {
            plan: outcome.plan,
            current_step: outcome.current_step,
            tx_draft: outcome.tx_draft,
            risk_level: outcome.risk_level,
            message: outcome.message,
            should_retry: outcome.should_retry,
        }
    }
}

#[derive(Clone)]
pub struct PlanExecutor {
    services: Arc<AgentServices>,
}

impl PlanExecutor {
    pub fn new(services: Arc<AgentServices>) -> Self {
        Self { services }
    }

    pub fn services(&self) -> &AgentServices {
        &self.services
    }

    pub async fn execute(&self, mut plan: Plan, request: &ExecutionRequest) -> ExecutionOutcome {
        reclassify_stale_active(&mut plan);

        let Some(index) = plan.next_pending_index() else {
            return match plan.steps.iter().find(|s| s.status.is_paused()).cloned() {
                Some(paused) => {
                    let message = format!(
                        "Waiting on your choice for \"{}\" before continuing.",
                        paused.description
                    );
                    ExecutionOutcome::idle(plan, Some(paused), message)
                }
                None => ExecutionOutcome::idle(plan, None, ALL_STEPS_COMPLETED.to_string()),
            };
        };

        let (id, kind) = {
            let step = &mut plan.steps[index];
            step.status = StepStatus::Active;
            (step.id.clone(), step.step_type)
        };
        let span = tracing::info_span!("step", id = %id, kind = %kind);

        let ctx = StepContext {
            services: &self.services,
            chain: request.chain,
            message: &request.message,
            history: &request.history,
        };

        let result = async {
            tracing::info!(network = %ctx.chain.network, retries = plan.steps[index].retries(), "dispatching step");
            run_step(&mut plan, index, &ctx).await
        }
        .instrument(span.clone())
        .await;

        let _entered = span.enter();
        let mut tx_draft = None;
        let mut risk_level = RiskLevel::Low;
        let mut should_retry = None;

        let message = match result {
            Ok(StepOutcome::Completed(done)) => {
                let step = &mut plan.steps[index];
                step.status = StepStatus::Completed;
                if done.result.is_some() {
                    step.result = done.result;
                }
                tx_draft = done.tx_draft;
                risk_level = done.risk_level;
                tracing::info!(draft = tx_draft.is_some(), ?risk_level, "step completed");
                done.message
            }
            Ok(StepOutcome::Parked { reason, message }) => {
                plan.steps[index].status = reason.status();
                tracing::info!(?reason, "step parked for caller input");
                message
            }
            Ok(StepOutcome::Suspended {
                awaiting,
                message,
                tx_draft: draft,
            }) => {
                plan.steps[index].status = StepStatus::Pending;
                tracing::info!(?awaiting, "step suspended until precondition holds");
                tx_draft = Some(draft);
                message
            }
            Err(err) => {
                let report = apply_failure(&mut plan.steps[index], &err);
                should_retry = report.should_retry;
                report.message
            }
        };

        let current_step = Some(plan.steps[index].clone());
        ExecutionOutcome {
            plan,
            current_step,
            tx_draft,
            risk_level,
            message,
            should_retry,
        }
    }
}

/// `active` is never valid on the wire; a caller that sends one back is
/// resubmitting a step whose previous call never answered.
fn reclassify_stale_active(plan: &mut Plan) {
    for step in plan
        .steps
        .iter_mut()
        .filter(|s| s.status == StepStatus::Active)
    {
        tracing::warn!(step = %step.id, "step arrived active, treating as pending");
        step.status = StepStatus::Pending;
    }
}
