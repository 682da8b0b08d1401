//! Agent endpoints
//!
//! The request carries the whole plan; the handler validates it, plans on
//! the first turn and delegates one step to [`PlanExecutor`].

use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::Address;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    routing::{get, post},
    Router,
};
use tracing::Instrument;
use uuid::Uuid;
use web3_agent_types::{AgentRequest, AgentResponse, HealthResponse};
use web3_agentic::Planner;

use super::{bad_request, network_for, ApiError};
use crate::chain::{ChainContext, Network};
use crate::engine::{ExecutionRequest, PlanExecutor};

// ============================================================================
// State
// ============================================================================

#[derive(Clone)]
pub struct AgentState {
    pub executor: PlanExecutor,
    pub planner: Arc<dyn Planner>,
    pub default_network: Network,
}

impl AgentState {
    pub fn new(executor: PlanExecutor, planner: Arc<dyn Planner>, default_network: Network) -> Self {
        Self {
            executor,
            planner,
            default_network,
        }
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_agent_router(state: AgentState) -> Router {
    Router::new()
        .route("/api/agent", post(run_agent))
        .route("/api/agent/health", get(health_check))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/agent - Run the next step of the plan
async fn run_agent(
    State(state): State<AgentState>,
    payload: Result<Json<AgentRequest>, JsonRejection>,
) -> Result<Json<AgentResponse>, ApiError> {
    let Json(req) = payload.map_err(|rejection| bad_request(rejection.body_text()))?;

    if req.message.trim().is_empty() {
        return Err(bad_request("Message is required"));
    }

    let user = match req.user_address.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            Address::from_str(raw)
                .map_err(|_| bad_request(format!("Invalid userAddress: {raw}")))?,
        ),
    };

    let network = network_for(req.chain_id, state.default_network)?;

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("agent_request", %request_id, %network);

    async move {
        let plan = match req.plan {
            Some(plan) => {
                if let Some(id) = plan.duplicate_step_id() {
                    return Err(bad_request(format!("Duplicate step id in plan: {id}")));
                }
                plan
            }
            None => {
                let plan = state.planner.plan(&req.message).await;
                tracing::info!(planner = state.planner.name(), steps = plan.steps.len(), "planned request");
                plan
            }
        };

        let request = ExecutionRequest {
            message: req.message,
            chain: ChainContext::new(network, user),
            history: req.history,
        };
        let outcome = state.executor.execute(plan, &request).await;
        Ok(Json(AgentResponse::from(outcome)))
    }
    .instrument(span)
    .await
}

/// GET /api/agent/health - Health check
async fn health_check(State(state): State<AgentState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        default_chain_id: state.default_network.chain_id(),
        planner: state.planner.name().to_string(),
    })
}
