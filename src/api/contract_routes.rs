//! Contract endpoints
//!
//! Stateless wrappers around the contract assistant, outside any plan.

use std::str::FromStr;

use alloy_primitives::Address;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};
use web3_agent_types::{AuditContractRequest, ErrorResponse, GenerateContractRequest};
use web3_agentic::{AuditReport, GeneratedContract};

use super::{api_error, bad_request, network_for, AgentState, ApiError};

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ============================================================================
// Router
// ============================================================================

pub fn create_contract_router(state: AgentState) -> Router {
    Router::new()
        .route("/api/contracts/generate", post(generate_contract))
        .route("/api/contracts/audit", post(audit_contract))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/contracts/generate - Generate a contract from a description
async fn generate_contract(
    State(state): State<AgentState>,
    payload: Result<Json<GenerateContractRequest>, JsonRejection>,
) -> Result<Json<GeneratedContract>, ApiError> {
    let Json(req) = payload.map_err(|rejection| bad_request(rejection.body_text()))?;
    let description =
        non_empty(req.description.as_deref()).ok_or_else(|| bad_request("Description required"))?;

    match state
        .executor
        .services()
        .assistant
        .generate_contract(description)
        .await
    {
        Ok(generated) => {
            tracing::info!(name = %generated.name, "contract generated");
            Ok(Json(generated))
        }
        Err(e) => {
            tracing::error!(error = %e, "contract generation failed");
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("Generation failed"),
            ))
        }
    }
}

/// POST /api/contracts/audit - Audit source code, or the verified source at an address
async fn audit_contract(
    State(state): State<AgentState>,
    payload: Result<Json<AuditContractRequest>, JsonRejection>,
) -> Result<Json<AuditReport>, ApiError> {
    let Json(req) = payload.map_err(|rejection| bad_request(rejection.body_text()))?;
    let services = state.executor.services();

    let code = match (
        non_empty(req.source_code.as_deref()),
        non_empty(req.address.as_deref()),
    ) {
        (Some(source), _) => source.to_string(),
        (None, Some(raw)) => {
            let network = network_for(req.chain_id, state.default_network)?;
            let address = Address::from_str(raw)
                .map_err(|_| bad_request(format!("Invalid address: {raw}")))?;
            match services.explorer.verified_source(address, network).await {
                Ok(Some(source)) => source,
                Ok(None) => {
                    return Err(api_error(
                        StatusCode::BAD_REQUEST,
                        ErrorResponse::new("Contract source code not verified on BSCScan")
                            .with_address(raw),
                    ));
                }
                Err(e) => {
                    tracing::warn!(%address, %network, error = %e, "source lookup failed");
                    return Err(api_error(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorResponse::new("Failed to fetch contract code from explorer")
                            .with_address(raw),
                    ));
                }
            }
        }
        (None, None) => return Err(bad_request("Address or Source Code required")),
    };

    match services.assistant.audit_contract(&code).await {
        Ok(report) => {
            tracing::info!(score = report.score, "audit complete");
            Ok(Json(report))
        }
        Err(e) => {
            tracing::error!(error = %e, "audit failed");
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("Audit failed"),
            ))
        }
    }
}
