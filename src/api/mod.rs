//! REST API
//!
//! - POST /api/agent              - run one step of a plan (planning it first if needed)
//! - GET  /api/agent/health       - health check
//! - POST /api/contracts/generate - one-shot contract generation
//! - POST /api/contracts/audit    - one-shot audit of source or a verified address

mod agent_routes;
mod contract_routes;

use axum::{http::StatusCode, response::Json};
use web3_agent_types::ErrorResponse;

use crate::chain::Network;

pub use agent_routes::{create_agent_router, AgentState};
pub use contract_routes::create_contract_router;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, body: ErrorResponse) -> ApiError {
    (status, Json(body))
}

fn bad_request(message: impl Into<String>) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, ErrorResponse::new(message))
}

fn network_for(chain_id: Option<u64>, default: Network) -> Result<Network, ApiError> {
    match chain_id {
        Some(id) => {
            Network::from_chain_id(id).ok_or_else(|| bad_request(format!("Unsupported chainId: {id}")))
        }
        None => Ok(default),
    }
}
