//! Web3 Agent REST API Server
//!
//! ## Usage
//!
//! ```bash
//! # Start the server (reads .env if present)
//! CHAINGPT_API_KEY=... cargo run --bin agent_server
//!
//! # First turn: plan and run the first step
//! curl -X POST http://localhost:3001/api/agent \
//!   -H "Content-Type: application/json" \
//!   -d '{"message": "Swap 0.5 BNB to USDT", "userAddress": "0x...", "chainId": 97}'
//!
//! # Later turns send the returned plan back
//! curl http://localhost:3001/api/agent/health
//!
//! # Standalone audit of a verified contract
//! curl -X POST http://localhost:3001/api/contracts/audit \
//!   -H "Content-Type: application/json" \
//!   -d '{"address": "0x...", "chainId": 56}'
//! ```

use std::sync::Arc;

use anyhow::Context;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use web3_agent::api::{create_agent_router, create_contract_router, AgentState};
use web3_agent::{AgentConfig, AgentServices, PlanExecutor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "web3_agent=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AgentConfig::from_env().context("invalid configuration")?;
    tracing::info!(
        network = %config.default_network,
        llm = config.chaingpt_api_key.is_some(),
        "starting web3 agent"
    );

    let (services, planner) =
        AgentServices::from_config(&config).context("failed to build collaborators")?;
    let executor = PlanExecutor::new(Arc::new(services));
    let state = AgentState::new(executor, planner, config.default_network);

    let app = create_agent_router(state.clone())
        .merge(create_contract_router(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
