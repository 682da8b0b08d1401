//! LLM-powered collaborators for the Web3 agent
//!
//! This crate owns everything that talks to the language model provider
//! (ChainGPT). It has no chain access - transaction drafting and policy stay
//! in `web3-agent`.
//!
//! ## Architecture
//!
//! ```text
//! User Request → Planner ─────────────┐
//!                                      ├─► LlmClient (ChainGPT /chat/stream)
//! Step Handlers → ContractAssistant ──┘
//! ```
//!
//! Without `CHAINGPT_API_KEY` the planner stays heuristic and the assistant
//! calls fail with [`LlmError::NotConfigured`].

pub mod assistant;
pub mod chaingpt_client;
pub mod error;
pub mod llm_client;
pub mod planner;

pub use assistant::{
    AuditReport, ChainGptAssistant, ContractAssistant, GeneratedContract, Severity, Vulnerability,
};
pub use chaingpt_client::ChainGptClient;
pub use error::LlmError;
pub use llm_client::{AssistantModel, DisabledClient, LlmClient};
pub use planner::{HeuristicPlanner, LlmPlanner, Planner};
