//! Web3 Agent - stateless plan/step execution engine
//!
//! A plan arrives with every request, exactly one pending step runs, and the
//! updated plan goes back to the caller together with any unsigned
//! transaction the wallet should sign.
//!
//! ## Call Chain
//!
//! ```text
//! POST /api/agent → Planner (first turn only) → PlanExecutor
//!     → step handler → {TokenResolver, QuoteEstimator, draft, PolicyGate}
//!     → {ChainReader, ContractAssistant, SourceVerifier, PortfolioAnalyzer}
//! ```

// Core error handling and configuration
pub mod config;
pub mod error;

// Chain access: networks, token registry, units, ABI, JSON-RPC reader
pub mod chain;

// Leaf services used by the step handlers
pub mod compiler;
pub mod draft;
pub mod explorer;
pub mod policy;
pub mod portfolio;
pub mod quote;
pub mod resolver;

// Plan executor and step handlers
pub mod engine;

// REST API (requires server feature)
#[cfg(feature = "server")]
pub mod api;

pub use config::AgentConfig;
pub use engine::{AgentServices, ExecutionOutcome, ExecutionRequest, PlanExecutor};
pub use error::{ErrorClass, StepError, TransientKind};
