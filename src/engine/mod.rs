//! Plan executor and step handlers.
//!
//! One call runs one step. The executor owns every status transition;
//! handlers only report an outcome or raise a [`StepError`](crate::StepError).

mod executor;
pub mod handlers;
mod retry;
mod services;

pub use executor::{ExecutionOutcome, ExecutionRequest, PlanExecutor};
pub use handlers::{Completion, ParkReason, Precondition, StepContext, StepOutcome};
pub use retry::{apply_failure, FailureReport};
pub use services::{AgentServices, BootstrapError};
