use web3_agent_types::Step;

use super::{Completion, StepContext, StepOutcome};
use crate::error::StepError;

/// Forwards the step's prompt (or the user's message) with conversation
/// history as context.
pub async fn execute(step: &Step, ctx: &StepContext<'_>) -> Result<StepOutcome, StepError> {
    let prompt = step
        .params
        .message
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(ctx.message);

    let answer = ctx.services.assistant.chat(prompt, ctx.history).await?;
    Ok(StepOutcome::Completed(Completion::new(answer)))
}
