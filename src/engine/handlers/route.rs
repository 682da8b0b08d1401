//! route_selected: hands a confirmed route back to its swap step.

use web3_agent_types::{Plan, StepStatus, StepType};

use super::{Completion, StepOutcome};
use crate::error::StepError;

/// Copies `params.selectedRouteId` onto the swap named by
/// `params.originalSwapStepId` and re-queues it. A swap that already
/// completed is left alone so its transaction is never drafted twice.
pub fn apply(plan: &mut Plan, index: usize) -> Result<StepOutcome, StepError> {
    let params = &plan.steps[index].params;
    let selected = params.selected_route_id.clone();
    let target = params
        .original_swap_step_id
        .as_deref()
        .and_then(|id| plan.step_index(id))
        .filter(|&i| i != index);

    let not_found =
        || StepError::NotFound("Original swap step or routes not found for route selection.".into());
    let target = target.ok_or_else(not_found)?;

    let swap = &mut plan.steps[target];
    if swap.step_type != StepType::SwapTokens {
        return Err(StepError::invalid(format!(
            "step {} is a {}, not a swap",
            swap.id, swap.step_type
        )));
    }
    let routes = swap.routes.as_ref().ok_or_else(not_found)?;
    let route = selected
        .as_deref()
        .and_then(|id| routes.iter().find(|r| r.id == id))
        .ok_or_else(|| StepError::NotFound("Selected route not found.".into()))?;
    let provider = route.provider.clone();

    if swap.status == StepStatus::Failed {
        return Err(StepError::invalid(format!("swap {} already failed", swap.id)));
    }
    if swap.status == StepStatus::Completed {
        tracing::info!(swap = %swap.id, "route confirmed for a swap that already ran");
        return Ok(StepOutcome::Completed(Completion::new(format!(
            "Route {provider} was already executed."
        ))));
    }

    swap.selected_route_id = selected;
    swap.status = StepStatus::Pending;
    tracing::info!(swap = %swap.id, route = ?swap.selected_route_id, "route applied, swap re-queued");

    Ok(StepOutcome::Completed(Completion::new(format!(
        "Route {provider} selected. Proceeding with swap."
    ))))
}
