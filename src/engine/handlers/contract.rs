//! generate → audit → deploy

use std::str::FromStr;

use alloy_primitives::{Address, U256};
use serde_json::json;
use web3_agent_types::{Plan, RiskLevel, Step, StepType, PREV_STEP_RESULT};
use web3_agentic::GeneratedContract;

use super::{Completion, StepContext, StepOutcome};
use crate::draft;
use crate::error::StepError;
use crate::policy::PolicyCheck;

/// Stand-in for the deployment's native cost when consulting the policy
/// gate (0.001 BNB).
pub const DEPLOY_GAS_ESTIMATE_WEI: u64 = 1_000_000_000_000_000;

pub const NO_CODE_PROVIDED: &str = "No code provided";

pub async fn generate(step: &Step, ctx: &StepContext<'_>) -> Result<StepOutcome, StepError> {
    let description = step
        .params
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or(ctx.message);

    let generated = ctx
        .services
        .assistant
        .generate_contract(description)
        .await?;
    tracing::info!(name = %generated.name, chars = generated.source_code.len(), "contract generated");

    Ok(StepOutcome::Completed(
        Completion::new("I've generated the contract code.").with_result(json!(generated)),
    ))
}

/// Source to audit: explicit source, then the preceding step's output,
/// then a verified-source lookup. Lookup problems degrade to a comment
/// stub so the audit still runs.
pub async fn audit(plan: &Plan, index: usize, ctx: &StepContext<'_>) -> Result<StepOutcome, StepError> {
    let params = &plan.steps[index].params;

    let mut code = match params.source.as_deref() {
        Some(PREV_STEP_RESULT) => index
            .checked_sub(1)
            .and_then(|prev| plan.steps[prev].result.as_ref())
            .and_then(generated_source),
        Some(literal) if !literal.trim().is_empty() => Some(literal.to_string()),
        _ => None,
    };

    if code.is_none() {
        if let Some(raw) = params.address.as_deref() {
            code = Some(fetch_source(raw, ctx).await);
        }
    }

    let code = code.unwrap_or_else(|| NO_CODE_PROVIDED.to_string());
    let report = ctx.services.assistant.audit_contract(&code).await?;
    tracing::info!(score = report.score, findings = report.vulnerabilities.len(), "audit complete");

    Ok(StepOutcome::Completed(
        Completion::new(format!("Audit complete. Score: {}/100.", report.score))
            .with_result(json!(report)),
    ))
}

fn generated_source(result: &serde_json::Value) -> Option<String> {
    result
        .get("sourceCode")
        .and_then(|s| s.as_str())
        .map(str::to_string)
}

async fn fetch_source(raw: &str, ctx: &StepContext<'_>) -> String {
    let Ok(address) = Address::from_str(raw) else {
        tracing::warn!(address = raw, "audit address is not a valid address");
        return format!("// Failed to fetch code for {raw}");
    };
    match ctx
        .services
        .explorer
        .verified_source(address, ctx.chain.network)
        .await
    {
        Ok(Some(source)) => source,
        Ok(None) => format!("// Contract source code not verified on BSCScan for {raw}"),
        Err(e) => {
            tracing::warn!(%address, error = %e, "source lookup failed, auditing placeholder");
            format!("// Failed to fetch code for {raw}")
        }
    }
}

pub async fn deploy(
    plan: &mut Plan,
    index: usize,
    ctx: &StepContext<'_>,
) -> Result<StepOutcome, StepError> {
    let generated: Option<GeneratedContract> = plan
        .completed_of(StepType::GenerateContract)
        .and_then(|s| s.result.clone())
        .and_then(|r| serde_json::from_value(r).ok());

    let artifact = ctx.services.compiler.compile(generated.as_ref()).await?;

    let mut description = "Deploy Smart Contract".to_string();
    if let Some(generated) = &generated {
        description = format!("Deploy: {}", generated.name);
        let params = &mut plan.steps[index].params;
        params.source_code = Some(generated.source_code.clone());
        params.contract_name = Some(generated.name.clone());
    }

    // Advisory only; a risky audit doesn't block deployment
    let risk = plan
        .completed_of(StepType::AuditContract)
        .and_then(|s| s.result.as_ref())
        .and_then(|r| r.get("score"))
        .and_then(|score| score.as_u64())
        .map(|score| RiskLevel::from_audit_score(score.min(100) as u32))
        .unwrap_or_default();

    let tx = draft::deployment(artifact.bytecode, description);

    let decision = ctx
        .services
        .policy
        .check(&PolicyCheck {
            destination: ctx.chain.user.unwrap_or(Address::ZERO),
            value: U256::from(DEPLOY_GAS_ESTIMATE_WEI),
            token: None,
        })
        .await;
    if !decision.allowed {
        return Err(StepError::PolicyViolation(
            decision.reason.unwrap_or_else(|| "deployment denied".into()),
        ));
    }

    tracing::info!(contract = %artifact.contract_name, ?risk, "deployment drafted");
    Ok(StepOutcome::Completed(
        Completion::new("Ready to deploy. Please sign the transaction.")
            .with_draft(tx)
            .with_risk(risk),
    ))
}
