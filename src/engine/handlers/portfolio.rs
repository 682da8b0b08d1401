use serde_json::json;
use web3_agent_types::RiskLevel;

use super::{Completion, StepContext, StepOutcome};
use crate::error::StepError;

/// Scores above this are reported as high risk.
pub const HIGH_RISK_SCORE: u32 = 50;

pub async fn execute(ctx: &StepContext<'_>) -> Result<StepOutcome, StepError> {
    let report = ctx
        .services
        .portfolio
        .analyze(ctx.chain.user, ctx.chain.network)
        .await?;

    let mut message = format!(
        "Portfolio Analysis Complete.\nRisk Score: {}/100\nValue: ${}",
        report.risk_score, report.total_value
    );
    let risk = if report.risk_score > HIGH_RISK_SCORE {
        message.push_str(&format!(
            "\n⚠️ High Risk! Found {} suspicious assets.",
            report.risky_assets.len()
        ));
        RiskLevel::High
    } else {
        message.push_str("\n✅ Your portfolio looks healthy.");
        RiskLevel::Low
    };

    Ok(StepOutcome::Completed(
        Completion::new(message)
            .with_result(json!(report))
            .with_risk(risk),
    ))
}
