use std::str::FromStr;

use alloy_primitives::Address;
use serde_json::json;
use web3_agent_types::Step;

use super::{Completion, StepContext, StepOutcome};
use crate::chain::network::NATIVE_SYMBOL;
use crate::chain::units::{parse_amount, to_base_units};
use crate::chain::{Network, TokenRef};
use crate::draft;
use crate::error::StepError;
use crate::policy::{PolicyCheck, TokenSpend};
use crate::resolver::{InputResolution, TokenResolver};

/// Native transfer unless `params.token` names something else.
pub async fn execute(step: &Step, ctx: &StepContext<'_>) -> Result<StepOutcome, StepError> {
    let params = &step.params;
    let network = ctx.chain.network;

    let raw_to = params
        .to
        .as_deref()
        .ok_or_else(|| StepError::invalid("transfer needs a recipient address"))?;
    let to = Address::from_str(raw_to)
        .map_err(|_| StepError::invalid(format!("'{raw_to}' is not a valid recipient address")))?;

    let raw_amount = params
        .amount
        .as_deref()
        .ok_or_else(|| StepError::invalid("transfer needs an amount"))?;
    let amount = parse_amount(raw_amount).map_err(|e| StepError::invalid(e.to_string()))?;

    let symbol = params
        .token
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(NATIVE_SYMBOL);
    let resolver = ctx.services.resolver();
    let token = resolve_token(&resolver, symbol, network)?;
    let decimals = resolver.decimals(network, token).await?;
    let value = to_base_units(amount, decimals).map_err(|e| StepError::invalid(e.to_string()))?;

    let tx = draft::transfer(
        token,
        to,
        value,
        format!("Transfer {raw_amount} {symbol} to {to}"),
    );

    let decision = ctx
        .services
        .policy
        .check(&PolicyCheck {
            destination: to,
            value: tx.value,
            token: token.address().map(|token| TokenSpend {
                token,
                amount: value,
            }),
        })
        .await;
    if !decision.allowed {
        return Err(StepError::PolicyViolation(
            decision.reason.unwrap_or_else(|| "transfer denied".into()),
        ));
    }

    let token_label = match token {
        TokenRef::Native => NATIVE_SYMBOL.to_string(),
        TokenRef::Erc20(address) => address.to_string(),
    };
    Ok(StepOutcome::Completed(
        Completion::new("Transfer transaction prepared.")
            .with_result(json!({ "to": to.to_string(), "amount": raw_amount, "token": token_label }))
            .with_draft(tx),
    ))
}

/// The asset sent is exactly the one named. Unknown symbols fail, and an
/// ambiguous symbol asks for the contract address instead.
fn resolve_token(
    resolver: &TokenResolver,
    symbol: &str,
    network: Network,
) -> Result<TokenRef, StepError> {
    match resolver.resolve_exact(symbol, network) {
        Some(InputResolution::Resolved(token)) => Ok(token),
        Some(InputResolution::Ambiguous(candidates)) => {
            let addresses: Vec<String> = candidates.iter().map(|c| c.address.to_string()).collect();
            Err(StepError::invalid(format!(
                "token '{symbol}' matches {} contracts on {network} ({}); specify the token address",
                candidates.len(),
                addresses.join(", ")
            )))
        }
        None => Err(StepError::invalid(format!(
            "unknown token '{symbol}' on {network}"
        ))),
    }
}
