//! swap_tokens
//!
//! Three suspension points, in order:
//!
//! ```text
//! resolve input ──ambiguous──► Parked(TokenSelection)   caller sets tokenInAddress
//!      │
//! no selectedRouteId ────────► Parked(RouteSelection)   caller sets selectedRouteId
//!      │
//! allowance short ───────────► Suspended(TokenApproval) approval draft, step back to pending
//!      │
//! swap draft + policy ───────► Completed
//! ```
//!
//! Amount and input token are written back into `params` the first time
//! they're resolved so a resumed step never re-derives them. Balances,
//! allowances and decimals are re-read on every call.

use alloy_primitives::{Address, U256};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::json;
use web3_agent_types::{Route, RouteKind, Step};
use web3_agentic::planner::DEFAULT_SWAP_AMOUNT;

use super::{Completion, ParkReason, Precondition, StepContext, StepOutcome};
use crate::chain::network::NATIVE_SYMBOL;
use crate::chain::units::{format_units, parse_amount, to_base_units};
use crate::chain::{Network, TokenRef};
use crate::draft::{self, SwapSpec, SLIPPAGE_BPS};
use crate::error::StepError;
use crate::policy::{PolicyCheck, TokenSpend};
use crate::quote::QuoteEstimator;
use crate::resolver::{InputResolution, TokenResolver};

pub const ROUTE_ID: &str = "r1";
const DEFAULT_OUTPUT_SYMBOL: &str = "USDT";

static AMOUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(\.\d+)?").unwrap());

/// Everything the route and execution phases share.
struct SwapLeg {
    network: Network,
    symbol_in: String,
    symbol_out: String,
    amount_text: String,
    amount: Decimal,
    token_in: TokenRef,
    token_out: TokenRef,
    path: Vec<Address>,
}

pub async fn execute(step: &mut Step, ctx: &StepContext<'_>) -> Result<StepOutcome, StepError> {
    let network = ctx.chain.network;
    let symbol_in = step
        .params
        .tokens
        .first()
        .cloned()
        .unwrap_or_else(|| NATIVE_SYMBOL.to_string());
    let symbol_out = step
        .params
        .tokens
        .get(1)
        .cloned()
        .unwrap_or_else(|| DEFAULT_OUTPUT_SYMBOL.to_string());

    let amount_text = resolve_amount(step, ctx.message);
    let amount = parse_amount(&amount_text).map_err(|e| StepError::invalid(e.to_string()))?;
    if amount.is_zero() {
        return Err(StepError::invalid("swap amount must be greater than zero"));
    }

    let resolver = ctx.services.resolver();
    let token_in = match step.params.token_in_address.as_deref() {
        Some(raw) => TokenRef::parse(raw).ok_or_else(|| {
            StepError::invalid(format!("tokenInAddress '{raw}' is not a token address"))
        })?,
        None => match resolver.resolve_input(&symbol_in, network) {
            InputResolution::Resolved(token) => {
                step.params.token_in_address = Some(token.to_string());
                token
            }
            InputResolution::Ambiguous(candidates) => {
                let options = resolver
                    .token_options(&candidates, network, ctx.chain.user)
                    .await;
                tracing::info!(symbol = %symbol_in, candidates = options.len(), "input token ambiguous");
                let message = format!(
                    "I found {} tokens matching \"{}\". Please select the correct one (check your balance):",
                    options.len(),
                    symbol_in
                );
                step.token_options = Some(options);
                return Ok(StepOutcome::Parked {
                    reason: ParkReason::TokenSelection,
                    message,
                });
            }
        },
    };
    let token_out = resolver.resolve_output(&symbol_out, network);
    let path = network.swap_path(token_in, token_out).ok_or_else(|| {
        StepError::invalid(format!("cannot swap {symbol_in} into {symbol_out}"))
    })?;

    let leg = SwapLeg {
        network,
        symbol_in,
        symbol_out,
        amount_text,
        amount,
        token_in,
        token_out,
        path,
    };
    let estimator = ctx.services.estimator();

    match step.selected_route_id.clone() {
        None => propose_route(step, &leg, &resolver, &estimator, ctx).await,
        Some(route_id) => {
            if let Some(routes) = &step.routes {
                if !routes.iter().any(|r| r.id == route_id) {
                    return Err(StepError::NotFound("Selected route not found.".into()));
                }
            }
            execute_route(&route_id, &leg, &resolver, &estimator, ctx).await
        }
    }
}

/// Persisted amount, else the first number in the message, else the
/// default. Written back on first resolution.
fn resolve_amount(step: &mut Step, message: &str) -> String {
    if let Some(amount) = step.params.amount.as_deref() {
        return amount.to_string();
    }
    let amount = AMOUNT
        .find(message)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| DEFAULT_SWAP_AMOUNT.to_string());
    step.params.amount = Some(amount.clone());
    amount
}

async fn propose_route(
    step: &mut Step,
    leg: &SwapLeg,
    resolver: &TokenResolver,
    estimator: &QuoteEstimator,
    ctx: &StepContext<'_>,
) -> Result<StepOutcome, StepError> {
    let quote = estimator
        .quote(resolver, leg.network, leg.token_in, leg.token_out, leg.amount)
        .await?;

    let from = ctx.chain.user.unwrap_or(Address::ZERO);
    let probe = draft::swap(
        SwapSpec {
            network: leg.network,
            token_in: leg.token_in,
            path: &leg.path,
            amount_in: quote.amount_in,
            amount_out_min: draft::min_out(quote.amount_out, SLIPPAGE_BPS),
            recipient: from,
            deadline: draft::deadline_from_now(),
        },
        String::new(),
    );
    let fee = estimator
        .estimate_fee(leg.network, &draft::as_call(&probe, Some(from)))
        .await;

    step.routes = Some(vec![Route {
        id: ROUTE_ID.to_string(),
        kind: RouteKind::Best,
        provider: leg.network.dex_name().to_string(),
        output_amount: format!("{} {}", quote.display, leg.symbol_out),
        gas_fee: fee.gas_fee,
        time: fee.time,
        tags: vec!["Best Return".to_string(), "Verified".to_string()],
    }]);
    tracing::info!(output = %quote.display, "swap route quoted");

    Ok(StepOutcome::Parked {
        reason: ParkReason::RouteSelection,
        message: format!(
            "I found the best route on {} for swapping {} {}.",
            leg.network.dex_name(),
            leg.amount_text,
            leg.symbol_in
        ),
    })
}

async fn execute_route(
    route_id: &str,
    leg: &SwapLeg,
    resolver: &TokenResolver,
    estimator: &QuoteEstimator,
    ctx: &StepContext<'_>,
) -> Result<StepOutcome, StepError> {
    let user = ctx.require_user("swap")?;
    let chain = &ctx.services.chain;
    let router = leg.network.router();

    let decimals = resolver.decimals(leg.network, leg.token_in).await?;
    let amount_in =
        to_base_units(leg.amount, decimals).map_err(|e| StepError::invalid(e.to_string()))?;

    let balance = chain.balance_of(leg.network, leg.token_in, user).await?;
    tracing::debug!(%user, token = %leg.token_in, decimals, %amount_in, %balance, "swap balance check");
    if balance < amount_in {
        return Err(StepError::InsufficientBalance {
            available: format_units(balance, decimals),
            requested: leg.amount_text.clone(),
            symbol: leg.symbol_in.clone(),
            token: leg.token_in.to_string(),
        });
    }

    if let TokenRef::Erc20(token) = leg.token_in {
        let allowance = match chain.allowance(leg.network, token, user, router).await {
            Ok(allowance) => allowance,
            Err(e) if e.is_transient() => return Err(e.into()),
            Err(e) => {
                tracing::warn!(%token, error = %e, "allowance() failed, treating as zero");
                U256::ZERO
            }
        };
        if allowance < amount_in {
            let tx = draft::approval(
                token,
                router,
                amount_in,
                format!("Approve {} {} for {}", leg.amount_text, leg.symbol_in, leg.network.dex_name()),
            );
            return Ok(StepOutcome::Suspended {
                awaiting: Precondition::TokenApproval {
                    token,
                    spender: router,
                },
                message: format!(
                    "I need your approval to spend {} {}. Please sign the approval transaction.",
                    leg.amount_text, leg.symbol_in
                ),
                tx_draft: tx,
            });
        }
    }

    let quote = estimator
        .quote(resolver, leg.network, leg.token_in, leg.token_out, leg.amount)
        .await?;
    let tx = draft::swap(
        SwapSpec {
            network: leg.network,
            token_in: leg.token_in,
            path: &leg.path,
            amount_in,
            amount_out_min: draft::min_out(quote.amount_out, SLIPPAGE_BPS),
            recipient: user,
            deadline: draft::deadline_from_now(),
        },
        format!("Swap {} {} for {}", leg.amount_text, leg.symbol_in, leg.symbol_out),
    );

    let decision = ctx
        .services
        .policy
        .check(&PolicyCheck {
            destination: router,
            value: tx.value,
            token: leg.token_in.address().map(|token| TokenSpend {
                token,
                amount: amount_in,
            }),
        })
        .await;
    if !decision.allowed {
        return Err(StepError::PolicyViolation(
            decision.reason.unwrap_or_else(|| "swap denied".into()),
        ));
    }

    Ok(StepOutcome::Completed(
        Completion::new(format!(
            "Route confirmed. Transaction to swap {} {} prepared.",
            leg.amount_text, leg.symbol_in
        ))
        .with_result(json!({
            "routeId": route_id,
            "amountIn": amount_in.to_string(),
            "expectedOutput": format!("{} {}", quote.display, leg.symbol_out),
        }))
        .with_draft(tx),
    ))
}
