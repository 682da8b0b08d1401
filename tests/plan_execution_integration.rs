//! E2E Test: Plan Execution
//!
//! Drives plans through the executor the way a client would: send the plan,
//! take the returned plan, edit what the user chose, send it back.
//!
//! Covers:
//! - one step per call, and no re-drafting of finished steps
//! - the retry ceiling for transient failures
//! - token selection, route selection and approval suspension in swaps
//! - terminal policy and balance failures
//! - the swap and contract-creation flows end to end

mod helpers;

use std::sync::Arc;

use alloy_primitives::{address, Address, U256};
use alloy_sol_types::SolCall;
use helpers::*;
use web3_agent::chain::abi::{IUniswapV2Router02, IERC20};
use web3_agent_types::{
    AgentResponse, ErrorCode, Plan, RiskLevel, Step, StepParams, StepStatus, StepType,
};
use web3_agentic::HeuristicPlanner;

const TOKEN_A: Address = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
const TOKEN_B: Address = address!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");
const RECIPIENT: Address = address!("2222222222222222222222222222222222222222");

fn swap_step(tokens: [&str; 2], amount: &str) -> Step {
    Step::new(
        "step_1",
        StepType::SwapTokens,
        format!("Swap {amount} {} for {}", tokens[0], tokens[1]),
        StepParams {
            tokens: tokens.iter().map(|t| t.to_string()).collect(),
            amount: Some(amount.to_string()),
            ..Default::default()
        },
    )
}

fn resume(mut plan: Plan, index: usize, edit: impl FnOnce(&mut Step)) -> Plan {
    let step = &mut plan.steps[index];
    edit(step);
    step.status = StepStatus::Pending;
    plan
}

// ============================================================================
// Idempotency
// ============================================================================

#[tokio::test]
async fn test_resubmission_advances_one_step_per_call() {
    let harness = Harness::new(MockChain::new());
    let plan = HeuristicPlanner.plan_text("Create a meme token called DOGE");

    let first = harness
        .executor
        .execute(plan.clone(), &harness.request("go"))
        .await;
    let again = harness
        .executor
        .execute(plan.clone(), &harness.request("go"))
        .await;

    for outcome in [&first, &again] {
        let statuses: Vec<_> = outcome.plan.steps.iter().map(|s| s.status).collect();
        assert_eq!(
            statuses,
            vec![StepStatus::Completed, StepStatus::Pending, StepStatus::Pending]
        );
    }
}

#[tokio::test]
async fn test_finished_plan_is_returned_unchanged() {
    let harness = Harness::new(MockChain::new());
    let mut step = swap_step(["BNB", "USDT"], "0.5");
    step.status = StepStatus::Completed;
    let plan = Plan::new("Swap 0.5 BNB to USDT", vec![step]);

    let outcome = harness
        .executor
        .execute(plan.clone(), &harness.request("again"))
        .await;

    assert_eq!(outcome.plan, plan);
    assert_eq!(outcome.message, "All steps completed.");
    assert!(outcome.tx_draft.is_none());
    assert!(outcome.current_step.is_none());
    assert_eq!(harness.chain.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_route_confirmation_for_completed_swap_drafts_nothing() {
    let harness = Harness::new(MockChain::new());
    let mut swap = swap_step(["BNB", "USDT"], "0.5");
    swap.status = StepStatus::Completed;
    swap.selected_route_id = Some("r1".into());
    swap.routes = Some(vec![web3_agent_types::Route {
        id: "r1".into(),
        kind: web3_agent_types::RouteKind::Best,
        provider: "PancakeSwap V2".into(),
        output_amount: "150.0000 USDT".into(),
        gas_fee: "$0.27".into(),
        time: "~15s".into(),
        tags: vec![],
    }]);
    let confirm = Step::new(
        "step_2",
        StepType::RouteSelected,
        "Confirm route",
        StepParams {
            original_swap_step_id: Some("step_1".into()),
            selected_route_id: Some("r1".into()),
            ..Default::default()
        },
    );

    let outcome = harness
        .executor
        .execute(Plan::new("swap", vec![swap, confirm]), &harness.request("Route selected"))
        .await;

    assert_eq!(outcome.plan.steps[0].status, StepStatus::Completed);
    assert_eq!(outcome.plan.steps[1].status, StepStatus::Completed);
    assert!(outcome.message.contains("already executed"));
    assert!(outcome.tx_draft.is_none());
}

#[tokio::test]
async fn test_paused_step_without_pending_work_waits() {
    let harness = Harness::new(MockChain::new());
    let mut swap = swap_step(["BNB", "USDT"], "0.5");
    swap.status = StepStatus::PendingSelection;
    let plan = Plan::new("swap", vec![swap]);

    let outcome = harness
        .executor
        .execute(plan.clone(), &harness.request("hello?"))
        .await;

    assert_eq!(outcome.plan, plan);
    assert_eq!(
        outcome.current_step.map(|s| s.status),
        Some(StepStatus::PendingSelection)
    );
}

// ============================================================================
// Retry
// ============================================================================

#[tokio::test]
async fn test_transient_failure_fails_on_third_attempt() {
    let harness = Harness::new(MockChain::new().with_native(USER, wei(1)).failing(3));
    let mut plan = HeuristicPlanner.plan_text("check my portfolio risk");

    for attempt in 1..=2u32 {
        let outcome = harness
            .executor
            .execute(plan, &harness.request("check my portfolio risk"))
            .await;
        let step = &outcome.plan.steps[0];
        assert_eq!(step.status, StepStatus::Pending);
        assert_eq!(step.retry_count, Some(attempt));
        assert_eq!(step.can_retry, Some(true));
        assert_eq!(step.error_code, Some(ErrorCode::NetworkError));
        assert_eq!(outcome.should_retry, Some(true));
        plan = outcome.plan;
    }

    let outcome = harness
        .executor
        .execute(plan, &harness.request("check my portfolio risk"))
        .await;
    let step = &outcome.plan.steps[0];
    assert_eq!(step.status, StepStatus::Failed);
    assert_eq!(step.retry_count, Some(2));
    assert_eq!(step.can_retry, Some(false));
    assert_eq!(step.error_code, Some(ErrorCode::ExecutionFailed));
    assert!(step.result.as_ref().unwrap()["error"]
        .as_str()
        .unwrap()
        .contains("timed out"));
    assert_eq!(outcome.should_retry, None);
}

#[tokio::test]
async fn test_retry_succeeds_after_transient_failure() {
    let harness = Harness::new(MockChain::new().with_native(USER, wei(2)).failing(1));
    let plan = HeuristicPlanner.plan_text("portfolio");

    let first = harness
        .executor
        .execute(plan, &harness.request("portfolio"))
        .await;
    assert_eq!(first.should_retry, Some(true));

    let second = harness
        .executor
        .execute(first.plan, &harness.request("portfolio"))
        .await;
    let step = &second.plan.steps[0];
    assert_eq!(step.status, StepStatus::Completed);
    assert_eq!(step.retry_count, Some(1));
    assert!(second.message.starts_with("Portfolio Analysis Complete."));
    assert_eq!(step.result.as_ref().unwrap()["riskScore"], 20);
}

// ============================================================================
// Swap suspension points
// ============================================================================

#[tokio::test]
async fn test_token_selection_round_trip() {
    let registry = MockRegistry(vec![token("USDT", TOKEN_A, 18), token("USDT", TOKEN_B, 6)]);
    let chain = MockChain::new()
        .with_token(TOKEN_A, USER, wei(5))
        .with_token(TOKEN_B, USER, U256::from(2_000_000u64))
        .with_decimals(TOKEN_B, 6);
    let harness = Harness::build(
        chain,
        Arc::new(registry),
        MockAssistant::scoring(90),
        RecordingPolicy::allow_all(),
    );
    let plan = Plan::new("Swap 10 USDT to BNB", vec![swap_step(["USDT", "BNB"], "10")]);

    let first = harness
        .executor
        .execute(plan, &harness.request("Swap 10 USDT to BNB"))
        .await;
    let step = &first.plan.steps[0];
    assert_eq!(step.status, StepStatus::PendingTokenSelection);
    let options = step.token_options.as_ref().unwrap();
    assert_eq!(options.len(), 2);
    assert_eq!(options[0].balance.as_deref(), Some("5"));
    assert_eq!(options[1].balance.as_deref(), Some("2"));
    assert!(step.routes.is_none());
    assert!(step.params.token_in_address.is_none());
    assert!(first.message.starts_with("I found 2 tokens matching \"USDT\""));

    let chosen = options[0].address.clone();
    let plan = resume(first.plan, 0, |s| s.params.token_in_address = Some(chosen));
    let second = harness
        .executor
        .execute(plan, &harness.request("USDT selected"))
        .await;

    let step = &second.plan.steps[0];
    assert_eq!(step.status, StepStatus::PendingSelection);
    let routes = step.routes.as_ref().unwrap();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].output_amount, "3000.0000 BNB");
    assert!(second.tx_draft.is_none());
}

#[tokio::test]
async fn test_approval_suspends_without_swap_draft() {
    let chain = MockChain::new().with_token(TOKEN_A, USER, wei(50));
    let harness = Harness::new(chain);
    let mut step = swap_step(["USDT", "BNB"], "10");
    step.params.token_in_address = Some(TOKEN_A.to_string());
    step.selected_route_id = Some("r1".into());
    let plan = Plan::new("Swap 10 USDT to BNB", vec![step]);

    let first = harness
        .executor
        .execute(plan, &harness.request("Route selected"))
        .await;

    assert_eq!(first.plan.steps[0].status, StepStatus::Pending);
    let draft = first.tx_draft.as_ref().unwrap();
    assert_eq!(draft.to, Some(TOKEN_A));
    assert_eq!(&draft.data[..4], IERC20::approveCall::SELECTOR.as_slice());
    let approve = IERC20::approveCall::abi_decode(&draft.data).unwrap();
    assert_eq!(approve.spender, NETWORK.router());
    assert_eq!(approve.amount, wei(10));
    assert!(first.message.contains("approval"));
    assert!(harness.policy.checks.lock().unwrap().is_empty());

    // Approval mined; the same step re-runs and drafts the swap
    harness.chain.set_allowance(TOKEN_A, USER, wei(10));
    let second = harness
        .executor
        .execute(first.plan, &harness.request("approved"))
        .await;

    assert_eq!(second.plan.steps[0].status, StepStatus::Completed);
    let draft = second.tx_draft.as_ref().unwrap();
    assert_eq!(draft.to, Some(NETWORK.router()));
    assert_eq!(draft.value, U256::ZERO);
    assert_eq!(
        &draft.data[..4],
        IUniswapV2Router02::swapExactTokensForETHCall::SELECTOR.as_slice()
    );
    let checks = harness.policy.checks.lock().unwrap();
    assert_eq!(checks.len(), 1);
    assert_eq!(checks[0].token.map(|t| t.token), Some(TOKEN_A));
}

#[tokio::test]
async fn test_unknown_selected_route_is_terminal() {
    let harness = Harness::new(MockChain::new().with_native(USER, wei(1)));
    let first = harness
        .executor
        .execute(
            Plan::new("swap", vec![swap_step(["BNB", "USDT"], "0.1")]),
            &harness.request("swap"),
        )
        .await;

    let plan = resume(first.plan, 0, |s| s.selected_route_id = Some("r9".into()));
    let outcome = harness
        .executor
        .execute(plan, &harness.request("Route selected"))
        .await;

    let step = &outcome.plan.steps[0];
    assert_eq!(step.status, StepStatus::Failed);
    assert_eq!(step.error_code, Some(ErrorCode::ExecutionFailed));
    assert_eq!(outcome.message, "Step failed: Selected route not found.");
}

#[tokio::test]
async fn test_route_selected_step_requeues_swap() {
    let harness = Harness::new(MockChain::new().with_native(USER, wei(1)));
    let confirm = Step::new(
        "step_2",
        StepType::RouteSelected,
        "Confirm route",
        StepParams {
            original_swap_step_id: Some("step_1".into()),
            selected_route_id: Some("r1".into()),
            ..Default::default()
        },
    );
    let mut plan = Plan::new("swap", vec![swap_step(["BNB", "USDT"], "0.5"), confirm]);
    // The confirmation is only submitted once the route exists
    plan.steps[1].status = StepStatus::Completed;

    let quoted = harness.executor.execute(plan, &harness.request("swap")).await;
    assert_eq!(quoted.plan.steps[0].status, StepStatus::PendingSelection);

    let plan = resume(quoted.plan, 1, |_| {});
    let confirmed = harness
        .executor
        .execute(plan, &harness.request("Route selected"))
        .await;
    assert_eq!(confirmed.plan.steps[1].status, StepStatus::Completed);
    assert_eq!(confirmed.plan.steps[0].status, StepStatus::Pending);
    assert_eq!(confirmed.plan.steps[0].selected_route_id.as_deref(), Some("r1"));
    assert_eq!(
        confirmed.message,
        "Route PancakeSwap V2 selected. Proceeding with swap."
    );
    assert!(confirmed.tx_draft.is_none());

    let executed = harness
        .executor
        .execute(confirmed.plan, &harness.request("Route selected"))
        .await;
    assert_eq!(executed.plan.steps[0].status, StepStatus::Completed);
    assert!(executed.tx_draft.is_some());
}

// ============================================================================
// Terminal failures
// ============================================================================

#[tokio::test]
async fn test_policy_denial_is_terminal() {
    let harness = Harness::build(
        MockChain::new(),
        Arc::new(web3_agent::chain::StaticTokenRegistry),
        MockAssistant::scoring(90),
        RecordingPolicy::deny_all("recipient is blocked"),
    );
    let step = Step::new(
        "step_1",
        StepType::TransferTokens,
        "Transfer 0.1 BNB",
        StepParams {
            to: Some(RECIPIENT.to_string()),
            amount: Some("0.1".into()),
            ..Default::default()
        },
    );

    let outcome = harness
        .executor
        .execute(Plan::new("send", vec![step]), &harness.request("send"))
        .await;

    let step = &outcome.plan.steps[0];
    assert_eq!(step.status, StepStatus::Failed);
    assert_eq!(step.error_code, Some(ErrorCode::PolicyViolation));
    assert_eq!(step.can_retry, Some(false));
    assert_eq!(outcome.should_retry, None);
    assert!(outcome.tx_draft.is_none());
    assert_eq!(
        outcome.message,
        "Transaction blocked by policy: recipient is blocked"
    );
}

#[tokio::test]
async fn test_policy_denial_on_swap_is_terminal() {
    let harness = Harness::build(
        MockChain::new().with_native(USER, wei(1)),
        Arc::new(web3_agent::chain::StaticTokenRegistry),
        MockAssistant::scoring(90),
        RecordingPolicy::deny_all("router not allowed"),
    );
    let mut step = swap_step(["BNB", "USDT"], "0.5");
    step.selected_route_id = Some("r1".into());

    let outcome = harness
        .executor
        .execute(Plan::new("swap", vec![step]), &harness.request("Route selected"))
        .await;

    let step = &outcome.plan.steps[0];
    assert_eq!(step.status, StepStatus::Failed);
    assert_eq!(step.error_code, Some(ErrorCode::PolicyViolation));
    assert_eq!(outcome.should_retry, None);
    assert!(outcome.tx_draft.is_none());
    let checks = harness.policy.checks.lock().unwrap();
    assert_eq!(checks.len(), 1);
    assert_eq!(checks[0].destination, NETWORK.router());
    assert_eq!(checks[0].value, wei(1) / U256::from(2u64));
    assert!(checks[0].token.is_none());
}

fn transfer_step(token: Option<&str>, amount: &str) -> Step {
    Step::new(
        "step_1",
        StepType::TransferTokens,
        format!("Transfer {amount} {}", token.unwrap_or("BNB")),
        StepParams {
            to: Some(RECIPIENT.to_string()),
            amount: Some(amount.to_string()),
            token: token.map(str::to_string),
            ..Default::default()
        },
    )
}

#[tokio::test]
async fn test_transfer_of_erc20_drafts_token_call() {
    let busd = address!("eD24FC36d5Ee211Ea25A80239Fb8C4Cfd80f1218");
    let harness = Harness::new(MockChain::new());

    let outcome = harness
        .executor
        .execute(
            Plan::new("send", vec![transfer_step(Some("BUSD"), "2.5")]),
            &harness.request("send 2.5 BUSD"),
        )
        .await;

    assert_eq!(outcome.plan.steps[0].status, StepStatus::Completed);
    let draft = outcome.tx_draft.as_ref().unwrap();
    assert_eq!(draft.to, Some(busd));
    assert_eq!(draft.value, U256::ZERO);
    let call = IERC20::transferCall::abi_decode(&draft.data).unwrap();
    assert_eq!(call.to, RECIPIENT);
    assert_eq!(call.amount, U256::from(2_500_000_000_000_000_000u64));

    let checks = harness.policy.checks.lock().unwrap();
    assert_eq!(checks[0].destination, RECIPIENT);
    assert_eq!(checks[0].value, U256::ZERO);
    assert_eq!(
        checks[0].token.map(|t| (t.token, t.amount)),
        Some((busd, U256::from(2_500_000_000_000_000_000u64)))
    );
}

#[tokio::test]
async fn test_transfer_of_unknown_token_fails_without_substitution() {
    let harness = Harness::new(MockChain::new());

    let outcome = harness
        .executor
        .execute(
            Plan::new("send", vec![transfer_step(Some("CAKE"), "10")]),
            &harness.request("send 10 CAKE"),
        )
        .await;

    let step = &outcome.plan.steps[0];
    assert_eq!(step.status, StepStatus::Failed);
    assert_eq!(step.error_code, Some(ErrorCode::ExecutionFailed));
    assert!(outcome.tx_draft.is_none());
    assert!(outcome.message.contains("unknown token 'CAKE'"));
    assert!(harness.policy.checks.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_transfer_of_ambiguous_symbol_asks_for_address() {
    let harness = Harness::new(MockChain::new());

    let outcome = harness
        .executor
        .execute(
            Plan::new("send", vec![transfer_step(Some("USDT"), "10")]),
            &harness.request("send 10 USDT"),
        )
        .await;

    assert_eq!(outcome.plan.steps[0].status, StepStatus::Failed);
    assert!(outcome.tx_draft.is_none());
    assert!(outcome.message.contains("matches 3 contracts"));
    assert!(outcome.message.contains("specify the token address"));
}

#[tokio::test]
async fn test_transfer_by_raw_address_uses_that_token() {
    let harness = Harness::new(MockChain::new().with_decimals(TOKEN_A, 6));

    let outcome = harness
        .executor
        .execute(
            Plan::new("send", vec![transfer_step(Some(&TOKEN_A.to_string()), "3")]),
            &harness.request("send"),
        )
        .await;

    let draft = outcome.tx_draft.as_ref().unwrap();
    assert_eq!(draft.to, Some(TOKEN_A));
    let call = IERC20::transferCall::abi_decode(&draft.data).unwrap();
    assert_eq!(call.amount, U256::from(3_000_000u64));
}

#[tokio::test]
async fn test_policy_denial_on_deploy_is_terminal() {
    let harness = Harness::build(
        MockChain::new(),
        Arc::new(web3_agent::chain::StaticTokenRegistry),
        MockAssistant::scoring(90),
        RecordingPolicy::deny_all("deployments paused"),
    );
    let step = Step::new("step_1", StepType::DeployContract, "Deploy", StepParams::default());

    let outcome = harness
        .executor
        .execute(Plan::new("deploy", vec![step]), &harness.request("deploy"))
        .await;

    assert_eq!(outcome.plan.steps[0].error_code, Some(ErrorCode::PolicyViolation));
    let checks = harness.policy.checks.lock().unwrap();
    assert_eq!(checks[0].destination, USER);
    assert_eq!(checks[0].value, U256::from(1_000_000_000_000_000u64));
}

#[tokio::test]
async fn test_insufficient_balance_uses_exact_units() {
    // 1.0 BNB held, 1.5 requested
    let harness = Harness::new(MockChain::new().with_native(USER, wei(1)));
    let mut step = swap_step(["BNB", "USDT"], "1.5");
    step.selected_route_id = Some("r1".into());

    let outcome = harness
        .executor
        .execute(Plan::new("swap", vec![step]), &harness.request("Route selected"))
        .await;

    let step = &outcome.plan.steps[0];
    assert_eq!(step.status, StepStatus::Failed);
    assert_eq!(step.error_code, Some(ErrorCode::InsufficientBalance));
    assert_eq!(
        outcome.message,
        "Insufficient balance. Please add funds to your wallet."
    );
    assert!(step.result.as_ref().unwrap()["error"]
        .as_str()
        .unwrap()
        .contains("You have 1 BNB"));
}

// ============================================================================
// End to end
// ============================================================================

#[tokio::test]
async fn test_swap_native_end_to_end() {
    let harness = Harness::new(MockChain::new().with_native(USER, wei(2)));
    let message = "Swap 0.5 BNB to USDT";
    let plan = HeuristicPlanner.plan_text(message);
    assert_eq!(plan.steps.len(), 1);
    assert_eq!(plan.steps[0].step_type, StepType::SwapTokens);

    let quoted = harness.executor.execute(plan, &harness.request(message)).await;
    let step = &quoted.plan.steps[0];
    assert_eq!(step.status, StepStatus::PendingSelection);
    let routes = step.routes.as_ref().unwrap();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].id, "r1");
    assert_eq!(routes[0].output_amount, "150.0000 USDT");
    assert!(routes[0].gas_fee.contains("BNB"));
    assert_eq!(step.params.token_in_address.as_deref(), Some("BNB"));

    let plan = resume(quoted.plan, 0, |s| s.selected_route_id = Some("r1".into()));
    let executed = harness
        .executor
        .execute(plan, &harness.request("Route selected"))
        .await;

    assert_eq!(executed.plan.steps[0].status, StepStatus::Completed);
    assert_eq!(
        executed.message,
        "Route confirmed. Transaction to swap 0.5 BNB prepared."
    );
    let response = serde_json::to_value(AgentResponse::from(executed)).unwrap();
    assert_eq!(response["txDraft"]["value"], "500000000000000000");
    assert_eq!(response["currentStep"]["status"], "completed");
}

async fn run_contract_flow(score: u32) -> (Plan, RiskLevel, Arc<MockAssistant>) {
    let harness = Harness::build(
        MockChain::new(),
        Arc::new(web3_agent::chain::StaticTokenRegistry),
        MockAssistant::scoring(score),
        RecordingPolicy::allow_all(),
    );
    let message = "Create a meme token called DOGE";
    let mut plan = HeuristicPlanner.plan_text(message);
    let kinds: Vec<_> = plan.steps.iter().map(|s| s.step_type).collect();
    assert_eq!(
        kinds,
        vec![
            StepType::GenerateContract,
            StepType::AuditContract,
            StepType::DeployContract
        ]
    );

    let mut risk = RiskLevel::Low;
    for call in 0..3 {
        let outcome = harness.executor.execute(plan, &harness.request(message)).await;
        assert_eq!(outcome.plan.steps[call].status, StepStatus::Completed);
        risk = outcome.risk_level;
        if call == 2 {
            let draft = outcome.tx_draft.as_ref().unwrap();
            assert!(draft.is_contract_creation());
            assert_eq!(draft.description, "Deploy: GeneratedContract");
        }
        plan = outcome.plan;
    }
    (plan, risk, harness.assistant.clone())
}

#[tokio::test]
async fn test_contract_flow_risk_follows_audit_score() {
    let (plan, risk, assistant) = run_contract_flow(40).await;
    assert_eq!(risk, RiskLevel::High);
    assert_eq!(plan.steps[1].result.as_ref().unwrap()["score"], 40);
    // Audit ran on the generated source, not a placeholder
    assert!(assistant.audited.lock().unwrap()[0].contains("contract Doge"));
    assert!(plan.steps[2].params.source_code.is_some());

    let (_, risk, _) = run_contract_flow(65).await;
    assert_eq!(risk, RiskLevel::Medium);

    let (_, risk, _) = run_contract_flow(92).await;
    assert_eq!(risk, RiskLevel::Low);
}

#[tokio::test]
async fn test_audit_of_unverified_address_uses_placeholder() {
    let harness = Harness::new(MockChain::new());
    let step = Step::new(
        "step_1",
        StepType::AuditContract,
        "Audit",
        StepParams {
            address: Some(RECIPIENT.to_string()),
            ..Default::default()
        },
    );

    let outcome = harness
        .executor
        .execute(Plan::new("audit", vec![step]), &harness.request("audit"))
        .await;

    assert_eq!(outcome.plan.steps[0].status, StepStatus::Completed);
    let audited = harness.assistant.audited.lock().unwrap();
    assert!(audited[0].starts_with("// Contract source code not verified on BSCScan for"));
}

#[tokio::test]
async fn test_audit_of_verified_address_uses_explorer_source() {
    let harness = Harness::new(MockChain::new());
    harness.explorer.verify(RECIPIENT, "contract Live {}");
    let step = Step::new(
        "step_1",
        StepType::AuditContract,
        "Audit",
        StepParams {
            address: Some(RECIPIENT.to_string()),
            ..Default::default()
        },
    );

    let outcome = harness
        .executor
        .execute(Plan::new("audit", vec![step]), &harness.request("audit"))
        .await;

    assert_eq!(outcome.message, "Audit complete. Score: 85/100.");
    assert_eq!(harness.assistant.audited.lock().unwrap()[0], "contract Live {}");
}

#[tokio::test]
async fn test_chat_forwards_history() {
    let harness = Harness::new(MockChain::new());
    let plan = HeuristicPlanner.plan_text("what is gas?");
    let mut request = harness.request("what is gas?");
    request.history = vec![web3_agent_types::ChatTurn {
        role: "user".into(),
        content: "hi".into(),
    }];

    let outcome = harness.executor.execute(plan, &request).await;

    assert_eq!(outcome.plan.steps[0].status, StepStatus::Completed);
    assert_eq!(outcome.message, "[1 turns] what is gas?");
}
