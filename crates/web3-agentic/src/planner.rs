//! Request Planner
//!
//! Turns the user's text into an initial [`Plan`]. The LLM planner asks the
//! model for a JSON step list; any failure falls back to keyword heuristics so
//! planning never fails outright.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use web3_agent_types::{Plan, Step, StepParams, StepType, PREV_STEP_RESULT};

use crate::llm_client::{AssistantModel, LlmClient};

pub const DEFAULT_SWAP_AMOUNT: &str = "0.01";

#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(&self, text: &str) -> Plan;

    fn name(&self) -> &str;
}

static SYMBOLS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z]{2,}").unwrap());
static AMOUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+(\.\d+)?").unwrap());
static ADDRESS: Lazy<Regex> = Lazy::new(|| Regex::new(r"0x[a-fA-F0-9]{40}").unwrap());

fn step_id(index: usize) -> String {
    format!("step_{}", index + 1)
}

/// Keyword rules, checked in order: create, swap, transfer, portfolio, chat.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicPlanner;

impl HeuristicPlanner {
    pub fn plan_text(&self, text: &str) -> Plan {
        let lower = text.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        let steps = if has(&["create", "generate"]) && has(&["token", "contract"]) {
            vec![
                Step::new(
                    step_id(0),
                    StepType::GenerateContract,
                    "Generate Smart Contract Code",
                    StepParams {
                        description: Some(text.to_string()),
                        ..Default::default()
                    },
                ),
                Step::new(
                    step_id(1),
                    StepType::AuditContract,
                    "Audit Generated Code for Security",
                    StepParams {
                        source: Some(PREV_STEP_RESULT.to_string()),
                        ..Default::default()
                    },
                ),
                Step::new(
                    step_id(2),
                    StepType::DeployContract,
                    "Deploy Contract to BNB Chain",
                    StepParams {
                        source: Some(PREV_STEP_RESULT.to_string()),
                        ..Default::default()
                    },
                ),
            ]
        } else if has(&["swap", "buy", "sell"]) {
            let tokens = swap_pair(text);
            let amount = first_amount(text).unwrap_or_else(|| DEFAULT_SWAP_AMOUNT.to_string());
            vec![Step::new(
                step_id(0),
                StepType::SwapTokens,
                format!("Swap {} {} for {}", amount, tokens[0], tokens[1]),
                StepParams {
                    tokens,
                    amount: Some(amount),
                    ..Default::default()
                },
            )]
        } else if has(&["transfer", "send"]) {
            let to = ADDRESS.find(text).map(|m| m.as_str().to_string());
            let amount = first_amount(text);
            vec![Step::new(
                step_id(0),
                StepType::TransferTokens,
                format!(
                    "Transfer {} BNB to {}",
                    amount.as_deref().unwrap_or("?"),
                    to.as_deref().unwrap_or("recipient")
                ),
                StepParams {
                    to,
                    amount,
                    ..Default::default()
                },
            )]
        } else if has(&["portfolio", "risk", "guardian"]) {
            vec![Step::new(
                step_id(0),
                StepType::PortfolioCheck,
                "Analyze Portfolio Risks",
                StepParams {
                    address: Some("user_wallet".to_string()),
                    ..Default::default()
                },
            )]
        } else {
            vec![chat_step(0, text)]
        };

        Plan::new(text, steps)
    }
}

#[async_trait]
impl Planner for HeuristicPlanner {
    async fn plan(&self, text: &str) -> Plan {
        self.plan_text(text)
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}

fn chat_step(index: usize, text: &str) -> Step {
    Step::new(
        step_id(index),
        StepType::GeneralChat,
        "Process Request with ChainGPT LLM",
        StepParams {
            message: Some(text.to_string()),
            ..Default::default()
        },
    )
}

fn first_amount(text: &str) -> Option<String> {
    AMOUNT.find(text).map(|m| m.as_str().to_string())
}

/// Uppercase symbols in order of appearance, padded to an `[in, out]` pair.
fn swap_pair(text: &str) -> Vec<String> {
    let mut symbols: Vec<String> = SYMBOLS
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect();
    match symbols.len() {
        0 => vec!["BNB".to_string(), "USDT".to_string()],
        1 => {
            let counter = if symbols[0] == "BNB" { "USDT" } else { "BNB" };
            symbols.push(counter.to_string());
            symbols
        }
        _ => {
            symbols.truncate(2);
            symbols
        }
    }
}

// ============================================================================
// LLM planner
// ============================================================================

pub struct LlmPlanner {
    client: Arc<dyn LlmClient>,
    fallback: HeuristicPlanner,
}

#[derive(Deserialize)]
struct RawPlan {
    steps: Vec<RawStep>,
}

#[derive(Deserialize)]
struct RawStep {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    params: Option<serde_json::Value>,
}

impl LlmPlanner {
    pub fn with_client(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            fallback: HeuristicPlanner,
        }
    }

    fn build_prompt(text: &str) -> String {
        format!(
            r#"You are an expert Web3 AI Agent Planner. Your job is to analyze the user's request and create a structured execution plan.
Available Intents:
- swap_tokens: User wants to swap/exchange tokens (e.g. "Swap BNB to USDT"). Params: {{ tokens: [in, out], amount: string }}
- transfer_tokens: User wants to send tokens (e.g. "Send 0.1 BNB to 0x..."). Params: {{ to: string, amount: string, token: string }}
- portfolio_check: User wants to check balance, risk, or portfolio (e.g. "Check my risk"). Params: {{}}
- audit_contract: User wants to audit a contract. Params: {{ address?: string, source?: string }}
- generate_contract: User wants to create/generate code. Params: {{ description: string }}
- deploy_contract: Deploy the previously generated contract. Params: {{}}
- general_chat: General questions. Params: {{ message: string }}

Rules:
1. If the user wants to CREATE a token, always plan 3 steps: generate_contract -> audit_contract -> deploy_contract.
2. Return ONLY valid JSON. No markdown, no explanations.
3. Structure: {{ "steps": [ {{ "type": "...", "description": "...", "params": {{...}} }} ] }}
4. Handle currency units intelligently: "10 cents" -> "0.10", "half a BNB" -> "0.5".

User Request: "{text}"
JSON Plan:"#
        )
    }

    /// Parses the model's answer; `None` when it isn't a usable plan.
    fn parse_plan(text: &str, answer: &str) -> Option<Plan> {
        let cleaned = answer.replace("```json", "").replace("```", "");
        let raw: RawPlan = match serde_json::from_str(cleaned.trim()) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "planner answer is not a JSON plan");
                return None;
            }
        };
        if raw.steps.is_empty() {
            return None;
        }

        let steps = raw
            .steps
            .into_iter()
            .enumerate()
            .map(|(i, s)| match StepType::parse(&s.kind) {
                // Route confirmations come from the caller, never the planner
                Some(StepType::RouteSelected) | None => {
                    tracing::warn!(kind = %s.kind, "unplannable step type, using chat");
                    chat_step(i, text)
                }
                Some(step_type) => {
                    let params = s
                        .params
                        .and_then(|p| serde_json::from_value::<StepParams>(p).ok())
                        .unwrap_or_default();
                    Step::new(
                        step_id(i),
                        step_type,
                        s.description.unwrap_or_else(|| step_type.to_string()),
                        params,
                    )
                }
            })
            .collect();

        Some(Plan::new(text, steps))
    }
}

#[async_trait]
impl Planner for LlmPlanner {
    async fn plan(&self, text: &str) -> Plan {
        let prompt = Self::build_prompt(text);
        match self.client.ask(AssistantModel::GeneralAssistant, &prompt).await {
            Ok(answer) => match Self::parse_plan(text, &answer) {
                Some(plan) => {
                    tracing::info!(steps = plan.steps.len(), "planned with LLM");
                    plan
                }
                None => self.fallback.plan_text(text),
            },
            Err(e) => {
                tracing::warn!(error = %e, "LLM planning failed, falling back to heuristic");
                self.fallback.plan_text(text)
            }
        }
    }

    fn name(&self) -> &str {
        "llm"
    }
}
