//! Contract Assistant
//!
//! Generation, audit and chat on top of an [`LlmClient`]. The provider answers
//! in prose, so audit scores and findings are scraped from the text.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use web3_agent_types::ChatTurn;

use crate::error::LlmError;
use crate::llm_client::{AssistantModel, LlmClient};

pub const GENERATED_CONTRACT_NAME: &str = "GeneratedContract";
pub const DEFAULT_COMPILER_VERSION: &str = "0.8.20";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContract {
    pub source_code: String,
    pub name: String,
    pub compiler_version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    /// 0-100, higher is safer
    pub score: u32,
    pub summary: String,
    #[serde(default)]
    pub vulnerabilities: Vec<Vulnerability>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vulnerability {
    pub severity: Severity,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Generation/audit/chat collaborator used by the step handlers.
#[async_trait]
pub trait ContractAssistant: Send + Sync {
    async fn generate_contract(&self, description: &str) -> Result<GeneratedContract, LlmError>;

    async fn audit_contract(&self, source: &str) -> Result<AuditReport, LlmError>;

    async fn chat(&self, prompt: &str, history: &[ChatTurn]) -> Result<String, LlmError>;
}

pub struct ChainGptAssistant {
    client: Arc<dyn LlmClient>,
}

impl ChainGptAssistant {
    pub fn with_client(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContractAssistant for ChainGptAssistant {
    async fn generate_contract(&self, description: &str) -> Result<GeneratedContract, LlmError> {
        let question = format!(
            "Generate a Solidity smart contract for: {description}. Return the code in a markdown block."
        );
        let text = self
            .client
            .ask(AssistantModel::SmartContractGenerator, &question)
            .await?;

        Ok(GeneratedContract {
            source_code: extract_solidity(&text),
            name: GENERATED_CONTRACT_NAME.to_string(),
            compiler_version: DEFAULT_COMPILER_VERSION.to_string(),
        })
    }

    async fn audit_contract(&self, source: &str) -> Result<AuditReport, LlmError> {
        let question = format!(
            "Audit this Solidity smart contract code and identify security vulnerabilities. \
             Provide a risk score (0-100) and a summary. Code:\n{source}"
        );
        let text = self
            .client
            .ask(AssistantModel::SmartContractAuditor, &question)
            .await?;

        let score = parse_audit_score(&text);
        let vulnerabilities = parse_vulnerabilities(&text);
        tracing::debug!(score, findings = vulnerabilities.len(), "audit parsed");

        Ok(AuditReport {
            score,
            summary: text,
            vulnerabilities,
        })
    }

    async fn chat(&self, prompt: &str, history: &[ChatTurn]) -> Result<String, LlmError> {
        let question = with_history(prompt, history);
        self.client
            .ask(AssistantModel::GeneralAssistant, &question)
            .await
    }
}

// ============================================================================
// Response scraping
// ============================================================================

static SCORE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(?:score|rating)[:\s]*(\d+)(?:\s*/\s*100)?",
        r"(\d+)\s*/\s*100",
        r"(?i)(\d+)\s*(?:out of|of)\s*100",
        r"(?i)(?:risk|security)\s*(?:score|rating)[:\s]*(\d+)",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

static CRITICAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)critical").unwrap());
static HIGH: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)high\s*(?:risk|severity)").unwrap());
static MEDIUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)medium\s*(?:risk|severity)").unwrap());
static LOW: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)low\s*(?:risk|severity)").unwrap());
static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[-*•]\s*(.+)").unwrap());
static SOLIDITY_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```solidity\n(.*?)```").unwrap());
static BARE_BLOCK: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```\n(.*?)```").unwrap());

/// Explicit score if the text states one, else estimated from severity
/// keyword counts.
pub fn parse_audit_score(text: &str) -> u32 {
    for pattern in SCORE_PATTERNS.iter() {
        if let Some(score) = pattern
            .captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
        {
            if score <= 100 {
                return score;
            }
        }
    }

    let critical = CRITICAL.find_iter(text).count() as i64;
    let high = HIGH.find_iter(text).count() as i64;
    let medium = MEDIUM.find_iter(text).count() as i64;
    let low = LOW.find_iter(text).count() as i64;

    let estimated = 100 - critical * 25 - high * 15 - medium * 5 - low * 2;
    estimated.clamp(0, 100) as u32
}

/// Bullet lines filed under the most recently mentioned severity.
pub fn parse_vulnerabilities(text: &str) -> Vec<Vulnerability> {
    let mut found = Vec::new();
    let mut current: Option<Severity> = None;

    for line in text.lines() {
        let lower = line.to_lowercase();
        if lower.contains("critical") {
            current = Some(Severity::Critical);
        } else if lower.contains("high") {
            current = Some(Severity::High);
        } else if lower.contains("medium") {
            current = Some(Severity::Medium);
        } else if lower.contains("low") {
            current = Some(Severity::Low);
        }

        let (Some(severity), Some(caps)) = (current, BULLET.captures(line)) else {
            continue;
        };
        let description = caps[1].trim();
        if description.chars().count() > 10 {
            found.push(Vulnerability {
                severity,
                description: description.to_string(),
                location: None,
            });
        }
    }

    found
}

/// First fenced code block, or the whole answer when there is none.
pub fn extract_solidity(text: &str) -> String {
    SOLIDITY_BLOCK
        .captures(text)
        .or_else(|| BARE_BLOCK.captures(text))
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| text.to_string())
}

fn with_history(prompt: &str, history: &[ChatTurn]) -> String {
    if history.is_empty() {
        return prompt.to_string();
    }
    let context = history
        .iter()
        .map(|t| format!("{}: {}", t.role, t.content))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Context of previous conversation:\n{context}\n\nCurrent User Question: {prompt}")
}
