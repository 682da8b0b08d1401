//! Policy Gate
//!
//! Spend/risk rules evaluated against a drafted transaction before it is
//! returned for signing. A deny becomes a terminal `POLICY_VIOLATION`.

use std::collections::{HashMap, HashSet};

use alloy_primitives::{Address, U256};
use async_trait::async_trait;

use crate::chain::units::{format_units, to_base_units};
use crate::config::PolicyConfig;

/// ERC-20 amount moved by the transaction, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSpend {
    pub token: Address,
    pub amount: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyCheck {
    pub destination: Address,
    /// Native value in wei
    pub value: U256,
    pub token: Option<TokenSpend>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl PolicyDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

#[async_trait]
pub trait PolicyGate: Send + Sync {
    async fn check(&self, check: &PolicyCheck) -> PolicyDecision;
}

/// Static limits: blocked destinations, a native value cap and optional
/// per-token caps.
#[derive(Debug, Clone)]
pub struct SpendPolicy {
    max_native_value: U256,
    blocked: HashSet<Address>,
    token_limits: HashMap<Address, U256>,
}

impl SpendPolicy {
    pub fn new(max_native_value: U256) -> Self {
        Self {
            max_native_value,
            blocked: HashSet::new(),
            token_limits: HashMap::new(),
        }
    }

    pub fn from_config(config: &PolicyConfig) -> Self {
        let max = to_base_units(config.max_native_value, 18).unwrap_or(U256::ZERO);
        config.token_limits.iter().fold(
            Self::new(max).with_blocked(config.blocked_addresses.iter().copied()),
            |policy, (token, limit)| policy.with_token_limit(*token, *limit),
        )
    }

    pub fn with_blocked(mut self, addresses: impl IntoIterator<Item = Address>) -> Self {
        self.blocked.extend(addresses);
        self
    }

    pub fn with_token_limit(mut self, token: Address, max_amount: U256) -> Self {
        self.token_limits.insert(token, max_amount);
        self
    }
}

#[async_trait]
impl PolicyGate for SpendPolicy {
    async fn check(&self, check: &PolicyCheck) -> PolicyDecision {
        if self.blocked.contains(&check.destination) {
            return PolicyDecision::deny(format!(
                "destination {} is on the block list",
                check.destination
            ));
        }
        if check.value > self.max_native_value {
            return PolicyDecision::deny(format!(
                "value {} BNB exceeds the per-transaction limit of {} BNB",
                format_units(check.value, 18),
                format_units(self.max_native_value, 18)
            ));
        }
        if let Some(spend) = check.token {
            if self.blocked.contains(&spend.token) {
                return PolicyDecision::deny(format!("token {} is on the block list", spend.token));
            }
            if let Some(limit) = self.token_limits.get(&spend.token) {
                if spend.amount > *limit {
                    return PolicyDecision::deny(format!(
                        "amount {} exceeds the limit {} for token {}",
                        spend.amount, limit, spend.token
                    ));
                }
            }
        }
        PolicyDecision::allow()
    }
}
