//! Environment configuration.
//!
//! Everything is read once at startup. The binary loads `.env` with `dotenvy`
//! before calling [`AgentConfig::from_env`].

use std::str::FromStr;
use std::time::Duration;

use alloy_primitives::{Address, U256};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::chain::Network;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";
pub const DEFAULT_MAINNET_RPC: &str = "https://bsc-dataseed.binance.org/";
pub const DEFAULT_TESTNET_RPC: &str = "https://data-seed-prebsc-1-s1.binance.org:8545/";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub bind_addr: String,
    pub default_network: Network,
    pub mainnet_rpc_url: String,
    pub testnet_rpc_url: String,
    /// Absent key keeps the planner heuristic
    pub chaingpt_api_key: Option<String>,
    pub chaingpt_base_url: String,
    pub bscscan_api_key: String,
    pub http_timeout: Duration,
    pub policy: PolicyConfig,
}

#[derive(Debug, Clone)]
pub struct PolicyConfig {
    /// Largest native value (in BNB) a single draft may carry
    pub max_native_value: Decimal,
    pub blocked_addresses: Vec<Address>,
    /// Per-token caps in the token's base units
    pub token_limits: Vec<(Address, U256)>,
}

impl AgentConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let chain_id = parse_var(&get, "DEFAULT_CHAIN_ID", 97u64)?;
        let default_network =
            Network::from_chain_id(chain_id).ok_or_else(|| ConfigError::Invalid {
                var: "DEFAULT_CHAIN_ID",
                value: chain_id.to_string(),
                reason: "supported chains are 56 and 97".into(),
            })?;

        let timeout_secs = parse_var(&get, "HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;
        let max_native_value = parse_var(&get, "POLICY_MAX_NATIVE_VALUE", Decimal::ONE)?;

        let blocked_addresses = match get("POLICY_BLOCKED_ADDRESSES") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    Address::from_str(s).map_err(|e| ConfigError::Invalid {
                        var: "POLICY_BLOCKED_ADDRESSES",
                        value: s.to_string(),
                        reason: e.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        let token_limits = match get("POLICY_TOKEN_LIMITS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(parse_token_limit)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        Ok(Self {
            bind_addr: get("AGENT_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            default_network,
            mainnet_rpc_url: get("BSC_RPC_URL").unwrap_or_else(|| DEFAULT_MAINNET_RPC.to_string()),
            testnet_rpc_url: get("BSC_TESTNET_RPC_URL")
                .unwrap_or_else(|| DEFAULT_TESTNET_RPC.to_string()),
            chaingpt_api_key: get("CHAINGPT_API_KEY"),
            chaingpt_base_url: get("CHAINGPT_BASE_URL")
                .unwrap_or_else(|| web3_agentic::chaingpt_client::DEFAULT_BASE_URL.to_string()),
            bscscan_api_key: get("BSCSCAN_API_KEY").unwrap_or_default(),
            http_timeout: Duration::from_secs(timeout_secs),
            policy: PolicyConfig {
                max_native_value,
                blocked_addresses,
                token_limits,
            },
        })
    }

    pub fn rpc_url(&self, network: Network) -> &str {
        match network {
            Network::BscMainnet => &self.mainnet_rpc_url,
            Network::BscTestnet => &self.testnet_rpc_url,
        }
    }
}

/// `<token address>=<max base units>`
fn parse_token_limit(entry: &str) -> Result<(Address, U256), ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        var: "POLICY_TOKEN_LIMITS",
        value: entry.to_string(),
        reason,
    };
    let (token, max) = entry
        .split_once('=')
        .ok_or_else(|| invalid("expected <address>=<amount>".into()))?;
    let token = Address::from_str(token.trim()).map_err(|e| invalid(e.to_string()))?;
    let max = U256::from_str_radix(max.trim(), 10).map_err(|e| invalid(e.to_string()))?;
    Ok((token, max))
}

fn parse_var<T, G>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            var,
            value: raw,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
