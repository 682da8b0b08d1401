//! Portfolio guardian: a coarse wallet health score from on-chain balances.

use std::sync::Arc;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::chain::network::NATIVE_SYMBOL;
use crate::chain::units::to_decimal;
use crate::chain::{ChainError, ChainReader, Network};
use crate::quote::{native_price_or_fallback, PriceOracle};
use crate::resolver::FALLBACK_DECIMALS;

pub const BASE_RISK_SCORE: u32 = 10;
pub const LOW_GAS_PENALTY: u32 = 30;
pub const CONCENTRATION_PENALTY: u32 = 10;
pub const STABLE_SYMBOL: &str = "USDT";

/// Native balance below which the wallet can't reliably pay for gas (0.01).
fn low_gas_threshold() -> Decimal {
    Decimal::new(1, 2)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioReport {
    #[serde(with = "rust_decimal::serde::float")]
    pub total_value: Decimal,
    /// 0-100, higher is riskier
    pub risk_score: u32,
    pub risky_assets: Vec<RiskyAsset>,
    pub assets: Vec<AssetHolding>,
}

impl PortfolioReport {
    fn empty(note: RiskyAsset) -> Self {
        Self {
            total_value: Decimal::ZERO,
            risk_score: 0,
            risky_assets: vec![note],
            assets: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskyAsset {
    pub token: String,
    pub reason: String,
}

impl RiskyAsset {
    fn new(token: &str, reason: &str) -> Self {
        Self {
            token: token.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetHolding {
    pub token: String,
    pub address: String,
    pub balance: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub value_usd: Decimal,
}

#[async_trait]
pub trait PortfolioAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        owner: Option<Address>,
        network: Network,
    ) -> Result<PortfolioReport, ChainError>;
}

/// Native + default-stable holdings priced in USD.
pub struct ChainPortfolioGuardian {
    chain: Arc<dyn ChainReader>,
    prices: Arc<dyn PriceOracle>,
}

impl ChainPortfolioGuardian {
    pub fn new(chain: Arc<dyn ChainReader>, prices: Arc<dyn PriceOracle>) -> Self {
        Self { chain, prices }
    }

    async fn stable_balance(&self, network: Network, owner: Address) -> Decimal {
        let stable = network.default_stable();
        let raw = match self.chain.token_balance(network, stable, owner).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(token = %stable, error = %e, "stable balance unavailable, counting zero");
                U256::ZERO
            }
        };
        let decimals = self
            .chain
            .decimals(network, stable)
            .await
            .unwrap_or(FALLBACK_DECIMALS);
        to_decimal(raw, decimals).unwrap_or(Decimal::ZERO)
    }
}

#[async_trait]
impl PortfolioAnalyzer for ChainPortfolioGuardian {
    async fn analyze(
        &self,
        owner: Option<Address>,
        network: Network,
    ) -> Result<PortfolioReport, ChainError> {
        let Some(owner) = owner else {
            return Ok(PortfolioReport::empty(RiskyAsset::new(
                "Wallet",
                "Please connect your wallet to analyze portfolio.",
            )));
        };

        let native_raw = self.chain.native_balance(network, owner).await?;
        let native = to_decimal(native_raw, 18)
            .ok_or_else(|| ChainError::decode("native balance", native_raw))?;
        let price = native_price_or_fallback(self.prices.as_ref(), network).await;
        let native_value = native * price.usd;

        let stable = self.stable_balance(network, owner).await;

        let mut risk_score = BASE_RISK_SCORE;
        let mut risky_assets = Vec::new();
        if price.approximate {
            risky_assets.push(RiskyAsset::new(
                NATIVE_SYMBOL,
                "Price is approximate (fallback value used).",
            ));
        }
        if native < low_gas_threshold() {
            risk_score += LOW_GAS_PENALTY;
            risky_assets.push(RiskyAsset::new(NATIVE_SYMBOL, "Low native balance for gas."));
        }
        if native_value > Decimal::ZERO && stable.is_zero() {
            risk_score += CONCENTRATION_PENALTY;
        }

        tracing::debug!(%owner, %native, %stable, risk_score, "portfolio analysed");

        Ok(PortfolioReport {
            total_value: (native_value + stable).round_dp(2),
            risk_score: risk_score.min(100),
            risky_assets,
            assets: vec![
                AssetHolding {
                    token: NATIVE_SYMBOL.to_string(),
                    address: "Native".to_string(),
                    balance: native.round_dp(4).to_string(),
                    value_usd: native_value.round_dp(2),
                },
                AssetHolding {
                    token: STABLE_SYMBOL.to_string(),
                    address: network.default_stable().to_string(),
                    balance: stable.round_dp(2).to_string(),
                    value_usd: stable.round_dp(2),
                },
            ],
        })
    }
}
