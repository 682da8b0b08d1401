//! Quote/Gas Estimator
//!
//! Expected output for a swap (router `getAmountsOut`) and a display-only
//! fee/time estimate. Fee estimation never fails; it degrades to fixed text.

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::U256;
use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::chain::units::{format_units_fixed, to_base_units, to_decimal};
use crate::chain::{CallRequest, ChainError, ChainReader, Network, TokenRef};
use crate::error::StepError;
use crate::resolver::TokenResolver;

pub const DEFAULT_GAS_LIMIT: u64 = 200_000;
pub const QUOTE_DISPLAY_DP: usize = 4;
pub const ESTIMATED_TIME: &str = "~15s";
pub const FALLBACK_GAS_FEE: &str = "~$0.15 (estimate)";
pub const FALLBACK_TIME: &str = "~30s";

/// Native price used when the oracle is unreachable.
pub fn fallback_native_price() -> Decimal {
    Decimal::from(650)
}

// ============================================================================
// Price oracle
// ============================================================================

#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// USD price of the network's native coin
    async fn native_usd(&self, network: Network) -> Result<Decimal, ChainError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativePrice {
    pub usd: Decimal,
    /// Set when the fallback price was used
    pub approximate: bool,
}

pub async fn native_price_or_fallback(oracle: &dyn PriceOracle, network: Network) -> NativePrice {
    match oracle.native_usd(network).await {
        Ok(usd) => NativePrice {
            usd,
            approximate: false,
        },
        Err(e) => {
            tracing::warn!(error = %e, "native price unavailable, using fallback");
            NativePrice {
                usd: fallback_native_price(),
                approximate: true,
            }
        }
    }
}

pub const COINGECKO_URL: &str = "https://api.coingecko.com/api/v3/simple/price";

/// CoinGecko `simple/price` for `binancecoin` in USD.
pub struct CoinGeckoOracle {
    client: reqwest::Client,
    url: String,
}

impl CoinGeckoOracle {
    pub fn new(timeout: Duration) -> Result<Self, ChainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::from_reqwest(COINGECKO_URL, e))?;
        Ok(Self {
            client,
            url: COINGECKO_URL.to_string(),
        })
    }
}

#[async_trait]
impl PriceOracle for CoinGeckoOracle {
    async fn native_usd(&self, _network: Network) -> Result<Decimal, ChainError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("ids", "binancecoin"), ("vs_currencies", "usd")])
            .send()
            .await
            .map_err(|e| ChainError::from_reqwest(&self.url, e))?;

        if !response.status().is_success() {
            return Err(ChainError::Http {
                endpoint: self.url.clone(),
                status: response.status().as_u16(),
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ChainError::decode("price response", e))?;
        let price = body
            .pointer("/binancecoin/usd")
            .and_then(|p| p.as_f64())
            .ok_or_else(|| ChainError::decode("price response", &body))?;
        Decimal::try_from(price).map_err(|e| ChainError::decode("price", e))
    }
}

// ============================================================================
// Estimator
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub amount_in: U256,
    pub amount_out: U256,
    /// Output amount to 4 decimal places, `"0.0000"` when there's no liquidity
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeEstimate {
    pub gas_fee: String,
    pub time: String,
}

impl FeeEstimate {
    fn fallback() -> Self {
        Self {
            gas_fee: FALLBACK_GAS_FEE.to_string(),
            time: FALLBACK_TIME.to_string(),
        }
    }
}

pub struct QuoteEstimator {
    chain: Arc<dyn ChainReader>,
    prices: Arc<dyn PriceOracle>,
}

impl QuoteEstimator {
    pub fn new(chain: Arc<dyn ChainReader>, prices: Arc<dyn PriceOracle>) -> Self {
        Self { chain, prices }
    }

    /// Expected output for `amount` of `token_in`. A reverted quote is a
    /// zero quote; transport failures propagate.
    pub async fn quote(
        &self,
        resolver: &TokenResolver,
        network: Network,
        token_in: TokenRef,
        token_out: TokenRef,
        amount: Decimal,
    ) -> Result<Quote, StepError> {
        let decimals_in = resolver.decimals(network, token_in).await?;
        let decimals_out = resolver.decimals(network, token_out).await?;
        let amount_in =
            to_base_units(amount, decimals_in).map_err(|e| StepError::invalid(e.to_string()))?;

        let path = network.swap_path(token_in, token_out).ok_or_else(|| {
            StepError::invalid(format!("cannot swap {token_in} into {token_out}"))
        })?;

        let amount_out = match self.chain.amounts_out(network, amount_in, &path).await {
            Ok(amounts) => amounts.last().copied().unwrap_or(U256::ZERO),
            Err(e) if e.is_transient() => return Err(e.into()),
            Err(e) => {
                tracing::warn!(error = %e, "quote failed, reporting zero output");
                U256::ZERO
            }
        };

        Ok(Quote {
            amount_in,
            amount_out,
            display: format_units_fixed(amount_out, decimals_out, QUOTE_DISPLAY_DP),
        })
    }

    /// Gas limit × gas price shown in USD and BNB.
    pub async fn estimate_fee(&self, network: Network, call: &CallRequest) -> FeeEstimate {
        let gas_limit = match self.chain.estimate_gas(network, call).await {
            Ok(gas) => gas,
            Err(e) => {
                tracing::debug!(error = %e, "gas estimate failed, using default limit");
                DEFAULT_GAS_LIMIT
            }
        };
        let gas_price = match self.chain.gas_price(network).await {
            Ok(price) => price,
            Err(e) => {
                tracing::warn!(error = %e, "gas price unavailable");
                return FeeEstimate::fallback();
            }
        };

        let cost_wei = gas_price.saturating_mul(U256::from(gas_limit));
        let Some(cost_bnb) = to_decimal(cost_wei, 18) else {
            return FeeEstimate::fallback();
        };
        let price = native_price_or_fallback(self.prices.as_ref(), network).await;
        let usd = (cost_bnb * price.usd).round_dp(2);

        FeeEstimate {
            gas_fee: format!("${} ({} BNB)", usd, cost_bnb.round_dp(6).normalize()),
            time: ESTIMATED_TIME.to_string(),
        }
    }
}
