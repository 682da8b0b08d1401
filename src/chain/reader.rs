use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;

use super::network::Network;
use super::tokens::TokenRef;
use super::ChainError;

/// A read-only call, used for gas estimation of a drafted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub data: Bytes,
    pub value: U256,
}

/// On-chain reads the handlers depend on.
///
/// Implementations must not cache: balances, allowances and decimals are
/// re-read on every invocation.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn native_balance(&self, network: Network, owner: Address) -> Result<U256, ChainError>;

    async fn token_balance(
        &self,
        network: Network,
        token: Address,
        owner: Address,
    ) -> Result<U256, ChainError>;

    async fn allowance(
        &self,
        network: Network,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError>;

    async fn decimals(&self, network: Network, token: Address) -> Result<u8, ChainError>;

    /// Router `getAmountsOut` along `path`
    async fn amounts_out(
        &self,
        network: Network,
        amount_in: U256,
        path: &[Address],
    ) -> Result<Vec<U256>, ChainError>;

    async fn gas_price(&self, network: Network) -> Result<U256, ChainError>;

    async fn estimate_gas(&self, network: Network, call: &CallRequest) -> Result<u64, ChainError>;

    async fn balance_of(
        &self,
        network: Network,
        token: TokenRef,
        owner: Address,
    ) -> Result<U256, ChainError> {
        match token {
            TokenRef::Native => self.native_balance(network, owner).await,
            TokenRef::Erc20(address) => self.token_balance(network, address, owner).await,
        }
    }
}
