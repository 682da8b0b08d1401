use alloy_primitives::{address, Address};

use super::tokens::TokenRef;

pub const NATIVE_SYMBOL: &str = "BNB";

/// Supported chains. Anything else is rejected at the HTTP boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    BscMainnet,
    BscTestnet,
}

impl Network {
    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        match chain_id {
            56 => Some(Network::BscMainnet),
            97 => Some(Network::BscTestnet),
            _ => None,
        }
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            Network::BscMainnet => 56,
            Network::BscTestnet => 97,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Network::BscMainnet => "bsc-mainnet",
            Network::BscTestnet => "bsc-testnet",
        }
    }

    /// PancakeSwap V2 router
    pub fn router(&self) -> Address {
        match self {
            Network::BscMainnet => address!("10ED43C718714eb63d5aA57B78B54704E256024E"),
            Network::BscTestnet => address!("D99D1c33F9fC3444f8101754aBC46c52416550D1"),
        }
    }

    /// WBNB, the router's stand-in for the native asset in swap paths
    pub fn wrapped_native(&self) -> Address {
        match self {
            Network::BscMainnet => address!("bb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c"),
            Network::BscTestnet => address!("ae13d989daC2f0dEbFf460aC112a837C89BAa7cd"),
        }
    }

    /// USDT; used when a symbol can't be resolved at all
    pub fn default_stable(&self) -> Address {
        match self {
            Network::BscMainnet => address!("55d398326f99059fF775485246999027B3197955"),
            Network::BscTestnet => address!("337610d27c682E347C9cD60BD4b3b107C9d34dDd"),
        }
    }

    pub fn explorer_api(&self) -> &'static str {
        match self {
            Network::BscMainnet => "https://api.bscscan.com/api",
            Network::BscTestnet => "https://api-testnet.bscscan.com/api",
        }
    }

    pub fn dex_name(&self) -> &'static str {
        "PancakeSwap V2"
    }

    pub fn is_native_symbol(symbol: &str) -> bool {
        symbol.eq_ignore_ascii_case(NATIVE_SYMBOL)
    }

    /// Router path for a pair. Native legs go through WBNB; `None` when
    /// both sides are the same asset.
    pub fn swap_path(&self, token_in: TokenRef, token_out: TokenRef) -> Option<Vec<Address>> {
        if token_in == token_out {
            return None;
        }
        let wrapped = self.wrapped_native();
        match (token_in, token_out) {
            (TokenRef::Native, TokenRef::Erc20(out)) if out == wrapped => None,
            (TokenRef::Erc20(inp), TokenRef::Native) if inp == wrapped => None,
            (TokenRef::Native, TokenRef::Erc20(out)) => Some(vec![wrapped, out]),
            (TokenRef::Erc20(inp), TokenRef::Native) => Some(vec![inp, wrapped]),
            (TokenRef::Erc20(inp), TokenRef::Erc20(out)) => Some(vec![inp, out]),
            (TokenRef::Native, TokenRef::Native) => None,
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.chain_id())
    }
}

/// Per-request chain context handed to every step handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainContext {
    pub network: Network,
    pub user: Option<Address>,
}

impl ChainContext {
    pub fn new(network: Network, user: Option<Address>) -> Self {
        Self { network, user }
    }
}
