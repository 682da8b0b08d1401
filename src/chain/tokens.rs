//! Token identities and the symbol registry.

use std::str::FromStr;

use alloy_primitives::{address, Address};

use super::network::{Network, NATIVE_SYMBOL};

/// A concrete asset: the chain's native coin or an ERC-20 contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenRef {
    Native,
    Erc20(Address),
}

impl TokenRef {
    /// Accepts the native symbol or a hex address.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if Network::is_native_symbol(raw) || raw.eq_ignore_ascii_case("native") {
            return Some(TokenRef::Native);
        }
        if raw.starts_with("0x") && raw.len() == 42 {
            return Address::from_str(raw).ok().map(TokenRef::Erc20);
        }
        None
    }

    pub fn address(&self) -> Option<Address> {
        match self {
            TokenRef::Native => None,
            TokenRef::Erc20(a) => Some(*a),
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, TokenRef::Native)
    }
}

/// Written into `params.tokenInAddress`, read back by [`TokenRef::parse`].
impl std::fmt::Display for TokenRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenRef::Native => f.write_str(NATIVE_SYMBOL),
            TokenRef::Erc20(a) => write!(f, "{a}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDef {
    pub symbol: String,
    pub name: String,
    pub address: Address,
    pub decimals: u8,
}

pub trait TokenRegistry: Send + Sync {
    /// Case-insensitive symbol lookup on one network.
    fn by_symbol(&self, symbol: &str, network: Network) -> Vec<TokenDef>;
}

type Entry = (&'static str, &'static str, Address, u8);

const TESTNET_TOKENS: &[Entry] = &[
    (
        "WBNB",
        "Wrapped BNB",
        address!("ae13d989daC2f0dEbFf460aC112a837C89BAa7cd"),
        18,
    ),
    (
        "USDT",
        "Tether USD (PancakeSwap testnet)",
        address!("337610d27c682E347C9cD60BD4b3b107C9d34dDd"),
        18,
    ),
    (
        "USDT",
        "Tether USD (6 decimals)",
        address!("7ef95a0FEE0Dd31b22626fA2e10Ee6A223F8a684"),
        6,
    ),
    (
        "USDT",
        "Tether USD (mainnet address)",
        address!("55d398326f99059fF775485246999027B3197955"),
        18,
    ),
    (
        "BUSD",
        "Binance USD",
        address!("eD24FC36d5Ee211Ea25A80239Fb8C4Cfd80f1218"),
        18,
    ),
    (
        "DAI",
        "Dai Stablecoin",
        address!("EC5dCb5Dbf4B114C9d0F65BcCAb49EC54F956622"),
        18,
    ),
];

const MAINNET_TOKENS: &[Entry] = &[
    (
        "USDT",
        "Tether USD",
        address!("55d398326f99059fF775485246999027B3197955"),
        18,
    ),
    (
        "BUSD",
        "Binance USD",
        address!("e9e7CEA3DedcA5984780Bafc599bD69ADd087D56"),
        18,
    ),
];

/// Built-in token lists for BSC mainnet and testnet.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticTokenRegistry;

impl TokenRegistry for StaticTokenRegistry {
    fn by_symbol(&self, symbol: &str, network: Network) -> Vec<TokenDef> {
        let list = match network {
            Network::BscMainnet => MAINNET_TOKENS,
            Network::BscTestnet => TESTNET_TOKENS,
        };
        list.iter()
            .filter(|(s, ..)| s.eq_ignore_ascii_case(symbol.trim()))
            .map(|(s, name, address, decimals)| TokenDef {
                symbol: s.to_string(),
                name: name.to_string(),
                address: *address,
                decimals: *decimals,
            })
            .collect()
    }
}
