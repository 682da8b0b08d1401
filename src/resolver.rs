//! Token/Route Resolver
//!
//! Symbol → concrete asset. The input side of a swap may come back ambiguous,
//! in which case the candidates are offered to the user with their balances.
//! The output side never asks: it takes the first registry match.

use std::sync::Arc;

use alloy_primitives::Address;
use web3_agent_types::TokenOption;

use crate::chain::units::format_units;
use crate::chain::{ChainError, ChainReader, Network, TokenDef, TokenRef, TokenRegistry};

/// Decimals assumed when a token contract doesn't answer `decimals()`.
pub const FALLBACK_DECIMALS: u8 = 18;

#[derive(Debug, Clone, PartialEq)]
pub enum InputResolution {
    Resolved(TokenRef),
    Ambiguous(Vec<TokenDef>),
}

pub struct TokenResolver {
    registry: Arc<dyn TokenRegistry>,
    chain: Arc<dyn ChainReader>,
}

impl TokenResolver {
    pub fn new(registry: Arc<dyn TokenRegistry>, chain: Arc<dyn ChainReader>) -> Self {
        Self { registry, chain }
    }

    pub fn resolve_input(&self, symbol: &str, network: Network) -> InputResolution {
        if Network::is_native_symbol(symbol) {
            return InputResolution::Resolved(TokenRef::Native);
        }
        let mut candidates = self.registry.by_symbol(symbol, network);
        match candidates.len() {
            0 => InputResolution::Resolved(Self::fallback(symbol, network)),
            1 => InputResolution::Resolved(TokenRef::Erc20(candidates.remove(0).address)),
            _ => InputResolution::Ambiguous(candidates),
        }
    }

    pub fn resolve_output(&self, symbol: &str, network: Network) -> TokenRef {
        if Network::is_native_symbol(symbol) {
            return TokenRef::Native;
        }
        let candidates = self.registry.by_symbol(symbol, network);
        match candidates.first() {
            Some(first) => {
                if candidates.len() > 1 {
                    // TODO: offer output-side candidates the way the input side does
                    tracing::warn!(
                        symbol,
                        count = candidates.len(),
                        chosen = %first.address,
                        "ambiguous output token, using first registry match"
                    );
                }
                TokenRef::Erc20(first.address)
            }
            None => Self::fallback(symbol, network),
        }
    }

    /// Lookup without any fallback asset: the native symbol, a raw address,
    /// or registry matches. `None` when nothing matches.
    pub fn resolve_exact(&self, symbol: &str, network: Network) -> Option<InputResolution> {
        if let Some(token) = TokenRef::parse(symbol) {
            return Some(InputResolution::Resolved(token));
        }
        let mut candidates = self.registry.by_symbol(symbol, network);
        match candidates.len() {
            0 => None,
            1 => Some(InputResolution::Resolved(TokenRef::Erc20(
                candidates.remove(0).address,
            ))),
            _ => Some(InputResolution::Ambiguous(candidates)),
        }
    }

    /// Raw address if the text is one, else the network's default stable.
    fn fallback(symbol: &str, network: Network) -> TokenRef {
        match TokenRef::parse(symbol) {
            Some(token) => token,
            None => {
                tracing::warn!(symbol, %network, "unknown token symbol, using default stable");
                TokenRef::Erc20(network.default_stable())
            }
        }
    }

    /// Candidate list for the user, each with the wallet's balance when
    /// it can be read. Balance failures only blank the balance.
    pub async fn token_options(
        &self,
        candidates: &[TokenDef],
        network: Network,
        owner: Option<Address>,
    ) -> Vec<TokenOption> {
        let mut options = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let balance = match owner {
                Some(owner) => {
                    match self
                        .chain
                        .token_balance(network, candidate.address, owner)
                        .await
                    {
                        Ok(raw) => Some(format_units(raw, candidate.decimals)),
                        Err(e) => {
                            tracing::warn!(token = %candidate.address, error = %e, "balance unavailable");
                            None
                        }
                    }
                }
                None => None,
            };
            options.push(TokenOption {
                symbol: candidate.symbol.clone(),
                name: candidate.name.clone(),
                address: candidate.address.to_string(),
                decimals: candidate.decimals,
                balance,
            });
        }
        options
    }

    /// Live decimals. A contract that reverts is assumed to use 18; transport
    /// failures propagate.
    pub async fn decimals(&self, network: Network, token: TokenRef) -> Result<u8, ChainError> {
        let TokenRef::Erc20(address) = token else {
            return Ok(18);
        };
        match self.chain.decimals(network, address).await {
            Ok(d) => Ok(d),
            Err(e) if e.is_transient() => Err(e),
            Err(e) => {
                tracing::warn!(token = %address, error = %e, "decimals() failed, assuming {FALLBACK_DECIMALS}");
                Ok(FALLBACK_DECIMALS)
            }
        }
    }
}
