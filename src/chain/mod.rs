//! Chain access for BNB Smart Chain.
//!
//! Reads only. Nothing here signs or sends transactions; drafts leave the
//! process unsigned.

pub mod abi;
pub mod network;
pub mod reader;
pub mod rpc;
pub mod tokens;
pub mod units;

use thiserror::Error;

pub use network::{ChainContext, Network};
pub use reader::{CallRequest, ChainReader};
pub use rpc::JsonRpcChainReader;
pub use tokens::{StaticTokenRegistry, TokenDef, TokenRef, TokenRegistry};

/// JSON-RPC code a wallet/provider uses for a user-declined request (EIP-1193).
pub const USER_REJECTED_CODE: i64 = 4001;
/// Common "limit exceeded" code returned by public BSC endpoints.
pub const LIMIT_EXCEEDED_CODE: i64 = -32005;

/// Errors from the chain reader and the other HTTP-backed data sources.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("{endpoint} timed out")]
    Timeout { endpoint: String },

    #[error("could not reach {endpoint}: {message}")]
    Transport { endpoint: String, message: String },

    #[error("{endpoint} returned HTTP {status}")]
    Http { endpoint: String, status: u16 },

    #[error("execution reverted: {0}")]
    Reverted(String),

    #[error("User rejected the request: {0}")]
    UserRejected(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("could not decode {what}: {message}")]
    Decode { what: String, message: String },

    #[error("no RPC endpoint configured for {0}")]
    NotConfigured(Network),
}

impl ChainError {
    pub fn from_reqwest(endpoint: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ChainError::Timeout {
                endpoint: endpoint.to_string(),
            }
        } else if let Some(status) = err.status() {
            ChainError::Http {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            }
        } else {
            ChainError::Transport {
                endpoint: endpoint.to_string(),
                message: err.to_string(),
            }
        }
    }

    pub fn decode(what: &str, message: impl std::fmt::Display) -> Self {
        ChainError::Decode {
            what: what.to_string(),
            message: message.to_string(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        match self {
            ChainError::Http { status, .. } => *status == 429,
            ChainError::Rpc { code, .. } => *code == LIMIT_EXCEEDED_CODE,
            _ => false,
        }
    }

    pub fn is_transient(&self) -> bool {
        match self {
            ChainError::Timeout { .. } | ChainError::Transport { .. } => true,
            ChainError::Http { status, .. } => matches!(status, 429 | 502 | 503 | 504),
            ChainError::Rpc { .. } => self.is_rate_limited(),
            ChainError::Reverted(_)
            | ChainError::UserRejected(_)
            | ChainError::Decode { .. }
            | ChainError::NotConfigured(_) => false,
        }
    }
}
