//! Verified-source lookup for auditing deployed contracts.

use std::time::Duration;

use alloy_primitives::Address;
use async_trait::async_trait;

use crate::chain::{ChainError, Network};

#[async_trait]
pub trait SourceVerifier: Send + Sync {
    /// `Ok(None)` when the contract exists but its source isn't verified.
    async fn verified_source(
        &self,
        address: Address,
        network: Network,
    ) -> Result<Option<String>, ChainError>;
}

/// BscScan `module=contract&action=getsourcecode`.
pub struct BscScanVerifier {
    client: reqwest::Client,
    api_key: String,
}

impl BscScanVerifier {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, ChainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::from_reqwest("bscscan", e))?;
        Ok(Self { client, api_key })
    }
}

#[async_trait]
impl SourceVerifier for BscScanVerifier {
    async fn verified_source(
        &self,
        address: Address,
        network: Network,
    ) -> Result<Option<String>, ChainError> {
        let endpoint = network.explorer_api();
        let address = address.to_string();
        let response = self
            .client
            .get(endpoint)
            .query(&[
                ("module", "contract"),
                ("action", "getsourcecode"),
                ("address", address.as_str()),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ChainError::from_reqwest(endpoint, e))?;

        if !response.status().is_success() {
            return Err(ChainError::Http {
                endpoint: endpoint.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ChainError::decode("explorer response", e))?;
        source_from_response(&body)
    }
}

/// `result` is an array on success and a message string on failure.
fn source_from_response(body: &serde_json::Value) -> Result<Option<String>, ChainError> {
    match body.get("result") {
        Some(serde_json::Value::Array(entries)) => Ok(entries
            .first()
            .and_then(|e| e.get("SourceCode"))
            .and_then(|s| s.as_str())
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)),
        Some(other) => Err(ChainError::decode("explorer response", other)),
        None => Err(ChainError::decode("explorer response", body)),
    }
}
