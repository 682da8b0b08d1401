//! JSON-RPC implementation of [`ChainReader`] over plain `reqwest`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::abi::{IUniswapV2Router02, IERC20};
use super::network::Network;
use super::reader::{CallRequest, ChainReader};
use super::{ChainError, USER_REJECTED_CODE};

pub struct JsonRpcChainReader {
    client: reqwest::Client,
    endpoints: HashMap<Network, String>,
    next_id: AtomicU64,
}

#[derive(Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl JsonRpcChainReader {
    pub fn new(timeout: Duration) -> Result<Self, ChainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::from_reqwest("rpc", e))?;
        Ok(Self {
            client,
            endpoints: HashMap::new(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn with_endpoint(mut self, network: Network, url: impl Into<String>) -> Self {
        self.endpoints.insert(network, url.into());
        self
    }

    async fn request(
        &self,
        network: Network,
        method: &str,
        params: Value,
    ) -> Result<Value, ChainError> {
        let endpoint = self
            .endpoints
            .get(&network)
            .ok_or(ChainError::NotConfigured(network))?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(%network, method, id, "rpc request");

        let response = self
            .client
            .post(endpoint)
            .json(&json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }))
            .send()
            .await
            .map_err(|e| ChainError::from_reqwest(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChainError::Http {
                endpoint: endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let envelope: RpcEnvelope = response
            .json()
            .await
            .map_err(|e| ChainError::decode(method, e))?;

        if let Some(err) = envelope.error {
            return Err(classify_rpc_error(err));
        }
        envelope
            .result
            .ok_or_else(|| ChainError::decode(method, "response has neither result nor error"))
    }

    async fn eth_call(
        &self,
        network: Network,
        to: Address,
        data: Vec<u8>,
    ) -> Result<Vec<u8>, ChainError> {
        let result = self
            .request(
                network,
                "eth_call",
                json!([{ "to": to.to_string(), "data": format!("0x{}", hex::encode(data)) }, "latest"]),
            )
            .await?;
        decode_bytes(&result)
    }
}

fn classify_rpc_error(err: RpcErrorBody) -> ChainError {
    if err.code == USER_REJECTED_CODE {
        return ChainError::UserRejected(err.message);
    }
    // Geth reports reverts as code 3 (with data) or -32000 "execution reverted"
    if err.code == 3 || err.message.to_lowercase().contains("revert") {
        let detail = err
            .data
            .as_ref()
            .and_then(|d| d.as_str())
            .map(|d| format!("{} ({d})", err.message))
            .unwrap_or(err.message);
        return ChainError::Reverted(detail);
    }
    ChainError::Rpc {
        code: err.code,
        message: err.message,
    }
}

fn decode_quantity(value: &Value) -> Result<U256, ChainError> {
    let raw = value
        .as_str()
        .ok_or_else(|| ChainError::decode("quantity", value))?;
    let digits = raw.trim_start_matches("0x");
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16).map_err(|e| ChainError::decode("quantity", e))
}

fn decode_bytes(value: &Value) -> Result<Vec<u8>, ChainError> {
    let raw = value
        .as_str()
        .ok_or_else(|| ChainError::decode("call result", value))?;
    hex::decode(raw.trim_start_matches("0x")).map_err(|e| ChainError::decode("call result", e))
}

fn call_object(call: &CallRequest) -> Value {
    let mut obj = json!({
        "data": format!("0x{}", hex::encode(&call.data)),
        "value": format!("{:#x}", call.value),
    });
    if let Some(from) = call.from {
        obj["from"] = json!(from.to_string());
    }
    if let Some(to) = call.to {
        obj["to"] = json!(to.to_string());
    }
    obj
}

#[async_trait]
impl ChainReader for JsonRpcChainReader {
    async fn native_balance(&self, network: Network, owner: Address) -> Result<U256, ChainError> {
        let result = self
            .request(network, "eth_getBalance", json!([owner.to_string(), "latest"]))
            .await?;
        decode_quantity(&result)
    }

    async fn token_balance(
        &self,
        network: Network,
        token: Address,
        owner: Address,
    ) -> Result<U256, ChainError> {
        let data = IERC20::balanceOfCall { owner }.abi_encode();
        let raw = self.eth_call(network, token, data).await?;
        U256::abi_decode(&raw).map_err(|e| ChainError::decode("balanceOf", e))
    }

    async fn allowance(
        &self,
        network: Network,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, ChainError> {
        let data = IERC20::allowanceCall { owner, spender }.abi_encode();
        let raw = self.eth_call(network, token, data).await?;
        U256::abi_decode(&raw).map_err(|e| ChainError::decode("allowance", e))
    }

    async fn decimals(&self, network: Network, token: Address) -> Result<u8, ChainError> {
        let data = IERC20::decimalsCall {}.abi_encode();
        let raw = self.eth_call(network, token, data).await?;
        let word = U256::abi_decode(&raw).map_err(|e| ChainError::decode("decimals", e))?;
        u8::try_from(word).map_err(|e| ChainError::decode("decimals", e))
    }

    async fn amounts_out(
        &self,
        network: Network,
        amount_in: U256,
        path: &[Address],
    ) -> Result<Vec<U256>, ChainError> {
        let data = IUniswapV2Router02::getAmountsOutCall {
            amountIn: amount_in,
            path: path.to_vec(),
        }
        .abi_encode();
        let raw = self.eth_call(network, network.router(), data).await?;
        Vec::<U256>::abi_decode(&raw).map_err(|e| ChainError::decode("getAmountsOut", e))
    }

    async fn gas_price(&self, network: Network) -> Result<U256, ChainError> {
        let result = self.request(network, "eth_gasPrice", json!([])).await?;
        decode_quantity(&result)
    }

    async fn estimate_gas(&self, network: Network, call: &CallRequest) -> Result<u64, ChainError> {
        let result = self
            .request(network, "eth_estimateGas", json!([call_object(call)]))
            .await?;
        let gas = decode_quantity(&result)?;
        u64::try_from(gas).map_err(|e| ChainError::decode("gas estimate", e))
    }
}
