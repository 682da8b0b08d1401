//! Scripted collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use alloy_primitives::{address, Address, U256};
use async_trait::async_trait;
use rust_decimal::Decimal;
use web3_agent::chain::{
    CallRequest, ChainContext, ChainError, ChainReader, Network, StaticTokenRegistry, TokenDef,
    TokenRegistry,
};
use web3_agent::compiler::PlaceholderCompiler;
use web3_agent::explorer::SourceVerifier;
use web3_agent::policy::{PolicyCheck, PolicyDecision, PolicyGate};
use web3_agent::portfolio::ChainPortfolioGuardian;
use web3_agent::quote::PriceOracle;
use web3_agent::{AgentServices, ExecutionRequest, PlanExecutor};
use web3_agent_types::ChatTurn;
use web3_agentic::{AuditReport, ContractAssistant, GeneratedContract, LlmError};

pub const USER: Address = address!("1111111111111111111111111111111111111111");
pub const NETWORK: Network = Network::BscTestnet;

pub fn wei(units: u64) -> U256 {
    U256::from(units) * U256::from(1_000_000_000_000_000_000u64)
}

// ============================================================================
// Chain
// ============================================================================

/// In-memory chain. Unknown balances and allowances read as zero; the first
/// `failures` calls of any kind time out.
#[derive(Default)]
pub struct MockChain {
    native: Mutex<HashMap<Address, U256>>,
    tokens: Mutex<HashMap<(Address, Address), U256>>,
    allowances: Mutex<HashMap<(Address, Address), U256>>,
    decimals: Mutex<HashMap<Address, u8>>,
    failures: AtomicU32,
    pub calls: AtomicU32,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_native(self, owner: Address, amount: U256) -> Self {
        self.native.lock().unwrap().insert(owner, amount);
        self
    }

    pub fn with_token(self, token: Address, owner: Address, amount: U256) -> Self {
        self.tokens.lock().unwrap().insert((token, owner), amount);
        self
    }

    pub fn with_allowance(self, token: Address, owner: Address, amount: U256) -> Self {
        self.allowances.lock().unwrap().insert((token, owner), amount);
        self
    }

    pub fn with_decimals(self, token: Address, decimals: u8) -> Self {
        self.decimals.lock().unwrap().insert(token, decimals);
        self
    }

    pub fn failing(self, times: u32) -> Self {
        self.failures.store(times, Ordering::SeqCst);
        self
    }

    pub fn set_allowance(&self, token: Address, owner: Address, amount: U256) {
        self.allowances.lock().unwrap().insert((token, owner), amount);
    }

    fn trip(&self) -> Result<(), ChainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ChainError::Timeout {
                endpoint: "mock-rpc".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ChainReader for MockChain {
    async fn native_balance(&self, _: Network, owner: Address) -> Result<U256, ChainError> {
        self.trip()?;
        Ok(self.native.lock().unwrap().get(&owner).copied().unwrap_or_default())
    }

    async fn token_balance(
        &self,
        _: Network,
        token: Address,
        owner: Address,
    ) -> Result<U256, ChainError> {
        self.trip()?;
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .get(&(token, owner))
            .copied()
            .unwrap_or_default())
    }

    async fn allowance(
        &self,
        _: Network,
        token: Address,
        owner: Address,
        _spender: Address,
    ) -> Result<U256, ChainError> {
        self.trip()?;
        Ok(self
            .allowances
            .lock()
            .unwrap()
            .get(&(token, owner))
            .copied()
            .unwrap_or_default())
    }

    async fn decimals(&self, _: Network, token: Address) -> Result<u8, ChainError> {
        self.trip()?;
        Ok(self.decimals.lock().unwrap().get(&token).copied().unwrap_or(18))
    }

    /// 1 in → 300 out
    async fn amounts_out(
        &self,
        _: Network,
        amount_in: U256,
        _path: &[Address],
    ) -> Result<Vec<U256>, ChainError> {
        self.trip()?;
        Ok(vec![amount_in, amount_in * U256::from(300u64)])
    }

    async fn gas_price(&self, _: Network) -> Result<U256, ChainError> {
        self.trip()?;
        Ok(U256::from(3_000_000_000u64))
    }

    async fn estimate_gas(&self, _: Network, _: &CallRequest) -> Result<u64, ChainError> {
        self.trip()?;
        Ok(150_000)
    }
}

/// Registry answering from a fixed list.
pub struct MockRegistry(pub Vec<TokenDef>);

impl TokenRegistry for MockRegistry {
    fn by_symbol(&self, symbol: &str, _: Network) -> Vec<TokenDef> {
        self.0
            .iter()
            .filter(|t| t.symbol.eq_ignore_ascii_case(symbol))
            .cloned()
            .collect()
    }
}

pub fn token(symbol: &str, address: Address, decimals: u8) -> TokenDef {
    TokenDef {
        symbol: symbol.to_string(),
        name: format!("{symbol} token"),
        address,
        decimals,
    }
}

// ============================================================================
// Other collaborators
// ============================================================================

pub struct MockAssistant {
    score: u32,
    pub audited: Mutex<Vec<String>>,
}

impl MockAssistant {
    pub fn scoring(score: u32) -> Self {
        Self {
            score,
            audited: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ContractAssistant for MockAssistant {
    async fn generate_contract(&self, description: &str) -> Result<GeneratedContract, LlmError> {
        Ok(GeneratedContract {
            source_code: format!("// {description}\ncontract Doge {{}}"),
            name: "GeneratedContract".into(),
            compiler_version: "0.8.20".into(),
        })
    }

    async fn audit_contract(&self, source: &str) -> Result<AuditReport, LlmError> {
        self.audited.lock().unwrap().push(source.to_string());
        Ok(AuditReport {
            score: self.score,
            summary: format!("Score: {}/100", self.score),
            vulnerabilities: Vec::new(),
        })
    }

    async fn chat(&self, prompt: &str, history: &[ChatTurn]) -> Result<String, LlmError> {
        Ok(format!("[{} turns] {prompt}", history.len()))
    }
}

pub struct FixedPrice(pub Decimal);

#[async_trait]
impl PriceOracle for FixedPrice {
    async fn native_usd(&self, _: Network) -> Result<Decimal, ChainError> {
        Ok(self.0)
    }
}

/// Remembers every check; denies everything when built with `deny_all`.
pub struct RecordingPolicy {
    deny: Option<String>,
    pub checks: Mutex<Vec<PolicyCheck>>,
}

impl RecordingPolicy {
    pub fn allow_all() -> Self {
        Self {
            deny: None,
            checks: Mutex::new(Vec::new()),
        }
    }

    pub fn deny_all(reason: &str) -> Self {
        Self {
            deny: Some(reason.to_string()),
            checks: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PolicyGate for RecordingPolicy {
    async fn check(&self, check: &PolicyCheck) -> PolicyDecision {
        self.checks.lock().unwrap().push(*check);
        match &self.deny {
            Some(reason) => PolicyDecision::deny(reason.clone()),
            None => PolicyDecision::allow(),
        }
    }
}

/// Explorer with scripted verified sources. Anything else is unverified;
/// addresses marked `unreachable` fail the lookup.
#[derive(Default)]
pub struct MockExplorer {
    sources: Mutex<HashMap<Address, String>>,
    unreachable: Mutex<Vec<Address>>,
}

impl MockExplorer {
    pub fn verify(&self, address: Address, source: &str) {
        self.sources.lock().unwrap().insert(address, source.to_string());
    }

    pub fn make_unreachable(&self, address: Address) {
        self.unreachable.lock().unwrap().push(address);
    }
}

#[async_trait]
impl SourceVerifier for MockExplorer {
    async fn verified_source(&self, address: Address, _: Network) -> Result<Option<String>, ChainError> {
        if self.unreachable.lock().unwrap().contains(&address) {
            return Err(ChainError::Http {
                endpoint: "mock-explorer".into(),
                status: 503,
            });
        }
        Ok(self.sources.lock().unwrap().get(&address).cloned())
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub chain: Arc<MockChain>,
    pub assistant: Arc<MockAssistant>,
    pub policy: Arc<RecordingPolicy>,
    pub explorer: Arc<MockExplorer>,
    pub executor: PlanExecutor,
}

impl Harness {
    pub fn new(chain: MockChain) -> Self {
        Self::build(
            chain,
            Arc::new(StaticTokenRegistry),
            MockAssistant::scoring(85),
            RecordingPolicy::allow_all(),
        )
    }

    pub fn build(
        chain: MockChain,
        registry: Arc<dyn TokenRegistry>,
        assistant: MockAssistant,
        policy: RecordingPolicy,
    ) -> Self {
        let chain = Arc::new(chain);
        let assistant = Arc::new(assistant);
        let policy = Arc::new(policy);
        let prices: Arc<dyn PriceOracle> = Arc::new(FixedPrice(Decimal::from(600)));
        let explorer = Arc::new(MockExplorer::default());

        let services = AgentServices {
            assistant: assistant.clone(),
            chain: chain.clone(),
            registry,
            prices: prices.clone(),
            policy: policy.clone(),
            explorer: explorer.clone(),
            compiler: Arc::new(PlaceholderCompiler),
            portfolio: Arc::new(ChainPortfolioGuardian::new(chain.clone(), prices)),
        };

        Self {
            chain,
            assistant,
            policy,
            explorer,
            executor: PlanExecutor::new(Arc::new(services)),
        }
    }

    pub fn request(&self, message: &str) -> ExecutionRequest {
        ExecutionRequest {
            message: message.to_string(),
            chain: ChainContext::new(NETWORK, Some(USER)),
            history: Vec::new(),
        }
    }
}
