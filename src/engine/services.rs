use std::sync::Arc;

use thiserror::Error;
use web3_agentic::{
    ChainGptAssistant, ChainGptClient, ContractAssistant, DisabledClient, HeuristicPlanner,
    LlmClient, LlmError, LlmPlanner, Planner,
};

use crate::chain::{ChainError, ChainReader, JsonRpcChainReader, Network, StaticTokenRegistry, TokenRegistry};
use crate::compiler::{ContractCompiler, PlaceholderCompiler};
use crate::config::AgentConfig;
use crate::explorer::{BscScanVerifier, SourceVerifier};
use crate::policy::{PolicyGate, SpendPolicy};
use crate::portfolio::{ChainPortfolioGuardian, PortfolioAnalyzer};
use crate::quote::{CoinGeckoOracle, PriceOracle, QuoteEstimator};
use crate::resolver::TokenResolver;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("chain client: {0}")]
    Chain(#[from] ChainError),
    #[error("LLM client: {0}")]
    Llm(#[from] LlmError),
}

/// Every collaborator a step handler may call, behind trait objects so
/// tests can swap in scripted implementations.
#[derive(Clone)]
pub struct AgentServices {
    pub assistant: Arc<dyn ContractAssistant>,
    pub chain: Arc<dyn ChainReader>,
    pub registry: Arc<dyn TokenRegistry>,
    pub prices: Arc<dyn PriceOracle>,
    pub policy: Arc<dyn PolicyGate>,
    pub explorer: Arc<dyn SourceVerifier>,
    pub compiler: Arc<dyn ContractCompiler>,
    pub portfolio: Arc<dyn PortfolioAnalyzer>,
}

impl AgentServices {
    pub fn resolver(&self) -> TokenResolver {
        TokenResolver::new(self.registry.clone(), self.chain.clone())
    }

    pub fn estimator(&self) -> QuoteEstimator {
        QuoteEstimator::new(self.chain.clone(), self.prices.clone())
    }

    /// Production wiring. The planner is LLM-backed only when a ChainGPT
    /// key is configured.
    pub fn from_config(config: &AgentConfig) -> Result<(Self, Arc<dyn Planner>), BootstrapError> {
        let chain: Arc<dyn ChainReader> = Arc::new(
            JsonRpcChainReader::new(config.http_timeout)?
                .with_endpoint(Network::BscMainnet, config.mainnet_rpc_url.as_str())
                .with_endpoint(Network::BscTestnet, config.testnet_rpc_url.as_str()),
        );
        let prices: Arc<dyn PriceOracle> = Arc::new(CoinGeckoOracle::new(config.http_timeout)?);

        let (llm, planner): (Arc<dyn LlmClient>, Arc<dyn Planner>) =
            match &config.chaingpt_api_key {
                Some(key) => {
                    let client: Arc<dyn LlmClient> = Arc::new(ChainGptClient::new(
                        key.clone(),
                        config.chaingpt_base_url.clone(),
                        config.http_timeout,
                    )?);
                    (client.clone(), Arc::new(LlmPlanner::with_client(client)))
                }
                None => {
                    tracing::warn!("CHAINGPT_API_KEY not set; heuristic planner, assistant disabled");
                    (
                        Arc::new(DisabledClient::new("CHAINGPT_API_KEY")),
                        Arc::new(HeuristicPlanner),
                    )
                }
            };

        let services = Self {
            assistant: Arc::new(ChainGptAssistant::with_client(llm)),
            chain: chain.clone(),
            registry: Arc::new(StaticTokenRegistry),
            prices: prices.clone(),
            policy: Arc::new(SpendPolicy::from_config(&config.policy)),
            explorer: Arc::new(BscScanVerifier::new(
                config.bscscan_api_key.clone(),
                config.http_timeout,
            )?),
            compiler: Arc::new(PlaceholderCompiler),
            portfolio: Arc::new(ChainPortfolioGuardian::new(chain, prices)),
        };
        Ok((services, planner))
    }
}
