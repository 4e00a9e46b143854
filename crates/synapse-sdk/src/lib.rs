pub mod abi;
pub mod amount;
pub mod bridge;
pub mod catalog;
pub mod connector;
pub mod contracts;
pub mod error;
pub mod fees;
pub mod jsonrpc;
pub mod provider;
pub mod quote;
pub mod slippage;
pub mod swap;
pub mod token;
pub mod types;

#[cfg(test)]
mod testing;

use std::sync::Arc;

// Re-exports for convenience
pub use bridge::{Bridge, BridgeTransactionParams};
pub use catalog::{IntermediateRule, SdkConfig, SdkConfigBuilder};
pub use connector::{RpcConnector, RpcEndpoints};
pub use error::{ConfigError, Error, UnsupportedSwapError, UnsupportedSwapKind};
pub use fees::{BridgeFee, BridgeFeeParams, FeeResolver, IntermediateTokens};
pub use provider::{BatchTransport, BatchingProvider, PendingRequest};
pub use quote::{BridgeQuoteParams, BridgeQuoter, Quote};
pub use slippage::{apply_tolerance, format_tolerance_label, Direction, Slippage};
pub use swap::{EstimatedSwapRate, SwapParams, SwapSetup, SwapTokensParams, TokenSwap};
pub use token::{SwapGroup, Token};
pub use types::address::Address;
pub use types::pool::SwapPool;
pub use types::transaction::UnsignedTransaction;

/// One configuration, one connector, and the components built on them.
#[derive(Debug, Clone)]
pub struct Synapse {
    config: Arc<SdkConfig>,
    connector: Arc<RpcConnector>,
    quoter: BridgeQuoter,
    bridge: Bridge,
}

impl Synapse {
    /// Providers come from the configuration's RPC endpoints.
    pub fn new(config: SdkConfig) -> Result<Self, ConfigError> {
        let connector = RpcConnector::new(config.rpc_endpoints().clone());
        Self::with_connector(Arc::new(config), Arc::new(connector))
    }

    pub fn with_connector(config: Arc<SdkConfig>, connector: Arc<RpcConnector>) -> Result<Self, ConfigError> {
        let quoter = BridgeQuoter::new(config.clone(), connector.clone())?;
        let bridge = Bridge::new(config.clone(), connector.clone());
        Ok(Self {
            config,
            connector,
            quoter,
            bridge,
        })
    }

    /// The mainnet catalog with endpoint overrides read from the environment.
    pub fn mainnet_from_env() -> Result<Self, ConfigError> {
        let config = SdkConfig::mainnet()?;
        let endpoints = config.rpc_endpoints().clone().with_env_overrides();
        Self::with_connector(Arc::new(config), Arc::new(RpcConnector::new(endpoints)))
    }

    pub fn config(&self) -> &Arc<SdkConfig> {
        &self.config
    }

    pub fn connector(&self) -> &Arc<RpcConnector> {
        &self.connector
    }

    pub fn token_swap(&self) -> &TokenSwap {
        self.quoter.token_swap()
    }

    pub fn fee_resolver(&self) -> &FeeResolver {
        self.quoter.fee_resolver()
    }

    pub fn quoter(&self) -> &BridgeQuoter {
        &self.quoter
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }
}
