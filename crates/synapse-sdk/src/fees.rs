use std::sync::Arc;

use num_bigint::BigUint;
use tracing::debug;

use crate::amount::to_fixed_point;
use crate::catalog::SdkConfig;
use crate::connector::RpcConnector;
use crate::contracts::{BridgeConfigContract, PendingCall};
use crate::error::{ConfigError, Error};
use crate::token::Token;

/// Bridge assets for a source token headed to a destination chain.
#[derive(Debug, Clone)]
pub struct IntermediateTokens {
    /// What crosses the bridge. `None` when the source token is only a
    /// destination-side asset.
    pub intermediate: Option<Arc<Token>>,
    /// What the fee registry is keyed by.
    pub bridge_config: Arc<Token>,
}

impl IntermediateTokens {
    /// The intermediate, falling back to the fee registry token.
    pub fn effective(&self) -> &Arc<Token> {
        self.intermediate.as_ref().unwrap_or(&self.bridge_config)
    }
}

/// Pure lookup in the configured intermediate-token rules.
pub fn resolve_intermediate_token(
    config: &SdkConfig,
    destination_chain_id: u64,
    token: &Arc<Token>,
) -> Result<IntermediateTokens, ConfigError> {
    if config.is_mint_burn(token.swap_group()) {
        return Ok(IntermediateTokens {
            intermediate: Some(token.clone()),
            bridge_config: token.clone(),
        });
    }

    let rule = config
        .intermediate_rule(token.swap_group())
        .ok_or_else(|| ConfigError::NoIntermediateToken {
            symbol: token.symbol().to_string(),
            chain_id: destination_chain_id,
        })?;

    Ok(IntermediateTokens {
        intermediate: rule.intermediate.clone(),
        bridge_config: rule.bridge_config_for(destination_chain_id).clone(),
    })
}

#[derive(Debug, Clone)]
pub struct BridgeFeeParams {
    pub chain_id_from: u64,
    pub token_from: Arc<Token>,
    pub chain_id_to: u64,
    /// Native units of `token_from` on `chain_id_from`.
    pub amount_from: BigUint,
}

/// The normalized amount is known immediately; the fee arrives with the
/// next batch.
#[derive(Debug)]
pub struct BridgeFee {
    pub normalized_amount: BigUint,
    pub fee: PendingCall<BigUint>,
}

#[derive(Debug, Clone)]
pub struct FeeResolver {
    config: Arc<SdkConfig>,
    registry: BridgeConfigContract,
}

impl FeeResolver {
    pub fn new(config: Arc<SdkConfig>, connector: &RpcConnector) -> Result<Self, ConfigError> {
        let location = config.fee_registry().ok_or(ConfigError::NoFeeRegistry)?;
        let provider = connector.provider(location.chain_id)?;
        Ok(Self {
            registry: BridgeConfigContract::new(provider, location.address),
            config,
        })
    }

    pub fn config(&self) -> &Arc<SdkConfig> {
        &self.config
    }

    pub fn resolve_intermediate_token(
        &self,
        destination_chain_id: u64,
        token: &Arc<Token>,
    ) -> Result<IntermediateTokens, ConfigError> {
        resolve_intermediate_token(&self.config, destination_chain_id, token)
    }

    /// Normalize `amount_from` to 18 decimals and queue the fee lookup.
    ///
    /// Every configuration problem is reported before anything is queued.
    pub fn calculate_bridge_fee(&self, params: &BridgeFeeParams) -> Result<BridgeFee, Error> {
        let BridgeFeeParams {
            chain_id_from,
            token_from,
            chain_id_to,
            amount_from,
        } = params;

        let tokens = self.resolve_intermediate_token(*chain_id_to, token_from)?;
        let fee_key = tokens
            .bridge_config
            .address(*chain_id_to)
            .ok_or_else(|| ConfigError::NoIntermediateToken {
                symbol: token_from.symbol().to_string(),
                chain_id: *chain_id_to,
            })?
            .to_lower_hex();

        let decimals = token_from.require_decimals(*chain_id_from)?;
        let normalized_amount = to_fixed_point(amount_from, decimals, token_from.symbol())?;

        debug!(
            token = token_from.symbol(),
            chain_id_from,
            chain_id_to,
            fee_token = tokens.bridge_config.symbol(),
            "requesting bridge fee"
        );

        let fee = self
            .registry
            .calculate_swap_fee(&fee_key, *chain_id_to, &normalized_amount)?;

        Ok(BridgeFee {
            normalized_amount,
            fee,
        })
    }
}
