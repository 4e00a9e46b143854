//! Cross-chain quotes: origin pool leg, bridge fee, destination pool leg.

use std::sync::Arc;

use num_bigint::BigUint;
use tracing::debug;

use crate::amount::from_fixed_point;
use crate::catalog::SdkConfig;
use crate::connector::RpcConnector;
use crate::error::{ConfigError, Error, UnsupportedSwapError};
use crate::fees::{resolve_intermediate_token, BridgeFeeParams, FeeResolver};
use crate::swap::{SwapParams, TokenSwap};
use crate::token::Token;
use crate::types::chain::chain_name;
use crate::types::pool::SwapPool;

/// A point-in-time estimate for bridging `amount_in` of `token_from` into
/// `token_to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quote {
    pub token_from: Arc<Token>,
    pub token_to: Arc<Token>,
    pub chain_id_from: u64,
    pub chain_id_to: u64,
    /// Native units of `token_from` on `chain_id_from`.
    pub amount_in: BigUint,
    /// Native units of `token_to` on `chain_id_to`.
    pub amount_out: BigUint,
    /// Native units of `intermediate_token` on `chain_id_to`.
    pub bridge_fee: BigUint,
    /// What arrives on the destination chain before the final pool leg.
    pub intermediate_token: Arc<Token>,
}

#[derive(Debug, Clone)]
pub struct BridgeQuoteParams {
    pub chain_id_from: u64,
    pub chain_id_to: u64,
    pub token_from: Arc<Token>,
    pub token_to: Arc<Token>,
    pub amount_in: BigUint,
}

/// How a token gets to or from the bridge asset on one chain.
#[derive(Debug, Clone)]
pub(crate) enum Route {
    /// The token is the bridge asset, or wraps or is wrapped by it.
    Direct,
    /// Pool swap between the token and the bridge asset.
    Swap(Arc<SwapPool>),
    /// The bridge asset is the pool's LP token.
    Liquidity(Arc<SwapPool>),
}

#[derive(Debug, Clone)]
pub(crate) struct Leg {
    pub(crate) chain_id: u64,
    pub(crate) token: Arc<Token>,
    pub(crate) intermediate: Arc<Token>,
    pub(crate) route: Route,
}

#[derive(Debug, Clone)]
pub struct BridgeQuoter {
    swap: TokenSwap,
    fees: FeeResolver,
}

impl BridgeQuoter {
    pub fn new(config: Arc<SdkConfig>, connector: Arc<RpcConnector>) -> Result<Self, ConfigError> {
        let fees = FeeResolver::new(config.clone(), &connector)?;
        Ok(Self {
            swap: TokenSwap::new(config, connector),
            fees,
        })
    }

    pub fn token_swap(&self) -> &TokenSwap {
        &self.swap
    }

    pub fn fee_resolver(&self) -> &FeeResolver {
        &self.fees
    }

    /// Estimate the output of a bridge transfer.
    ///
    /// Both legs are planned from configuration first, so an untradable route
    /// fails before anything is queued. The fee is subtracted in 18-decimal
    /// fixed point and clamps at zero.
    pub async fn estimate_bridge_quote(&self, params: &BridgeQuoteParams) -> Result<Quote, Error> {
        let BridgeQuoteParams {
            chain_id_from,
            chain_id_to,
            token_from,
            token_to,
            amount_in,
        } = params;

        self.swap
            .bridge_swap_supported(token_from, token_to, *chain_id_from, *chain_id_to)?;
        let config = self.swap.config();
        let origin = plan_leg(config, *chain_id_from, token_from)?;
        let destination = plan_leg(config, *chain_id_to, token_to)?;
        let destination_decimals = destination.intermediate.require_decimals(*chain_id_to)?;

        let bridged = self.origin_leg(&origin, amount_in).await?;
        let fee = self.fees.calculate_bridge_fee(&BridgeFeeParams {
            chain_id_from: *chain_id_from,
            token_from: origin.intermediate.clone(),
            chain_id_to: *chain_id_to,
            amount_from: bridged,
        })?;
        let normalized = fee.normalized_amount;
        let fee = fee.fee.await?;

        let after_fee = if fee >= normalized {
            BigUint::default()
        } else {
            &normalized - &fee
        };
        let symbol = destination.intermediate.symbol();
        let received = from_fixed_point(&after_fee, destination_decimals, symbol)?;
        let bridge_fee = from_fixed_point(&fee, destination_decimals, symbol)?;

        debug!(
            chain_id_from,
            chain_id_to,
            intermediate = symbol,
            %normalized,
            %fee,
            "bridge fee applied"
        );

        let amount_out = self.destination_leg(&destination, &received).await?;

        Ok(Quote {
            token_from: token_from.clone(),
            token_to: token_to.clone(),
            chain_id_from: *chain_id_from,
            chain_id_to: *chain_id_to,
            amount_in: amount_in.clone(),
            amount_out,
            bridge_fee,
            intermediate_token: destination.intermediate,
        })
    }

    async fn origin_leg(&self, leg: &Leg, amount: &BigUint) -> Result<BigUint, Error> {
        debug!(chain_id = leg.chain_id, token = leg.token.symbol(), route = ?leg.route, "origin leg");
        match &leg.route {
            Route::Direct => Ok(amount.clone()),
            Route::Swap(_) => {
                let params = SwapParams::new(leg.chain_id, leg.token.clone(), leg.intermediate.clone(), amount.clone());
                Ok(self.swap.calculate_swap_rate(&params).await?.amount_out)
            }
            Route::Liquidity(pool) => {
                let amounts = pool.layout_amounts(&[(leg.token.clone(), amount.clone())])?;
                self.swap.calculate_add_liquidity(pool, &amounts).await
            }
        }
    }

    async fn destination_leg(&self, leg: &Leg, amount: &BigUint) -> Result<BigUint, Error> {
        debug!(chain_id = leg.chain_id, token = leg.token.symbol(), route = ?leg.route, "destination leg");
        match &leg.route {
            Route::Direct => Ok(amount.clone()),
            Route::Swap(_) => {
                let params = SwapParams::new(leg.chain_id, leg.intermediate.clone(), leg.token.clone(), amount.clone());
                Ok(self.swap.calculate_swap_rate(&params).await?.amount_out)
            }
            Route::Liquidity(pool) => {
                self.swap
                    .calculate_remove_liquidity_one_token(pool, amount, &leg.token)
                    .await
            }
        }
    }
}

/// The bridge asset for `token`'s group as deployed on `chain_id`.
///
/// Prefers the rule's intermediate and falls back to the fee registry token
/// when the intermediate has no deployment there.
fn leg_intermediate(config: &SdkConfig, chain_id: u64, token: &Arc<Token>) -> Result<Arc<Token>, ConfigError> {
    let tokens = resolve_intermediate_token(config, chain_id, token)?;
    match tokens.intermediate {
        Some(intermediate) if intermediate.is_on_chain(chain_id) => Ok(intermediate),
        _ if tokens.bridge_config.is_on_chain(chain_id) => Ok(tokens.bridge_config),
        _ => Err(ConfigError::NoIntermediateToken {
            symbol: token.symbol().to_string(),
            chain_id,
        }),
    }
}

fn bridges_as_is(token: &Token, intermediate: &Token) -> bool {
    token.is_equal(intermediate)
        || intermediate.underlying().is_some_and(|u| u.is_equal(token))
        || token.underlying().is_some_and(|u| u.is_equal(intermediate))
}

/// Decide, from configuration alone, how `token` reaches the bridge asset on
/// `chain_id`.
pub(crate) fn plan_leg(config: &SdkConfig, chain_id: u64, token: &Arc<Token>) -> Result<Leg, Error> {
    let intermediate = leg_intermediate(config, chain_id, token)?;
    let route = if bridges_as_is(token, &intermediate) {
        Route::Direct
    } else {
        let pool = config
            .pools_on_chain(chain_id)
            .find(|pool| pool.contains(token) && (pool.is_lp_token(&intermediate) || pool.contains(&intermediate)))
            .ok_or_else(|| {
                UnsupportedSwapError::no_pool_for_pair(token.symbol(), intermediate.symbol(), &chain_name(chain_id))
            })?;
        if pool.is_lp_token(&intermediate) {
            Route::Liquidity(pool.clone())
        } else {
            Route::Swap(pool.clone())
        }
    };

    Ok(Leg {
        chain_id,
        token: token.clone(),
        intermediate,
        route,
    })
}
