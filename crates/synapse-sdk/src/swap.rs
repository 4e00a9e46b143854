//! Same-chain swap and liquidity operations against the configured pools.
//!
//! Amounts are native units of the relevant token on the pool's chain, both
//! in and out. View calls go through the chain's [`BatchingProvider`], so
//! independent lookups issued together share a batch.
//!
//! [`BatchingProvider`]: crate::provider::BatchingProvider

use std::sync::Arc;

use num_bigint::BigUint;
use time::OffsetDateTime;
use tracing::debug;

use crate::catalog::SdkConfig;
use crate::connector::RpcConnector;
use crate::contracts::{Erc20Contract, PendingCall, SwapPoolContract};
use crate::error::{ConfigError, Error, UnsupportedSwapError};
use crate::token::{swap_group, Token};
use crate::types::chain::{chain_id, chain_name};
use crate::types::pool::SwapPool;
use crate::types::transaction::UnsignedTransaction;

/// Added to the current time when the caller gives no deadline.
pub const DEFAULT_DEADLINE: time::Duration = time::Duration::minutes(10);

/// A pool contract plus the indices of both sides of a swap within it.
#[derive(Debug, Clone)]
pub struct SwapSetup {
    pub pool: Arc<SwapPool>,
    pub contract: SwapPoolContract,
    pub token_index_from: u8,
    pub token_index_to: u8,
}

impl SwapSetup {
    /// A reused setup must come from a pool on the same chain that holds
    /// both tokens.
    fn check(&self, chain_id: u64, from: &Token, to: &Token) -> Result<(), ConfigError> {
        if self.pool.chain_id != chain_id {
            return Err(ConfigError::SetupMismatch {
                pool: self.pool.name.clone(),
                reason: format!("pool is on chain {}, not {chain_id}", self.pool.chain_id),
            });
        }
        for token in [from, to] {
            if !self.pool.contains(token) {
                return Err(ConfigError::SetupMismatch {
                    pool: self.pool.name.clone(),
                    reason: format!("{} is not in the pool", token.symbol()),
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SwapParams {
    pub chain_id: u64,
    pub token_from: Arc<Token>,
    pub token_to: Arc<Token>,
    pub amount_in: BigUint,
    /// Reuse an earlier [`TokenSwap::swap_setup`] instead of looking the
    /// indices up again.
    pub swap_setup: Option<SwapSetup>,
}

impl SwapParams {
    pub fn new(chain_id: u64, token_from: Arc<Token>, token_to: Arc<Token>, amount_in: BigUint) -> Self {
        Self {
            chain_id,
            token_from,
            token_to,
            amount_in,
            swap_setup: None,
        }
    }

    pub fn with_setup(mut self, setup: SwapSetup) -> Self {
        self.swap_setup = Some(setup);
        self
    }
}

#[derive(Debug, Clone)]
pub struct SwapTokensParams {
    pub swap: SwapParams,
    /// Already slippage-adjusted by the caller.
    pub min_amount_out: BigUint,
    /// Unix seconds. Defaults to now plus [`DEFAULT_DEADLINE`].
    pub deadline: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstimatedSwapRate {
    pub amount_out: BigUint,
}

pub(crate) fn resolve_deadline(deadline: Option<u64>) -> u64 {
    deadline.unwrap_or_else(|| deadline_after(DEFAULT_DEADLINE))
}

/// Unix seconds `from_now` in the future.
pub(crate) fn deadline_after(from_now: time::Duration) -> u64 {
    let at = OffsetDateTime::now_utc() + from_now;
    u64::try_from(at.unix_timestamp()).unwrap_or_default()
}

/// Swap quoting and transaction building for every configured pool.
#[derive(Debug, Clone)]
pub struct TokenSwap {
    config: Arc<SdkConfig>,
    connector: Arc<RpcConnector>,
}

impl TokenSwap {
    pub fn new(config: Arc<SdkConfig>, connector: Arc<RpcConnector>) -> Self {
        Self { config, connector }
    }

    pub fn config(&self) -> &Arc<SdkConfig> {
        &self.config
    }

    pub fn connector(&self) -> &Arc<RpcConnector> {
        &self.connector
    }

    /// Whether `from` can be swapped for `to` on `chain_id`.
    pub fn swap_supported(&self, chain_id: u64, from: &Token, to: &Token) -> Result<(), UnsupportedSwapError> {
        let network = chain_name(chain_id);
        for token in [from, to] {
            if !self.config.supports_token(chain_id, token) {
                return Err(UnsupportedSwapError::token_not_supported(token.symbol(), &network));
            }
        }
        check_groups(from, to)
    }

    /// Whether `from` on `chain_id_from` can be bridged into `to` on
    /// `chain_id_to`.
    pub fn bridge_swap_supported(
        &self,
        from: &Token,
        to: &Token,
        chain_id_from: u64,
        chain_id_to: u64,
    ) -> Result<(), UnsupportedSwapError> {
        if !self.config.supports_token(chain_id_from, from) {
            return Err(UnsupportedSwapError::token_not_supported_net_from(
                from.symbol(),
                &chain_name(chain_id_from),
            ));
        }
        if !self.config.supports_token(chain_id_to, to) {
            return Err(UnsupportedSwapError::token_not_supported_net_to(
                to.symbol(),
                &chain_name(chain_id_to),
            ));
        }
        check_groups(from, to)?;
        let eth_on_boba = |chain_id: u64, token: &Token| {
            chain_id == chain_id::BOBA && token.swap_group().as_str() == swap_group::ETH
        };
        if eth_on_boba(chain_id_from, from) || eth_on_boba(chain_id_to, to) {
            return Err(UnsupportedSwapError::eth_on_boba());
        }
        Ok(())
    }

    /// The pool that routes `from` into `to` on `chain_id`.
    ///
    /// Local only; fails with an [`UnsupportedSwapError`] when the pair is
    /// not tradable.
    pub fn pool_for_swap(&self, chain_id: u64, from: &Token, to: &Token) -> Result<Arc<SwapPool>, Error> {
        self.swap_supported(chain_id, from, to)?;
        self.config
            .pool_for_pair(chain_id, from, to)
            .ok_or_else(|| UnsupportedSwapError::no_pool_for_pair(from.symbol(), to.symbol(), &chain_name(chain_id)).into())
    }

    pub fn pool_contract(&self, pool: &SwapPool) -> Result<SwapPoolContract, ConfigError> {
        let provider = self.connector.provider(pool.chain_id)?;
        Ok(SwapPoolContract::new(provider, pool.address))
    }

    /// Resolve the pool holding both tokens on `chain_id` and ask it for the
    /// index of each. Both lookups are queued before either is awaited.
    pub async fn swap_setup(&self, chain_id: u64, from: &Token, to: &Token) -> Result<SwapSetup, Error> {
        let pool = self.pool_for_swap(chain_id, from, to)?;
        self.setup_in(pool, chain_id, from, to).await
    }

    async fn setup_in(&self, pool: Arc<SwapPool>, chain_id: u64, from: &Token, to: &Token) -> Result<SwapSetup, Error> {
        let contract = self.pool_contract(&pool)?;
        let index_from = contract.get_token_index(from.require_address(chain_id)?)?;
        let index_to = contract.get_token_index(to.require_address(chain_id)?)?;
        let (token_index_from, token_index_to) = tokio::try_join!(index_from, index_to)?;

        Ok(SwapSetup {
            pool,
            contract,
            token_index_from,
            token_index_to,
        })
    }

    async fn setup_for(&self, params: &SwapParams) -> Result<SwapSetup, Error> {
        let pool = self.pool_for_swap(params.chain_id, &params.token_from, &params.token_to)?;
        match &params.swap_setup {
            Some(setup) => {
                setup.check(params.chain_id, &params.token_from, &params.token_to)?;
                Ok(setup.clone())
            }
            None => {
                self.setup_in(pool, params.chain_id, &params.token_from, &params.token_to)
                    .await
            }
        }
    }

    /// Estimate the output of swapping `amount_in` through the pool.
    ///
    /// Rejects unsupported pairs before any request is queued.
    pub async fn calculate_swap_rate(&self, params: &SwapParams) -> Result<EstimatedSwapRate, Error> {
        let setup = self.setup_for(params).await?;
        debug!(
            chain_id = params.chain_id,
            from = params.token_from.symbol(),
            to = params.token_to.symbol(),
            pool = %setup.pool.name,
            "estimating swap"
        );
        let amount_out = setup
            .contract
            .calculate_swap(setup.token_index_from, setup.token_index_to, &params.amount_in)?
            .await?;
        Ok(EstimatedSwapRate { amount_out })
    }

    /// Build the pool `swap` call. `min_amount_out` is used as given.
    pub async fn build_swap_tokens_transaction(&self, params: &SwapTokensParams) -> Result<UnsignedTransaction, Error> {
        let setup = self.setup_for(&params.swap).await?;
        setup.contract.swap_transaction(
            setup.token_index_from,
            setup.token_index_to,
            &params.swap.amount_in,
            &params.min_amount_out,
            resolve_deadline(params.deadline),
        )
    }

    /// LP tokens minted for depositing `amounts`, laid out in pool order.
    pub async fn calculate_add_liquidity(&self, pool: &SwapPool, amounts: &[BigUint]) -> Result<BigUint, Error> {
        pool.check_amounts_len(amounts)?;
        let contract = self.pool_contract(pool)?;
        contract.calculate_token_amount(amounts, true)?.await
    }

    /// Per-token amounts returned for burning `amount` LP tokens.
    ///
    /// The LP supply is fetched in the same batch; asking for more than is
    /// outstanding fails with [`Error::InsufficientLiquidity`].
    pub async fn calculate_remove_liquidity(&self, pool: &SwapPool, amount: &BigUint) -> Result<Vec<BigUint>, Error> {
        let supply = self.lp_contract(pool)?.total_supply()?;
        let amounts = self.pool_contract(pool)?.calculate_remove_liquidity(amount)?;
        let (supply, amounts) = tokio::join!(supply, amounts);
        ensure_supply(amount, supply?)?;
        amounts
    }

    /// Amount of `token` returned for burning `amount` LP tokens.
    pub async fn calculate_remove_liquidity_one_token(
        &self,
        pool: &SwapPool,
        amount: &BigUint,
        token: &Token,
    ) -> Result<BigUint, Error> {
        let contract = self.pool_contract(pool)?;
        let index = self.token_index(pool, &contract, token)?;
        let supply = self.lp_contract(pool)?.total_supply()?;
        let (supply, index) = tokio::join!(supply, index);
        ensure_supply(amount, supply?)?;
        contract.calculate_remove_liquidity_one_token(amount, index?)?.await
    }

    pub fn build_add_liquidity_transaction(
        &self,
        pool: &SwapPool,
        amounts: &[BigUint],
        min_to_mint: &BigUint,
        deadline: Option<u64>,
    ) -> Result<UnsignedTransaction, Error> {
        pool.check_amounts_len(amounts)?;
        self.pool_contract(pool)?
            .add_liquidity_transaction(amounts, min_to_mint, resolve_deadline(deadline))
    }

    pub fn build_remove_liquidity_transaction(
        &self,
        pool: &SwapPool,
        amount: &BigUint,
        min_amounts: &[BigUint],
        deadline: Option<u64>,
    ) -> Result<UnsignedTransaction, Error> {
        pool.check_amounts_len(min_amounts)?;
        self.pool_contract(pool)?
            .remove_liquidity_transaction(amount, min_amounts, resolve_deadline(deadline))
    }

    pub async fn build_remove_liquidity_one_token_transaction(
        &self,
        pool: &SwapPool,
        amount: &BigUint,
        token: &Token,
        min_amount: &BigUint,
        deadline: Option<u64>,
    ) -> Result<UnsignedTransaction, Error> {
        let contract = self.pool_contract(pool)?;
        let index = self.token_index(pool, &contract, token)?.await?;
        contract.remove_liquidity_one_token_transaction(amount, index, min_amount, resolve_deadline(deadline))
    }

    fn token_index(
        &self,
        pool: &SwapPool,
        contract: &SwapPoolContract,
        token: &Token,
    ) -> Result<PendingCall<u8>, Error> {
        if !pool.contains(token) {
            return Err(ConfigError::TokenNotInPool {
                symbol: token.symbol().to_string(),
                pool: pool.name.clone(),
            }
            .into());
        }
        contract.get_token_index(token.require_address(pool.chain_id)?)
    }

    fn lp_contract(&self, pool: &SwapPool) -> Result<Erc20Contract, ConfigError> {
        let provider = self.connector.provider(pool.chain_id)?;
        Ok(Erc20Contract::new(provider, pool.lp_token.require_address(pool.chain_id)?))
    }
}

fn check_groups(from: &Token, to: &Token) -> Result<(), UnsupportedSwapError> {
    if from.can_swap(to) {
        Ok(())
    } else {
        Err(UnsupportedSwapError::non_matching_swap_groups(
            from.swap_group().as_str(),
            to.swap_group().as_str(),
        ))
    }
}

fn ensure_supply(requested: &BigUint, supply: BigUint) -> Result<(), Error> {
    if requested > &supply {
        return Err(Error::InsufficientLiquidity {
            requested: requested.clone(),
            supply,
        });
    }
    Ok(())
}
