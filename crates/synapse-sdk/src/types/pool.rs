use std::sync::Arc;

use num_bigint::BigUint;

use crate::error::ConfigError;
use crate::token::{SwapGroup, Token};

use super::address::Address;

/// A stableswap-style pool deployed on a single chain.
///
/// `pool_tokens` is kept in the pool's own index order; the contract is still
/// asked for indices at swap time, the static order is only used to lay out
/// liquidity amount arrays.
#[derive(Debug, Clone)]
pub struct SwapPool {
    pub name: String,
    pub chain_id: u64,
    pub swap_group: SwapGroup,
    pub address: Address,
    pub lp_token: Arc<Token>,
    pub pool_tokens: Vec<Arc<Token>>,
}

impl SwapPool {
    pub fn new(
        name: impl Into<String>,
        chain_id: u64,
        swap_group: impl Into<SwapGroup>,
        address: &str,
        lp_token: Arc<Token>,
        pool_tokens: Vec<Arc<Token>>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            name: name.into(),
            chain_id,
            swap_group: swap_group.into(),
            address: address.parse()?,
            lp_token,
            pool_tokens,
        })
    }

    pub fn contains(&self, token: &Token) -> bool {
        self.pool_tokens.iter().any(|t| t.is_equal(token))
    }

    /// Position of `token` within `pool_tokens`.
    pub fn position(&self, token: &Token) -> Option<usize> {
        self.pool_tokens.iter().position(|t| t.is_equal(token))
    }

    pub fn is_lp_token(&self, token: &Token) -> bool {
        self.lp_token.is_equal(token)
    }

    /// Spread per-token amounts into the pool's positional layout; tokens
    /// not mentioned get zero.
    pub fn layout_amounts(&self, amounts: &[(Arc<Token>, BigUint)]) -> Result<Vec<BigUint>, ConfigError> {
        let mut out = vec![BigUint::default(); self.pool_tokens.len()];
        for (token, amount) in amounts {
            let index = self.position(token).ok_or_else(|| ConfigError::TokenNotInPool {
                symbol: token.symbol().to_string(),
                pool: self.name.clone(),
            })?;
            out[index] += amount;
        }
        Ok(out)
    }

    pub(crate) fn check_amounts_len(&self, amounts: &[BigUint]) -> Result<(), ConfigError> {
        if amounts.len() != self.pool_tokens.len() {
            return Err(ConfigError::AmountsLength {
                pool: self.name.clone(),
                expected: self.pool_tokens.len(),
                actual: amounts.len(),
            });
        }
        Ok(())
    }
}
