//! Bridge transactions built from a [`Quote`], plus the ERC-20 approval and
//! balance checks that come before them.
//!
//! Every call goes through the origin chain's bridge zap. Which zap function
//! is used follows from how each side reaches the bridge asset: a plain
//! deposit or redeem, a pool swap, or a pool deposit / withdrawal.

use std::sync::Arc;

use num_bigint::BigUint;
use tracing::debug;

use crate::amount::{format_units, from_fixed_point, to_fixed_point};
use crate::catalog::SdkConfig;
use crate::connector::RpcConnector;
use crate::contracts::{BridgeZapContract, Erc20Contract, ZapDestination, ZapOrigin, ZapRemove, ZapSwap};
use crate::error::{ConfigError, Error, UnsupportedSwapError};
use crate::quote::{plan_leg, Leg, Quote, Route};
use crate::slippage::{Direction, Slippage};
use crate::swap::{deadline_after, resolve_deadline, TokenSwap};
use crate::token::Token;
use crate::types::address::Address;
use crate::types::chain::chain_name;
use crate::types::pool::SwapPool;
use crate::types::transaction::UnsignedTransaction;

/// Added to the current time for the destination-side deadline when the
/// caller gives none.
pub const DEFAULT_BRIDGE_DEADLINE: time::Duration = time::Duration::hours(24);

/// `2^256 - 1`, the approval amount used when none is given.
pub fn max_approval() -> BigUint {
    BigUint::from_bytes_be(&[0xff; 32])
}

#[derive(Debug, Clone)]
pub struct BridgeTransactionParams {
    /// Receiver on the destination chain.
    pub address_to: Address,
    /// Taken off every expected amount to get the on-chain minimums.
    pub slippage: Slippage,
    /// Origin-side deadline, unix seconds. Defaults to now plus
    /// [`DEFAULT_DEADLINE`](crate::swap::DEFAULT_DEADLINE).
    pub deadline: Option<u64>,
    /// Destination-side deadline. Defaults to now plus
    /// [`DEFAULT_BRIDGE_DEADLINE`].
    pub bridge_deadline: Option<u64>,
}

impl BridgeTransactionParams {
    pub fn new(address_to: Address) -> Self {
        Self {
            address_to,
            slippage: Slippage::DEFAULT,
            deadline: None,
            bridge_deadline: None,
        }
    }

    pub fn with_slippage(mut self, slippage: Slippage) -> Self {
        self.slippage = slippage;
        self
    }

    pub fn with_deadlines(mut self, deadline: u64, bridge_deadline: u64) -> Self {
        self.deadline = Some(deadline);
        self.bridge_deadline = Some(bridge_deadline);
        self
    }
}

/// Builds bridge and approval transactions and checks whether a wallet can
/// bridge.
#[derive(Debug, Clone)]
pub struct Bridge {
    swap: TokenSwap,
}

impl Bridge {
    pub fn new(config: Arc<SdkConfig>, connector: Arc<RpcConnector>) -> Self {
        Self {
            swap: TokenSwap::new(config, connector),
        }
    }

    pub fn config(&self) -> &Arc<SdkConfig> {
        self.swap.config()
    }

    /// Turn `quote` into the origin chain's zap call.
    ///
    /// Local only. Pool indices come from the configured pool order, and the
    /// minimums are the quoted amounts less `params.slippage`.
    pub fn build_bridge_transaction(
        &self,
        quote: &Quote,
        params: &BridgeTransactionParams,
    ) -> Result<UnsignedTransaction, Error> {
        let Quote {
            token_from,
            token_to,
            chain_id_from,
            chain_id_to,
            amount_in,
            amount_out,
            ..
        } = quote;
        let (chain_id_from, chain_id_to) = (*chain_id_from, *chain_id_to);

        self.swap
            .bridge_swap_supported(token_from, token_to, chain_id_from, chain_id_to)?;
        let config = self.config();
        let zap = BridgeZapContract::new(chain_id_from, config.bridge_zap(chain_id_from)?);
        let origin = plan_leg(config, chain_id_from, token_from)?;
        let destination = plan_leg(config, chain_id_to, token_to)?;

        let deadline = resolve_deadline(params.deadline);
        let bridge_deadline = params
            .bridge_deadline
            .unwrap_or_else(|| deadline_after(DEFAULT_BRIDGE_DEADLINE));

        let zap_origin = match &origin.route {
            Route::Direct => {
                let token = token_from.require_address(chain_id_from)?;
                let amount = amount_in.clone();
                if config.deposits_on(chain_id_from, token_from.swap_group()) {
                    ZapOrigin::Deposit { token, amount }
                } else {
                    ZapOrigin::Redeem { token, amount }
                }
            }
            Route::Swap(pool) => ZapOrigin::Swap {
                token: origin.intermediate.require_address(chain_id_from)?,
                dx: amount_in.clone(),
                swap: ZapSwap {
                    token_index_from: index_in(pool, token_from)?,
                    token_index_to: index_in(pool, &origin.intermediate)?,
                    min_dy: min_intermediate(&origin, amount_in, params.slippage)?,
                    deadline,
                },
            },
            Route::Liquidity(pool) => ZapOrigin::Liquidity {
                token: origin.intermediate.require_address(chain_id_from)?,
                amounts: pool.layout_amounts(&[(token_from.clone(), amount_in.clone())])?,
                min_to_mint: min_intermediate(&origin, amount_in, params.slippage)?,
                deadline,
            },
        };

        let min_out = params.slippage.apply(amount_out, Direction::Decrease);
        let zap_destination = match &destination.route {
            Route::Direct => ZapDestination::Keep,
            Route::Swap(pool) => ZapDestination::Swap(ZapSwap {
                token_index_from: index_in(pool, &destination.intermediate)?,
                token_index_to: index_in(pool, token_to)?,
                min_dy: min_out,
                deadline: bridge_deadline,
            }),
            Route::Liquidity(pool) => ZapDestination::Remove(ZapRemove {
                token_index: index_in(pool, token_to)?,
                min_amount: min_out,
                deadline: bridge_deadline,
            }),
        };

        debug!(
            chain_id_from,
            chain_id_to,
            origin = ?origin.route,
            destination = ?destination.route,
            "building bridge transaction"
        );
        zap.bridge_transaction(params.address_to, chain_id_to, &zap_origin, &zap_destination)?
            .ok_or_else(|| {
                UnsupportedSwapError::no_bridge_route(
                    token_from.symbol(),
                    &chain_name(chain_id_from),
                    token_to.symbol(),
                    &chain_name(chain_id_to),
                )
                .into()
            })
    }

    /// Approve the zap on `chain_id` to spend `token`. `None` approves
    /// [`max_approval`].
    pub fn build_approve_transaction(
        &self,
        chain_id: u64,
        token: &Token,
        amount: Option<&BigUint>,
    ) -> Result<UnsignedTransaction, Error> {
        let spender = self.config().bridge_zap(chain_id)?;
        let amount = amount.cloned().unwrap_or_else(max_approval);
        self.erc20(chain_id, token)?.approve_transaction(spender, &amount)
    }

    /// How much of `token` the zap on `chain_id` may move for `owner`.
    pub async fn allowance(&self, chain_id: u64, owner: Address, token: &Token) -> Result<BigUint, Error> {
        let spender = self.config().bridge_zap(chain_id)?;
        self.erc20(chain_id, token)?.allowance(owner, spender)?.await
    }

    /// Whether `owner` holds and has approved at least `amount` of `token`.
    ///
    /// Balance and allowance are fetched in one batch. A short allowance is
    /// reported before a short balance.
    pub async fn check_can_bridge(
        &self,
        chain_id: u64,
        owner: Address,
        token: &Token,
        amount: &BigUint,
    ) -> Result<(), Error> {
        let spender = self.config().bridge_zap(chain_id)?;
        let decimals = token.require_decimals(chain_id)?;
        let erc20 = self.erc20(chain_id, token)?;
        let (balance, allowance) = tokio::try_join!(erc20.balance_of(owner)?, erc20.allowance(owner, spender)?)?;

        if &allowance < amount {
            return Err(Error::InsufficientAllowance {
                symbol: token.symbol().to_string(),
                allowance: format_units(&allowance, decimals),
            });
        }
        if &balance < amount {
            return Err(Error::InsufficientBalance {
                symbol: token.symbol().to_string(),
                balance: format_units(&balance, decimals),
            });
        }
        Ok(())
    }

    fn erc20(&self, chain_id: u64, token: &Token) -> Result<Erc20Contract, ConfigError> {
        let provider = self.swap.connector().provider(chain_id)?;
        Ok(Erc20Contract::new(provider, token.require_address(chain_id)?))
    }
}

fn index_in(pool: &SwapPool, token: &Token) -> Result<u8, ConfigError> {
    pool.position(token)
        .and_then(|i| u8::try_from(i).ok())
        .ok_or_else(|| ConfigError::TokenNotInPool {
            symbol: token.symbol().to_string(),
            pool: pool.name.clone(),
        })
}

/// `amount` of the leg's token restated in bridge asset units, less slippage.
fn min_intermediate(leg: &Leg, amount: &BigUint, slippage: Slippage) -> Result<BigUint, ConfigError> {
    let normalized = to_fixed_point(amount, leg.token.require_decimals(leg.chain_id)?, leg.token.symbol())?;
    let expected = from_fixed_point(
        &normalized,
        leg.intermediate.require_decimals(leg.chain_id)?,
        leg.intermediate.symbol(),
    )?;
    Ok(slippage.apply(&expected, Direction::Decrease))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{decode_output, parse_types, selector_from_signature, AbiValue};
    use crate::error::UnsupportedSwapKind;
    use crate::quote::{BridgeQuoteParams, BridgeQuoter};
    use crate::testing::{fake_connector, init_tracing, provider, revert, word, MockTransport};
    use crate::types::chain::chain_id;

    const E18: u128 = 1_000_000_000_000_000_000;
    const DEADLINE: u64 = 1_700_000_000;
    const BRIDGE_DEADLINE: u64 = 1_700_086_400;

    fn receiver() -> Address {
        Address([0x42; 20])
    }

    fn bridge() -> (Bridge, BridgeQuoter) {
        init_tracing();
        let config = Arc::new(SdkConfig::mainnet().unwrap());
        let (connector, _) = fake_connector(&config);
        let connector = Arc::new(connector);
        (
            Bridge::new(config.clone(), connector.clone()),
            BridgeQuoter::new(config, connector).unwrap(),
        )
    }

    fn params() -> BridgeTransactionParams {
        BridgeTransactionParams::new(receiver()).with_deadlines(DEADLINE, BRIDGE_DEADLINE)
    }

    /// A quote built by hand; only routes and amounts matter to the builder.
    fn hand_quote(bridge: &Bridge, from: (u64, &str), to: (u64, &str), amount_in: u128, amount_out: u128) -> Quote {
        let config = bridge.config();
        let token_to = config.token(to.1).unwrap();
        Quote {
            token_from: config.token(from.1).unwrap(),
            token_to: token_to.clone(),
            chain_id_from: from.0,
            chain_id_to: to.0,
            amount_in: BigUint::from(amount_in),
            amount_out: BigUint::from(amount_out),
            bridge_fee: BigUint::default(),
            intermediate_token: token_to,
        }
    }

    fn function(tx: &UnsignedTransaction) -> &'static str {
        const NAMES: [&str; 10] = [
            "deposit(address,uint256,address,uint256)",
            "redeem(address,uint256,address,uint256)",
            "depositAndSwap(address,uint256,address,uint256,uint8,uint8,uint256,uint256)",
            "redeemAndSwap(address,uint256,address,uint256,uint8,uint8,uint256,uint256)",
            "redeemAndRemove(address,uint256,address,uint256,uint8,uint256,uint256)",
            "swapAndRedeem(address,uint256,address,uint8,uint8,uint256,uint256,uint256)",
            "swapAndRedeemAndSwap(address,uint256,address,uint8,uint8,uint256,uint256,uint256,uint8,uint8,uint256,uint256)",
            "swapAndRedeemAndRemove(address,uint256,address,uint8,uint8,uint256,uint256,uint256,uint8,uint256,uint256)",
            "zapAndDeposit(address,uint256,address,uint256[],uint256,uint256)",
            "zapAndDepositAndSwap(address,uint256,address,uint256[],uint256,uint256,uint8,uint8,uint256,uint256)",
        ];
        NAMES
            .into_iter()
            .find(|sig| tx.selector() == Some(selector_from_signature(sig)))
            .unwrap()
    }

    fn args(tx: &UnsignedTransaction) -> Vec<AbiValue> {
        let sig = function(tx);
        let types = &sig[sig.find('(').unwrap() + 1..sig.len() - 1];
        decode_output(&parse_types(types).unwrap(), &tx.data[4..]).unwrap()
    }

    fn uint(value: &AbiValue) -> BigUint {
        value.as_uint().unwrap().clone()
    }

    fn address_on(bridge: &Bridge, symbol: &str, chain: u64) -> Address {
        bridge.config().token(symbol).unwrap().address(chain).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_quote_into_zap_and_deposit_and_swap() {
        let (bridge, quoter) = bridge();
        let config = bridge.config();
        // 100 USDC on Ethereum into USDT on BSC.
        let quote = quoter
            .estimate_bridge_quote(&BridgeQuoteParams {
                chain_id_from: chain_id::ETH,
                chain_id_to: chain_id::BSC,
                token_from: config.token("USDC").unwrap(),
                token_to: config.token("USDT").unwrap(),
                amount_in: BigUint::from(100_000_000u32),
            })
            .await
            .unwrap();

        let tx = bridge.build_bridge_transaction(&quote, &params()).unwrap();
        assert_eq!(tx.chain_id, chain_id::ETH);
        assert_eq!(tx.to, config.bridge_zap(chain_id::ETH).unwrap());
        assert!(function(&tx).starts_with("zapAndDepositAndSwap("));

        let values = args(&tx);
        assert_eq!(values[0].as_address(), Some(receiver()));
        assert_eq!(uint(&values[1]), BigUint::from(chain_id::BSC));
        assert_eq!(values[2].as_address(), Some(address_on(&bridge, "nUSD", chain_id::ETH)));
        // DAI, USDC, USDT
        let amounts: Vec<BigUint> = values[3].as_array().unwrap().iter().map(uint).collect();
        assert_eq!(
            amounts,
            vec![BigUint::default(), BigUint::from(100_000_000u32), BigUint::default()]
        );
        assert_eq!(uint(&values[4]), BigUint::from(99 * E18));
        assert_eq!(uint(&values[5]), BigUint::from(DEADLINE));
        // nUSD sits first in the BSC pool, USDT last.
        assert_eq!(uint(&values[6]), BigUint::from(0u8));
        assert_eq!(uint(&values[7]), BigUint::from(3u8));
        assert_eq!(uint(&values[8]), Slippage::One.apply(&quote.amount_out, Direction::Decrease));
        assert_eq!(uint(&values[9]), BigUint::from(BRIDGE_DEADLINE));
    }

    #[test]
    fn test_swap_and_redeem_and_remove() {
        let (bridge, _) = bridge();
        let quote = hand_quote(&bridge, (chain_id::BSC, "USDT"), (chain_id::ETH, "USDC"), 100 * E18, 98_000_000);
        let tx = bridge
            .build_bridge_transaction(&quote, &params().with_slippage(Slippage::OneTenth))
            .unwrap();
        assert_eq!(tx.chain_id, chain_id::BSC);
        assert!(function(&tx).starts_with("swapAndRedeemAndRemove("));

        let values = args(&tx);
        assert_eq!(values[2].as_address(), Some(address_on(&bridge, "nUSD", chain_id::BSC)));
        let tail: Vec<BigUint> = values[3..].iter().map(uint).collect();
        assert_eq!(
            tail,
            vec![
                BigUint::from(3u8),
                BigUint::from(0u8),
                BigUint::from(100 * E18),
                BigUint::from(100 * E18 / 1000 * 999),
                BigUint::from(DEADLINE),
                // USDC in the Ethereum pool
                BigUint::from(1u8),
                BigUint::from(97_902_000u32),
                BigUint::from(BRIDGE_DEADLINE),
            ]
        );
    }

    #[test]
    fn test_direct_routes_deposit_or_redeem() {
        let (bridge, _) = bridge();
        let cases = [
            ((chain_id::ETH, "nUSD"), (chain_id::BSC, "nUSD"), "deposit("),
            ((chain_id::BSC, "nUSD"), (chain_id::ETH, "nUSD"), "redeem("),
            ((chain_id::ETH, "SYN"), (chain_id::ARBITRUM, "SYN"), "redeem("),
            ((chain_id::ARBITRUM, "GMX"), (chain_id::AVALANCHE, "GMX"), "deposit("),
            ((chain_id::AVALANCHE, "GMX"), (chain_id::ARBITRUM, "GMX"), "redeem("),
            ((chain_id::ETH, "nUSD"), (chain_id::POLYGON, "DAI"), "depositAndSwap("),
            ((chain_id::AVALANCHE, "nUSD"), (chain_id::ETH, "USDT"), "redeemAndRemove("),
            ((chain_id::ETH, "WETH"), (chain_id::ARBITRUM, "WETH"), "depositAndSwap("),
            ((chain_id::ARBITRUM, "WETH"), (chain_id::AVALANCHE, "AVWETH"), "swapAndRedeemAndSwap("),
            ((chain_id::POLYGON, "USDC"), (chain_id::FANTOM, "nUSD"), "swapAndRedeem("),
        ];
        for (from, to, expected) in cases {
            let quote = hand_quote(&bridge, from, to, E18, E18);
            let tx = bridge.build_bridge_transaction(&quote, &params()).unwrap();
            assert!(function(&tx).starts_with(expected), "{from:?} -> {to:?}: {}", function(&tx));
            assert_eq!(tx.to, bridge.config().bridge_zap(from.0).unwrap());

            let values = args(&tx);
            assert_eq!(values[0].as_address(), Some(receiver()));
            assert_eq!(uint(&values[1]), BigUint::from(to.0));
        }
    }

    #[test]
    fn test_routes_without_zap_function_are_unsupported() {
        let (bridge, _) = bridge();
        // Pool deposit on one side, pool withdrawal on the other.
        let quote = hand_quote(&bridge, (chain_id::ETH, "USDC"), (chain_id::ETH, "USDT"), 1_000_000, 1_000_000);
        match bridge.build_bridge_transaction(&quote, &params()).unwrap_err() {
            Error::UnsupportedSwap(e) => assert_eq!(e.kind, UnsupportedSwapKind::NoBridgeRoute),
            other => panic!("unexpected error {other:?}"),
        }

        let quote = hand_quote(&bridge, (chain_id::ETH, "USDC"), (chain_id::ARBITRUM, "WETH"), 1, 1);
        assert!(bridge
            .build_bridge_transaction(&quote, &params())
            .unwrap_err()
            .is_unsupported_swap());
    }

    #[test]
    fn test_approve_transaction() {
        let (bridge, _) = bridge();
        let usdc = bridge.config().token("USDC").unwrap();
        let zap = bridge.config().bridge_zap(chain_id::BSC).unwrap();

        let tx = bridge.build_approve_transaction(chain_id::BSC, &usdc, None).unwrap();
        assert_eq!(tx.to, usdc.address(chain_id::BSC).unwrap());
        assert_eq!(tx.selector(), Some(selector_from_signature("approve(address,uint256)")));
        let values = decode_output(&parse_types("address,uint256").unwrap(), &tx.data[4..]).unwrap();
        assert_eq!(values[0].as_address(), Some(zap));
        assert_eq!(uint(&values[1]), max_approval());
        assert_eq!(max_approval().bits(), 256);

        let tx = bridge
            .build_approve_transaction(chain_id::BSC, &usdc, Some(&BigUint::from(5u8)))
            .unwrap();
        let values = decode_output(&parse_types("address,uint256").unwrap(), &tx.data[4..]).unwrap();
        assert_eq!(uint(&values[1]), BigUint::from(5u8));
    }

    /// A wallet on Ethereum answering `balanceOf` and `allowance`.
    fn wallet(balance: u128, allowance: u128) -> (Bridge, Arc<MockTransport>) {
        let config = Arc::new(SdkConfig::mainnet().unwrap());
        let zap = config.bridge_zap(chain_id::ETH).unwrap();
        let transport = Arc::new(MockTransport::eth_call(move |_, data| {
            if data[..4] == selector_from_signature("balanceOf(address)") {
                Ok(word(balance))
            } else if data[..4] == selector_from_signature("allowance(address,address)") {
                let args = decode_output(&parse_types("address,address").unwrap(), &data[4..]).unwrap();
                assert_eq!(args[1].as_address(), Some(zap));
                Ok(word(allowance))
            } else {
                Err(revert("unknown selector"))
            }
        }));
        let connector = RpcConnector::new(Default::default());
        connector.set_provider(provider(chain_id::ETH, &transport));
        (Bridge::new(config, Arc::new(connector)), transport)
    }

    #[tokio::test(start_paused = true)]
    async fn test_allowance_queries_zap_spender() {
        let (bridge, transport) = wallet(0, 1_234);
        let usdc = bridge.config().token("USDC").unwrap();
        let allowance = bridge.allowance(chain_id::ETH, receiver(), &usdc).await.unwrap();
        assert_eq!(allowance, BigUint::from(1_234u32));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_can_bridge() {
        let usdc_amount = BigUint::from(10_000_000u32);

        let (bridge, transport) = wallet(20_000_000, 10_000_000);
        let usdc = bridge.config().token("USDC").unwrap();
        bridge
            .check_can_bridge(chain_id::ETH, receiver(), &usdc, &usdc_amount)
            .await
            .unwrap();
        let batches = transport.batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);

        let (bridge, _) = wallet(1_500_000, 10_000_000);
        let err = bridge
            .check_can_bridge(chain_id::ETH, receiver(), &usdc, &usdc_amount)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Balance of token USDC is too low; current balance is 1.5"
        );

        // Both short: the allowance is reported.
        let (bridge, _) = wallet(1_500_000, 50_000_000 / 10);
        let err = bridge
            .check_can_bridge(chain_id::ETH, receiver(), &usdc, &usdc_amount)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InsufficientAllowance { ref allowance, .. } if allowance == "5"));
        assert_eq!(
            err.to_string(),
            "Spend allowance of Bridge too low for token USDC; current allowance for Bridge is 5"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_can_bridge_needs_a_deployment() {
        let (bridge, transport) = wallet(0, 0);
        let busd = bridge.config().token("BUSD").unwrap();
        let err = bridge
            .check_can_bridge(chain_id::ETH, receiver(), &busd, &BigUint::from(1u8))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::TokenNotOnChain { .. })));
        assert_eq!(transport.request_count(), 0);
    }
}
