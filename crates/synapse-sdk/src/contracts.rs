//! Typed wrappers over the view calls and transactions the SDK needs.
//!
//! View calls are enqueued on the chain's [`BatchingProvider`] as soon as
//! they are made; the returned [`PendingCall`] only waits for the batch.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use num_bigint::BigUint;
use serde_json::{json, Value};

use crate::abi::{decode_hex, decode_output, encode_call, parse_signature, AbiValue, ParamType};
use crate::error::{DecodeError, Error};
use crate::provider::{BatchingProvider, PendingRequest};
use crate::types::address::Address;
use crate::types::transaction::UnsignedTransaction;

const GET_TOKEN_INDEX: &str = "getTokenIndex(address)";
const GET_TOKEN: &str = "getToken(uint8)";
const CALCULATE_SWAP: &str = "calculateSwap(uint8,uint8,uint256)";
const CALCULATE_TOKEN_AMOUNT: &str = "calculateTokenAmount(uint256[],bool)";
const CALCULATE_REMOVE_LIQUIDITY: &str = "calculateRemoveLiquidity(uint256)";
const CALCULATE_REMOVE_LIQUIDITY_ONE_TOKEN: &str = "calculateRemoveLiquidityOneToken(uint256,uint8)";
const SWAP: &str = "swap(uint8,uint8,uint256,uint256,uint256)";
const ADD_LIQUIDITY: &str = "addLiquidity(uint256[],uint256,uint256)";
const REMOVE_LIQUIDITY: &str = "removeLiquidity(uint256,uint256[],uint256)";
const REMOVE_LIQUIDITY_ONE_TOKEN: &str = "removeLiquidityOneToken(uint256,uint8,uint256,uint256)";
const CALCULATE_SWAP_FEE: &str = "calculateSwapFee(string,uint256,uint256)";
const TOTAL_SUPPLY: &str = "totalSupply()";
const BALANCE_OF: &str = "balanceOf(address)";
const ALLOWANCE: &str = "allowance(address,address)";
const APPROVE: &str = "approve(address,uint256)";
const DECIMALS: &str = "decimals()";

const DEPOSIT: &str = "deposit(address,uint256,address,uint256)";
const REDEEM: &str = "redeem(address,uint256,address,uint256)";
const DEPOSIT_AND_SWAP: &str = "depositAndSwap(address,uint256,address,uint256,uint8,uint8,uint256,uint256)";
const REDEEM_AND_SWAP: &str = "redeemAndSwap(address,uint256,address,uint256,uint8,uint8,uint256,uint256)";
const REDEEM_AND_REMOVE: &str = "redeemAndRemove(address,uint256,address,uint256,uint8,uint256,uint256)";
const SWAP_AND_REDEEM: &str = "swapAndRedeem(address,uint256,address,uint8,uint8,uint256,uint256,uint256)";
const SWAP_AND_REDEEM_AND_SWAP: &str =
    "swapAndRedeemAndSwap(address,uint256,address,uint8,uint8,uint256,uint256,uint256,uint8,uint8,uint256,uint256)";
const SWAP_AND_REDEEM_AND_REMOVE: &str =
    "swapAndRedeemAndRemove(address,uint256,address,uint8,uint8,uint256,uint256,uint256,uint8,uint256,uint256)";
const ZAP_AND_DEPOSIT: &str = "zapAndDeposit(address,uint256,address,uint256[],uint256,uint256)";
const ZAP_AND_DEPOSIT_AND_SWAP: &str =
    "zapAndDepositAndSwap(address,uint256,address,uint256[],uint256,uint256,uint8,uint8,uint256,uint256)";

fn calldata(signature: &str, args: &[AbiValue]) -> Result<Vec<u8>, DecodeError> {
    encode_call(&parse_signature(signature)?, args)
}

fn eth_call(provider: &BatchingProvider, to: Address, data: &[u8]) -> PendingRequest {
    provider.request(
        "eth_call",
        json!([
            {"to": to.to_lower_hex(), "data": format!("0x{}", hex::encode(data))},
            "latest"
        ]),
    )
}

fn view<T>(
    provider: &BatchingProvider,
    to: Address,
    signature: &str,
    args: &[AbiValue],
    decode: fn(&[u8]) -> Result<T, DecodeError>,
) -> Result<PendingCall<T>, Error> {
    let data = calldata(signature, args)?;
    Ok(PendingCall {
        request: eth_call(provider, to, &data),
        decode,
    })
}

/// A queued `eth_call` whose return data is decoded into `T`.
pub struct PendingCall<T> {
    request: PendingRequest,
    decode: fn(&[u8]) -> Result<T, DecodeError>,
}

impl<T> Future for PendingCall<T> {
    type Output = Result<T, Error>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.request).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
            Poll::Ready(Ok(value)) => {
                Poll::Ready(return_data(&value).and_then(|data| (this.decode)(&data)).map_err(Error::from))
            }
        }
    }
}

impl<T> fmt::Debug for PendingCall<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingCall").field("request", &self.request).finish()
    }
}

fn return_data(value: &Value) -> Result<Vec<u8>, DecodeError> {
    let hex_str = value
        .as_str()
        .ok_or_else(|| DecodeError::UnexpectedResult(format!("expected hex string, got {value}")))?;
    decode_hex(hex_str)
}

fn single(types: &[ParamType], data: &[u8]) -> Result<AbiValue, DecodeError> {
    decode_output(types, data)?
        .into_iter()
        .next()
        .ok_or_else(|| DecodeError::UnexpectedResult("empty return data".to_string()))
}

fn decode_uint(data: &[u8]) -> Result<BigUint, DecodeError> {
    match single(&[ParamType::Uint(256)], data)? {
        AbiValue::Uint(n) => Ok(n),
        other => Err(DecodeError::UnexpectedResult(format!("expected uint, got {other:?}"))),
    }
}

fn decode_u8(data: &[u8]) -> Result<u8, DecodeError> {
    let n = decode_uint(data)?;
    u8::try_from(&n).map_err(|_| DecodeError::UnexpectedResult(format!("{n} does not fit in uint8")))
}

fn decode_address(data: &[u8]) -> Result<Address, DecodeError> {
    single(&[ParamType::Address], data)?
        .as_address()
        .ok_or_else(|| DecodeError::UnexpectedResult("expected address".to_string()))
}

fn decode_uint_array(data: &[u8]) -> Result<Vec<BigUint>, DecodeError> {
    let value = single(&[ParamType::Array(Box::new(ParamType::Uint(256)))], data)?;
    value
        .as_array()
        .ok_or_else(|| DecodeError::UnexpectedResult("expected uint256[]".to_string()))?
        .iter()
        .map(|v| {
            v.as_uint()
                .cloned()
                .ok_or_else(|| DecodeError::UnexpectedResult("expected uint256".to_string()))
        })
        .collect()
}

fn uint_array(amounts: &[BigUint]) -> AbiValue {
    AbiValue::Array(amounts.iter().cloned().map(AbiValue::Uint).collect())
}

/// A stableswap pool contract.
#[derive(Debug, Clone)]
pub struct SwapPoolContract {
    provider: BatchingProvider,
    address: Address,
}

impl SwapPoolContract {
    pub fn new(provider: BatchingProvider, address: Address) -> Self {
        Self { provider, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn chain_id(&self) -> u64 {
        self.provider.chain_id()
    }

    pub fn get_token_index(&self, token: Address) -> Result<PendingCall<u8>, Error> {
        view(&self.provider, self.address, GET_TOKEN_INDEX, &[AbiValue::Address(token)], decode_u8)
    }

    pub fn get_token(&self, index: u8) -> Result<PendingCall<Address>, Error> {
        view(&self.provider, self.address, GET_TOKEN, &[AbiValue::uint(index)], decode_address)
    }

    pub fn calculate_swap(&self, index_from: u8, index_to: u8, dx: &BigUint) -> Result<PendingCall<BigUint>, Error> {
        view(
            &self.provider,
            self.address,
            CALCULATE_SWAP,
            &[AbiValue::uint(index_from), AbiValue::uint(index_to), AbiValue::Uint(dx.clone())],
            decode_uint,
        )
    }

    pub fn calculate_token_amount(&self, amounts: &[BigUint], deposit: bool) -> Result<PendingCall<BigUint>, Error> {
        view(
            &self.provider,
            self.address,
            CALCULATE_TOKEN_AMOUNT,
            &[uint_array(amounts), AbiValue::Bool(deposit)],
            decode_uint,
        )
    }

    pub fn calculate_remove_liquidity(&self, amount: &BigUint) -> Result<PendingCall<Vec<BigUint>>, Error> {
        view(
            &self.provider,
            self.address,
            CALCULATE_REMOVE_LIQUIDITY,
            &[AbiValue::Uint(amount.clone())],
            decode_uint_array,
        )
    }

    pub fn calculate_remove_liquidity_one_token(
        &self,
        amount: &BigUint,
        index: u8,
    ) -> Result<PendingCall<BigUint>, Error> {
        view(
            &self.provider,
            self.address,
            CALCULATE_REMOVE_LIQUIDITY_ONE_TOKEN,
            &[AbiValue::Uint(amount.clone()), AbiValue::uint(index)],
            decode_uint,
        )
    }

    pub fn swap_transaction(
        &self,
        index_from: u8,
        index_to: u8,
        dx: &BigUint,
        min_dy: &BigUint,
        deadline: u64,
    ) -> Result<UnsignedTransaction, Error> {
        let data = calldata(
            SWAP,
            &[
                AbiValue::uint(index_from),
                AbiValue::uint(index_to),
                AbiValue::Uint(dx.clone()),
                AbiValue::Uint(min_dy.clone()),
                AbiValue::uint(deadline),
            ],
        )?;
        Ok(UnsignedTransaction::new(self.chain_id(), self.address, data))
    }

    pub fn add_liquidity_transaction(
        &self,
        amounts: &[BigUint],
        min_to_mint: &BigUint,
        deadline: u64,
    ) -> Result<UnsignedTransaction, Error> {
        let data = calldata(
            ADD_LIQUIDITY,
            &[uint_array(amounts), AbiValue::Uint(min_to_mint.clone()), AbiValue::uint(deadline)],
        )?;
        Ok(UnsignedTransaction::new(self.chain_id(), self.address, data))
    }

    pub fn remove_liquidity_transaction(
        &self,
        amount: &BigUint,
        min_amounts: &[BigUint],
        deadline: u64,
    ) -> Result<UnsignedTransaction, Error> {
        let data = calldata(
            REMOVE_LIQUIDITY,
            &[AbiValue::Uint(amount.clone()), uint_array(min_amounts), AbiValue::uint(deadline)],
        )?;
        Ok(UnsignedTransaction::new(self.chain_id(), self.address, data))
    }

    pub fn remove_liquidity_one_token_transaction(
        &self,
        amount: &BigUint,
        index: u8,
        min_amount: &BigUint,
        deadline: u64,
    ) -> Result<UnsignedTransaction, Error> {
        let data = calldata(
            REMOVE_LIQUIDITY_ONE_TOKEN,
            &[
                AbiValue::Uint(amount.clone()),
                AbiValue::uint(index),
                AbiValue::Uint(min_amount.clone()),
                AbiValue::uint(deadline),
            ],
        )?;
        Ok(UnsignedTransaction::new(self.chain_id(), self.address, data))
    }
}

/// The bridge fee registry.
#[derive(Debug, Clone)]
pub struct BridgeConfigContract {
    provider: BatchingProvider,
    address: Address,
}

impl BridgeConfigContract {
    pub fn new(provider: BatchingProvider, address: Address) -> Self {
        Self { provider, address }
    }

    /// Fee for bridging `amount` (18-decimal fixed point) of the token the
    /// registry knows as `token_address` to `chain_id`.
    pub fn calculate_swap_fee(
        &self,
        token_address: &str,
        chain_id: u64,
        amount: &BigUint,
    ) -> Result<PendingCall<BigUint>, Error> {
        view(
            &self.provider,
            self.address,
            CALCULATE_SWAP_FEE,
            &[
                AbiValue::String(token_address.to_string()),
                AbiValue::uint(chain_id),
                AbiValue::Uint(amount.clone()),
            ],
            decode_uint,
        )
    }
}

#[derive(Debug, Clone)]
pub struct Erc20Contract {
    provider: BatchingProvider,
    address: Address,
}

impl Erc20Contract {
    pub fn new(provider: BatchingProvider, address: Address) -> Self {
        Self { provider, address }
    }

    pub fn total_supply(&self) -> Result<PendingCall<BigUint>, Error> {
        view(&self.provider, self.address, TOTAL_SUPPLY, &[], decode_uint)
    }

    pub fn balance_of(&self, owner: Address) -> Result<PendingCall<BigUint>, Error> {
        view(&self.provider, self.address, BALANCE_OF, &[AbiValue::Address(owner)], decode_uint)
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> Result<PendingCall<BigUint>, Error> {
        view(
            &self.provider,
            self.address,
            ALLOWANCE,
            &[AbiValue::Address(owner), AbiValue::Address(spender)],
            decode_uint,
        )
    }

    pub fn approve_transaction(&self, spender: Address, amount: &BigUint) -> Result<UnsignedTransaction, Error> {
        let data = calldata(APPROVE, &[AbiValue::Address(spender), AbiValue::Uint(amount.clone())])?;
        Ok(UnsignedTransaction::new(self.provider.chain_id(), self.address, data))
    }

    pub fn decimals(&self) -> Result<PendingCall<u8>, Error> {
        view(&self.provider, self.address, DECIMALS, &[], decode_u8)
    }
}

/// A pool swap executed by the zap, on either side of the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZapSwap {
    pub token_index_from: u8,
    pub token_index_to: u8,
    pub min_dy: BigUint,
    pub deadline: u64,
}

/// Single-token liquidity removal on the destination chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZapRemove {
    pub token_index: u8,
    pub min_amount: BigUint,
    pub deadline: u64,
}

/// How tokens enter the bridge on the origin chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZapOrigin {
    /// Lock a canonical bridge asset.
    Deposit { token: Address, amount: BigUint },
    /// Burn a bridged asset.
    Redeem { token: Address, amount: BigUint },
    /// Swap into the bridge asset `token` through its pool, then burn it.
    Swap { token: Address, dx: BigUint, swap: ZapSwap },
    /// Add liquidity and lock the minted LP token `token`.
    Liquidity {
        token: Address,
        amounts: Vec<BigUint>,
        min_to_mint: BigUint,
        deadline: u64,
    },
}

/// What the bridge does with the asset on the destination chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZapDestination {
    Keep,
    Swap(ZapSwap),
    Remove(ZapRemove),
}

/// A bridge zap contract. Transactions only; it is never queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeZapContract {
    chain_id: u64,
    address: Address,
}

impl BridgeZapContract {
    pub fn new(chain_id: u64, address: Address) -> Self {
        Self { chain_id, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Build the zap call joining `origin` and `destination`. Returns `None`
    /// when the contract has no function for the pair.
    pub fn bridge_transaction(
        &self,
        to: Address,
        chain_id_to: u64,
        origin: &ZapOrigin,
        destination: &ZapDestination,
    ) -> Result<Option<UnsignedTransaction>, Error> {
        use ZapDestination as D;
        use ZapOrigin as O;

        let signature = match (origin, destination) {
            (O::Deposit { .. }, D::Keep) => DEPOSIT,
            (O::Deposit { .. }, D::Swap(_)) => DEPOSIT_AND_SWAP,
            (O::Redeem { .. }, D::Keep) => REDEEM,
            (O::Redeem { .. }, D::Swap(_)) => REDEEM_AND_SWAP,
            (O::Redeem { .. }, D::Remove(_)) => REDEEM_AND_REMOVE,
            (O::Swap { .. }, D::Keep) => SWAP_AND_REDEEM,
            (O::Swap { .. }, D::Swap(_)) => SWAP_AND_REDEEM_AND_SWAP,
            (O::Swap { .. }, D::Remove(_)) => SWAP_AND_REDEEM_AND_REMOVE,
            (O::Liquidity { .. }, D::Keep) => ZAP_AND_DEPOSIT,
            (O::Liquidity { .. }, D::Swap(_)) => ZAP_AND_DEPOSIT_AND_SWAP,
            (O::Deposit { .. } | O::Liquidity { .. }, D::Remove(_)) => return Ok(None),
        };

        let mut args = vec![AbiValue::Address(to), AbiValue::uint(chain_id_to)];
        match origin {
            O::Deposit { token, amount } | O::Redeem { token, amount } => {
                args.extend([AbiValue::Address(*token), AbiValue::Uint(amount.clone())]);
            }
            O::Swap { token, dx, swap } => {
                args.extend([
                    AbiValue::Address(*token),
                    AbiValue::uint(swap.token_index_from),
                    AbiValue::uint(swap.token_index_to),
                    AbiValue::Uint(dx.clone()),
                    AbiValue::Uint(swap.min_dy.clone()),
                    AbiValue::uint(swap.deadline),
                ]);
            }
            O::Liquidity {
                token,
                amounts,
                min_to_mint,
                deadline,
            } => {
                args.extend([
                    AbiValue::Address(*token),
                    uint_array(amounts),
                    AbiValue::Uint(min_to_mint.clone()),
                    AbiValue::uint(*deadline),
                ]);
            }
        }
        match destination {
            D::Keep => {}
            D::Swap(swap) => args.extend([
                AbiValue::uint(swap.token_index_from),
                AbiValue::uint(swap.token_index_to),
                AbiValue::Uint(swap.min_dy.clone()),
                AbiValue::uint(swap.deadline),
            ]),
            D::Remove(remove) => args.extend([
                AbiValue::uint(remove.token_index),
                AbiValue::Uint(remove.min_amount.clone()),
                AbiValue::uint(remove.deadline),
            ]),
        }

        let data = calldata(signature, &args)?;
        Ok(Some(UnsignedTransaction::new(self.chain_id, self.address, data)))
    }
}
