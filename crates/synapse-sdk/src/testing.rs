//! In-memory transport for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use num_bigint::BigUint;
use serde_json::{json, Value};

use crate::abi::{decode_hex, decode_output, parse_types, selector_from_signature, AbiValue};
use crate::catalog::SdkConfig;
use crate::connector::{RpcConnector, RpcEndpoints};
use crate::error::TransportError;
use crate::jsonrpc::{BatchReply, ErrorObject, JsonRpcRequest, JsonRpcResponse};
use crate::provider::{BatchTransport, BatchingProvider};
use crate::types::address::Address;

type Handler = dyn Fn(&JsonRpcRequest) -> Result<Value, ErrorObject> + Send + Sync;
type RawReply = dyn Fn(&[JsonRpcRequest]) -> BatchReply + Send + Sync;

/// Records every dispatched batch and answers each item with `handler`.
pub struct MockTransport {
    handler: Arc<Handler>,
    failure: Option<TransportError>,
    raw: Option<Arc<RawReply>>,
    reverse: bool,
    drop_last: bool,
    batches: Mutex<Vec<Vec<JsonRpcRequest>>>,
}

impl MockTransport {
    pub fn new(handler: impl Fn(&JsonRpcRequest) -> Result<Value, ErrorObject> + Send + Sync + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
            failure: None,
            raw: None,
            reverse: false,
            drop_last: false,
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Answers `eth_call` by handing `(to, calldata)` to `handler`, which
    /// returns ABI-encoded return data.
    pub fn eth_call(handler: impl Fn(Address, &[u8]) -> Result<Vec<u8>, ErrorObject> + Send + Sync + 'static) -> Self {
        Self::new(move |req| {
            let call = &req.params[0];
            let to: Address = call["to"]
                .as_str()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default();
            let data = call["data"]
                .as_str()
                .and_then(|s| decode_hex(s).ok())
                .unwrap_or_default();
            let out = handler(to, &data)?;
            Ok(json!(format!("0x{}", hex::encode(out))))
        })
    }

    pub fn failing(err: TransportError) -> Self {
        let mut transport = Self::new(|_| Ok(Value::Null));
        transport.failure = Some(err);
        transport
    }

    /// Answers each batch with whatever `reply` builds, e.g. a reply parsed
    /// from raw JSON.
    pub fn replying(reply: impl Fn(&[JsonRpcRequest]) -> BatchReply + Send + Sync + 'static) -> Self {
        let mut transport = Self::new(|_| Ok(Value::Null));
        transport.raw = Some(Arc::new(reply));
        transport
    }

    /// Reply items in reverse order.
    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }

    /// Omit the reply to the last request of each batch.
    pub fn dropping_last(mut self) -> Self {
        self.drop_last = true;
        self
    }

    pub fn batches(&self) -> Vec<Vec<JsonRpcRequest>> {
        self.batches.lock().map(|b| b.clone()).unwrap_or_default()
    }

    pub fn batch_count(&self) -> usize {
        self.batches().len()
    }

    pub fn request_count(&self) -> usize {
        self.batches().iter().map(Vec::len).sum()
    }
}

#[async_trait]
impl BatchTransport for MockTransport {
    async fn send_batch(&self, batch: Vec<JsonRpcRequest>) -> Result<BatchReply, TransportError> {
        if let Ok(mut batches) = self.batches.lock() {
            batches.push(batch.clone());
        }
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        if let Some(raw) = &self.raw {
            return Ok(raw(&batch));
        }

        let mut replies: Vec<JsonRpcResponse> = batch
            .iter()
            .map(|req| match (self.handler)(req) {
                Ok(result) => JsonRpcResponse::success(req.id, result),
                Err(error) => JsonRpcResponse {
                    jsonrpc: Some("2.0".to_string()),
                    id: Some(req.id),
                    result: None,
                    error: Some(error),
                },
            })
            .collect();
        if self.drop_last {
            replies.pop();
        }
        if self.reverse {
            replies.reverse();
        }
        Ok(BatchReply::Batch(replies))
    }
}

pub fn provider(chain_id: u64, transport: &Arc<MockTransport>) -> BatchingProvider {
    BatchingProvider::new(chain_id, transport.clone())
}

/// ABI word for a uint.
pub fn word(value: u128) -> Vec<u8> {
    let mut w = vec![0u8; 32];
    w[16..].copy_from_slice(&value.to_be_bytes());
    w
}

/// ABI word for an address.
pub fn address_word(address: Address) -> Vec<u8> {
    let mut w = vec![0u8; 32];
    w[12..].copy_from_slice(address.as_bytes());
    w
}

/// ABI encoding of a single `uint256[]` return value.
pub fn uint_array(values: &[u128]) -> Vec<u8> {
    let mut out = word(0x20);
    out.extend(word(values.len() as u128));
    for v in values {
        out.extend(word(*v));
    }
    out
}

pub fn revert(message: &str) -> ErrorObject {
    ErrorObject {
        code: 3,
        message: format!("execution reverted: {message}"),
        data: None,
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct FakePool {
    address: Address,
    tokens: Vec<(Address, u8)>,
    lp_token: Address,
}

/// Percentage the fake pools keep on every swap or single-token withdrawal.
pub const FAKE_POOL_CUT_BPS: u32 = 100;
/// Fee the fake registry charges, in 18-decimal units.
pub const FAKE_BRIDGE_FEE: u128 = 1_000_000_000_000_000;
/// Outstanding supply reported for every LP token.
pub const FAKE_LP_SUPPLY: u128 = 1_000_000_000_000_000_000_000_000;

/// A transport that behaves like every catalog pool on `chain_id`, an ERC-20
/// `totalSupply` for their LP tokens, and the bridge fee registry.
///
/// Swaps convert between token decimals and keep [`FAKE_POOL_CUT_BPS`].
pub fn fake_chain(config: &SdkConfig, chain_id: u64) -> Arc<MockTransport> {
    let pools: Vec<FakePool> = config
        .pools_on_chain(chain_id)
        .map(|p| FakePool {
            address: p.address,
            tokens: p
                .pool_tokens
                .iter()
                .map(|t| (t.address(chain_id).unwrap_or_default(), t.decimals(chain_id).unwrap_or(18)))
                .collect(),
            lp_token: p.lp_token.address(chain_id).unwrap_or_default(),
        })
        .collect();

    Arc::new(MockTransport::eth_call(move |to, data| {
        let selector = &data[..4];
        let args = |sig: &str| {
            decode_output(&parse_types(sig).unwrap_or_default(), &data[4..])
                .map_err(|e| revert(&e.to_string()))
        };
        let uint = |v: &AbiValue| v.as_uint().cloned().unwrap_or_default();
        let encode = |n: BigUint| {
            let mut w = vec![0u8; 32];
            let bytes = n.to_bytes_be();
            w[32 - bytes.len()..].copy_from_slice(&bytes);
            w
        };

        if selector == selector_from_signature("calculateSwapFee(string,uint256,uint256)") {
            return Ok(word(FAKE_BRIDGE_FEE));
        }
        if selector == selector_from_signature("totalSupply()") {
            if pools.iter().any(|p| p.lp_token == to) {
                return Ok(word(FAKE_LP_SUPPLY));
            }
            return Err(revert("not an lp token"));
        }

        let pool = pools
            .iter()
            .find(|p| p.address == to)
            .ok_or_else(|| revert("no contract at address"))?;
        let scale = |n: &BigUint, from: u8, to: u8| {
            if to >= from {
                n * BigUint::from(10u32).pow(u32::from(to - from))
            } else {
                n / BigUint::from(10u32).pow(u32::from(from - to))
            }
        };
        let cut = |n: BigUint| n * (10_000 - FAKE_POOL_CUT_BPS) / 10_000u32;
        let decimals_at = |i: &BigUint| {
            usize::try_from(i)
                .ok()
                .and_then(|i| pool.tokens.get(i))
                .map(|(_, d)| *d)
                .ok_or_else(|| revert("index out of range"))
        };

        if selector == selector_from_signature("getTokenIndex(address)") {
            let a = args("address")?;
            let wanted = a[0].as_address().unwrap_or_default();
            let index = pool
                .tokens
                .iter()
                .position(|(addr, _)| *addr == wanted)
                .ok_or_else(|| revert("Token does not exist"))?;
            Ok(word(index as u128))
        } else if selector == selector_from_signature("calculateSwap(uint8,uint8,uint256)") {
            let a = args("uint8,uint8,uint256")?;
            let (from, to) = (decimals_at(&uint(&a[0]))?, decimals_at(&uint(&a[1]))?);
            Ok(encode(cut(scale(&uint(&a[2]), from, to))))
        } else if selector == selector_from_signature("calculateTokenAmount(uint256[],bool)") {
            let a = args("uint256[],bool")?;
            let amounts = a[0].as_array().unwrap_or_default();
            let mut total = BigUint::default();
            for (amount, (_, d)) in amounts.iter().zip(&pool.tokens) {
                total += scale(&uint(amount), *d, 18);
            }
            Ok(encode(total))
        } else if selector == selector_from_signature("calculateRemoveLiquidity(uint256)") {
            let a = args("uint256")?;
            let share = uint(&a[0]) / pool.tokens.len() as u32;
            let values: Vec<u128> = pool
                .tokens
                .iter()
                .map(|(_, d)| u128::try_from(scale(&share, 18, *d)).unwrap_or(u128::MAX))
                .collect();
            Ok(uint_array(&values))
        } else if selector == selector_from_signature("calculateRemoveLiquidityOneToken(uint256,uint8)") {
            let a = args("uint256,uint8")?;
            let d = decimals_at(&uint(&a[1]))?;
            Ok(encode(cut(scale(&uint(&a[0]), 18, d))))
        } else {
            Err(revert("unknown selector"))
        }
    }))
}

/// A connector whose every catalog chain is served by [`fake_chain`].
pub fn fake_connector(config: &SdkConfig) -> (RpcConnector, HashMap<u64, Arc<MockTransport>>) {
    let connector = RpcConnector::new(RpcEndpoints::new());
    let mut transports = HashMap::new();
    let mut chains: Vec<u64> = config.pools().iter().map(|p| p.chain_id).collect();
    if let Some(registry) = config.fee_registry() {
        chains.push(registry.chain_id);
    }
    for chain_id in chains {
        transports.entry(chain_id).or_insert_with(|| {
            let transport = fake_chain(config, chain_id);
            connector.set_provider(provider(chain_id, &transport));
            transport
        });
    }
    (connector, transports)
}
