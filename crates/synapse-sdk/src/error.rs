use num_bigint::BigUint;
use thiserror::Error;

/// Unified error type for the SDK.
///
/// Every variant is `Clone` so a single transport failure can be handed to
/// each caller whose request was part of the failed batch.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("unsupported swap: {0}")]
    UnsupportedSwap(#[from] UnsupportedSwapError),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("requested {requested} liquidity tokens but only {supply} are outstanding")]
    InsufficientLiquidity { requested: BigUint, supply: BigUint },

    #[error("Balance of token {symbol} is too low; current balance is {balance}")]
    InsufficientBalance { symbol: String, balance: String },

    #[error("Spend allowance of Bridge too low for token {symbol}; current allowance for Bridge is {allowance}")]
    InsufficientAllowance { symbol: String, allowance: String },
}

impl Error {
    /// Whether this error means the pair simply cannot be traded, as opposed
    /// to a transient network or remote failure.
    pub fn is_unsupported_swap(&self) -> bool {
        matches!(self, Error::UnsupportedSwap(_))
    }
}

/// Configuration invariant violations. These are raised before any network
/// call is made.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no intermediate token configured for {symbol} bridging to chain {chain_id}")]
    NoIntermediateToken { symbol: String, chain_id: u64 },

    #[error("token {symbol} is not deployed on chain {chain_id}")]
    TokenNotOnChain { symbol: String, chain_id: u64 },

    #[error("token {symbol} is not part of pool {pool}")]
    TokenNotInPool { symbol: String, pool: String },

    #[error("swap setup for pool {pool} does not fit the swap: {reason}")]
    SetupMismatch { pool: String, reason: String },

    #[error("no bridge zap contract configured on chain {chain_id}")]
    NoBridgeZap { chain_id: u64 },

    #[error("no rpc provider configured for chain {chain_id}")]
    NoProvider { chain_id: u64 },

    #[error("no fee registry configured")]
    NoFeeRegistry,

    #[error("unsupported decimals {decimals} for token {symbol}")]
    UnsupportedDecimals { symbol: String, decimals: u8 },

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("expected {expected} liquidity amounts for pool {pool}, got {actual}")]
    AmountsLength {
        pool: String,
        expected: usize,
        actual: usize,
    },

    #[error("parse error: {0}")]
    Parse(String),
}

/// A JSON-RPC error envelope returned for a single request.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message} (code {code})")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// The batched network call as a whole failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("http status {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("failed to send batch call: {0}")]
    Send(String),

    #[error("failed to parse JSON response: {0}")]
    InvalidResponse(String),

    #[error("no async runtime available to dispatch the batch")]
    NoRuntime,

    #[error("batch was dropped before a response arrived")]
    Dropped,
}

/// Named reasons a swap or bridge route is not tradable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnsupportedSwapKind {
    UnsupportedToken,
    UnsupportedTokenNetFrom,
    UnsupportedTokenNetTo,
    NonMatchingSwapGroups,
    NoPoolForPair,
    /// ETH-group tokens cannot be bridged to or from Boba.
    EthOnBoba,
    /// No bridge zap function joins the two legs.
    NoBridgeRoute,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{reason}")]
pub struct UnsupportedSwapError {
    pub kind: UnsupportedSwapKind,
    pub reason: String,
}

impl UnsupportedSwapError {
    pub fn token_not_supported(symbol: &str, network: &str) -> Self {
        Self {
            kind: UnsupportedSwapKind::UnsupportedToken,
            reason: format!("Token {symbol} not supported on network {network}"),
        }
    }

    pub fn token_not_supported_net_from(symbol: &str, network: &str) -> Self {
        Self {
            kind: UnsupportedSwapKind::UnsupportedTokenNetFrom,
            reason: format!("Token {symbol} not supported on 'from' network {network}"),
        }
    }

    pub fn token_not_supported_net_to(symbol: &str, network: &str) -> Self {
        Self {
            kind: UnsupportedSwapKind::UnsupportedTokenNetTo,
            reason: format!("Token {symbol} not supported on 'to' network {network}"),
        }
    }

    pub fn non_matching_swap_groups(from: &str, to: &str) -> Self {
        Self {
            kind: UnsupportedSwapKind::NonMatchingSwapGroups,
            reason: format!("Token swap groups don't match ({from} vs {to})"),
        }
    }

    pub fn no_pool_for_pair(from: &str, to: &str, network: &str) -> Self {
        Self {
            kind: UnsupportedSwapKind::NoPoolForPair,
            reason: format!("No pool on network {network} routes {from} to {to}"),
        }
    }

    pub fn eth_on_boba() -> Self {
        Self {
            kind: UnsupportedSwapKind::EthOnBoba,
            reason: "ETH swaps to and from Boba are not supported".to_string(),
        }
    }

    pub fn no_bridge_route(from: &str, from_network: &str, to: &str, to_network: &str) -> Self {
        Self {
            kind: UnsupportedSwapKind::NoBridgeRoute,
            reason: format!("No bridge route sends {from} on {from_network} to {to} on {to_network}"),
        }
    }
}

/// Errors during signature parsing, argument encoding and return data decoding.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("invalid function signature: {0}")]
    InvalidSignature(String),

    #[error("data too short: expected at least {expected} bytes, got {actual}")]
    DataTooShort { expected: usize, actual: usize },

    #[error("argument mismatch: {0}")]
    ArgumentMismatch(String),

    #[error("invalid ABI encoding: {0}")]
    InvalidEncoding(String),

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("unexpected result shape: {0}")]
    UnexpectedResult(String),
}
