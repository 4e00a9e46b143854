use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::abi::keccak256;
use crate::error::ConfigError;
use crate::types::address::Address;

/// Coarse compatibility tag. Two tokens can be routed through the same pool
/// only if their groups match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SwapGroup(String);

impl SwapGroup {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SwapGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SwapGroup {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// Swap group tags used by the default catalog.
pub mod swap_group {
    pub const USD: &str = "USD";
    pub const SYN: &str = "SYN";
    pub const ETH: &str = "ETH";
    pub const FRAX: &str = "FRAX";
    pub const AVAX: &str = "AVAX";
    pub const HIGH: &str = "HIGHSTREET";
    pub const GMX: &str = "GMX";
    pub const OHM: &str = "OHM";
}

#[derive(Debug, Clone)]
pub enum TokenKind {
    Base,
    /// A wrapper around another (always base) token, e.g. wAVAX around AVAX.
    Wrapped { underlying: Arc<Token> },
}

/// A logical token deployed on one or more chains.
///
/// Equality is by identity hash (derived from the symbol), never by
/// address: the same token has a different address on every chain.
#[derive(Debug, Clone)]
pub struct Token {
    name: String,
    symbol: String,
    swap_group: SwapGroup,
    addresses: BTreeMap<u64, Address>,
    decimals: BTreeMap<u64, u8>,
    hash: [u8; 32],
    kind: TokenKind,
}

impl Token {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, swap_group: impl Into<SwapGroup>) -> Self {
        let symbol = symbol.into();
        let hash = keccak256(symbol.as_bytes());
        Self {
            name: name.into(),
            symbol,
            swap_group: swap_group.into(),
            addresses: BTreeMap::new(),
            decimals: BTreeMap::new(),
            hash,
            kind: TokenKind::Base,
        }
    }

    /// Record the token's deployment on `chain_id`.
    pub fn with_address(mut self, chain_id: u64, address: &str) -> Result<Self, ConfigError> {
        self.addresses.insert(chain_id, address.parse()?);
        Ok(self)
    }

    pub fn with_decimals(mut self, chain_id: u64, decimals: u8) -> Self {
        self.decimals.insert(chain_id, decimals);
        self
    }

    /// Apply the same decimals to every chain the token has an address on.
    /// Chains added afterwards need their own `with_decimals`.
    pub fn with_uniform_decimals(mut self, decimals: u8) -> Self {
        for chain_id in self.addresses.keys() {
            self.decimals.insert(*chain_id, decimals);
        }
        self
    }

    pub fn wrapping(mut self, underlying: Arc<Token>) -> Self {
        self.kind = TokenKind::Wrapped { underlying };
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn swap_group(&self) -> &SwapGroup {
        &self.swap_group
    }

    pub fn kind(&self) -> &TokenKind {
        &self.kind
    }

    pub fn identity_hash(&self) -> [u8; 32] {
        self.hash
    }

    /// Deployed address on `chain_id`, or `None` when the token does not
    /// exist there.
    pub fn address(&self, chain_id: u64) -> Option<Address> {
        self.addresses.get(&chain_id).copied()
    }

    /// Native decimals on `chain_id`, looked up independently of the address.
    pub fn decimals(&self, chain_id: u64) -> Option<u8> {
        self.decimals.get(&chain_id).copied()
    }

    pub fn is_on_chain(&self, chain_id: u64) -> bool {
        self.addresses.contains_key(&chain_id)
    }

    pub fn chains(&self) -> impl Iterator<Item = u64> + '_ {
        self.addresses.keys().copied()
    }

    pub fn is_equal(&self, other: &Token) -> bool {
        self.hash == other.hash
    }

    /// Swap compatibility is a category match, not a liquidity check.
    pub fn can_swap(&self, other: &Token) -> bool {
        self.swap_group == other.swap_group
    }

    pub fn is_wrapped(&self) -> bool {
        matches!(self.kind, TokenKind::Wrapped { .. })
    }

    pub fn underlying(&self) -> Option<&Arc<Token>> {
        match &self.kind {
            TokenKind::Wrapped { underlying } => Some(underlying),
            TokenKind::Base => None,
        }
    }

    /// Address on `chain_id`, or a configuration error naming the token.
    pub(crate) fn require_address(&self, chain_id: u64) -> Result<Address, ConfigError> {
        self.address(chain_id).ok_or_else(|| ConfigError::TokenNotOnChain {
            symbol: self.symbol.clone(),
            chain_id,
        })
    }

    pub(crate) fn require_decimals(&self, chain_id: u64) -> Result<u8, ConfigError> {
        self.decimals(chain_id).ok_or_else(|| ConfigError::TokenNotOnChain {
            symbol: self.symbol.clone(),
            chain_id,
        })
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

impl Eq for Token {}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}
