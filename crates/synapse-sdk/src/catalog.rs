use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::connector::RpcEndpoints;
use crate::error::ConfigError;
use crate::token::{swap_group, SwapGroup, Token};
use crate::types::address::Address;
use crate::types::chain::chain_id;
use crate::types::pool::SwapPool;

/// How a swap group maps onto bridge assets.
///
/// `intermediate` is what actually crosses the bridge; `bridge_config` is the
/// token the fee registry is keyed by, optionally overridden per destination
/// chain.
#[derive(Debug, Clone)]
pub struct IntermediateRule {
    pub intermediate: Option<Arc<Token>>,
    pub bridge_config: Arc<Token>,
    pub bridge_config_overrides: BTreeMap<u64, Arc<Token>>,
}

impl IntermediateRule {
    /// The token bridges as `intermediate` and fees are keyed by it too.
    pub fn via(intermediate: Arc<Token>) -> Self {
        Self {
            intermediate: Some(intermediate.clone()),
            bridge_config: intermediate,
            bridge_config_overrides: BTreeMap::new(),
        }
    }

    /// No bridgeable intermediate; only the fee registry key is known.
    pub fn fee_only(bridge_config: Arc<Token>) -> Self {
        Self {
            intermediate: None,
            bridge_config,
            bridge_config_overrides: BTreeMap::new(),
        }
    }

    pub fn bridge_config_on(mut self, chain_id: u64, token: Arc<Token>) -> Self {
        self.bridge_config_overrides.insert(chain_id, token);
        self
    }

    pub fn bridge_config_for(&self, destination_chain_id: u64) -> &Arc<Token> {
        self.bridge_config_overrides
            .get(&destination_chain_id)
            .unwrap_or(&self.bridge_config)
    }
}

/// Location of the bridge fee registry contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeRegistry {
    pub chain_id: u64,
    pub address: Address,
}

/// Immutable token, pool and bridge configuration shared by every component.
#[derive(Debug, Clone)]
pub struct SdkConfig {
    tokens: Vec<Arc<Token>>,
    by_symbol: HashMap<String, Arc<Token>>,
    by_address: HashMap<(u64, Address), Arc<Token>>,
    pools: Vec<Arc<SwapPool>>,
    intermediate_rules: HashMap<SwapGroup, IntermediateRule>,
    mint_burn_groups: HashSet<SwapGroup>,
    fee_registry: Option<FeeRegistry>,
    bridge_zaps: HashMap<u64, Address>,
    deposit_chains: HashSet<(SwapGroup, u64)>,
    rpc_endpoints: RpcEndpoints,
}

impl SdkConfig {
    pub fn builder() -> SdkConfigBuilder {
        SdkConfigBuilder::default()
    }

    pub fn tokens(&self) -> &[Arc<Token>] {
        &self.tokens
    }

    /// Look up a token by symbol, ignoring case.
    pub fn token(&self, symbol: &str) -> Option<Arc<Token>> {
        self.by_symbol.get(&symbol.to_lowercase()).cloned()
    }

    pub fn token_by_address(&self, chain_id: u64, address: &Address) -> Option<Arc<Token>> {
        self.by_address.get(&(chain_id, *address)).cloned()
    }

    pub fn tokens_on_chain(&self, chain_id: u64) -> Vec<Arc<Token>> {
        self.tokens
            .iter()
            .filter(|t| t.is_on_chain(chain_id))
            .cloned()
            .collect()
    }

    pub fn supports_token(&self, chain_id: u64, token: &Token) -> bool {
        token.is_on_chain(chain_id)
    }

    pub fn pools(&self) -> &[Arc<SwapPool>] {
        &self.pools
    }

    pub fn pools_on_chain(&self, chain_id: u64) -> impl Iterator<Item = &Arc<SwapPool>> {
        self.pools.iter().filter(move |p| p.chain_id == chain_id)
    }

    /// The pool for `swap_group` on `chain_id`, if any.
    pub fn pool(&self, chain_id: u64, swap_group: &SwapGroup) -> Option<Arc<SwapPool>> {
        self.pools_on_chain(chain_id)
            .find(|p| &p.swap_group == swap_group)
            .cloned()
    }

    /// The pool on `chain_id` holding both `from` and `to`.
    pub fn pool_for_pair(&self, chain_id: u64, from: &Token, to: &Token) -> Option<Arc<SwapPool>> {
        self.pools_on_chain(chain_id)
            .find(|p| p.contains(from) && p.contains(to))
            .cloned()
    }

    pub fn intermediate_rule(&self, swap_group: &SwapGroup) -> Option<&IntermediateRule> {
        self.intermediate_rules.get(swap_group)
    }

    pub fn is_mint_burn(&self, swap_group: &SwapGroup) -> bool {
        self.mint_burn_groups.contains(swap_group)
    }

    pub fn fee_registry(&self) -> Option<FeeRegistry> {
        self.fee_registry
    }

    /// The bridge zap contract users send tokens through on `chain_id`.
    pub fn bridge_zap(&self, chain_id: u64) -> Result<Address, ConfigError> {
        self.bridge_zaps
            .get(&chain_id)
            .copied()
            .ok_or(ConfigError::NoBridgeZap { chain_id })
    }

    /// Whether bridge assets of `swap_group` are locked by `deposit` on
    /// `chain_id`. Everywhere else they are burned by `redeem`.
    pub fn deposits_on(&self, chain_id: u64, swap_group: &SwapGroup) -> bool {
        self.deposit_chains.contains(&(swap_group.clone(), chain_id))
    }

    pub fn rpc_endpoints(&self) -> &RpcEndpoints {
        &self.rpc_endpoints
    }

    /// The built-in mainnet catalog.
    pub fn mainnet() -> Result<Self, ConfigError> {
        mainnet::build()
    }
}

#[derive(Debug, Default)]
pub struct SdkConfigBuilder {
    tokens: Vec<Arc<Token>>,
    pools: Vec<SwapPool>,
    intermediate_rules: HashMap<SwapGroup, IntermediateRule>,
    mint_burn_groups: HashSet<SwapGroup>,
    fee_registry: Option<FeeRegistry>,
    bridge_zaps: HashMap<u64, Address>,
    deposit_chains: HashSet<(SwapGroup, u64)>,
    rpc_endpoints: RpcEndpoints,
}

impl SdkConfigBuilder {
    pub fn add_token(mut self, token: Arc<Token>) -> Self {
        if !self.tokens.iter().any(|t| t.is_equal(&token)) {
            self.tokens.push(token);
        }
        self
    }

    /// Register a pool; its LP token and pool tokens are added to the catalog.
    pub fn add_pool(mut self, pool: SwapPool) -> Self {
        self = self.add_token(pool.lp_token.clone());
        for token in &pool.pool_tokens {
            self = self.add_token(token.clone());
        }
        self.pools.push(pool);
        self
    }

    pub fn intermediate_rule(mut self, swap_group: impl Into<SwapGroup>, rule: IntermediateRule) -> Self {
        self.intermediate_rules.insert(swap_group.into(), rule);
        self
    }

    /// Tokens in a mint/burn group bridge as themselves.
    pub fn mint_burn_group(mut self, swap_group: impl Into<SwapGroup>) -> Self {
        self.mint_burn_groups.insert(swap_group.into());
        self
    }

    pub fn bridge_config(mut self, chain_id: u64, address: &str) -> Result<Self, ConfigError> {
        self.fee_registry = Some(FeeRegistry {
            chain_id,
            address: address.parse()?,
        });
        Ok(self)
    }

    pub fn bridge_zap(mut self, chain_id: u64, address: &str) -> Result<Self, ConfigError> {
        self.bridge_zaps.insert(chain_id, address.parse()?);
        Ok(self)
    }

    /// `swap_group`'s bridge asset is canonical on `chain_id`.
    pub fn deposit_chain(mut self, swap_group: impl Into<SwapGroup>, chain_id: u64) -> Self {
        self.deposit_chains.insert((swap_group.into(), chain_id));
        self
    }

    pub fn rpc_endpoint(mut self, chain_id: u64, url: impl Into<String>) -> Self {
        self.rpc_endpoints.insert(chain_id, url, None);
        self
    }

    pub fn rpc_endpoints(mut self, endpoints: RpcEndpoints) -> Self {
        self.rpc_endpoints = endpoints;
        self
    }

    /// Validate and freeze the configuration.
    ///
    /// Every pool token must be deployed, with decimals, on its pool's chain.
    pub fn build(self) -> Result<SdkConfig, ConfigError> {
        for pool in &self.pools {
            for token in pool.pool_tokens.iter().chain(std::iter::once(&pool.lp_token)) {
                token.require_address(pool.chain_id)?;
                token.require_decimals(pool.chain_id)?;
            }
        }

        let mut by_symbol = HashMap::new();
        let mut by_address = HashMap::new();
        for token in &self.tokens {
            by_symbol.insert(token.symbol().to_lowercase(), token.clone());
            for chain in token.chains() {
                if let Some(address) = token.address(chain) {
                    by_address.insert((chain, address), token.clone());
                }
            }
        }

        Ok(SdkConfig {
            tokens: self.tokens,
            by_symbol,
            by_address,
            pools: self.pools.into_iter().map(Arc::new).collect(),
            intermediate_rules: self.intermediate_rules,
            mint_burn_groups: self.mint_burn_groups,
            fee_registry: self.fee_registry,
            bridge_zaps: self.bridge_zaps,
            deposit_chains: self.deposit_chains,
            rpc_endpoints: self.rpc_endpoints,
        })
    }
}

mod mainnet {
    use super::*;
    use chain_id::*;

    const BRIDGE_CONFIG_V3: &str = "0x3ee02f08B801B1990AC844d8CD2F119BA6Fb9bcF";

    fn token(
        name: &str,
        symbol: &str,
        group: &str,
        deployments: &[(u64, &str, u8)],
    ) -> Result<Token, ConfigError> {
        let mut token = Token::new(name, symbol, group);
        for (chain, address, decimals) in deployments {
            token = token.with_address(*chain, address)?.with_decimals(*chain, *decimals);
        }
        Ok(token)
    }

    pub(super) fn build() -> Result<SdkConfig, ConfigError> {
        let nusd = Arc::new(token("Synapse nUSD", "nUSD", swap_group::USD, &[
            (ETH, "0x1B84765dE8B7566e4cEAF4D0fD3c5aF52D3DdE4F", 18),
            (OPTIMISM, "0x67C10C397dD0Ba417329543c1a40eb48AAa7cd00", 18),
            (BSC, "0x23b891e5c62e0955ae2bd185990103928ab817b3", 18),
            (POLYGON, "0xb6c473756050de474286bed418b77aeac39b02af", 18),
            (FANTOM, "0xED2a7edd7413021d440b09D654f3b87712abAB66", 18),
            (ARBITRUM, "0x2913E812Cf0dcCA30FB28E6Cac3d2DCFF4497688", 18),
            (AVALANCHE, "0xCFc37A6AB183dd4aED08C204D1c2773c0b1BDf46", 18),
            (HARMONY, "0xED2a7edd7413021d440b09D654f3b87712abAB66", 18),
        ])?);
        let dai = Arc::new(token("Dai", "DAI", swap_group::USD, &[
            (ETH, "0x6b175474e89094c44da98b954eedeac495271d0f", 18),
            (BSC, "0x1af3f329e8be154074d8769d1ffa4ee058b1dbc3", 18),
            (POLYGON, "0x8f3cf7ad23cd3cadbd9735aff958023239c6a063", 18),
            (ARBITRUM, "0xDA10009cBd5D07dd0CeCc66161FC93D7c9000da1", 18),
            (AVALANCHE, "0xd586E7F844cEa2F87f50152665BCbc2C279D8d70", 18),
            (HARMONY, "0xef977d2f931c1978db5f6747666fa1eacb0d0339", 18),
        ])?);
        let busd = Arc::new(token("Binance USD", "BUSD", swap_group::USD, &[
            (BSC, "0xe9e7cea3dedca5984780bafc599bd69add087d56", 18),
        ])?);
        let usdc = Arc::new(token("USD Circle", "USDC", swap_group::USD, &[
            (ETH, "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48", 6),
            (OPTIMISM, "0x7f5c764cbc14f9669b88837ca1490cca17c31607", 6),
            (BSC, "0x8ac76a51cc950d9822d68b83fe1ad97b32cd580d", 18),
            (POLYGON, "0x2791bca1f2de4661ed88a30c99a7a9449aa84174", 6),
            (FANTOM, "0x04068da6c83afcfa0e13ba15a6696662335d5b75", 6),
            (ARBITRUM, "0xff970a61a04b1ca14834a43f5de4533ebddb5cc8", 6),
            (AVALANCHE, "0xA7D7079b0FEaD91F3e65f86E8915Cb59c1a4C664", 6),
        ])?);
        let usdt = Arc::new(token("USD Tether", "USDT", swap_group::USD, &[
            (ETH, "0xdac17f958d2ee523a2206206994597c13d831ec7", 6),
            (BSC, "0x55d398326f99059ff775485246999027b3197955", 18),
            (POLYGON, "0xc2132d05d31c914a87c6611c10748aeb04b58e8f", 6),
            (FANTOM, "0x049d68029688eabf473097a2fc38ef61633a3c7a", 6),
            (ARBITRUM, "0xfd086bc7cd5c481dcc9c85ebe478a1c0b69fcbb9", 6),
            (AVALANCHE, "0xc7198437980c041c805a1edcba50c1ce5db95118", 6),
        ])?);
        let nusd_lp = Arc::new(token("Synapse nUSD LP Token", "nUSD-LP", swap_group::USD, &[
            (BSC, "0xa4b7Bc06EC817785170C2DbC1dD3ff86CDcdcc4C", 18),
            (POLYGON, "0x7479e1bc2f2473f9e78c89b4210eb6d55d33b645", 18),
            (FANTOM, "0x2DC777ff99058a12844A33D9B1AE6c8AB4701F66", 18),
            (ARBITRUM, "0xcFd72be67Ee69A0dd7cF0f846Fc0D98C33d60F16", 18),
            (AVALANCHE, "0xCA87BF3ec55372D9540437d7a86a7750B42C02f4", 18),
        ])?);

        let neth = Arc::new(token("Synapse nETH", "nETH", swap_group::ETH, &[
            (OPTIMISM, "0x809DC529f07651bD43A172e8dB6f4a7a0d771036", 18),
            (FANTOM, "0x67C10C397dD0Ba417329543c1a40eb48AAa7cd00", 18),
            (ARBITRUM, "0x3ea9B0ab55F34Fb188824Ee288CeaEfC63cf908e", 18),
            (AVALANCHE, "0x19E1ae0eE35c0404f835521146206595d37981ae", 18),
            (HARMONY, "0x0b5740c6b4a97f90eF2F0220651Cca420B868FfB", 18),
        ])?);
        let weth = Arc::new(token("Wrapped ETH", "WETH", swap_group::ETH, &[
            (ETH, "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2", 18),
            (OPTIMISM, "0x121ab82b49B2BC4c7901CA46B8277962b4350204", 18),
            (ARBITRUM, "0x82af49447d8a07e3bd95bd0d56f35241523fbab1", 18),
        ])?);
        let avweth = Arc::new(token("AAVE Wrapped Ether", "AVWETH", swap_group::ETH, &[
            (AVALANCHE, "0x53f7c5869a859f0aec3d334ee8b4cf01e3492f21", 18),
        ])?);
        let neth_lp = Arc::new(token("Synapse ETH LP Token", "nETH-LP", swap_group::ETH, &[
            (OPTIMISM, "0x4619a06ddd3b8f0f951354ec5e75c09cd1cd1aef", 18),
            (ARBITRUM, "0xD70A52248e546A3B260849386410C7170c7BD1E9", 18),
            (AVALANCHE, "0x5dF1dB940dd8fEE0e0eB0C8917cb50b4dfaDF98c", 18),
        ])?);

        let syn = Arc::new(token("Synapse", "SYN", swap_group::SYN, &[
            (ETH, "0x0f2d719407fdbeff09d87557abb7232601fd9f29", 18),
            (OPTIMISM, "0x5A5fFf6F753d7C11A56A52FE47a177a87e431655", 18),
            (BSC, "0xa4080f1778e69467e905b8d6f72f6e441f9e9484", 18),
            (POLYGON, "0xf8f9efc0db77d8881500bb06ff5d6abc3070e695", 18),
            (FANTOM, "0xE55e19Fb4F2D85af758950957714292DAC1e25B2", 18),
            (ARBITRUM, "0x080f6aed32fc474dd5717105dba5ea57268f46eb", 18),
            (AVALANCHE, "0x1f1E7c893855525b303f99bDF5c3c05Be09ca251", 18),
            (HARMONY, "0xE55e19Fb4F2D85af758950957714292DAC1e25B2", 18),
        ])?);

        let frax = Arc::new(token("Frax", "FRAX", swap_group::FRAX, &[
            (ETH, "0x853d955acef822db058eb8505911ed77f175b99e", 18),
            (MOONRIVER, "0x1a93b23281cc1cde4c4741353f3064709a16197d", 18),
            (HARMONY, "0xFa7191D292d5633f702B0bd7E3E3BcCC0e633200", 18),
        ])?);
        let syn_frax = Arc::new(token("Synapse Frax", "synFRAX", swap_group::FRAX, &[
            (FANTOM, "0x1852F70512298d56e9c8FDd905e02581E04ddb2a", 18),
            (MOONBEAM, "0xDd47A348AB60c61Ad6B60cA8C31ea5e00eBfAB4F", 18),
            (MOONRIVER, "0xE96AC70907ffF3Efee79f502C985A7A21Bce407d", 18),
            (HARMONY, "0x1852F70512298d56e9c8FDd905e02581E04ddb2a", 18),
        ])?);

        let avax = Arc::new(Token::new("Avalanche", "AVAX", swap_group::AVAX).with_decimals(AVALANCHE, 18));
        let wavax = Arc::new(
            token("Wrapped AVAX", "wAVAX", swap_group::AVAX, &[
                (MOONBEAM, "0xA1f8890E39b4d8E33efe296D698fe42Fb5e59cC3", 18),
                (AVALANCHE, "0xb31f66aa3c1e785363f0875a1b74e27b85fd66c7", 18),
            ])?
            .wrapping(avax.clone()),
        );
        let syn_avax = Arc::new(token("Wrapped AVAX", "synAVAX", swap_group::AVAX, &[
            (HARMONY, "0xD9eAA386cCD65F30b77FF175F6b52115FE454fD6", 18),
        ])?);

        let gohm = Arc::new(token("Olympus DAO", "gOHM", swap_group::OHM, &[
            (ETH, "0x0ab87046fBb341D058F17CBC4c1133F25a20a52f", 18),
            (OPTIMISM, "0x0b5740c6b4a97f90eF2F0220651Cca420B868FfB", 18),
            (BSC, "0x88918495892BAF4536611E38E75D771Dc6Ec0863", 18),
            (POLYGON, "0xd8cA34fd379d9ca3C6Ee3b3905678320F5b45195", 18),
            (FANTOM, "0x91fa20244Fb509e8289CA630E5db3E9166233FDc", 18),
            (ARBITRUM, "0x8D9bA570D6cb60C7e3e0F31343Efe75AB8E65FB1", 18),
            (AVALANCHE, "0x321E7092a180BB43555132ec53AaA65a5bF84251", 18),
            (HARMONY, "0x67C10C397dD0Ba417329543c1a40eb48AAa7cd00", 18),
        ])?);
        let high = Arc::new(token("Highstreet", "HIGH", swap_group::HIGH, &[
            (ETH, "0x71Ab77b7dbB4fa7e017BC15090b2163221420282", 18),
            (BSC, "0x5f4bde007dc06b867f86ebfe4802e34a1ffeed63", 18),
        ])?);
        let gmx = Arc::new(token("GMX", "GMX", swap_group::GMX, &[
            (ARBITRUM, "0xfc5a1a6eb076a2c7ad06ed22c90d7e710e35ad0a", 18),
            (AVALANCHE, "0x62edc0692bd897d2295872a9ffcac5425011c661", 18),
        ])?);

        let usd_pool = |name: &str, chain: u64, swap: &str, lp: &Arc<Token>, tokens: &[&Arc<Token>]| {
            SwapPool::new(
                name,
                chain,
                swap_group::USD,
                swap,
                lp.clone(),
                tokens.iter().map(|t| (*t).clone()).collect(),
            )
        };
        let eth_pool = |name: &str, chain: u64, swap: &str, other: &Arc<Token>| {
            SwapPool::new(
                name,
                chain,
                swap_group::ETH,
                swap,
                neth_lp.clone(),
                vec![neth.clone(), other.clone()],
            )
        };

        let mut endpoints = RpcEndpoints::new();
        for (chain, url) in [
            (ETH, "https://mainnet.infura.io/v3/9aa3d95b3bc440fa88ea12eaa4456161"),
            (OPTIMISM, "https://mainnet.optimism.io"),
            (BSC, "https://bsc-dataseed.binance.org/"),
            (POLYGON, "https://polygon-rpc.com/"),
            (FANTOM, "https://rpc.ftm.tools/"),
            (BOBA, "https://replica-oolong.boba.network/"),
            (MOONBEAM, "https://rpc.api.moonbeam.network"),
            (MOONRIVER, "https://rpc.api.moonriver.moonbeam.network"),
            (ARBITRUM, "https://arb1.arbitrum.io/rpc"),
            (AVALANCHE, "https://api.avax.network/ext/bc/C/rpc"),
            (AURORA, "https://mainnet.aurora.dev"),
            (HARMONY, "https://api.harmony.one/"),
        ] {
            endpoints.insert(chain, url, None);
        }

        let mut builder = SdkConfig::builder();
        for (chain, zap) in [
            (ETH, "0x6571d6be3d8460CF5F7d6711Cd9961860029D85F"),
            (OPTIMISM, "0x470f9522ff620eE45DF86C58E54E6A645fE3b4A7"),
            (BSC, "0x749F37Df06A99D6A8E065dd065f8cF947ca23697"),
            (POLYGON, "0x1c6aE197fF4BF7BA96c66C5FD64Cb22450aF9cC8"),
            (FANTOM, "0xB003e75f7E0B5365e814302192E99b4EE08c0DEd"),
            (BOBA, "0x64B4097bCCD27D49BC2A081984C39C3EeC427a2d"),
            (MOONBEAM, "0xadA10A7474f4c71A829b55D2cB4232C281383fd5"),
            (MOONRIVER, "0xfA28DdB74b08B2b6430f5F61A1Dd5104268CC29e"),
            (ARBITRUM, "0x37f9aE2e0Ea6742b9CAD5AbCfB6bBC3475b3862B"),
            (AVALANCHE, "0x0EF812f4c68DC84c22A4821EF30ba2ffAB9C2f3A"),
            (AURORA, "0x2D8Ee8d6951cB4Eecfe4a79eb9C2F973C02596Ed"),
            (HARMONY, "0xB003e75f7E0B5365e814302192E99b4EE08c0DEd"),
        ] {
            builder = builder.bridge_zap(chain, zap)?;
        }

        builder
            .add_pool(usd_pool(
                "Ethereum Stableswap Pool",
                ETH,
                "0x1116898DdA4015eD8dDefb84b6e8Bc24528Af2d8",
                &nusd,
                &[&dai, &usdc, &usdt],
            )?)
            .add_pool(usd_pool(
                "BSC Stableswap Pool",
                BSC,
                "0x28ec0B36F0819ecB5005cAB836F4ED5a2eCa4D13",
                &nusd_lp,
                &[&nusd, &busd, &usdc, &usdt],
            )?)
            .add_pool(usd_pool(
                "Polygon Stableswap Pool",
                POLYGON,
                "0x85fCD7Dd0a1e1A9FCD5FD886ED522dE8221C3EE5",
                &nusd_lp,
                &[&nusd, &dai, &usdc, &usdt],
            )?)
            .add_pool(usd_pool(
                "Fantom Stableswap Pool",
                FANTOM,
                "0x85662fd123280827e11C59973Ac9fcBE838dC3B4",
                &nusd_lp,
                &[&nusd, &usdc, &usdt],
            )?)
            .add_pool(usd_pool(
                "Arbitrum Stableswap Pool",
                ARBITRUM,
                "0x9Dd329F5411466d9e0C488fF72519CA9fEf0cb40",
                &nusd_lp,
                &[&nusd, &usdc, &usdt],
            )?)
            .add_pool(usd_pool(
                "Avalanche Stableswap Pool",
                AVALANCHE,
                "0xED2a7edd7413021d440b09D654f3b87712abAB66",
                &nusd_lp,
                &[&nusd, &dai, &usdc, &usdt],
            )?)
            .add_pool(eth_pool(
                "Optimism ETH Pool",
                OPTIMISM,
                "0xE27BFf97CE92C3e1Ff7AA9f86781FDd6D48F5eE9",
                &weth,
            )?)
            .add_pool(eth_pool(
                "Arbitrum ETH Pool",
                ARBITRUM,
                "0xa067668661C84476aFcDc6fA5D758C4c01C34352",
                &weth,
            )?)
            .add_pool(eth_pool(
                "Avalanche ETH Pool",
                AVALANCHE,
                "0x77a7e60555bC18B4Be44C181b2575eee46212d44",
                &avweth,
            )?)
            .add_token(syn.clone())
            .add_token(frax.clone())
            .add_token(syn_frax.clone())
            .add_token(avax)
            .add_token(wavax.clone())
            .add_token(syn_avax.clone())
            .add_token(gohm)
            .add_token(high)
            .add_token(gmx)
            .intermediate_rule(swap_group::USD, IntermediateRule::via(nusd))
            .intermediate_rule(swap_group::SYN, IntermediateRule::via(syn))
            .intermediate_rule(
                swap_group::ETH,
                IntermediateRule::via(neth.clone()).bridge_config_on(ETH, weth),
            )
            .intermediate_rule(
                swap_group::FRAX,
                IntermediateRule::fee_only(syn_frax).bridge_config_on(ETH, frax),
            )
            .intermediate_rule(
                swap_group::AVAX,
                IntermediateRule::via(wavax).bridge_config_on(HARMONY, syn_avax),
            )
            .mint_burn_group(swap_group::OHM)
            .mint_burn_group(swap_group::HIGH)
            .mint_burn_group(swap_group::GMX)
            .deposit_chain(swap_group::USD, ETH)
            .deposit_chain(swap_group::ETH, ETH)
            .deposit_chain(swap_group::FRAX, ETH)
            .deposit_chain(swap_group::HIGH, ETH)
            .deposit_chain(swap_group::OHM, ETH)
            .deposit_chain(swap_group::GMX, ARBITRUM)
            .bridge_config(ETH, BRIDGE_CONFIG_V3)?
            .rpc_endpoints(endpoints)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mainnet_builds() {
        let config = SdkConfig::mainnet().unwrap();
        assert!(config.pools().len() >= 9);
        assert_eq!(config.fee_registry().unwrap().chain_id, chain_id::ETH);
        assert!(config.rpc_endpoints().get(chain_id::AVALANCHE).is_some());
    }

    #[test]
    fn test_symbol_lookup_ignores_case() {
        let config = SdkConfig::mainnet().unwrap();
        let nusd = config.token("NUSD").unwrap();
        assert_eq!(nusd.symbol(), "nUSD");
        assert!(config.token("nope").is_none());
    }

    #[test]
    fn test_address_lookup() {
        let config = SdkConfig::mainnet().unwrap();
        let addr: Address = "0xA0B86991C6218B36C1D19D4A2E9EB0CE3606EB48".parse().unwrap();
        let usdc = config.token_by_address(chain_id::ETH, &addr).unwrap();
        assert_eq!(usdc.symbol(), "USDC");
        assert!(config.token_by_address(chain_id::BSC, &addr).is_none());
    }

    #[test]
    fn test_pool_for_pair() {
        let config = SdkConfig::mainnet().unwrap();
        let usdc = config.token("USDC").unwrap();
        let busd = config.token("BUSD").unwrap();
        let dai = config.token("DAI").unwrap();

        let pool = config.pool_for_pair(chain_id::BSC, &usdc, &busd).unwrap();
        assert_eq!(pool.name, "BSC Stableswap Pool");
        // BSC's pool has no DAI.
        assert!(config.pool_for_pair(chain_id::BSC, &usdc, &dai).is_none());
        assert!(config.pool(chain_id::BSC, &SwapGroup::from(swap_group::ETH)).is_none());
    }

    #[test]
    fn test_intermediate_rules() {
        let config = SdkConfig::mainnet().unwrap();
        let eth = config.intermediate_rule(&swap_group::ETH.into()).unwrap();
        assert_eq!(eth.intermediate.as_ref().unwrap().symbol(), "nETH");
        assert_eq!(eth.bridge_config_for(chain_id::ETH).symbol(), "WETH");
        assert_eq!(eth.bridge_config_for(chain_id::ARBITRUM).symbol(), "nETH");

        let frax = config.intermediate_rule(&swap_group::FRAX.into()).unwrap();
        assert!(frax.intermediate.is_none());
        assert!(config.is_mint_burn(&swap_group::GMX.into()));
        assert!(!config.is_mint_burn(&swap_group::USD.into()));
    }

    #[test]
    fn test_bridge_zaps_and_deposit_chains() {
        let config = SdkConfig::mainnet().unwrap();
        assert_eq!(
            config.bridge_zap(chain_id::ETH).unwrap(),
            "0x6571d6be3d8460CF5F7d6711Cd9961860029D85F".parse::<Address>().unwrap()
        );
        assert!(chain_id::ALL.iter().all(|&id| config.bridge_zap(id).is_ok()));
        assert_eq!(config.bridge_zap(31337), Err(ConfigError::NoBridgeZap { chain_id: 31337 }));

        assert!(config.deposits_on(chain_id::ETH, &swap_group::USD.into()));
        assert!(!config.deposits_on(chain_id::BSC, &swap_group::USD.into()));
        assert!(config.deposits_on(chain_id::ARBITRUM, &swap_group::GMX.into()));
        assert!(!config.deposits_on(chain_id::ETH, &swap_group::SYN.into()));
    }

    #[test]
    fn test_build_rejects_pool_token_off_chain() {
        let lp = Arc::new(
            Token::new("LP", "LP", "X")
                .with_address(chain_id::ETH, "0x0000000000000000000000000000000000000001")
                .unwrap()
                .with_decimals(chain_id::ETH, 18),
        );
        let stray = Arc::new(Token::new("Stray", "STRAY", "X"));
        let pool = SwapPool::new(
            "Bad",
            chain_id::ETH,
            "X",
            "0x0000000000000000000000000000000000000002",
            lp,
            vec![stray],
        )
        .unwrap();

        let err = SdkConfig::builder().add_pool(pool).build().unwrap_err();
        assert_eq!(
            err,
            ConfigError::TokenNotOnChain {
                symbol: "STRAY".to_string(),
                chain_id: chain_id::ETH
            }
        );
    }
}
