/// EVM chain identifiers the default catalog knows about.
pub mod chain_id {
    pub const ETH: u64 = 1;
    pub const OPTIMISM: u64 = 10;
    pub const BSC: u64 = 56;
    pub const POLYGON: u64 = 137;
    pub const FANTOM: u64 = 250;
    pub const BOBA: u64 = 288;
    pub const MOONBEAM: u64 = 1284;
    pub const MOONRIVER: u64 = 1285;
    pub const ARBITRUM: u64 = 42161;
    pub const AVALANCHE: u64 = 43114;
    pub const AURORA: u64 = 1313161554;
    pub const HARMONY: u64 = 1666600000;

    pub const ALL: [u64; 12] = [
        ETH, OPTIMISM, BSC, POLYGON, FANTOM, BOBA, MOONBEAM, MOONRIVER, ARBITRUM, AVALANCHE, AURORA, HARMONY,
    ];
}

/// Known chain IDs → human-readable names.
pub fn chain_name(chain_id: u64) -> String {
    match chain_id {
        chain_id::ETH => "Ethereum".to_string(),
        chain_id::OPTIMISM => "Optimism".to_string(),
        chain_id::BSC => "BNB Chain".to_string(),
        chain_id::POLYGON => "Polygon".to_string(),
        chain_id::FANTOM => "Fantom".to_string(),
        chain_id::BOBA => "Boba".to_string(),
        chain_id::MOONBEAM => "Moonbeam".to_string(),
        chain_id::MOONRIVER => "Moonriver".to_string(),
        chain_id::ARBITRUM => "Arbitrum One".to_string(),
        chain_id::AVALANCHE => "Avalanche".to_string(),
        chain_id::AURORA => "Aurora".to_string(),
        chain_id::HARMONY => "Harmony".to_string(),
        _ => format!("Chain {chain_id}"),
    }
}

/// Environment variable that overrides the RPC endpoint for a chain.
pub fn rpc_env_key(chain_id: u64) -> Option<&'static str> {
    let key = match chain_id {
        chain_id::ETH => "ETH_RPC_URI",
        chain_id::OPTIMISM => "OPTIMISM_RPC_URI",
        chain_id::BSC => "BSC_RPC_URI",
        chain_id::POLYGON => "POLYGON_RPC_URI",
        chain_id::FANTOM => "FANTOM_RPC_URI",
        chain_id::BOBA => "BOBA_RPC_URI",
        chain_id::MOONBEAM => "MOONBEAM_RPC_URI",
        chain_id::MOONRIVER => "MOONRIVER_RPC_URI",
        chain_id::ARBITRUM => "ARBITRUM_RPC_URI",
        chain_id::AVALANCHE => "AVALANCHE_RPC_URI",
        chain_id::AURORA => "AURORA_RPC_URI",
        chain_id::HARMONY => "HARMONY_RPC_URI",
        _ => return None,
    };
    Some(key)
}
