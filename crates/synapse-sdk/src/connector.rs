use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::provider::{BatchingProvider, DEFAULT_BATCH_INTERVAL};
use crate::types::chain::{chain_id, rpc_env_key};

pub const BATCH_INTERVAL_ENV: &str = "RPC_BATCH_INTERVAL";

/// One chain's RPC endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcEndpoint {
    pub endpoint: String,
    /// Batch window in milliseconds; the global default applies when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_interval: Option<u64>,
}

/// Per-chain RPC endpoints plus the default batch window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcEndpoints {
    endpoints: BTreeMap<u64, RpcEndpoint>,
    default_interval: Duration,
}

impl Default for RpcEndpoints {
    fn default() -> Self {
        Self {
            endpoints: BTreeMap::new(),
            default_interval: DEFAULT_BATCH_INTERVAL,
        }
    }
}

impl RpcEndpoints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `{"<chainId>": {"endpoint": "...", "batchInterval": 50}, ...}`.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let endpoints: BTreeMap<u64, RpcEndpoint> =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Ok(Self {
            endpoints,
            ..Self::default()
        })
    }

    pub fn insert(&mut self, chain_id: u64, endpoint: impl Into<String>, batch_interval: Option<u64>) {
        self.endpoints.insert(
            chain_id,
            RpcEndpoint {
                endpoint: endpoint.into(),
                batch_interval,
            },
        );
    }

    pub fn with_default_interval(mut self, interval: Duration) -> Self {
        self.default_interval = interval;
        self
    }

    /// Apply `<CHAIN>_RPC_URI` and `RPC_BATCH_INTERVAL` from the process
    /// environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup. A chain with no
    /// endpoint yet gets one from its variable.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(ms) = lookup(BATCH_INTERVAL_ENV).and_then(|v| v.trim().parse::<u64>().ok()) {
            if ms > 0 {
                self.default_interval = Duration::from_millis(ms);
            }
        }

        for chain_id in chain_id::ALL {
            let Some(key) = rpc_env_key(chain_id) else {
                continue;
            };
            if let Some(uri) = lookup(key).filter(|v| !v.trim().is_empty()) {
                debug!(chain_id, key, "rpc endpoint overridden from environment");
                self.endpoints
                    .entry(chain_id)
                    .and_modify(|entry| entry.endpoint = uri.clone())
                    .or_insert(RpcEndpoint {
                        endpoint: uri,
                        batch_interval: None,
                    });
            }
        }
        self
    }

    pub fn get(&self, chain_id: u64) -> Option<&RpcEndpoint> {
        self.endpoints.get(&chain_id)
    }

    pub fn chain_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.endpoints.keys().copied()
    }

    /// Effective batch window for `chain_id`.
    pub fn batch_interval(&self, chain_id: u64) -> Duration {
        self.endpoints
            .get(&chain_id)
            .and_then(|e| e.batch_interval)
            .map(Duration::from_millis)
            .unwrap_or(self.default_interval)
    }

    pub fn default_interval(&self) -> Duration {
        self.default_interval
    }
}

/// Lazily built, per-chain batching providers.
#[derive(Debug)]
pub struct RpcConnector {
    endpoints: RpcEndpoints,
    providers: RwLock<HashMap<u64, BatchingProvider>>,
}

impl RpcConnector {
    pub fn new(endpoints: RpcEndpoints) -> Self {
        Self {
            endpoints,
            providers: RwLock::new(HashMap::new()),
        }
    }

    pub fn endpoints(&self) -> &RpcEndpoints {
        &self.endpoints
    }

    /// Provider for `chain_id`, created from the configured endpoint on first
    /// use. Every call for the same chain shares one batch queue.
    pub fn provider(&self, chain_id: u64) -> Result<BatchingProvider, ConfigError> {
        if let Some(provider) = self
            .providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&chain_id)
        {
            return Ok(provider.clone());
        }

        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(provider) = providers.get(&chain_id) {
            return Ok(provider.clone());
        }
        let provider = self.build_provider(chain_id)?;
        providers.insert(chain_id, provider.clone());
        Ok(provider)
    }

    /// Replace the provider for `chain_id` with one pointed at `url`.
    #[cfg(feature = "http")]
    pub fn set_provider_endpoint(&self, chain_id: u64, url: impl Into<String>, batch_interval: Option<Duration>) {
        let interval = batch_interval.unwrap_or_else(|| self.endpoints.batch_interval(chain_id));
        let provider = BatchingProvider::http(chain_id, url, interval);
        self.set_provider(provider);
    }

    /// Install a pre-built provider, e.g. one with a custom transport.
    pub fn set_provider(&self, provider: BatchingProvider) {
        let chain_id = provider.chain_id();
        self.providers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(chain_id, provider);
    }

    #[cfg(feature = "http")]
    fn build_provider(&self, chain_id: u64) -> Result<BatchingProvider, ConfigError> {
        let endpoint = self
            .endpoints
            .get(chain_id)
            .ok_or(ConfigError::NoProvider { chain_id })?;
        Ok(BatchingProvider::http(
            chain_id,
            endpoint.endpoint.clone(),
            self.endpoints.batch_interval(chain_id),
        ))
    }

    #[cfg(not(feature = "http"))]
    fn build_provider(&self, chain_id: u64) -> Result<BatchingProvider, ConfigError> {
        Err(ConfigError::NoProvider { chain_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{provider, MockTransport};
    use crate::types::chain::chain_id;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_from_json() {
        let endpoints = RpcEndpoints::from_json(
            r#"{
                "1": {"endpoint": "https://eth.example"},
                "43114": {"endpoint": "https://avax.example", "batchInterval": 10}
            }"#,
        )
        .unwrap();
        assert_eq!(endpoints.get(1).unwrap().endpoint, "https://eth.example");
        assert_eq!(endpoints.batch_interval(1), Duration::from_millis(50));
        assert_eq!(endpoints.batch_interval(43114), Duration::from_millis(10));
        assert_eq!(endpoints.chain_ids().collect::<Vec<_>>(), vec![1, 43114]);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            RpcEndpoints::from_json("[1,2]"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut endpoints = RpcEndpoints::new();
        endpoints.insert(chain_id::ETH, "https://default.example", None);
        endpoints.insert(chain_id::BSC, "https://bsc.example", Some(5));

        let vars: HashMap<&str, &str> = [
            ("ETH_RPC_URI", "https://override.example"),
            ("RPC_BATCH_INTERVAL", "80"),
        ]
        .into_iter()
        .collect();
        let endpoints = endpoints.with_overrides_from(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(endpoints.get(chain_id::ETH).unwrap().endpoint, "https://override.example");
        assert_eq!(endpoints.get(chain_id::BSC).unwrap().endpoint, "https://bsc.example");
        assert_eq!(endpoints.batch_interval(chain_id::ETH), Duration::from_millis(80));
        assert_eq!(endpoints.batch_interval(chain_id::BSC), Duration::from_millis(5));
    }

    #[test]
    fn test_env_adds_missing_endpoint() {
        let mut endpoints = RpcEndpoints::new();
        endpoints.insert(chain_id::ETH, "https://default.example", None);

        let endpoints = endpoints.with_overrides_from(|k| {
            (k == "AVALANCHE_RPC_URI").then(|| "https://avax.example".to_string())
        });

        assert_eq!(endpoints.get(chain_id::AVALANCHE).unwrap().endpoint, "https://avax.example");
        assert_eq!(endpoints.batch_interval(chain_id::AVALANCHE), DEFAULT_BATCH_INTERVAL);
        assert_eq!(endpoints.get(chain_id::ETH).unwrap().endpoint, "https://default.example");
        assert_eq!(endpoints.chain_ids().collect::<Vec<_>>(), vec![chain_id::ETH, chain_id::AVALANCHE]);
        assert!(endpoints.get(chain_id::BSC).is_none());
    }

    #[test]
    fn test_bad_interval_is_ignored() {
        let endpoints = RpcEndpoints::new().with_overrides_from(|k| {
            (k == BATCH_INTERVAL_ENV).then(|| "soon".to_string())
        });
        assert_eq!(endpoints.default_interval(), DEFAULT_BATCH_INTERVAL);
    }

    #[test]
    fn test_unknown_chain_has_no_provider() {
        let connector = RpcConnector::new(RpcEndpoints::new());
        assert_eq!(
            connector.provider(31337).unwrap_err(),
            ConfigError::NoProvider { chain_id: 31337 }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_providers_are_shared_per_chain() {
        let transport = Arc::new(MockTransport::new(|_| Ok(json!("0x1"))));
        let connector = RpcConnector::new(RpcEndpoints::new());
        connector.set_provider(provider(chain_id::ETH, &transport));

        let a = connector.provider(chain_id::ETH).unwrap().request("eth_blockNumber", json!([]));
        let b = connector.provider(chain_id::ETH).unwrap().request("eth_gasPrice", json!([]));
        a.await.unwrap();
        b.await.unwrap();
        assert_eq!(transport.batch_count(), 1);
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_provider_built_from_endpoint() {
        let mut endpoints = RpcEndpoints::new();
        endpoints.insert(chain_id::AVALANCHE, "https://avax.example", Some(15));
        let connector = RpcConnector::new(endpoints);
        let provider = connector.provider(chain_id::AVALANCHE).unwrap();
        assert_eq!(provider.chain_id(), chain_id::AVALANCHE);
        assert_eq!(provider.batch_interval(), Duration::from_millis(15));

        connector.set_provider_endpoint(chain_id::AVALANCHE, "https://other.example", None);
        assert_eq!(
            connector.provider(chain_id::AVALANCHE).unwrap().batch_interval(),
            Duration::from_millis(15)
        );
    }
}
