//! Network and token lookup tables.
//!
//! Presets are static and immutable. Entries registered at runtime live in
//! the registry instance and are consulted before the presets, so they can
//! shadow a preset key without altering it. [`NetworkRegistry::reset`] drops
//! every runtime entry.

use crate::models::{NativeCurrency, NetworkConfig, NetworkEnvironment, TokenConfig};
use dashmap::DashMap;
use ethers::types::Address;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::LazyLock;

pub const DEFAULT_NETWORK: &str = "mantle";
pub const TESTNET_NETWORK: &str = "mantle-sepolia";
pub const NATIVE_SYMBOL: &str = "MNT";

pub const RPC_URL_ENV: &str = "X402_RPC_URL";

fn mantle_currency() -> NativeCurrency {
    NativeCurrency {
        name: "Mantle".to_string(),
        symbol: NATIVE_SYMBOL.to_string(),
        decimals: 18,
    }
}

static PRESET_NETWORKS: LazyLock<HashMap<&'static str, NetworkConfig>> = LazyLock::new(|| {
    HashMap::from([
        (
            DEFAULT_NETWORK,
            NetworkConfig {
                chain_id: 5000,
                rpc_url: "https://rpc.mantle.xyz".to_string(),
                name: "Mantle".to_string(),
                environment: NetworkEnvironment::Mainnet,
                native_currency: mantle_currency(),
                block_explorer: "https://explorer.mantle.xyz".to_string(),
            },
        ),
        (
            TESTNET_NETWORK,
            NetworkConfig {
                chain_id: 5003,
                rpc_url: "https://rpc.sepolia.mantle.xyz".to_string(),
                name: "Mantle Sepolia".to_string(),
                environment: NetworkEnvironment::Testnet,
                native_currency: mantle_currency(),
                block_explorer: "https://sepolia.mantlescan.xyz".to_string(),
            },
        ),
    ])
});

// (network, symbol, address, decimals)
const PRESET_TOKEN_TABLE: &[(&str, &str, &str, u32)] = &[
    (DEFAULT_NETWORK, "USDC", "09Bc4E0D864854c6aFB6eB9A9cdF58aC190D0dF9", 6),
    (DEFAULT_NETWORK, "USDT", "201EBa5CC46D216Ce6DC03F6a759e8E766e956aE", 6),
    (DEFAULT_NETWORK, "WETH", "dEAddEaDdeadDEadDEADDEAddEADDEAddead1111", 18),
];

static PRESET_TOKENS: LazyLock<HashMap<(String, String), TokenConfig>> =
    LazyLock::new(|| {
        PRESET_TOKEN_TABLE
            .iter()
            .filter_map(|(network, symbol, address, decimals)| {
                let address = Address::from_str(address).ok()?;
                Some((
                    (network.to_string(), symbol.to_string()),
                    TokenConfig {
                        address,
                        decimals: *decimals,
                        symbol: symbol.to_string(),
                    },
                ))
            })
            .collect()
    });

/// `X402_RPC_URL_<NETWORK>` with the key uppercased and dashes replaced.
pub fn network_rpc_env(network: &str) -> String {
    format!(
        "{}_{}",
        RPC_URL_ENV,
        network.to_uppercase().replace('-', "_")
    )
}

#[derive(Debug, Default)]
pub struct NetworkRegistry {
    custom_networks: DashMap<String, NetworkConfig>,
    custom_tokens: DashMap<(String, String), TokenConfig>,
}

impl NetworkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never fails: unknown keys resolve to the default mainnet entry.
    pub fn network_config(&self, network: &str) -> NetworkConfig {
        let key = network.to_lowercase();
        if let Some(custom) = self.custom_networks.get(&key) {
            return custom.clone();
        }
        if let Some(preset) = PRESET_NETWORKS.get(key.as_str()) {
            return preset.clone();
        }
        tracing::debug!("Unknown network {:?}, falling back to {}", network, DEFAULT_NETWORK);
        PRESET_NETWORKS[DEFAULT_NETWORK].clone()
    }

    pub fn chain_id(&self, network: &str) -> u64 {
        self.network_config(network).chain_id
    }

    /// True for the reserved `MNT` symbol and for the network's own native
    /// currency symbol.
    pub fn is_native(&self, token: &str, network: &str) -> bool {
        token.eq_ignore_ascii_case(NATIVE_SYMBOL)
            || token.eq_ignore_ascii_case(&self.network_config(network).native_currency.symbol)
    }

    /// `None` for native assets and for unknown tokens.
    pub fn token_config(&self, token: &str, network: &str) -> Option<TokenConfig> {
        if self.is_native(token, network) {
            return None;
        }
        let network = network.to_lowercase();
        let symbol = token.to_uppercase();

        let key = (network, symbol);
        if let Some(custom) = self.custom_tokens.get(&key) {
            return Some(custom.clone());
        }
        PRESET_TOKENS.get(&key).cloned()
    }

    pub fn rpc_url(&self, network: &str, override_url: Option<&str>) -> String {
        self.rpc_url_with(network, override_url, |name| std::env::var(name).ok())
    }

    /// Precedence: explicit override, `X402_RPC_URL_<NETWORK>`, `X402_RPC_URL`,
    /// then the network's configured URL.
    pub fn rpc_url_with<F>(&self, network: &str, override_url: Option<&str>, env: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |value: String| (!value.trim().is_empty()).then_some(value);

        if let Some(url) = override_url.map(str::to_string).and_then(non_blank) {
            return url;
        }
        if let Some(url) = env(&network_rpc_env(network)).and_then(non_blank) {
            return url;
        }
        if let Some(url) = env(RPC_URL_ENV).and_then(non_blank) {
            return url;
        }
        self.network_config(network).rpc_url
    }

    pub fn register_custom_network(&self, key: &str, config: NetworkConfig) {
        tracing::debug!("Registering custom network {} (chain {})", key, config.chain_id);
        self.custom_networks.insert(key.to_lowercase(), config);
    }

    pub fn register_custom_tokens<I>(&self, network: &str, tokens: I)
    where
        I: IntoIterator<Item = (String, TokenConfig)>,
    {
        let network = network.to_lowercase();
        for (symbol, token) in tokens {
            self.custom_tokens
                .insert((network.clone(), symbol.to_uppercase()), token);
        }
    }

    pub fn reset(&self) {
        self.custom_networks.clear();
        self.custom_tokens.clear();
    }
}
