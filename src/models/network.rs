use ethers::types::Address;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkEnvironment {
    Mainnet,
    Testnet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub rpc_url: String,
    pub name: String,
    pub environment: NetworkEnvironment,
    pub native_currency: NativeCurrency,
    pub block_explorer: String,
}

impl NetworkConfig {
    pub fn is_testnet(&self) -> bool {
        self.environment == NetworkEnvironment::Testnet
    }

    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.block_explorer.trim_end_matches('/'), tx_hash)
    }
}

/// ERC20 deployment of a token on one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub address: Address,
    pub decimals: u32,
    pub symbol: String,
}
