use ethers::types::{Address, Bytes, H256, U256};
use serde::{Deserialize, Serialize};

/// Payment proof supplied by the client in request headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub transaction_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<H256>,
    pub data: Bytes,
}

/// Chain-observed outcome of a transaction, merged from the receipt and the
/// transaction object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub transaction_hash: H256,
    pub block_number: u64,
    pub status: TxStatus,
    pub from: Address,
    pub to: Option<Address>,
    pub value: U256,
    pub logs: Vec<Log>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Erc20Transfer {
    pub from: Address,
    pub to: Address,
    pub value: U256,
    pub token_address: Address,
}
