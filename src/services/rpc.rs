use crate::{
    error::X402Error,
    models::{Log, TransactionReceipt, TxStatus},
};
use async_trait::async_trait;
use ethers::types::{Transaction, TransactionReceipt as NodeReceipt, U256, U64};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(10);

/// Read access to chain state needed for payment verification.
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// `Ok(None)` when the node has no receipt yet (unknown or pending).
    async fn transaction_receipt(
        &self,
        rpc_url: &str,
        tx_hash: &str,
    ) -> Result<Option<TransactionReceipt>, X402Error>;
}

/// Minimal JSON-RPC 2.0 client over HTTP.
pub struct RpcClient {
    client: reqwest::Client,
    next_id: AtomicU64,
}

#[derive(Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl RpcClient {
    pub fn new(timeout: Duration) -> Result<Self, X402Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            next_id: AtomicU64::new(1),
        })
    }

    /// Issues one JSON-RPC call. Transport failures are retried once; an
    /// `error` envelope from the node is returned as-is.
    pub async fn call(&self, url: &str, method: &str, params: Value) -> Result<Value, X402Error> {
        match self.call_once(url, method, &params).await {
            Err(X402Error::Transport(reason)) => {
                tracing::warn!("RPC {} to {} failed ({}), retrying once", method, url, reason);
                self.call_once(url, method, &params).await
            }
            other => other,
        }
    }

    async fn call_once(&self, url: &str, method: &str, params: &Value) -> Result<Value, X402Error> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });

        let response = self.client.post(url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(X402Error::Transport(format!(
                "HTTP {} from {} for {}",
                status.as_u16(),
                url,
                method
            )));
        }

        let envelope: RpcEnvelope = response
            .json()
            .await
            .map_err(|e| X402Error::InvalidResponse(format!("{method}: {e}")))?;

        if let Some(error) = envelope.error {
            return Err(X402Error::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        Ok(envelope.result.unwrap_or(Value::Null))
    }

    pub async fn get_transaction_receipt(
        &self,
        rpc_url: &str,
        tx_hash: &str,
    ) -> Result<Option<TransactionReceipt>, X402Error> {
        let (receipt, transaction) = tokio::try_join!(
            self.call(rpc_url, "eth_getTransactionReceipt", json!([tx_hash])),
            self.call(rpc_url, "eth_getTransactionByHash", json!([tx_hash])),
        )?;

        if receipt.is_null() {
            tracing::debug!("No receipt yet for {}", tx_hash);
            return Ok(None);
        }

        let receipt: NodeReceipt = serde_json::from_value(receipt)?;
        let transaction: Option<Transaction> = if transaction.is_null() {
            None
        } else {
            Some(serde_json::from_value(transaction)?)
        };

        Ok(Some(merge_receipt(receipt, transaction)))
    }
}

fn merge_receipt(receipt: NodeReceipt, transaction: Option<Transaction>) -> TransactionReceipt {
    let status = if receipt.status == Some(U64::one()) {
        TxStatus::Success
    } else {
        TxStatus::Failed
    };
    let (to, value) = match transaction {
        Some(tx) => (tx.to.or(receipt.to), tx.value),
        None => (receipt.to, U256::zero()),
    };

    TransactionReceipt {
        transaction_hash: receipt.transaction_hash,
        block_number: receipt.block_number.map(|n| n.as_u64()).unwrap_or_default(),
        status,
        from: receipt.from,
        to,
        value,
        logs: receipt
            .logs
            .into_iter()
            .map(|log| Log {
                address: log.address,
                topics: log.topics,
                data: log.data,
            })
            .collect(),
    }
}

#[async_trait]
impl ChainRpc for RpcClient {
    async fn transaction_receipt(
        &self,
        rpc_url: &str,
        tx_hash: &str,
    ) -> Result<Option<TransactionReceipt>, X402Error> {
        self.get_transaction_receipt(rpc_url, tx_hash).await
    }
}
