//! Fixtures for exercising the gate without a live platform or chain.

use crate::{
    error::X402Error,
    models::{Log, TransactionReceipt, TxStatus},
    services::{
        platform::DEFAULT_PLATFORM_TIMEOUT,
        ChainRpc, EventSink, PlatformClient, PlatformEvent, ProjectConfigResolver, X402Context,
    },
};
use async_trait::async_trait;
use ethers::{
    types::{Address, Bytes, H256, U256},
    utils::keccak256,
};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

pub const APP_ID: &str = "app_1";
pub const PAY_TO: &str = "0x2222222222222222222222222222222222222222";
pub const PAID_HASH: &str = "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060";
pub const UNKNOWN_HASH: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";

#[derive(Default)]
pub struct StubRpc {
    receipts: HashMap<String, TransactionReceipt>,
    requested: Mutex<Vec<String>>,
}

impl StubRpc {
    pub fn with_receipt(mut self, receipt: TransactionReceipt) -> Self {
        self.receipts
            .insert(format!("{:?}", receipt.transaction_hash), receipt);
        self
    }

    /// RPC URLs seen so far, in call order.
    pub fn requested_urls(&self) -> Vec<String> {
        self.requested.lock().map(|u| u.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ChainRpc for StubRpc {
    async fn transaction_receipt(
        &self,
        rpc_url: &str,
        tx_hash: &str,
    ) -> Result<Option<TransactionReceipt>, X402Error> {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(rpc_url.to_string());
        }
        Ok(self.receipts.get(&tx_hash.to_lowercase()).cloned())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PlatformEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<PlatformEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: PlatformEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Successful native transfer of `value` wei to [`PAY_TO`].
pub fn native_payment(value: U256) -> TransactionReceipt {
    TransactionReceipt {
        transaction_hash: H256::from_str(PAID_HASH).unwrap(),
        block_number: 42,
        status: TxStatus::Success,
        from: Address::repeat_byte(0x11),
        to: Some(Address::from_str(PAY_TO).unwrap()),
        value,
        logs: vec![],
    }
}

/// Successful contract call whose only log is an ERC20 `Transfer` of
/// `value` base units from `token` to [`PAY_TO`].
pub fn erc20_payment(token: Address, value: U256) -> TransactionReceipt {
    let mut data = [0u8; 32];
    value.to_big_endian(&mut data);
    let transfer = Log {
        address: token,
        topics: vec![
            H256::from(keccak256("Transfer(address,address,uint256)")),
            H256::from(Address::repeat_byte(0x11)),
            H256::from(Address::from_str(PAY_TO).unwrap()),
        ],
        data: Bytes::from(data.to_vec()),
    };

    TransactionReceipt {
        to: Some(token),
        value: U256::zero(),
        logs: vec![transfer],
        ..native_payment(U256::zero())
    }
}

pub fn project_body(network: &str) -> String {
    serde_json::json!({
        "appId": APP_ID,
        "name": "Demo",
        "payTo": PAY_TO,
        "network": network,
        "status": "ACTIVE"
    })
    .to_string()
}

pub async fn mock_project(server: &mut mockito::ServerGuard, network: &str) -> mockito::Mock {
    server
        .mock("GET", format!("/api/projects/{APP_ID}").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(project_body(network))
        .create_async()
        .await
}

pub fn context(
    platform_url: &str,
    rpc: impl Into<Arc<StubRpc>>,
    sink: Arc<RecordingSink>,
) -> Arc<X402Context> {
    let rpc: Arc<StubRpc> = rpc.into();
    let resolver = ProjectConfigResolver::new(
        Some(APP_ID.to_string()),
        Arc::new(PlatformClient::new(platform_url, DEFAULT_PLATFORM_TIMEOUT).unwrap()),
    );
    Arc::new(X402Context::new(resolver, rpc, sink))
}
