use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockchainVerification {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BlockchainVerification {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn verified(
        transaction_hash: String,
        amount: String,
        token: String,
        block_number: u64,
    ) -> Self {
        Self {
            valid: true,
            transaction_hash: Some(transaction_hash),
            amount: Some(amount),
            token: Some(token),
            block_number: Some(block_number),
            error: None,
        }
    }

    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or("Payment verification failed")
    }
}
