use crate::models::{BlockchainVerification, NetworkConfig, TokenConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const PAYMENT_REQUIRED_STATUS: u16 = 402;
pub const INTERNAL_ERROR_STATUS: u16 = 500;

/// Per-route payment requirements.
#[derive(Debug, Clone, Default)]
pub struct PaymentOptions {
    /// Decimal amount, e.g. `"0.01"`.
    pub price: String,
    /// Token symbol; the native asset symbol selects the native-value path.
    pub token: String,
    pub network: Option<String>,
    pub testnet: bool,
    pub rpc_url: Option<String>,
    pub custom_network: Option<(String, NetworkConfig)>,
    /// Network key -> (symbol -> token).
    pub custom_tokens: HashMap<String, HashMap<String, TokenConfig>>,
}

impl PaymentOptions {
    pub fn new(price: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            price: price.into(),
            token: token.into(),
            ..Default::default()
        }
    }

    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = Some(network.into());
        self
    }

    pub fn with_testnet(mut self, testnet: bool) -> Self {
        self.testnet = testnet;
        self
    }

    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = Some(rpc_url.into());
        self
    }

    pub fn with_custom_network(mut self, key: impl Into<String>, config: NetworkConfig) -> Self {
        self.custom_network = Some((key.into(), config));
        self
    }

    pub fn with_custom_token(mut self, network: impl Into<String>, token: TokenConfig) -> Self {
        self.custom_tokens
            .entry(network.into())
            .or_default()
            .insert(token.symbol.clone(), token);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequiredBody {
    pub error: String,
    pub amount: String,
    pub token: String,
    pub network: String,
    pub chain_id: u64,
    pub recipient: String,
}

/// Structured 402 challenge, independent of any HTTP framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequiredResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: PaymentRequiredBody,
}

impl PaymentRequiredResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiddlewareError {
    pub status: u16,
    pub message: String,
}

impl MiddlewareError {
    pub fn payment(message: impl Into<String>) -> Self {
        Self {
            status: PAYMENT_REQUIRED_STATUS,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: INTERNAL_ERROR_STATUS,
            message: message.into(),
        }
    }
}

/// Outcome of running the payment gate for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentDecision {
    Allowed(BlockchainVerification),
    PaymentRequired(PaymentRequiredResponse),
    Denied(MiddlewareError),
}

impl PaymentDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, PaymentDecision::Allowed(_))
    }

    pub fn payment_required(&self) -> Option<&PaymentRequiredResponse> {
        match self {
            PaymentDecision::PaymentRequired(challenge) => Some(challenge),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&MiddlewareError> {
        match self {
            PaymentDecision::Denied(error) => Some(error),
            _ => None,
        }
    }
}
