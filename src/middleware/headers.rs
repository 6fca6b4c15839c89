use crate::models::PaymentReceipt;
use std::collections::HashMap;

pub const TX_HASH_HEADER: &str = "x-402-transaction-hash";
pub const TIMESTAMP_HEADER: &str = "x-402-timestamp";

pub const AMOUNT_HEADER: &str = "X-402-Amount";
pub const TOKEN_HEADER: &str = "X-402-Token";
pub const NETWORK_HEADER: &str = "X-402-Network";
pub const CHAIN_ID_HEADER: &str = "X-402-Chain-Id";
pub const RECIPIENT_HEADER: &str = "X-402-Recipient";

/// Case-insensitive, string-keyed header access.
pub trait HeaderLookup {
    fn header(&self, name: &str) -> Option<&str>;
}

/// Plain header mapping with lowercased keys. The first value wins when a
/// header repeats.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Headers(HashMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.0
            .entry(name.to_ascii_lowercase())
            .or_insert_with(|| value.into());
    }

    pub fn from_header_map(map: &axum::http::HeaderMap) -> Self {
        map.iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name.as_ref(), value);
        }
        headers
    }
}

impl HeaderLookup for Headers {
    fn header(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

impl HeaderLookup for axum::http::HeaderMap {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|value| value.to_str().ok())
    }
}

pub fn extract_payment_receipt<H: HeaderLookup + ?Sized>(headers: &H) -> Option<PaymentReceipt> {
    let transaction_hash = headers
        .header(TX_HASH_HEADER)
        .map(str::trim)
        .filter(|hash| !hash.is_empty())?;

    Some(PaymentReceipt {
        transaction_hash: transaction_hash.to_string(),
        timestamp: headers
            .header(TIMESTAMP_HEADER)
            .map(str::trim)
            .filter(|ts| !ts.is_empty())
            .map(str::to_string),
    })
}
