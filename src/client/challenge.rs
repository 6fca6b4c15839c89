use crate::{
    middleware::headers::{
        HeaderLookup, AMOUNT_HEADER, CHAIN_ID_HEADER, NETWORK_HEADER, RECIPIENT_HEADER,
        TOKEN_HEADER,
    },
    models::PaymentRequiredBody,
};
use serde::{Deserialize, Serialize};

/// Payment terms read back from a 402 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentChallenge {
    pub amount: String,
    pub token: String,
    pub network: String,
    pub chain_id: u64,
    pub recipient: String,
}

impl PaymentChallenge {
    /// `None` unless every challenge header is present and the chain id
    /// parses.
    pub fn from_headers<H: HeaderLookup + ?Sized>(headers: &H) -> Option<Self> {
        Some(Self {
            amount: headers.header(AMOUNT_HEADER)?.to_string(),
            token: headers.header(TOKEN_HEADER)?.to_string(),
            network: headers.header(NETWORK_HEADER)?.to_string(),
            chain_id: headers.header(CHAIN_ID_HEADER)?.trim().parse().ok()?,
            recipient: headers.header(RECIPIENT_HEADER)?.to_string(),
        })
    }

    pub fn from_body(body: &PaymentRequiredBody) -> Self {
        Self {
            amount: body.amount.clone(),
            token: body.token.clone(),
            network: body.network.clone(),
            chain_id: body.chain_id,
            recipient: body.recipient.clone(),
        }
    }

    /// Headers take precedence; the JSON body is the fallback.
    pub fn parse<H: HeaderLookup + ?Sized>(headers: &H, body: &str) -> Option<Self> {
        Self::from_headers(headers).or_else(|| {
            serde_json::from_str::<PaymentRequiredBody>(body)
                .ok()
                .map(|b| Self::from_body(&b))
        })
    }
}
