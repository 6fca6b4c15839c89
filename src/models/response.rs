use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub project_initialized: bool,
    pub network: Option<String>,
    pub chain_id: Option<u64>,
    pub uptime_seconds: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct PremiumContent {
    pub message: String,
    pub transaction_hash: Option<String>,
    pub paid_amount: Option<String>,
    pub paid_token: Option<String>,
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}
