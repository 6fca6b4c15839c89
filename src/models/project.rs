use ethers::types::Address;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    Active,
    Inactive,
    Suspended,
    #[serde(other)]
    Unknown,
}

/// Tenant identity validated against the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub app_id: String,
    pub name: String,
    pub pay_to: Address,
    pub network: String,
    pub status: ProjectStatus,
}

impl ProjectConfig {
    /// Recipient formatted as lowercase `0x` hex, the form used on the wire.
    pub fn pay_to_hex(&self) -> String {
        format!("{:?}", self.pay_to)
    }
}
