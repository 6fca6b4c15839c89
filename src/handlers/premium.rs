use crate::models::{BlockchainVerification, PremiumContent};
use axum::{Extension, Json};
use chrono::Utc;
use uuid::Uuid;

// Payment middleware already verified the transaction.
pub async fn premium_content(
    verification: Option<Extension<BlockchainVerification>>,
) -> Json<PremiumContent> {
    let verification = verification.map(|Extension(v)| v).unwrap_or_default();

    Json(PremiumContent {
        message: "Thanks for paying! Here is your premium content.".to_string(),
        transaction_hash: verification.transaction_hash,
        paid_amount: verification.amount,
        paid_token: verification.token,
        request_id: Uuid::new_v4().to_string(),
        timestamp: Utc::now(),
    })
}
