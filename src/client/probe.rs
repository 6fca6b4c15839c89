use anyhow::{bail, Result};
use reqwest::Client;
use serde_json::Value;
use x402_devkit::{
    client::PaymentChallenge,
    middleware::{headers::TX_HASH_HEADER, Headers},
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();

    let base_url = std::env::var("X402_GATEWAY_URL")
        .unwrap_or_else(|_| "http://localhost:8080".to_string());
    let endpoint = std::env::var("X402_PROBE_PATH").unwrap_or_else(|_| "/api/premium".to_string());
    let tx_hash = std::env::var("X402_TX_HASH").ok();

    println!("x402 Probe");
    println!("==========");
    println!("Server:   {}", base_url);
    println!("Endpoint: {}", endpoint);
    println!();

    let client = Client::new();
    let url = format!("{}{}", base_url, endpoint);

    println!("Step 1: Requesting without payment (expecting 402)...");
    let response = client.get(&url).send().await?;
    if response.status() != 402 {
        bail!("Expected 402 Payment Required, got {}", response.status());
    }

    let headers: Headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            let value = value.to_str().ok()?;
            Some((name.as_str().to_string(), value.to_string()))
        })
        .collect();
    let body = response.text().await?;
    let Some(challenge) = PaymentChallenge::parse(&headers, &body) else {
        bail!("402 response did not carry a payment challenge: {}", body);
    };

    println!("   [OK] Payment required:");
    println!("   {}", serde_json::to_string_pretty(&challenge)?);
    println!();

    let Some(tx_hash) = tx_hash else {
        println!(
            "Send {} {} to {} on {} (chain {}), then rerun with X402_TX_HASH set.",
            challenge.amount,
            challenge.token,
            challenge.recipient,
            challenge.network,
            challenge.chain_id
        );
        return Ok(());
    };

    println!("Step 2: Retrying with payment proof {}...", tx_hash);
    let response = client
        .get(&url)
        .header(TX_HASH_HEADER, tx_hash.as_str())
        .send()
        .await?;

    let status = response.status();
    let data: Value = response.json().await.unwrap_or(Value::Null);
    if !status.is_success() {
        println!("   [FAILED] {}: {}", status, data);
        return Ok(());
    }

    println!("   [OK] Payment verified!");
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}
