//! Framework-agnostic payment decision for one request.

use crate::{
    error::X402Error,
    middleware::headers::{
        extract_payment_receipt, HeaderLookup, AMOUNT_HEADER, CHAIN_ID_HEADER, NETWORK_HEADER,
        RECIPIENT_HEADER, TOKEN_HEADER,
    },
    models::{
        MiddlewareError, PaymentDecision, PaymentOptions, PaymentRequiredBody,
        PaymentRequiredResponse, ProjectConfig, PAYMENT_REQUIRED_STATUS,
    },
    services::{registry::TESTNET_NETWORK, VerificationRequest, X402Context},
};

pub const PAYMENT_REQUIRED: &str = "Payment Required";

/// Resolves the gate's decision. Verification failures stay in the 402
/// family; anything unexpected becomes a 500.
pub async fn process_payment<H>(
    ctx: &X402Context,
    options: &PaymentOptions,
    headers: &H,
) -> PaymentDecision
where
    H: HeaderLookup + ?Sized,
{
    match try_process(ctx, options, headers).await {
        Ok(decision) => decision,
        Err(e) => {
            tracing::error!("Payment middleware error: {}", e);
            PaymentDecision::Denied(MiddlewareError::internal(e.to_string()))
        }
    }
}

async fn try_process<H>(
    ctx: &X402Context,
    options: &PaymentOptions,
    headers: &H,
) -> Result<PaymentDecision, X402Error>
where
    H: HeaderLookup + ?Sized,
{
    register_custom_entries(ctx, options);

    let project = ctx.init().await?;
    let network = effective_network(options, &project);
    let chain_id = ctx.registry().chain_id(&network);

    let Some(receipt) = extract_payment_receipt(headers) else {
        tracing::debug!("No payment receipt, issuing challenge on {}", network);
        return Ok(PaymentDecision::PaymentRequired(payment_challenge(
            options, &network, chain_id, &project,
        )));
    };

    let verification = ctx
        .verifier()
        .verify(VerificationRequest {
            tx_hash: &receipt.transaction_hash,
            project: &project,
            network: &network,
            amount: &options.price,
            token: &options.token,
            rpc_url: options.rpc_url.as_deref(),
        })
        .await;

    if !verification.valid {
        return Ok(PaymentDecision::Denied(MiddlewareError::payment(
            verification.error_message(),
        )));
    }

    Ok(PaymentDecision::Allowed(verification))
}

fn register_custom_entries(ctx: &X402Context, options: &PaymentOptions) {
    if let Some((key, config)) = &options.custom_network {
        ctx.registry().register_custom_network(key, config.clone());
    }
    for (network, tokens) in &options.custom_tokens {
        ctx.registry().register_custom_tokens(
            network,
            tokens
                .iter()
                .map(|(symbol, token)| (symbol.clone(), token.clone())),
        );
    }
}

/// Explicit network, then the testnet shorthand, then the project's network.
pub fn effective_network(options: &PaymentOptions, project: &ProjectConfig) -> String {
    if let Some(network) = options
        .network
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
    {
        return network.to_lowercase();
    }
    if options.testnet {
        return TESTNET_NETWORK.to_string();
    }
    project.network.to_lowercase()
}

pub fn payment_challenge(
    options: &PaymentOptions,
    network: &str,
    chain_id: u64,
    project: &ProjectConfig,
) -> PaymentRequiredResponse {
    let recipient = project.pay_to_hex();
    let headers = vec![
        (AMOUNT_HEADER.to_string(), options.price.clone()),
        (TOKEN_HEADER.to_string(), options.token.clone()),
        (NETWORK_HEADER.to_string(), network.to_string()),
        (CHAIN_ID_HEADER.to_string(), chain_id.to_string()),
        (RECIPIENT_HEADER.to_string(), recipient.clone()),
    ];

    PaymentRequiredResponse {
        status: PAYMENT_REQUIRED_STATUS,
        headers,
        body: PaymentRequiredBody {
            error: PAYMENT_REQUIRED.to_string(),
            amount: options.price.clone(),
            token: options.token.clone(),
            network: network.to_string(),
            chain_id,
            recipient,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProjectStatus;
    use ethers::types::Address;

    fn project() -> ProjectConfig {
        ProjectConfig {
            app_id: "app_1".to_string(),
            name: "Demo".to_string(),
            pay_to: Address::repeat_byte(0xaa),
            network: "Mantle".to_string(),
            status: ProjectStatus::Active,
        }
    }

    #[test]
    fn network_precedence() {
        let project = project();
        let base = PaymentOptions::new("1", "MNT");

        assert_eq!(effective_network(&base, &project), "mantle");
        assert_eq!(
            effective_network(&base.clone().with_testnet(true), &project),
            TESTNET_NETWORK
        );
        assert_eq!(
            effective_network(
                &base.clone().with_testnet(true).with_network("Local"),
                &project
            ),
            "local"
        );
        assert_eq!(
            effective_network(&base.with_network(" "), &project),
            "mantle"
        );
    }

    #[test]
    fn challenge_mirrors_headers_and_body() {
        let options = PaymentOptions::new("0.5", "USDC");
        let challenge = payment_challenge(&options, "mantle", 5000, &project());

        assert_eq!(challenge.status, 402);
        assert_eq!(challenge.header("x-402-amount"), Some("0.5"));
        assert_eq!(challenge.header("X-402-Token"), Some("USDC"));
        assert_eq!(challenge.header("X-402-Network"), Some("mantle"));
        assert_eq!(challenge.header("X-402-Chain-Id"), Some("5000"));
        assert_eq!(
            challenge.header("X-402-Recipient"),
            Some("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa")
        );
        assert_eq!(challenge.body.error, PAYMENT_REQUIRED);
        assert_eq!(challenge.body.amount, "0.5");
        assert_eq!(challenge.body.chain_id, 5000);
        assert_eq!(challenge.body.recipient, challenge.header("X-402-Recipient").unwrap());
    }

    #[tokio::test]
    async fn orchestrator_without_app_id_is_internal_error() {
        use crate::{
            middleware::{headers::Headers, testing::StubRpc},
            services::{
                platform::DEFAULT_PLATFORM_TIMEOUT, NoopEventSink, PlatformClient,
                ProjectConfigResolver,
            },
        };
        use std::sync::Arc;

        let ctx = X402Context::new(
            ProjectConfigResolver::new(
                None,
                Arc::new(
                    PlatformClient::new("http://127.0.0.1:9", DEFAULT_PLATFORM_TIMEOUT).unwrap(),
                ),
            ),
            Arc::new(StubRpc::default()),
            Arc::new(NoopEventSink),
        );
        let options = PaymentOptions::new("1", "MNT");
        let decision = process_payment(&ctx, &options, &Headers::new()).await;
        assert_eq!(
            decision,
            PaymentDecision::Denied(MiddlewareError::internal(X402Error::MissingAppId.to_string()))
        );
    }

    #[tokio::test]
    async fn orchestrator_challenge_then_denial() {
        use crate::middleware::{headers::Headers, testing::*};

        let mut server = mockito::Server::new_async().await;
        let _platform = mock_project(&mut server, "mantle-sepolia").await;
        let ctx = context(&server.url(), StubRpc::default(), Default::default());
        let options = PaymentOptions::new("2.5", "MNT");

        let challenge = process_payment(&ctx, &options, &Headers::new()).await;
        let challenge = challenge.payment_required().unwrap();
        assert_eq!(challenge.body.amount, options.price);
        assert_eq!(challenge.body.token, options.token);
        assert_eq!(challenge.header("x-402-chain-id"), Some("5003"));

        let headers: Headers = [("x-402-transaction-hash", UNKNOWN_HASH)].into_iter().collect();
        let denied = process_payment(&ctx, &options, &headers).await;
        assert_eq!(
            denied,
            PaymentDecision::Denied(MiddlewareError::payment(
                crate::services::verifier::TX_NOT_FOUND
            ))
        );

        ctx.reset().await;
        assert!(ctx.resolver().project_config().await.is_err());
    }

    #[tokio::test]
    async fn orchestrator_pays_custom_token_through_rpc_override() {
        use crate::{
            middleware::{headers::Headers, testing::*},
            models::TokenConfig,
        };
        use ethers::types::U256;
        use std::sync::Arc;

        let mut server = mockito::Server::new_async().await;
        let _platform = mock_project(&mut server, "mantle").await;
        let tusd = TokenConfig {
            address: Address::repeat_byte(0x77),
            decimals: 2,
            symbol: "TUSD".to_string(),
        };
        let rpc = Arc::new(
            StubRpc::default().with_receipt(erc20_payment(tusd.address, U256::from(250))),
        );
        let ctx = context(&server.url(), rpc.clone(), Default::default());
        let options = PaymentOptions::new("2.5", "TUSD")
            .with_testnet(true)
            .with_custom_token(TESTNET_NETWORK, tusd)
            .with_rpc_url("http://rpc.override.test");
        let headers: Headers = [("X-402-Transaction-Hash", PAID_HASH)].into_iter().collect();

        let decision = process_payment(&ctx, &options, &headers).await;
        let PaymentDecision::Allowed(verification) = decision else {
            panic!("expected an allowed payment, got {decision:?}");
        };
        assert_eq!(verification.amount.as_deref(), Some("2.5"));
        assert_eq!(verification.token.as_deref(), Some("TUSD"));
        assert_eq!(rpc.requested_urls(), vec!["http://rpc.override.test".to_string()]);
        assert!(ctx.registry().token_config("tusd", TESTNET_NETWORK).is_some());

        // One base unit short of 2.5 with a zero tolerance at 2 decimals.
        let short = StubRpc::default()
            .with_receipt(erc20_payment(Address::repeat_byte(0x77), U256::from(249)));
        let ctx = context(&server.url(), short, Default::default());
        let denied = process_payment(&ctx, &options, &headers).await;
        assert_eq!(denied.error().map(|e| e.status), Some(402));
        assert!(denied.error().unwrap().message.starts_with("Amount mismatch"));
    }
}
