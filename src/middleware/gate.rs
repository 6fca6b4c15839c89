use crate::{
    error::X402Error,
    middleware::{
        headers::{extract_payment_receipt, Headers},
        processor::{effective_network, process_payment},
    },
    models::{
        BlockchainVerification, MiddlewareError, PaymentDecision, PaymentOptions, ProjectConfig,
    },
    services::{
        events::{EndpointSeen, PaymentLogged, PlatformEvent},
        X402Context,
    },
};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Per-route adapter state shared by the axum and tower bindings.
pub struct PaymentGate {
    ctx: Arc<X402Context>,
    options: PaymentOptions,
    ready: OnceCell<Arc<ProjectConfig>>,
}

impl PaymentGate {
    pub fn new(ctx: Arc<X402Context>, options: PaymentOptions) -> Self {
        Self {
            ctx,
            options,
            ready: OnceCell::new(),
        }
    }

    pub fn context(&self) -> &X402Context {
        &self.ctx
    }

    pub fn options(&self) -> &PaymentOptions {
        &self.options
    }

    /// First request initializes the platform; concurrent first requests
    /// wait on the same attempt. A failed attempt is retried once after
    /// clearing the resolver cache.
    async fn ensure_initialized(&self) -> Result<Arc<ProjectConfig>, X402Error> {
        self.ready
            .get_or_try_init(|| async {
                match self.ctx.init().await {
                    Ok(project) => Ok(project),
                    Err(e) => {
                        tracing::warn!("Platform initialization failed ({}), retrying once", e);
                        self.ctx.resolver().clear_cache().await;
                        self.ctx.init().await
                    }
                }
            })
            .await
            .cloned()
    }

    pub async fn handle(&self, method: &str, path: &str, headers: &Headers) -> PaymentDecision {
        let project = match self.ensure_initialized().await {
            Ok(project) => project,
            Err(e) => {
                tracing::error!("Payment gate unavailable: {}", e);
                return PaymentDecision::Denied(MiddlewareError::internal(e.to_string()));
            }
        };

        self.announce_endpoint(method, path, &project).await;

        let decision = process_payment(&self.ctx, &self.options, headers).await;
        if let PaymentDecision::Allowed(verification) = &decision {
            self.log_payment(path, &project, verification, headers);
        }
        decision
    }

    async fn announce_endpoint(&self, method: &str, path: &str, project: &ProjectConfig) {
        if !self.ctx.endpoints().first_sighting(method, path).await {
            return;
        }
        self.ctx.events().emit(PlatformEvent::EndpointSeen(EndpointSeen {
            app_id: project.app_id.clone(),
            method: method.to_uppercase(),
            path: path.to_string(),
            price: self.options.price.clone(),
            token: self.options.token.clone(),
            network: effective_network(&self.options, project),
        }));
    }

    fn log_payment(
        &self,
        path: &str,
        project: &ProjectConfig,
        verification: &BlockchainVerification,
        headers: &Headers,
    ) {
        let receipt = extract_payment_receipt(headers);
        self.ctx.events().emit(PlatformEvent::PaymentVerified(PaymentLogged {
            app_id: project.app_id.clone(),
            transaction_hash: verification
                .transaction_hash
                .clone()
                .or_else(|| receipt.as_ref().map(|r| r.transaction_hash.clone()))
                .unwrap_or_default(),
            amount: verification.amount.clone().unwrap_or_default(),
            token: verification
                .token
                .clone()
                .unwrap_or_else(|| self.options.token.clone()),
            network: effective_network(&self.options, project),
            path: path.to_string(),
            block_number: verification.block_number,
            client_timestamp: receipt.and_then(|r| r.timestamp),
            verified_at: Utc::now(),
        }));
    }
}
