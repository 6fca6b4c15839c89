use anyhow::Result;
use axum::{middleware as axum_middleware, routing::get, Router};
use std::{sync::Arc, time::Instant};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use x402_devkit::{
    config::Config,
    handlers::*,
    middleware::{x402_middleware, PaymentGate},
    services::X402Context,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    tracing::info!("Starting x402 devkit v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {:?}", config.environment);

    let ctx = Arc::new(X402Context::from_config(&config)?);

    // Paid routes initialize lazily, so a platform outage here is not fatal.
    match ctx.init().await {
        Ok(project) => tracing::info!(
            "Serving project {} ({}) on {}",
            project.name,
            project.app_id,
            project.network
        ),
        Err(e) if e.is_config_error() => {
            tracing::error!("Project configuration rejected ({}); paid routes will fail", e)
        }
        Err(e) => tracing::warn!("Platform initialization deferred: {}", e),
    }

    let gate = Arc::new(PaymentGate::new(ctx.clone(), config.payment_options()));

    let health_state = HealthState {
        ctx: ctx.clone(),
        started_at: Instant::now(),
    };

    // Build router
    let app = Router::new()
        // Public endpoints (no payment required)
        .route("/health", get(health_check))
        .route("/api/project", get(get_project))
        .with_state(health_state)

        // Protected endpoints (payment required)
        .merge(
            Router::new()
                .route("/api/premium", get(premium_content))
                .route_layer(axum_middleware::from_fn_with_state(gate, x402_middleware)),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl+c: {}", e);
        return;
    }
    tracing::info!("Shutting down gracefully...");
}
