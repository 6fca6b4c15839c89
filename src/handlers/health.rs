use crate::{models::HealthStatus, services::X402Context};
use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct HealthState {
    pub ctx: Arc<X402Context>,
    pub started_at: Instant,
}

pub async fn health_check(State(state): State<HealthState>) -> Json<HealthStatus> {
    let project = state.ctx.resolver().project_config().await.ok();

    let status = if project.is_some() { "healthy" } else { "degraded" };
    let network = project.as_ref().map(|p| p.network.clone());
    let chain_id = network.as_deref().map(|n| state.ctx.registry().chain_id(n));

    Json(HealthStatus {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        project_initialized: project.is_some(),
        network,
        chain_id,
        uptime_seconds: state.started_at.elapsed().as_secs(),
        timestamp: Utc::now(),
    })
}
