use crate::{error::X402Error, handlers::HealthState, models::ProjectConfig};
use axum::{extract::State, Json};

pub async fn get_project(
    State(state): State<HealthState>,
) -> Result<Json<ProjectConfig>, X402Error> {
    let project = state.ctx.resolver().project_config().await?;
    Ok(Json(project.as_ref().clone()))
}
