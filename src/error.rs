use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum X402Error {
    #[error("X402_APP_ID is required")]
    MissingAppId,

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Unauthorized: platform rejected app id {0}")]
    Unauthorized(String),

    #[error("Platform validation failed: {status} {text}")]
    PlatformStatus { status: u16, text: String },

    #[error("Invalid project configuration: {0}")]
    InvalidProject(String),

    #[error("Project is not active (status: {0})")]
    InactiveProject(String),

    #[error("Platform not initialized; call initialize() first")]
    NotInitialized,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

impl X402Error {
    /// Errors raised while resolving the project identity. These are fatal
    /// for the current attempt and are never retried automatically.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            X402Error::MissingAppId
                | X402Error::ProjectNotFound(_)
                | X402Error::Unauthorized(_)
                | X402Error::PlatformStatus { .. }
                | X402Error::InvalidProject(_)
                | X402Error::InactiveProject(_)
                | X402Error::NotInitialized
        )
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            X402Error::Transport(_) | X402Error::Rpc { .. } | X402Error::InvalidResponse(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for X402Error {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => X402Error::Transport(format!("HTTP {}: {}", status.as_u16(), err)),
            None => X402Error::Transport(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for X402Error {
    fn from(err: serde_json::Error) -> Self {
        X402Error::InvalidResponse(err.to_string())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for X402Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        tracing::error!(
            error = ?self,
            status = status.as_u16(),
            "Request failed"
        );

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
