use crate::{
    error::ErrorResponse,
    models::{MiddlewareError, PaymentRequiredResponse},
};
use axum::{
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

impl IntoResponse for PaymentRequiredResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::PAYMENT_REQUIRED);
        let mut response = (status, Json(self.body)).into_response();

        for (name, value) in self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => {
                    response.headers_mut().insert(name, value);
                }
                _ => tracing::warn!("Skipping unrepresentable challenge header {}", name),
            }
        }
        response
    }
}

impl IntoResponse for MiddlewareError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse { error: self.message })).into_response()
    }
}
