use crate::{
    middleware::{gate::PaymentGate, headers::Headers},
    models::PaymentDecision,
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Use with `axum::middleware::from_fn_with_state(gate, x402_middleware)`.
/// On success the verification is inserted into the request extensions.
pub async fn x402_middleware(
    State(gate): State<Arc<PaymentGate>>,
    mut request: Request,
    next: Next,
) -> Response {
    let headers = Headers::from_header_map(request.headers());
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    match gate.handle(&method, &path, &headers).await {
        PaymentDecision::Allowed(verification) => {
            request.extensions_mut().insert(verification);
            next.run(request).await
        }
        PaymentDecision::PaymentRequired(challenge) => challenge.into_response(),
        PaymentDecision::Denied(error) => error.into_response(),
    }
}
