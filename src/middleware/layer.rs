use crate::{
    middleware::{gate::PaymentGate, headers::Headers},
    models::PaymentDecision,
};
use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower binding of the payment gate, for stacks that compose services
/// rather than axum middleware functions.
#[derive(Clone)]
pub struct PaymentLayer {
    gate: Arc<PaymentGate>,
}

impl PaymentLayer {
    pub fn new(gate: Arc<PaymentGate>) -> Self {
        Self { gate }
    }
}

impl<S> Layer<S> for PaymentLayer {
    type Service = PaymentService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        PaymentService {
            inner,
            gate: self.gate.clone(),
        }
    }
}

#[derive(Clone)]
pub struct PaymentService<S> {
    inner: S,
    gate: Arc<PaymentGate>,
}

impl<S> Service<Request<Body>> for PaymentService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        let gate = self.gate.clone();
        // The readied service goes into the future; a fresh clone stays behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let headers = Headers::from_header_map(request.headers());
            let method = request.method().to_string();
            let path = request.uri().path().to_string();

            match gate.handle(&method, &path, &headers).await {
                PaymentDecision::Allowed(verification) => {
                    request.extensions_mut().insert(verification);
                    inner.call(request).await
                }
                PaymentDecision::PaymentRequired(challenge) => Ok(challenge.into_response()),
                PaymentDecision::Denied(error) => Ok(error.into_response()),
            }
        })
    }
}
