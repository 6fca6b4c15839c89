pub mod axum;
pub mod gate;
pub mod headers;
pub mod layer;
pub mod processor;
pub mod response;
#[cfg(test)]
pub(crate) mod testing;

pub use self::axum::x402_middleware;
pub use gate::PaymentGate;
pub use headers::{extract_payment_receipt, HeaderLookup, Headers};
pub use layer::{PaymentLayer, PaymentService};
pub use processor::{effective_network, payment_challenge, process_payment};
