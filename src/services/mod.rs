pub mod amount;
pub mod context;
pub mod events;
pub mod platform;
pub mod registry;
pub mod rpc;
pub mod verifier;

pub use context::X402Context;
pub use events::{EndpointRegistry, EventSink, HttpEventSink, NoopEventSink, PlatformEvent};
pub use platform::{PlatformClient, ProjectConfigResolver};
pub use registry::NetworkRegistry;
pub use rpc::{ChainRpc, RpcClient};
pub use verifier::{PaymentVerifier, VerificationRequest};
