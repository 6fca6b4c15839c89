use crate::{
    config::Config,
    error::X402Error,
    models::ProjectConfig,
    services::{
        events::{EndpointRegistry, EventSink, HttpEventSink},
        platform::{PlatformClient, ProjectConfigResolver},
        registry::NetworkRegistry,
        rpc::{ChainRpc, RpcClient},
        verifier::PaymentVerifier,
    },
};
use std::sync::Arc;

/// Everything a payment gate needs, owned by the hosting application.
/// Separate contexts share no state.
pub struct X402Context {
    registry: Arc<NetworkRegistry>,
    resolver: ProjectConfigResolver,
    verifier: PaymentVerifier,
    events: Arc<dyn EventSink>,
    endpoints: EndpointRegistry,
}

impl X402Context {
    pub fn new(
        resolver: ProjectConfigResolver,
        rpc: Arc<dyn ChainRpc>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        let registry = Arc::new(NetworkRegistry::new());
        Self {
            verifier: PaymentVerifier::new(rpc, registry.clone()),
            registry,
            resolver,
            events,
            endpoints: EndpointRegistry::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, X402Error> {
        let platform = Arc::new(PlatformClient::new(
            config.platform_url.clone(),
            config.platform_timeout,
        )?);
        let events = HttpEventSink::new(platform.http().clone(), platform.base_url());
        let resolver = ProjectConfigResolver::new(config.app_id.clone(), platform);
        let rpc = RpcClient::new(config.rpc_timeout)?;

        Ok(Self::new(resolver, Arc::new(rpc), Arc::new(events)))
    }

    pub fn registry(&self) -> &NetworkRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> &ProjectConfigResolver {
        &self.resolver
    }

    pub fn verifier(&self) -> &PaymentVerifier {
        &self.verifier
    }

    pub fn events(&self) -> &dyn EventSink {
        self.events.as_ref()
    }

    pub fn endpoints(&self) -> &EndpointRegistry {
        &self.endpoints
    }

    pub async fn init(&self) -> Result<Arc<ProjectConfig>, X402Error> {
        self.resolver.initialize().await
    }

    /// Restores a freshly constructed state: presets only, no cached
    /// project, no announced endpoints.
    pub async fn reset(&self) {
        self.registry.reset();
        self.resolver.clear_cache().await;
        self.endpoints.reset();
    }
}
