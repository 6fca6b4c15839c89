//! Project identity resolution against the x402 platform.

use crate::{
    error::X402Error,
    models::{ProjectConfig, ProjectStatus},
};
use ethers::types::Address;
use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::StatusCode;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

pub const APP_ID_ENV: &str = "X402_APP_ID";
pub const PLATFORM_URL_ENV: &str = "X402_PLATFORM_URL";
pub const PUBLIC_PLATFORM_URL_ENV: &str = "PUBLIC_X402_PLATFORM_URL";
pub const DEFAULT_PLATFORM_URL: &str = "http://localhost:3000";
pub const DEFAULT_PLATFORM_TIMEOUT: Duration = Duration::from_secs(10);

/// `X402_PLATFORM_URL`, then `PUBLIC_X402_PLATFORM_URL`, then the default.
pub fn platform_url_with<F>(env: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    [PLATFORM_URL_ENV, PUBLIC_PLATFORM_URL_ENV]
        .into_iter()
        .filter_map(|name| env(name))
        .map(|url| url.trim().trim_end_matches('/').to_string())
        .find(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_PLATFORM_URL.to_string())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProject {
    app_id: Option<String>,
    name: Option<String>,
    pay_to: Option<String>,
    network: Option<String>,
    status: Option<String>,
}

fn present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|v| !v.trim().is_empty())
}

impl RawProject {
    fn into_config(self) -> Result<ProjectConfig, X402Error> {
        let missing: Vec<&str> = [
            ("appId", present(&self.app_id)),
            ("payTo", present(&self.pay_to)),
            ("network", present(&self.network)),
        ]
        .into_iter()
        .filter_map(|(name, ok)| (!ok).then_some(name))
        .collect();
        if !missing.is_empty() {
            return Err(X402Error::InvalidProject(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )));
        }

        let status = self.status.unwrap_or_default();
        if status != "ACTIVE" {
            let shown = if status.is_empty() { "missing" } else { status.as_str() };
            return Err(X402Error::InactiveProject(shown.to_string()));
        }

        let pay_to = self.pay_to.unwrap_or_default();
        let pay_to = Address::from_str(pay_to.trim())
            .map_err(|_| X402Error::InvalidProject(format!("invalid payTo address: {pay_to}")))?;

        Ok(ProjectConfig {
            app_id: self.app_id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            pay_to,
            network: self.network.unwrap_or_default().trim().to_lowercase(),
            status: ProjectStatus::Active,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PlatformClient {
    client: reqwest::Client,
    base_url: String,
}

impl PlatformClient {
    /// The timeout bounds validation and every event POST sharing this
    /// client.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, X402Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.client
    }

    /// `GET {base}/api/projects/{appId}`
    pub async fn validate_project(&self, app_id: &str) -> Result<ProjectConfig, X402Error> {
        let url = format!("{}/api/projects/{}", self.base_url, app_id);
        let response = self.client.get(&url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(X402Error::ProjectNotFound(app_id.to_string())),
            StatusCode::UNAUTHORIZED => return Err(X402Error::Unauthorized(app_id.to_string())),
            status if !status.is_success() => {
                return Err(X402Error::PlatformStatus {
                    status: status.as_u16(),
                    text: status.canonical_reason().unwrap_or_default().to_string(),
                })
            }
            _ => {}
        }

        let raw: RawProject = response
            .json()
            .await
            .map_err(|e| X402Error::InvalidResponse(format!("project validation: {e}")))?;
        raw.into_config()
    }
}

type PendingValidation = Shared<BoxFuture<'static, Result<Arc<ProjectConfig>, X402Error>>>;

/// Memoizes the validated project for one app id. Concurrent callers share a
/// single in-flight validation; a failed attempt is not cached.
pub struct ProjectConfigResolver {
    app_id: Option<String>,
    client: Arc<PlatformClient>,
    cached: RwLock<Option<Arc<ProjectConfig>>>,
    in_flight: Mutex<Option<PendingValidation>>,
    generation: AtomicU64,
}

impl ProjectConfigResolver {
    pub fn new(app_id: Option<String>, client: Arc<PlatformClient>) -> Self {
        Self {
            app_id,
            client,
            cached: RwLock::new(None),
            in_flight: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn from_env(client: Arc<PlatformClient>) -> Self {
        Self::new(std::env::var(APP_ID_ENV).ok(), client)
    }

    pub fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }

    pub async fn initialize(&self) -> Result<Arc<ProjectConfig>, X402Error> {
        if let Some(config) = self.cached.read().await.clone() {
            return Ok(config);
        }
        let app_id = self.app_id().ok_or(X402Error::MissingAppId)?.to_string();

        let (pending, generation) = {
            let mut slot = self.in_flight.lock().await;
            if let Some(config) = self.cached.read().await.clone() {
                return Ok(config);
            }
            // Left behind when its last waiter was cancelled before clearing it.
            if slot.as_ref().is_some_and(|stale| stale.peek().is_some()) {
                *slot = None;
            }
            let generation = self.generation.load(Ordering::SeqCst);
            let pending = match slot.as_ref() {
                Some(pending) => pending.clone(),
                None => {
                    let client = self.client.clone();
                    let pending = async move {
                        client.validate_project(&app_id).await.map(Arc::new)
                    }
                    .boxed()
                    .shared();
                    *slot = Some(pending.clone());
                    pending
                }
            };
            (pending, generation)
        };

        let result = pending.clone().await;

        if self.generation.load(Ordering::SeqCst) == generation {
            match &result {
                Ok(config) => {
                    *self.cached.write().await = Some(config.clone());
                    tracing::info!(
                        "Project {} validated (network: {}, pay_to: {:?})",
                        config.app_id,
                        config.network,
                        config.pay_to
                    );
                }
                Err(e) => tracing::warn!("Project validation failed: {}", e),
            }
            let mut slot = self.in_flight.lock().await;
            if slot.as_ref().is_some_and(|current| current.ptr_eq(&pending)) {
                *slot = None;
            }
        }

        result
    }

    pub async fn project_config(&self) -> Result<Arc<ProjectConfig>, X402Error> {
        self.cached
            .read()
            .await
            .clone()
            .ok_or(X402Error::NotInitialized)
    }

    /// Drops the cached project and any in-flight validation.
    pub async fn clear_cache(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        *self.in_flight.lock().await = None;
        *self.cached.write().await = None;
    }
}
