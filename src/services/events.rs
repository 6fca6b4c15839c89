//! Best-effort notifications to the platform. Emission never blocks the
//! request and a failed delivery is only logged.

use chrono::{DateTime, Utc};
use moka::future::Cache;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointSeen {
    pub app_id: String,
    pub method: String,
    pub path: String,
    pub price: String,
    pub token: String,
    pub network: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLogged {
    pub app_id: String,
    pub transaction_hash: String,
    pub amount: String,
    pub token: String,
    pub network: String,
    pub path: String,
    pub block_number: Option<u64>,
    pub client_timestamp: Option<String>,
    pub verified_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformEvent {
    EndpointSeen(EndpointSeen),
    PaymentVerified(PaymentLogged),
}

impl PlatformEvent {
    /// Platform route the event is delivered to.
    pub fn route(&self) -> &'static str {
        match self {
            PlatformEvent::EndpointSeen(_) => "/api/endpoints",
            PlatformEvent::PaymentVerified(_) => "/api/payments",
        }
    }

    pub fn body(&self) -> serde_json::Value {
        let body = match self {
            PlatformEvent::EndpointSeen(event) => serde_json::to_value(event),
            PlatformEvent::PaymentVerified(event) => serde_json::to_value(event),
        };
        body.unwrap_or_default()
    }
}

pub trait EventSink: Send + Sync {
    /// Must return immediately.
    fn emit(&self, event: PlatformEvent);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, event: PlatformEvent) {
        tracing::debug!("Dropping platform event for {}", event.route());
    }
}

/// Posts events to the platform on a detached task.
#[derive(Debug, Clone)]
pub struct HttpEventSink {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEventSink {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

impl EventSink for HttpEventSink {
    fn emit(&self, event: PlatformEvent) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime; dropping platform event for {}", event.route());
            return;
        };

        let url = format!("{}{}", self.base_url, event.route());
        let body = event.body();
        let client = self.client.clone();

        runtime.spawn(async move {
            match client.post(&url).json(&body).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!("Platform event delivered to {}", url);
                }
                Ok(response) => {
                    tracing::warn!("Platform rejected event at {}: {}", url, response.status());
                }
                Err(e) => tracing::warn!("Failed to deliver platform event to {}: {}", url, e),
            }
        });
    }
}

const MAX_TRACKED_ENDPOINTS: u64 = 10_000;

/// Remembers which `(method, path)` pairs were already announced.
#[derive(Clone)]
pub struct EndpointRegistry {
    seen: Cache<String, ()>,
}

impl Default for EndpointRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self {
            seen: Cache::builder().max_capacity(MAX_TRACKED_ENDPOINTS).build(),
        }
    }

    /// True exactly once per `(method, path)` until [`reset`](Self::reset).
    pub async fn first_sighting(&self, method: &str, path: &str) -> bool {
        let key = format!("{} {}", method.to_uppercase(), path);
        self.seen.entry(key).or_insert(()).await.is_fresh()
    }

    pub fn reset(&self) {
        self.seen.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn endpoints_are_announced_once() {
        let endpoints = EndpointRegistry::new();
        assert!(endpoints.first_sighting("get", "/api/premium").await);
        assert!(!endpoints.first_sighting("GET", "/api/premium").await);
        assert!(endpoints.first_sighting("POST", "/api/premium").await);
    }

    #[test]
    fn events_route_to_platform_endpoints() {
        let seen = PlatformEvent::EndpointSeen(EndpointSeen {
            app_id: "app_1".into(),
            method: "GET".into(),
            path: "/api/premium".into(),
            price: "0.01".into(),
            token: "MNT".into(),
            network: "mantle".into(),
        });
        assert_eq!(seen.route(), "/api/endpoints");
        assert_eq!(seen.body()["appId"], "app_1");
        assert_eq!(seen.body()["path"], "/api/premium");
    }

    #[tokio::test]
    async fn http_sink_posts_without_blocking() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/payments")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "transactionHash": "0xabc",
                "amount": "1"
            })))
            .with_status(201)
            .create_async()
            .await;

        let sink = HttpEventSink::new(reqwest::Client::new(), server.url());
        sink.emit(PlatformEvent::PaymentVerified(PaymentLogged {
            app_id: "app_1".into(),
            transaction_hash: "0xabc".into(),
            amount: "1".into(),
            token: "MNT".into(),
            network: "mantle".into(),
            path: "/api/premium".into(),
            block_number: Some(1),
            client_timestamp: None,
            verified_at: Utc::now(),
        }));

        for _ in 0..50 {
            if mock.matched_async().await {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        mock.assert_async().await;
    }

    #[test]
    fn emit_outside_runtime_is_dropped() {
        let mut server = mockito::Server::new();
        let mock = server.mock("POST", "/api/endpoints").expect(0).create();

        let sink = HttpEventSink::new(reqwest::Client::new(), server.url());
        sink.emit(PlatformEvent::EndpointSeen(EndpointSeen {
            app_id: "a".into(),
            method: "GET".into(),
            path: "/".into(),
            price: "1".into(),
            token: "MNT".into(),
            network: "mantle".into(),
        }));

        std::thread::sleep(std::time::Duration::from_millis(100));
        mock.assert();
    }
}
