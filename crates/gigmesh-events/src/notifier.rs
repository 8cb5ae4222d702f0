//! Event delivery boundary

use gigmesh_types::{GigMeshError, MarketEvent, Result};
use std::sync::Mutex;
use tracing::debug;

/// Delivers a market event to an external consumer
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &MarketEvent) -> Result<()>;
}

/// Posts events as JSON to a webhook endpoint
pub struct WebhookNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl WebhookNotifier {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, event: &MarketEvent) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("X-GigMesh-Event", event.event_type())
            .json(event)
            .send()
            .await
            .map_err(|e| GigMeshError::internal(format!("webhook post: {}", e)))?;
        response
            .error_for_status()
            .map_err(|e| GigMeshError::internal(format!("webhook status: {}", e)))?;
        debug!(
            event_type = event.event_type(),
            endpoint = %self.endpoint,
            "event delivered"
        );
        Ok(())
    }
}

/// Collects events in memory; used by tests and the demo
#[derive(Default)]
pub struct MemoryNotifier {
    events: Mutex<Vec<MarketEvent>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far
    pub fn delivered(&self) -> Vec<MarketEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Notifier for MemoryNotifier {
    async fn notify(&self, event: &MarketEvent) -> Result<()> {
        self.events
            .lock()
            .map_err(|_| GigMeshError::internal("notifier poisoned"))?
            .push(event.clone());
        Ok(())
    }
}
