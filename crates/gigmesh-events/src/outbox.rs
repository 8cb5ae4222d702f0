//! Post-commit event outbox and its dispatcher task

use crate::Notifier;
use gigmesh_types::MarketEvent;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tracing::{debug, warn};

/// Queue of committed-but-undelivered events
///
/// Pushing never blocks and never fails, so it is safe to call right after a
/// store commit inside a service operation.
#[derive(Default)]
pub struct Outbox {
    queue: Mutex<VecDeque<MarketEvent>>,
    wakeup: Notify,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an event for delivery
    pub fn push(&self, event: MarketEvent) {
        debug!(event_type = event.event_type(), "event enqueued");
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(event);
        }
        self.wakeup.notify_one();
    }

    /// Take every queued event
    pub fn drain(&self) -> Vec<MarketEvent> {
        match self.queue.lock() {
            Ok(mut queue) => queue.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Number of undelivered events
    pub fn len(&self) -> usize {
        self.queue.lock().map(|q| q.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn wait(&self) {
        self.wakeup.notified().await;
    }
}

/// Drains the outbox and delivers events to a notifier
pub struct Dispatcher;

impl Dispatcher {
    /// Spawn the delivery loop on the current runtime
    ///
    /// Runs until the task is aborted. Notification failures are logged and
    /// the event is dropped.
    pub fn spawn(
        outbox: Arc<Outbox>,
        notifier: Arc<dyn Notifier>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let events = outbox.drain();
                if events.is_empty() {
                    outbox.wait().await;
                    continue;
                }
                for event in events {
                    if let Err(e) = notifier.notify(&event).await {
                        warn!(
                            event_type = event.event_type(),
                            error = %e,
                            "event delivery failed, dropping"
                        );
                    }
                }
            }
        })
    }

    /// Deliver everything currently queued, then return
    ///
    /// Useful at shutdown and in tests, where a background task is overkill.
    pub async fn drain_once(outbox: &Outbox, notifier: &dyn Notifier) {
        for event in outbox.drain() {
            if let Err(e) = notifier.notify(&event).await {
                warn!(
                    event_type = event.event_type(),
                    error = %e,
                    "event delivery failed, dropping"
                );
            }
        }
    }
}
