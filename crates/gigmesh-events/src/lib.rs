//! GigMesh Events - outbound event plumbing
//!
//! State-mutating operations push a [`MarketEvent`] into the [`Outbox`] only
//! after their store commit succeeds. A [`Dispatcher`] task drains the outbox
//! and hands events to a [`Notifier`]; delivery is fire-and-forget and a
//! failed notification is logged and dropped, never retried into the
//! settlement path.

pub mod notifier;
pub mod outbox;

pub use notifier::{MemoryNotifier, Notifier, WebhookNotifier};
pub use outbox::{Dispatcher, Outbox};
