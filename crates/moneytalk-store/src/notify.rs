//! Change notifications for derived views.
//!
//! Every committed mutation bumps a version counter and publishes a
//! [`ChangeEvent`] naming the collections that were reloaded. Consumers either
//! poll [`ChangeNotifier::version`] or hold a [`ChangeSubscription`]; dropping
//! the subscription unsubscribes it.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;

use crate::policy::EntityKind;

/// Buffered events per subscriber before the oldest are dropped.
const CHANNEL_CAPACITY: usize = 64;

/// Published after a mutation commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Store version after this change; strictly increasing.
    pub version: u64,
    /// Collections whose contents may differ from the previous version.
    pub collections: Vec<EntityKind>,
}

impl ChangeEvent {
    pub fn touches(&self, kind: EntityKind) -> bool {
        self.collections.contains(&kind)
    }
}

/// Publishing side, owned by the store.
#[derive(Debug)]
pub struct ChangeNotifier {
    sender: broadcast::Sender<ChangeEvent>,
    version: AtomicU64,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            version: AtomicU64::new(0),
        }
    }

    /// Current version. Zero until the first change.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> ChangeSubscription {
        ChangeSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Bump the version and publish. Returns the event sent.
    pub fn publish(&self, collections: Vec<EntityKind>) -> ChangeEvent {
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        let event = ChangeEvent {
            version,
            collections,
        };
        // No subscribers is not an error
        if self.sender.send(event.clone()).is_err() {
            tracing::trace!(version, "change published with no subscribers");
        }
        event
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side. Unsubscribes when dropped.
#[derive(Debug)]
pub struct ChangeSubscription {
    receiver: broadcast::Receiver<ChangeEvent>,
}

impl ChangeSubscription {
    /// Wait for the next change. Returns `None` once the store is gone.
    ///
    /// A subscriber that fell behind skips to the oldest retained event; the
    /// version gap tells it something was missed.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "change subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Next buffered change, without waiting.
    pub fn try_next(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}
