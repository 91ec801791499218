use tokio::sync::broadcast;

use crate::{
    db::{DbPool, notification_store::NotificationStore},
    error::Result,
    models::notification::Notification,
};

/// Persistent notification log with a live fan-out to subscribers
#[derive(Clone)]
pub struct NotificationFeed {
    store: NotificationStore,
    sender: broadcast::Sender<Notification>,
}

impl NotificationFeed {
    pub fn new(pool: DbPool, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            store: NotificationStore::new(pool),
            sender,
        }
    }

    /// Publish a notification that was stored inside a committed transaction
    pub fn announce(&self, notification: Notification) {
        tracing::debug!("Notification {}: {}", notification.id, notification.message);
        // No receivers is the normal state when nobody has the page open
        let _ = self.sender.send(notification);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub async fn latest(&self) -> Result<Vec<Notification>> {
        self.store.latest().await
    }

    pub async fn mark_all_read(&self) -> Result<u64> {
        self.store.mark_all_read().await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.store.delete(id).await
    }
}
