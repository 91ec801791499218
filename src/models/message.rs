use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope for messages pushed over the notification WebSocket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedMessage<T> {
    /// Message type
    #[serde(rename = "type")]
    pub kind: String,
    /// Message data
    pub data: T,
    /// Timestamp when the message was created
    pub timestamp: DateTime<Utc>,
    /// Message ID
    pub id: Uuid,
}

impl<T> FeedMessage<T> {
    pub fn new(kind: &str, data: T) -> Self {
        Self {
            kind: kind.to_string(),
            data,
            timestamp: Utc::now(),
            id: Uuid::new_v4(),
        }
    }
}
