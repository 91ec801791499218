use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::sync::{broadcast::error::RecvError, mpsc};
use uuid::Uuid;

use crate::{error::Result, models::FeedMessage, services::NotificationFeed};

fn encode<T: Serialize>(kind: &str, data: T) -> Result<Message> {
    let text = serde_json::to_string(&FeedMessage::new(kind, data))?;
    Ok(Message::Text(text.into()))
}

/// Stream notifications to one WebSocket client until either side hangs up
pub async fn handle_socket(socket: WebSocket, feed: NotificationFeed) {
    // Generate a connection ID
    let connection_id = Uuid::new_v4();
    tracing::info!("New notification subscriber: {}", connection_id);

    // Split the socket into sender and receiver
    let (mut sender, mut receiver) = socket.split();

    // Replies produced by the receive task
    let (tx, mut rx) = mpsc::channel::<Message>(16);

    let mut notifications = feed.subscribe();

    match encode("connected", json!({ "connectionId": connection_id })) {
        Ok(message) => {
            if let Err(e) = sender.send(message).await {
                tracing::error!("Error sending connection status: {}", e);
                return;
            }
        }
        Err(e) => tracing::error!("Error encoding connection status: {}", e),
    }

    // Task to forward notifications and replies to the WebSocket
    let mut forward_task = tokio::spawn(async move {
        loop {
            let message = tokio::select! {
                reply = rx.recv() => match reply {
                    Some(message) => message,
                    None => break,
                },
                received = notifications.recv() => match received {
                    Ok(notification) => match encode("notification", notification) {
                        Ok(message) => message,
                        Err(e) => {
                            tracing::error!("Error encoding notification: {}", e);
                            continue;
                        }
                    },
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "Subscriber {} lagging, skipped {} notifications",
                            connection_id,
                            skipped
                        );
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
            };

            if let Err(e) = sender.send(message).await {
                tracing::error!("Error sending WebSocket message: {}", e);
                break;
            }
        }
    });

    // Task to handle incoming messages
    let mut receive_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    tracing::debug!("Received message: {}", text.as_str());

                    let kind = serde_json::from_str::<Value>(text.as_str())
                        .ok()
                        .and_then(|v| v.get("type").and_then(Value::as_str).map(str::to_owned));

                    match kind.as_deref() {
                        Some("ping") => match encode("pong", Value::Null) {
                            Ok(pong) => {
                                if tx.send(pong).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => tracing::error!("Error encoding pong: {}", e),
                        },
                        Some(other) => tracing::debug!("Ignoring client message {}", other),
                        None => tracing::debug!("Ignoring malformed client message"),
                    }
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Client disconnected");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            }
        }
    });

    // Wait for either task to finish and stop the other one
    tokio::select! {
        _ = &mut forward_task => receive_task.abort(),
        _ = &mut receive_task => forward_task.abort(),
    }

    tracing::info!("Notification subscriber closed: {}", connection_id);
}
