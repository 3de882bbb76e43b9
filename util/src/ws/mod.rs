//! Real-time delivery plumbing: the topic registry, the per-socket server
//! loop and the JSON envelope used for server-pushed events.

pub mod axum_adapter;
pub mod handler_trait;
pub mod manager;
pub mod runtime;
pub mod serve;

pub use manager::WebSocketManager;

use chrono::Utc;
use serde::Serialize;

/// Standard event envelope sent over WebSocket topics.
#[derive(Serialize)]
pub struct EventEnvelope<'a, T> {
    #[serde(rename = "type")]
    pub r#type: &'static str,
    pub event: &'a str,
    pub topic: &'a str,
    pub payload: T,
    pub ts: String,
}

/// Broadcast a JSON-serialized `EventEnvelope` on `topic`.
///
/// Returns how many live channels received the frame.
pub async fn emit<T: Serialize>(
    ws: &WebSocketManager,
    topic: &str,
    event: &str,
    payload: &T,
) -> usize {
    let env = EventEnvelope {
        r#type: "event",
        event,
        topic,
        payload,
        ts: Utc::now().to_rfc3339(),
    };
    match serde_json::to_string(&env) {
        Ok(json) => ws.broadcast(topic, json).await,
        Err(e) => {
            tracing::error!(topic, event, error = %e, "Failed to serialize WS envelope");
            0
        }
    }
}

/// Broadcast `payload` as bare JSON, without an envelope.
pub async fn push_json<T: Serialize>(ws: &WebSocketManager, topic: &str, payload: &T) -> usize {
    match serde_json::to_string(payload) {
        Ok(json) => ws.broadcast(topic, json).await,
        Err(e) => {
            tracing::error!(topic, error = %e, "Failed to serialize WS payload");
            0
        }
    }
}
