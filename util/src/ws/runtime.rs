use crate::ws::WebSocketManager;
use axum::extract::ws::{CloseFrame, Message, Utf8Bytes};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

/// Per-socket handle given to a `WsHandler`.
pub struct WsContext {
    pub topic: String,
    /// Authenticated user behind this socket, if the route tracks presence.
    pub user_id: Option<i64>,
    pub ws: WebSocketManager,
    out_tx: mpsc::Sender<Message>,
    closing: AtomicBool,
}

impl WsContext {
    pub fn new(
        topic: String,
        user_id: Option<i64>,
        ws: WebSocketManager,
        out_tx: mpsc::Sender<Message>,
    ) -> Self {
        Self {
            topic,
            user_id,
            ws,
            out_tx,
            closing: AtomicBool::new(false),
        }
    }

    /// Send a single text frame to this client only.
    pub async fn reply_text(&self, text: impl Into<Utf8Bytes>) -> Result<(), ()> {
        self.out_tx
            .send(Message::Text(text.into()))
            .await
            .map_err(|_| ())
    }

    /// Serialize `payload` inside an `{event, topic, payload, ts}` frame for this client only.
    pub async fn reply_event<T: Serialize>(&self, event: &str, payload: &T) -> Result<(), ()> {
        let frame = serde_json::json!({
            "event": event,
            "topic": self.topic,
            "payload": payload,
            "ts": chrono::Utc::now().to_rfc3339(),
        });
        self.reply_text(frame.to_string()).await
    }

    pub async fn reply_pong(&self, payload: bytes::Bytes) -> Result<(), ()> {
        self.out_tx
            .send(Message::Pong(payload))
            .await
            .map_err(|_| ())
    }

    /// Broadcast a JSON envelope on this topic.
    pub async fn emit<T: Serialize>(&self, event: &str, payload: &T) {
        crate::ws::emit(&self.ws, &self.topic, event, payload).await;
    }

    /// Queue a close frame; the server loop stops reading after the current message.
    pub async fn close(&self, code: u16, reason: &'static str) {
        self.closing.store(true, Ordering::SeqCst);
        let _ = self
            .out_tx
            .send(Message::Close(Some(CloseFrame {
                code,
                reason: reason.into(),
            })))
            .await;
    }

    pub fn is_closing(&self) -> bool {
        self.closing.load(Ordering::SeqCst)
    }
}
