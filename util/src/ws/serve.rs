use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio::time;

use super::WebSocketManager;
use super::handler_trait::WsHandler;
use super::runtime::WsContext;
use crate::config;

pub struct WsServerOptions {
    pub ws_ping_sec: u64,
    pub enable_app_ping: bool,
}

impl Default for WsServerOptions {
    fn default() -> Self {
        Self {
            ws_ping_sec: config::ws_ping_seconds(),
            enable_app_ping: true,
        }
    }
}

/// Drives one socket subscribed to `topic` until either side closes.
///
/// Presence for `user_id` is registered before `on_open` and removed after
/// `on_close`. Frames broadcast on the topic are forwarded in publish order.
pub async fn serve_topic<H: WsHandler>(
    socket: WebSocket,
    manager: WebSocketManager,
    topic: String,
    user_id: Option<i64>,
    handler: Arc<H>,
    opts: WsServerOptions,
) {
    let mut rx = manager.subscribe(&topic).await;
    if let Some(uid) = user_id {
        manager.register(&topic, uid).await;
    }

    let (mut sink, mut socket_rx) = socket.split();

    let (out_tx, mut out_rx) = mpsc::channel::<Message>(64);
    let writer_task = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            let closing = matches!(frame, Message::Close(_));
            if sink.send(frame).await.is_err() || closing {
                break;
            }
        }
    });

    let ctx = WsContext::new(topic.clone(), user_id, manager.clone(), out_tx.clone());

    // S→C: topic broadcasts
    let forward_task = {
        let out_tx = out_tx.clone();
        let topic = topic.clone();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(msg) => {
                        if out_tx.send(Message::Text(msg.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(topic = %topic, skipped, "WS receiver lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    };

    let ping_task = {
        let out_tx = out_tx.clone();
        let every = std::time::Duration::from_secs(opts.ws_ping_sec.max(1));
        tokio::spawn(async move {
            loop {
                time::sleep(every).await;
                if out_tx.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        })
    };

    handler.on_open(&ctx).await;

    // C→S
    while !ctx.is_closing() {
        let Some(Ok(msg)) = socket_rx.next().await else {
            break;
        };
        match msg {
            Message::Text(text) => {
                let raw = text.as_str();
                if opts.enable_app_ping && is_app_ping(raw) {
                    let pong = serde_json::json!({
                        "event": "pong",
                        "topic": ctx.topic,
                        "payload": {},
                        "ts": Utc::now().to_rfc3339(),
                    });
                    let _ = ctx.reply_text(pong.to_string()).await;
                    continue;
                }
                match serde_json::from_str::<H::In>(raw) {
                    Ok(parsed) => handler.on_message(&ctx, parsed).await,
                    Err(e) => tracing::warn!(topic = %ctx.topic, error = %e, "WS invalid message"),
                }
            }
            Message::Ping(payload) => {
                let _ = ctx.reply_pong(payload).await;
            }
            Message::Pong(_) => {}
            Message::Binary(_) => {
                tracing::warn!(topic = %ctx.topic, "Ignoring binary frame");
            }
            Message::Close(_) => break,
        }
    }

    handler.on_close(&ctx).await;

    forward_task.abort();
    ping_task.abort();
    // The forwarder owns this socket's receiver; wait until it is dropped.
    let _ = forward_task.await;
    drop(ctx);
    drop(out_tx);
    let _ = writer_task.await;

    if let Some(uid) = user_id {
        manager.deregister(&topic, uid).await;
    }
    manager.release_if_idle(&topic).await;
    tracing::info!(topic = %topic, "WS session ended");
}

fn is_app_ping(raw: &str) -> bool {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw) {
        if let Some(Value::String(t)) = map.get("type") {
            return t == "ping";
        }
    }
    false
}
