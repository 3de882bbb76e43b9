//! Connection registry for push delivery.
//!
//! Each topic owns a Tokio broadcast channel; every open socket subscribed to
//! the topic holds one receiver, so a single publish reaches all of a user's
//! tabs. Presence is a per-topic refcount keyed by user id, registered on
//! socket open and dropped on close.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};

type Topic = String;
type Sender = broadcast::Sender<String>;
type Receiver = broadcast::Receiver<String>;

/// Frames buffered per receiver before a slow socket starts lagging.
const CHANNEL_CAPACITY: usize = 128;

#[derive(Clone, Default)]
pub struct WebSocketManager {
    channels: Arc<RwLock<HashMap<Topic, Sender>>>,
    /// topic -> (user_id -> open sockets)
    presence: Arc<RwLock<HashMap<Topic, HashMap<i64, usize>>>>,
}

impl WebSocketManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to `topic`, creating its channel on first use.
    pub async fn subscribe(&self, topic: &str) -> Receiver {
        let mut map = self.channels.write().await;
        map.entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Sends `msg` to every live receiver of `topic` and returns how many
    /// received it. Unknown topics are a no-op. A topic left without
    /// receivers is dropped.
    pub async fn broadcast<T: Into<String>>(&self, topic: &str, msg: T) -> usize {
        let mut map = self.channels.write().await;
        let Some(sender) = map.get(topic) else {
            return 0;
        };
        let delivered = sender.send(msg.into()).unwrap_or(0);
        if sender.receiver_count() == 0 {
            tracing::debug!(topic, "Dropping topic with no receivers");
            map.remove(topic);
        }
        delivered
    }

    /// Drops `topic` if no receiver is attached. Called when a socket
    /// closes so topics of finished sessions and offline students do not
    /// accumulate. Returns whether the topic was dropped.
    pub async fn release_if_idle(&self, topic: &str) -> bool {
        let mut map = self.channels.write().await;
        if map.get(topic).is_some_and(|s| s.receiver_count() == 0) {
            map.remove(topic);
            tracing::debug!(topic, "Released idle topic");
            return true;
        }
        false
    }

    /// Number of receivers currently attached to `topic`.
    pub async fn receiver_count(&self, topic: &str) -> usize {
        self.channels
            .read()
            .await
            .get(topic)
            .map(|s| s.receiver_count())
            .unwrap_or(0)
    }

    // -------------------- Presence --------------------

    pub async fn register(&self, topic: &str, user_id: i64) {
        let mut p = self.presence.write().await;
        let entry = p.entry(topic.to_string()).or_default();
        *entry.entry(user_id).or_insert(0) += 1;
    }

    pub async fn deregister(&self, topic: &str, user_id: i64) {
        let mut p = self.presence.write().await;
        if let Some(users) = p.get_mut(topic) {
            if let Some(cnt) = users.get_mut(&user_id) {
                if *cnt > 1 {
                    *cnt -= 1;
                } else {
                    users.remove(&user_id);
                }
            }
            if users.is_empty() {
                p.remove(topic);
            }
        }
    }

    /// Open sockets `user_id` holds on `topic`.
    async fn connections_for(&self, topic: &str, user_id: i64) -> usize {
        let p = self.presence.read().await;
        p.get(topic)
            .and_then(|m| m.get(&user_id))
            .copied()
            .unwrap_or(0)
    }

    pub async fn is_user_present_on(&self, topic: &str, user_id: i64) -> bool {
        self.connections_for(topic, user_id).await > 0
    }
}
