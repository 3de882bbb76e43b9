//! Shared state handed to every axum handler through `State<AppState>`.
//!
//! Holds the database connection used by the attendance components and the
//! connection registry that pushes notifications and live session events.

use crate::ws::WebSocketManager;
use sea_orm::DatabaseConnection;

/// Cheap-to-clone handle on the database pool and the WebSocket registry.
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    ws: WebSocketManager,
}

impl AppState {
    pub fn new(db: DatabaseConnection, ws: WebSocketManager) -> Self {
        Self { db, ws }
    }

    /// Builds a state around `db` with an empty connection registry.
    pub fn with_db(db: DatabaseConnection) -> Self {
        Self::new(db, WebSocketManager::new())
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// The registry of live channels keyed by topic.
    pub fn ws(&self) -> &WebSocketManager {
        &self.ws
    }

    /// Owned connection for spawned tasks.
    pub fn db_clone(&self) -> DatabaseConnection {
        self.db.clone()
    }

    pub fn ws_clone(&self) -> WebSocketManager {
        self.ws.clone()
    }
}
