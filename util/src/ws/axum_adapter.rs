use super::handler_trait::WsHandler;
use super::serve::{WsServerOptions, serve_topic};
use crate::state::AppState;
use axum::extract::{State, WebSocketUpgrade, ws::WebSocket};
use axum::response::IntoResponse;
use std::sync::Arc;

/// Upgrades the request and hands the socket to `serve_topic`.
pub async fn ws_route<H>(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    user_id: Option<i64>,
    topic: String,
    handler: Arc<H>,
    opts: WsServerOptions,
) -> impl IntoResponse
where
    H: WsHandler,
{
    let manager = state.ws_clone();
    ws.on_upgrade(move |socket: WebSocket| async move {
        serve_topic(socket, manager, topic, user_id, handler, opts).await;
    })
}
