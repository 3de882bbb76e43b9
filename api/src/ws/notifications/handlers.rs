use axum::{
    Extension,
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
};
use std::sync::Arc;
use util::state::AppState;
use util::ws::axum_adapter::ws_route;
use util::ws::serve::WsServerOptions;

use super::topics::student_notifications_topic;
use super::ws_handlers::NotificationsWsHandler;
use crate::auth::AuthUser;

/// GET `/ws/notifications?token=<jwt>`
///
/// Registers the socket under the authenticated student. Each published
/// notification arrives as a bare `{id, message, createdAt, read}` frame.
pub async fn notifications_ws_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> impl IntoResponse {
    let student_id = user.id();
    tracing::info!(student_id, "Notification channel requested");

    ws_route(
        ws,
        State(app_state),
        Some(student_id),
        student_notifications_topic(student_id),
        Arc::new(NotificationsWsHandler),
        WsServerOptions::default(),
    )
    .await
}
